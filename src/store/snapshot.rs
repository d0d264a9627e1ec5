//! Snapshot type and its two serialisation codecs.
//!
//! A `Snapshot` carries exactly the source-of-truth state of a [`super::Store`]
//! — nodes, edges, and the id counters — in ascending-id order. Every
//! derived index (label/type maps, adjacency lists) is rebuilt from this by
//! [`super::Store::bulk_load`], so the two codecs below are also the
//! transaction rollback mechanism's data shape.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Node, Relationship};
use crate::{Error, Result};

/// Logical, storage-format-independent description of a store's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub next_node_id: u64,
    pub next_edge_id: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<Relationship>,
}

impl Snapshot {
    /// Serialises to the compact binary codec (`postcard`), preserving
    /// exact numeric representations (no float round-trip through text).
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| Error::Serde(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|e| Error::Serde(e.to_string()))
    }

    /// Serialises to the human-readable JSON codec.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serde(e.to_string()))
    }

    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Serde(e.to_string()))
    }

    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_binary()?;
        let mut file = std::fs::File::create(path).map_err(Error::Io)?;
        file.write_all(&bytes).map_err(Error::Io)
    }

    pub fn load_binary(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = std::fs::File::open(path).map_err(Error::Io)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(Error::Io)?;
        Self::from_binary(&bytes)
    }

    pub fn save_text(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = self.to_text()?;
        std::fs::write(path, text).map_err(Error::Io)
    }

    pub fn load_text(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_text(&text)
    }
}
