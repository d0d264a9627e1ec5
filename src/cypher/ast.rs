//! Cypher AST.
//!
//! Pure data — no behavior, no storage references, no execution logic. The
//! top-level shape is a flat sequence of clauses in source order; the
//! executor, not the parser, gives them pipeline meaning.

use indexmap::IndexMap;

/// A parsed query: an ordered sequence of clauses.
#[derive(Debug, Clone)]
pub struct Statement {
    pub clauses: Vec<Clause>,
}

/// A single top-level clause, in the order it appeared in the source text.
#[derive(Debug, Clone)]
pub enum Clause {
    Match(Vec<Pattern>),
    Where(Expr),
    Create(Vec<Pattern>),
    With(Projection),
    Return(Projection),
    OrderBy(Vec<OrderItem>),
    Skip(Expr),
    Limit(Expr),
}

/// A pattern: `(a:Person)-[:KNOWS]->(b:Person)`.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub elements: Vec<PatternElement>,
}

#[derive(Debug, Clone)]
pub enum PatternElement {
    Node(NodePattern),
    Rel(RelPattern),
}

/// Node pattern: `(alias:Label1:Label2 {prop: value})`.
#[derive(Debug, Clone, Default)]
pub struct NodePattern {
    pub alias: Option<String>,
    pub labels: Vec<String>,
    pub properties: IndexMap<String, Expr>,
}

/// Relationship pattern: `-[alias:TYPE *min..max {props}]->`.
#[derive(Debug, Clone)]
pub struct RelPattern {
    pub alias: Option<String>,
    pub rel_types: Vec<String>,
    pub direction: PatternDirection,
    pub properties: IndexMap<String, Expr>,
    pub var_length: Option<VarLength>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternDirection {
    /// `->`
    Right,
    /// `<-`
    Left,
    /// `-` (undirected)
    Both,
}

/// `*min..max` variable-length path specification. Both ends are inclusive.
#[derive(Debug, Clone, Copy)]
pub struct VarLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// `RETURN`/`WITH` projection list.
#[derive(Debug, Clone)]
pub struct Projection {
    pub distinct: bool,
    pub items: Vec<ProjectionItem>,
}

#[derive(Debug, Clone)]
pub struct ProjectionItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl ProjectionItem {
    /// The column name: the explicit alias, or the source expression
    /// rendered back to text when no alias was given.
    pub fn column_name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| self.expr.render())
    }
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub expr: Expr,
    pub ascending: bool,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    /// Variable reference: `n`, `r`.
    Variable(String),
    /// Property access: `n.name`.
    Property { expr: Box<Expr>, key: String },
    /// Parameter: `$name`.
    Parameter(String),
    /// Scalar function call: `upper(n.name)`.
    FunctionCall { name: String, args: Vec<Expr> },
    /// Aggregate call, recognised by name at parse time and kept distinct
    /// from `FunctionCall` so the executor can detect grouping without
    /// re-scanning the AST: `count(n)`, `count(*)`, `sum(n.age)`.
    Aggregate { name: String, arg: Option<Box<Expr>> },
    BinaryOp { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    List(Vec<Expr>),
    MapLiteral(IndexMap<String, Expr>),
    /// String-search operator: `STARTS WITH`, `ENDS WITH`, `CONTAINS`.
    StringOp { left: Box<Expr>, op: StringOp, right: Box<Expr> },
}

impl Expr {
    /// Render the expression back to a column-name-shaped string, used when
    /// a projection item has no explicit `AS` alias.
    pub fn render(&self) -> String {
        match self {
            Expr::Literal(l) => l.render(),
            Expr::Variable(v) => v.clone(),
            Expr::Property { expr, key } => format!("{}.{}", expr.render(), key),
            Expr::Parameter(p) => format!("${p}"),
            Expr::FunctionCall { name, args } => {
                let args: Vec<String> = args.iter().map(Expr::render).collect();
                format!("{}({})", name.to_lowercase(), args.join(", "))
            }
            Expr::Aggregate { name, arg } => match arg {
                Some(a) => format!("{}({})", name.to_lowercase(), a.render()),
                None => format!("{}(*)", name.to_lowercase()),
            },
            Expr::BinaryOp { left, op, right } => {
                format!("{} {} {}", left.render(), op.render(), right.render())
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOp::Not => format!("NOT {}", expr.render()),
                UnaryOp::Negate => format!("-{}", expr.render()),
            },
            Expr::List(items) => {
                let items: Vec<String> = items.iter().map(Expr::render).collect();
                format!("[{}]", items.join(", "))
            }
            Expr::MapLiteral(m) => {
                let items: Vec<String> =
                    m.iter().map(|(k, v)| format!("{k}: {}", v.render())).collect();
                format!("{{{}}}", items.join(", "))
            }
            Expr::StringOp { left, op, right } => {
                format!("{} {} {}", left.render(), op.render(), right.render())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    fn render(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div,
    Eq, Neq, Lt, Lte, Gt, Gte,
    And, Or,
    RegexMatch,
}

impl BinaryOp {
    fn render(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "=",
            BinaryOp::Neq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::RegexMatch => "=~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    StartsWith,
    EndsWith,
    Contains,
}

impl StringOp {
    fn render(&self) -> &'static str {
        match self {
            StringOp::StartsWith => "STARTS WITH",
            StringOp::EndsWith => "ENDS WITH",
            StringOp::Contains => "CONTAINS",
        }
    }
}

/// Names recognised as aggregate calls rather than scalar function calls.
pub const AGGREGATE_NAMES: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX"];

pub fn is_aggregate_name(name: &str) -> bool {
    AGGREGATE_NAMES.contains(&name.to_uppercase().as_str())
}
