//! Recursive-descent parser producing a [`Statement`] from a token stream.
//!
//! Expressions use precedence climbing:
//! `or > and > not > comparison/string-op > additive > multiplicative > unary > postfix > primary`.

use indexmap::IndexMap;

use super::ast::*;
use super::lexer::{Span, Token, TokenKind};
use crate::{Error, Result};

pub fn parse_statement(tokens: &[Token]) -> Result<Statement> {
    let mut p = Parser { tokens, pos: 0 };
    p.parse_statement()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos];
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(self.err(tok.span, format!("expected {what}, found '{}'", tok.text)))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().text.clone())
        } else {
            let tok = self.peek().clone();
            Err(self.err(tok.span, format!("expected {what}, found '{}'", tok.text)))
        }
    }

    fn err(&self, span: Span, message: String) -> Error {
        Error::ParseError { offset: span.start, message }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.check(TokenKind::Eof) {
            return Err(self.err(self.peek().span, "empty query".into()));
        }

        let mut clauses = Vec::new();
        while !self.check(TokenKind::Eof) {
            clauses.push(self.parse_clause()?);
        }
        Ok(Statement { clauses })
    }

    fn parse_clause(&mut self) -> Result<Clause> {
        match self.peek_kind() {
            TokenKind::Match => {
                self.advance();
                Ok(Clause::Match(self.parse_pattern_list()?))
            }
            TokenKind::Where => {
                self.advance();
                Ok(Clause::Where(self.parse_expr()?))
            }
            TokenKind::Create => {
                self.advance();
                Ok(Clause::Create(self.parse_pattern_list()?))
            }
            TokenKind::With => {
                self.advance();
                Ok(Clause::With(self.parse_projection()?))
            }
            TokenKind::Return => {
                self.advance();
                Ok(Clause::Return(self.parse_projection()?))
            }
            TokenKind::Order => {
                self.advance();
                self.expect(TokenKind::By, "BY")?;
                Ok(Clause::OrderBy(self.parse_order_items()?))
            }
            TokenKind::Skip => {
                self.advance();
                Ok(Clause::Skip(self.parse_expr()?))
            }
            TokenKind::Limit => {
                self.advance();
                Ok(Clause::Limit(self.parse_expr()?))
            }
            _ => {
                let tok = self.peek().clone();
                Err(self.err(tok.span, format!("unexpected token '{}'", tok.text)))
            }
        }
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    fn parse_pattern_list(&mut self) -> Result<Vec<Pattern>> {
        let mut patterns = vec![self.parse_pattern()?];
        while self.eat(TokenKind::Comma) {
            patterns.push(self.parse_pattern()?);
        }
        Ok(patterns)
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let mut elements = vec![PatternElement::Node(self.parse_node_pattern()?)];
        while self.check(TokenKind::Dash) || self.check(TokenKind::LeftArrow) {
            elements.push(PatternElement::Rel(self.parse_rel_pattern()?));
            elements.push(PatternElement::Node(self.parse_node_pattern()?));
        }
        Ok(Pattern { elements })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut pat = NodePattern::default();

        if self.check(TokenKind::Identifier) {
            pat.alias = Some(self.advance().text.clone());
        }
        while self.eat(TokenKind::Colon) {
            pat.labels.push(self.expect_identifier("a label")?);
        }
        if self.check(TokenKind::LBrace) {
            pat.properties = self.parse_property_map()?;
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(pat)
    }

    fn parse_rel_pattern(&mut self) -> Result<RelPattern> {
        let left_arrow = self.eat(TokenKind::LeftArrow);
        if !left_arrow {
            self.expect(TokenKind::Dash, "'-' or '<-'")?;
        }
        self.expect(TokenKind::LBracket, "'['")?;

        let mut alias = None;
        if self.check(TokenKind::Identifier) {
            alias = Some(self.advance().text.clone());
        }

        let mut rel_types = Vec::new();
        if self.eat(TokenKind::Colon) {
            rel_types.push(self.expect_identifier("a relationship type")?);
            while self.eat(TokenKind::Pipe) {
                rel_types.push(self.expect_identifier("a relationship type")?);
            }
        }

        let var_length = if self.check(TokenKind::Star) {
            Some(self.parse_var_length()?)
        } else {
            None
        };

        let properties = if self.check(TokenKind::LBrace) {
            self.parse_property_map()?
        } else {
            IndexMap::new()
        };

        self.expect(TokenKind::RBracket, "']'")?;

        let direction = if left_arrow {
            self.expect(TokenKind::Dash, "'-'")?;
            PatternDirection::Left
        } else if self.eat(TokenKind::Arrow) {
            PatternDirection::Right
        } else if self.eat(TokenKind::Dash) {
            PatternDirection::Both
        } else {
            let tok = self.peek().clone();
            return Err(self.err(tok.span, "expected '->', '-' or relationship arrow".into()));
        };

        Ok(RelPattern { alias, rel_types, direction, properties, var_length })
    }

    fn parse_var_length(&mut self) -> Result<VarLength> {
        self.expect(TokenKind::Star, "'*'")?;
        let min1 = if self.check(TokenKind::Integer) {
            Some(self.advance().text.parse::<usize>().unwrap_or(0))
        } else {
            None
        };

        if self.eat(TokenKind::DotDot) {
            let max = if self.check(TokenKind::Integer) {
                Some(self.advance().text.parse::<usize>().unwrap_or(0))
            } else {
                None
            };
            Ok(VarLength { min: min1, max })
        } else if let Some(n) = min1 {
            Ok(VarLength { min: Some(n), max: Some(n) })
        } else {
            Ok(VarLength { min: None, max: None })
        }
    }

    fn parse_property_map(&mut self) -> Result<IndexMap<String, Expr>> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut map = IndexMap::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = self.expect_identifier("a property key")?;
                self.expect(TokenKind::Colon, "':'")?;
                let value = self.parse_expr()?;
                map.insert(key, value);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(map)
    }

    // ------------------------------------------------------------------
    // Projections / ordering
    // ------------------------------------------------------------------

    fn parse_projection(&mut self) -> Result<Projection> {
        let distinct = self.eat(TokenKind::Distinct);
        let mut items = vec![self.parse_projection_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_projection_item()?);
        }
        Ok(Projection { distinct, items })
    }

    fn parse_projection_item(&mut self) -> Result<ProjectionItem> {
        let expr = self.parse_expr()?;
        let alias = if self.eat(TokenKind::As) {
            Some(self.expect_identifier("an alias")?)
        } else {
            None
        };
        Ok(ProjectionItem { expr, alias })
    }

    fn parse_order_items(&mut self) -> Result<Vec<OrderItem>> {
        let mut items = vec![self.parse_order_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_order_item()?);
        }
        Ok(items)
    }

    fn parse_order_item(&mut self) -> Result<OrderItem> {
        let expr = self.parse_expr()?;
        let ascending = if self.eat(TokenKind::Desc) {
            false
        } else {
            self.eat(TokenKind::Asc);
            true
        };
        Ok(OrderItem { expr, ascending })
    }

    // ------------------------------------------------------------------
    // Expressions, precedence climbing low to high
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOp::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOp::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(TokenKind::Not) {
            let expr = self.parse_not()?;
            Ok(Expr::UnaryOp { op: UnaryOp::Not, expr: Box::new(expr) })
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let op = match self.peek_kind() {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::Neq => Some(BinaryOp::Neq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Lte => Some(BinaryOp::Lte),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Gte => Some(BinaryOp::Gte),
            TokenKind::RegexMatch => Some(BinaryOp::RegexMatch),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.parse_additive()?;
            return Ok(Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) });
        }

        if self.check(TokenKind::Contains) {
            self.advance();
            let right = self.parse_additive()?;
            return Ok(Expr::StringOp { left: Box::new(left), op: StringOp::Contains, right: Box::new(right) });
        }
        if self.check(TokenKind::StartsWith) {
            self.advance();
            self.expect(TokenKind::With, "WITH")?;
            let right = self.parse_additive()?;
            return Ok(Expr::StringOp { left: Box::new(left), op: StringOp::StartsWith, right: Box::new(right) });
        }
        if self.check(TokenKind::EndsWith) {
            self.advance();
            self.expect(TokenKind::With, "WITH")?;
            let right = self.parse_additive()?;
            return Ok(Expr::StringOp { left: Box::new(left), op: StringOp::EndsWith, right: Box::new(right) });
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Dash => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.check(TokenKind::Dash) {
            self.advance();
            let expr = self.parse_unary()?;
            Ok(Expr::UnaryOp { op: UnaryOp::Negate, expr: Box::new(expr) })
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(TokenKind::Dot) {
            let key = self.expect_identifier("a property name")?;
            expr = Expr::Property { expr: Box::new(expr), key };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                let n = tok.text.parse::<i64>().map_err(|_| {
                    self.err(tok.span, format!("invalid integer literal '{}'", tok.text))
                })?;
                Ok(Expr::Literal(Literal::Int(n)))
            }
            TokenKind::Float => {
                self.advance();
                let f = tok.text.parse::<f64>().map_err(|_| {
                    self.err(tok.span, format!("invalid float literal '{}'", tok.text))
                })?;
                Ok(Expr::Literal(Literal::Float(f)))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::Literal(Literal::String(tok.text.clone())))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Parameter => {
                self.advance();
                Ok(Expr::Parameter(tok.text.clone()))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            TokenKind::LBrace => {
                let map = self.parse_property_map()?;
                Ok(Expr::MapLiteral(map))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = tok.text.clone();
                if self.check(TokenKind::LParen) {
                    self.parse_call(name, tok.span)
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            _ => Err(self.err(tok.span, format!("unexpected token '{}' in expression", tok.text))),
        }
    }

    fn parse_call(&mut self, name: String, span: Span) -> Result<Expr> {
        self.expect(TokenKind::LParen, "'('")?;

        if is_aggregate_name(&name) {
            if self.eat(TokenKind::Star) {
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(Expr::Aggregate { name, arg: None });
            }
            if self.check(TokenKind::RParen) {
                return Err(self.err(span, format!("{name} requires an argument")));
            }
            let arg = self.parse_expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(Expr::Aggregate { name, arg: Some(Box::new(arg)) });
        }

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::FunctionCall { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse(src: &str) -> Statement {
        parse_statement(&tokenize(src).unwrap()).unwrap()
    }

    #[test]
    fn parses_simple_match_return() {
        let stmt = parse("MATCH (n:Person) RETURN n");
        assert_eq!(stmt.clauses.len(), 2);
        match &stmt.clauses[0] {
            Clause::Match(patterns) => {
                assert_eq!(patterns.len(), 1);
                assert_eq!(patterns[0].elements.len(), 1);
            }
            _ => panic!("expected Match"),
        }
    }

    #[test]
    fn parses_relationship_pattern_with_direction() {
        let stmt = parse("MATCH (a)-[:KNOWS]->(b) RETURN a, b");
        let Clause::Match(patterns) = &stmt.clauses[0] else { panic!() };
        assert_eq!(patterns[0].elements.len(), 3);
        let PatternElement::Rel(rel) = &patterns[0].elements[1] else { panic!() };
        assert_eq!(rel.direction, PatternDirection::Right);
        assert_eq!(rel.rel_types, vec!["KNOWS".to_string()]);
    }

    #[test]
    fn parses_var_length_range() {
        let stmt = parse("MATCH (a)-[:R*1..3]->(b) RETURN b");
        let Clause::Match(patterns) = &stmt.clauses[0] else { panic!() };
        let PatternElement::Rel(rel) = &patterns[0].elements[1] else { panic!() };
        let vl = rel.var_length.unwrap();
        assert_eq!(vl.min, Some(1));
        assert_eq!(vl.max, Some(3));
    }

    #[test]
    fn parses_where_and_order_by_limit() {
        let stmt = parse("MATCH (n:Person) WHERE n.age > 25 RETURN n.age ORDER BY n.age LIMIT 2");
        assert_eq!(stmt.clauses.len(), 5);
        assert!(matches!(stmt.clauses[1], Clause::Where(_)));
        assert!(matches!(stmt.clauses[3], Clause::OrderBy(_)));
        assert!(matches!(stmt.clauses[4], Clause::Limit(_)));
    }

    #[test]
    fn parses_aggregate_call() {
        let stmt = parse("MATCH (n) RETURN count(*)");
        let Clause::Return(proj) = &stmt.clauses[1] else { panic!() };
        assert!(matches!(proj.items[0].expr, Expr::Aggregate { arg: None, .. }));
    }

    #[test]
    fn parses_distinct_and_alias() {
        let stmt = parse("MATCH (n) RETURN DISTINCT n.name AS name");
        let Clause::Return(proj) = &stmt.clauses[1] else { panic!() };
        assert!(proj.distinct);
        assert_eq!(proj.items[0].alias.as_deref(), Some("name"));
    }

    #[test]
    fn parses_string_ops() {
        let stmt = parse("MATCH (n) WHERE n.name CONTAINS 'a' RETURN n");
        let Clause::Where(expr) = &stmt.clauses[1] else { panic!() };
        assert!(matches!(expr, Expr::StringOp { op: StringOp::Contains, .. }));
    }

    #[test]
    fn empty_query_is_parse_error() {
        assert!(parse_statement(&tokenize("").unwrap()).is_err());
    }

    #[test]
    fn operator_precedence_and_over_or() {
        // a OR b AND c  parses as  a OR (b AND c)
        let stmt = parse("MATCH (n) WHERE n.a OR n.b AND n.c RETURN n");
        let Clause::Where(expr) = &stmt.clauses[1] else { panic!() };
        let Expr::BinaryOp { op: BinaryOp::Or, right, .. } = expr else { panic!("expected OR at top") };
        assert!(matches!(**right, Expr::BinaryOp { op: BinaryOp::And, .. }));
    }
}
