//! Recursive-descent parser for the accepted ShExC subset.
//!
//! One token of lookahead, fail-fast: the first error is reported with
//! its exact position and nothing is recovered.

use crate::error::{Position, ShexParseError, ShexParseErrorKind};
use crate::shex::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::shex::{ShexSchema, ShexShape, TripleConstraint, ValueExpr};
use crate::types::{iri_has_scheme, Cardinality, NodeKind, PrefixTable, ShapeLabel, ValueSetItem};
use log::debug;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Literal, NamedNode};

/// Parses a ShExC document into a schema.
pub fn parse(src: &str) -> Result<ShexSchema, ShexParseError> {
    Parser::new(src).parse_schema()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
    prefixes: PrefixTable,
    base: Option<String>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(src),
            peeked: None,
            prefixes: PrefixTable::with_defaults(),
            base: None,
        }
    }

    fn advance(&mut self) -> Result<Token, ShexParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<&Token, ShexParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ShexParseError> {
        if &self.peek()?.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ShexParseError> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(expected, &token))
        }
    }

    fn parse_schema(mut self) -> Result<ShexSchema, ShexParseError> {
        self.parse_directives()?;
        let mut shapes: Vec<ShexShape> = Vec::new();
        loop {
            if self.peek()?.kind == TokenKind::Eof {
                break;
            }
            let (shape, id_position) = self.parse_shape()?;
            if shapes.iter().any(|s| s.id == shape.id) {
                return Err(ShexParseError::new(
                    ShexParseErrorKind::DuplicateShapeId(shape.id.to_string()),
                    id_position,
                ));
            }
            shapes.push(shape);
        }
        debug!("parsed {} shex shapes", shapes.len());
        Ok(ShexSchema {
            prefixes: self.prefixes,
            base: self.base,
            shapes,
        })
    }

    fn parse_directives(&mut self) -> Result<(), ShexParseError> {
        loop {
            match self.peek()?.kind {
                TokenKind::Keyword(Keyword::Prefix) => {
                    self.advance()?;
                    let token = self.advance()?;
                    let TokenKind::PrefixedName {
                        ref prefix,
                        ref local,
                    } = token.kind
                    else {
                        return Err(unexpected("a prefix declaration like `ex:`", &token));
                    };
                    if !local.is_empty() {
                        return Err(unexpected("a prefix declaration like `ex:`", &token));
                    }
                    let prefix = prefix.clone();
                    let iri_token = self.advance()?;
                    let TokenKind::IriRef(iri) = iri_token.kind else {
                        return Err(unexpected("an IRI", &iri_token));
                    };
                    let namespace = self.resolve_against_base(&iri);
                    self.prefixes.insert(prefix, namespace);
                }
                TokenKind::Keyword(Keyword::Base) => {
                    self.advance()?;
                    let iri_token = self.advance()?;
                    let TokenKind::IriRef(iri) = iri_token.kind else {
                        return Err(unexpected("an IRI", &iri_token));
                    };
                    self.base = Some(self.resolve_against_base(&iri));
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_shape(&mut self) -> Result<(ShexShape, Position), ShexParseError> {
        let token = self.advance()?;
        let id_position = token.position;
        let id = match token.kind {
            TokenKind::IriRef(iri) => ShapeLabel::new(iri),
            TokenKind::PrefixedName { prefix, local } => {
                let iri = self
                    .prefixes
                    .expand_named(&prefix, &local, token.position)?;
                ShapeLabel::new(iri.into_string())
            }
            _ => return Err(unexpected("a shape id", &token)),
        };
        let mut shape = ShexShape::new(id);

        if self.eat(&TokenKind::Keyword(Keyword::Extra))? {
            shape.extra.push(self.parse_predicate()?);
            while self.predicate_ahead()? {
                shape.extra.push(self.parse_predicate()?);
            }
        }
        if self.eat(&TokenKind::Keyword(Keyword::Closed))? {
            shape.closed = true;
        }

        self.expect(TokenKind::LBrace, "`{`")?;
        if !self.eat(&TokenKind::RBrace)? {
            loop {
                shape.expression.push(self.parse_triple_constraint()?);
                if self.eat(&TokenKind::Semicolon)? {
                    // A trailing `;` before `}` is allowed.
                    if self.eat(&TokenKind::RBrace)? {
                        break;
                    }
                } else {
                    self.expect(TokenKind::RBrace, "`;` or `}`")?;
                    break;
                }
            }
        }
        Ok((shape, id_position))
    }

    /// Whether the next token can start a predicate (used to end the
    /// `EXTRA` list).
    fn predicate_ahead(&mut self) -> Result<bool, ShexParseError> {
        Ok(matches!(
            self.peek()?.kind,
            TokenKind::IriRef(_)
                | TokenKind::PrefixedName { .. }
                | TokenKind::Keyword(Keyword::A)
        ))
    }

    fn parse_predicate(&mut self) -> Result<NamedNode, ShexParseError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Keyword(Keyword::A) => Ok(rdf::TYPE.into_owned()),
            TokenKind::PrefixedName { prefix, local } => {
                self.prefixes.expand_named(&prefix, &local, token.position)
            }
            TokenKind::IriRef(iri) => self.named_node(&iri, token.position),
            _ => Err(unexpected("a predicate", &token)),
        }
    }

    fn parse_triple_constraint(&mut self) -> Result<TripleConstraint, ShexParseError> {
        let inverse = self.eat(&TokenKind::Caret)?;
        let predicate = self.parse_predicate()?;
        let value = self.parse_value_expr()?;
        let cardinality = self.parse_cardinality()?;
        Ok(TripleConstraint {
            predicate,
            inverse,
            value,
            cardinality,
        })
    }

    fn parse_value_expr(&mut self) -> Result<ValueExpr, ShexParseError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Dot => Ok(ValueExpr::Any),
            TokenKind::Keyword(Keyword::Iri) => Ok(ValueExpr::Kind(NodeKind::Iri)),
            TokenKind::Keyword(Keyword::Bnode) => Ok(ValueExpr::Kind(NodeKind::BlankNode)),
            TokenKind::Keyword(Keyword::Literal) => Ok(ValueExpr::Kind(NodeKind::Literal)),
            TokenKind::Keyword(Keyword::Nonliteral) => {
                Ok(ValueExpr::Kind(NodeKind::BlankNodeOrIri))
            }
            TokenKind::PrefixedName { prefix, local } => {
                let datatype = self.prefixes.expand_named(&prefix, &local, token.position)?;
                Ok(ValueExpr::Datatype(datatype))
            }
            TokenKind::IriRef(iri) => {
                Ok(ValueExpr::Datatype(self.named_node(&iri, token.position)?))
            }
            TokenKind::RefIri(iri) => Ok(ValueExpr::Ref(ShapeLabel::new(iri))),
            TokenKind::RefPname { prefix, local } => {
                let iri = self.prefixes.expand_named(&prefix, &local, token.position)?;
                Ok(ValueExpr::Ref(ShapeLabel::new(iri.into_string())))
            }
            TokenKind::LBracket => self.parse_value_set(),
            TokenKind::LParen => self.parse_one_of(),
            _ => Err(unexpected("a value expression", &token)),
        }
    }

    fn parse_value_set(&mut self) -> Result<ValueExpr, ShexParseError> {
        let mut items = Vec::new();
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::RBracket if !items.is_empty() => {
                    return Ok(ValueExpr::Values(items));
                }
                TokenKind::PrefixedName { prefix, local } => {
                    let iri = self.prefixes.expand_named(&prefix, &local, token.position)?;
                    items.push(self.finish_iri_item(iri)?);
                }
                TokenKind::IriRef(iri) => {
                    if self.eat(&TokenKind::Tilde)? {
                        items.push(ValueSetItem::Stem(self.resolve_against_base(&iri)));
                    } else {
                        let iri = self.named_node(&iri, token.position)?;
                        items.push(ValueSetItem::Iri(iri));
                    }
                }
                TokenKind::StringLiteral(value) => {
                    items.push(ValueSetItem::Literal(self.finish_literal(value)?));
                }
                TokenKind::Integer(n) => {
                    items.push(ValueSetItem::Literal(Literal::new_typed_literal(
                        n.to_string(),
                        xsd::INTEGER,
                    )));
                }
                _ => return Err(unexpected("a value set item or `]`", &token)),
            }
        }
    }

    fn finish_iri_item(&mut self, iri: NamedNode) -> Result<ValueSetItem, ShexParseError> {
        if self.eat(&TokenKind::Tilde)? {
            Ok(ValueSetItem::Stem(iri.into_string()))
        } else {
            Ok(ValueSetItem::Iri(iri))
        }
    }

    fn finish_literal(&mut self, value: String) -> Result<Literal, ShexParseError> {
        let lang = match &self.peek()?.kind {
            TokenKind::LangTag(tag) => Some(tag.clone()),
            _ => None,
        };
        if let Some(tag) = lang {
            self.advance()?;
            return Ok(Literal::new_language_tagged_literal_unchecked(
                value,
                tag.to_lowercase(),
            ));
        }
        if self.eat(&TokenKind::DatatypeMarker)? {
            let datatype = self.parse_predicate()?;
            return Ok(Literal::new_typed_literal(value, datatype));
        }
        Ok(Literal::new_simple_literal(value))
    }

    fn parse_one_of(&mut self) -> Result<ValueExpr, ShexParseError> {
        let mut labels = vec![self.parse_shape_ref()?];
        loop {
            let token = self.advance()?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Keyword(Keyword::Or) | TokenKind::Pipe => {
                    labels.push(self.parse_shape_ref()?);
                }
                _ => return Err(unexpected("`OR` or `)`", &token)),
            }
        }
        if labels.len() == 1 {
            // `(@<a>)` normalizes to a plain reference.
            Ok(ValueExpr::Ref(labels.remove(0)))
        } else {
            Ok(ValueExpr::OneOf(labels))
        }
    }

    fn parse_shape_ref(&mut self) -> Result<ShapeLabel, ShexParseError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::RefIri(iri) => Ok(ShapeLabel::new(iri)),
            TokenKind::RefPname { prefix, local } => {
                let iri = self.prefixes.expand_named(&prefix, &local, token.position)?;
                Ok(ShapeLabel::new(iri.into_string()))
            }
            _ => Err(unexpected("a shape reference", &token)),
        }
    }

    fn parse_cardinality(&mut self) -> Result<Cardinality, ShexParseError> {
        let position = self.peek()?.position;
        match self.peek()?.kind {
            TokenKind::Question => {
                self.advance()?;
                Ok(Cardinality::OPTIONAL)
            }
            TokenKind::Star => {
                self.advance()?;
                Ok(Cardinality::ANY)
            }
            TokenKind::Plus => {
                self.advance()?;
                Ok(Cardinality::ONE_OR_MORE)
            }
            TokenKind::LBrace => {
                self.advance()?;
                let min_token = self.advance()?;
                let TokenKind::Integer(min) = min_token.kind else {
                    return Err(unexpected("a minimum count", &min_token));
                };
                let max = if self.eat(&TokenKind::Comma)? {
                    let max_token = self.advance()?;
                    match max_token.kind {
                        TokenKind::Integer(max) => Some(max),
                        TokenKind::Star => None,
                        _ => return Err(unexpected("a maximum count or `*`", &max_token)),
                    }
                } else {
                    Some(min)
                };
                self.expect(TokenKind::RBrace, "`}`")?;
                if let Some(max) = max {
                    if min > max {
                        return Err(ShexParseError::new(
                            ShexParseErrorKind::InvalidCardinality,
                            position,
                        ));
                    }
                }
                Ok(Cardinality::new(min, max))
            }
            _ => Ok(Cardinality::ONE),
        }
    }

    /// Resolves an IRI reference written in the document into an
    /// absolute `NamedNode`, using the schema base for relative ones.
    fn named_node(&self, iri: &str, position: Position) -> Result<NamedNode, ShexParseError> {
        let resolved = self.resolve_against_base(iri);
        NamedNode::new(&resolved)
            .map_err(|_| ShexParseError::new(ShexParseErrorKind::InvalidIri(resolved), position))
    }

    /// Best-effort base resolution: absolute IRIs pass through, relative
    /// ones resolve against the base when one is declared.
    fn resolve_against_base(&self, iri: &str) -> String {
        if iri_has_scheme(iri) {
            return iri.to_owned();
        }
        let Some(base) = self.base.as_deref() else {
            return iri.to_owned();
        };
        match oxiri::Iri::parse(base).and_then(|b| b.resolve(iri)) {
            Ok(resolved) => resolved.into_inner(),
            Err(_) => iri.to_owned(),
        }
    }
}

fn unexpected(expected: &str, token: &Token) -> ShexParseError {
    ShexParseError::new(
        ShexParseErrorKind::UnexpectedToken {
            expected: expected.to_owned(),
            found: token.kind.to_string(),
        },
        token.position,
    )
}
