use std::fmt;
use thiserror::Error;

/// A location in a ShExC source text. Lines and columns are 1-based.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// What went wrong while tokenizing or parsing ShExC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShexParseErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated IRI reference")]
    UnterminatedIri,
    #[error("bad escape sequence `\\{0}`")]
    BadEscape(char),
    #[error("unexpected character `{0}`")]
    InvalidToken(char),
    #[error("integer literal out of range")]
    InvalidInteger,
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("invalid cardinality bounds")]
    InvalidCardinality,
    #[error("unknown prefix `{0}:`")]
    UnknownPrefix(String),
    #[error("duplicate shape id `{0}`")]
    DuplicateShapeId(String),
    #[error("invalid IRI `{0}`")]
    InvalidIri(String),
}

/// A ShExC parse failure with the position of the first offending byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct ShexParseError {
    pub kind: ShexParseErrorKind,
    pub position: Position,
}

impl ShexParseError {
    pub fn new(kind: ShexParseErrorKind, position: Position) -> Self {
        ShexParseError { kind, position }
    }
}

/// A failure while reading SHACL out of Turtle text or a triple bag,
/// or while serializing one back.
#[derive(Debug, Error)]
pub enum ShaclError {
    #[error(transparent)]
    Turtle(#[from] oxttl::TurtleSyntaxError),
    #[error("malformed RDF list starting at `{0}`")]
    MalformedList(String),
    #[error("unrecognized sh:nodeKind value `{0}`")]
    UnrecognizedNodeKind(String),
    #[error("property shape under `{0}` has no sh:path")]
    MissingPath(String),
    #[error("unsupported sh:path structure under `{0}`")]
    UnsupportedPath(String),
    #[error("invalid prefix namespace: {0}")]
    Prefix(#[from] oxiri::IriParseError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A translation failure from either direction of the facade API.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Shex(#[from] ShexParseError),
    #[error(transparent)]
    Shacl(#[from] ShaclError),
}

/// A lossy-conversion notice. Converters never fail on a well-formed
/// model; anything they cannot carry across is reported here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A `sh:pattern` that is not an IRI-stem pattern was discarded.
    DroppedPattern { shape: String, pattern: String },
    /// A construct with no counterpart in the target language was
    /// discarded.
    UnsupportedConstruct { shape: String, construct: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DroppedPattern { shape, pattern } => {
                write!(f, "shape {shape}: dropped non-stem pattern {pattern:?}")
            }
            Warning::UnsupportedConstruct { shape, construct } => {
                write!(f, "shape {shape}: dropped untranslatable {construct}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_displays_position_first() {
        let err = ShexParseError::new(
            ShexParseErrorKind::UnknownPrefix("foaf".to_owned()),
            Position {
                line: 3,
                column: 7,
                offset: 41,
            },
        );
        assert_eq!(err.to_string(), "line 3 column 7: unknown prefix `foaf:`");
    }

    #[test]
    fn warning_display_names_the_shape() {
        let w = Warning::DroppedPattern {
            shape: "Person".to_owned(),
            pattern: "[0-9]+".to_owned(),
        };
        assert!(w.to_string().contains("Person"));
        assert!(w.to_string().contains("[0-9]+"));
    }
}
