//! A SHACL <-> ShEx schema translator library.
//!
//! The pipeline is symmetric in both directions: parse the source
//! schema into its model, rewrite that model as the other formalism,
//! print the result. Models are built in one pass and never mutated;
//! the converters report anything they cannot carry across as
//! [`Warning`]s instead of failing.
#![deny(clippy::all)]

pub mod canonicalization;
pub mod convert;
pub mod error;
pub mod shacl;
pub mod shex;
pub mod types;

pub use error::{ShaclError, ShexParseError, TranslateError, Warning};

/// The outcome of a whole-text translation.
#[derive(Debug)]
pub struct Translation {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Translates a SHACL schema in Turtle into ShExC text.
pub fn shacl_to_shex(turtle: &str) -> Result<Translation, TranslateError> {
    let schema = shacl::parser::parse_turtle(turtle)?;
    let (shex, warnings) = convert::to_shex(&schema);
    Ok(Translation {
        text: shex::serializer::to_shexc(&shex),
        warnings,
    })
}

/// Translates a ShExC schema into SHACL Turtle text.
pub fn shex_to_shacl(shexc: &str) -> Result<Translation, TranslateError> {
    let schema = shex::parser::parse(shexc)?;
    let (converted, warnings) = convert::to_shacl(&schema);
    let text = shacl::serializer::to_turtle(&converted)?;
    Ok(Translation { text, warnings })
}
