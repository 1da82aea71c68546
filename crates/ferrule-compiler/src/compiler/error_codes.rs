//! Maps the lex/parse error enums onto the stable [`ErrorCode`] taxonomy
//! (`spec.md` §7), producing the [`ferrule_core::EngineError`] the facade
//! ultimately surfaces.

use ferrule_core::{EngineError, ErrorCode};

use crate::compiler::parser::ParseError;

pub fn parse_error_code(e: &ParseError) -> ErrorCode {
    match e {
        ParseError::UnexpectedToken { .. } => ErrorCode::UnexpectedToken,
        ParseError::UnterminatedString { .. } => ErrorCode::UnterminatedString,
        ParseError::InvalidNumber { .. } => ErrorCode::InvalidNumber,
        ParseError::UnexpectedEof { .. } => ErrorCode::UnexpectedEndOfFile,
        ParseError::LiteralStringRequired { .. } => ErrorCode::TypeMismatch,
        ParseError::InvalidFieldName { .. } => ErrorCode::InvalidFieldName,
        ParseError::UnknownTypeHint { .. } => ErrorCode::TypeMismatch,
    }
}

fn parse_error_position(e: &ParseError) -> (usize, usize) {
    match *e {
        ParseError::UnexpectedToken { line, column, .. }
        | ParseError::UnterminatedString { line, column }
        | ParseError::InvalidNumber { line, column }
        | ParseError::UnexpectedEof { line, column }
        | ParseError::LiteralStringRequired { line, column }
        | ParseError::InvalidFieldName { line, column }
        | ParseError::UnknownTypeHint { line, column, .. } => (line, column),
    }
}

pub fn parse_error_to_engine_error(e: &ParseError) -> EngineError {
    let (line, column) = parse_error_position(e);
    EngineError::new(parse_error_code(e), e.to_string(), line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_string_required_maps_to_type_mismatch() {
        let e = ParseError::LiteralStringRequired { line: 1, column: 1 };
        assert_eq!(parse_error_code(&e), ErrorCode::TypeMismatch);
    }
}
