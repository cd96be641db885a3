//! Parsing of signature strings into [`Type`]s.
//!
//! The wire format is peer controlled, so everything here is checked:
//! bracket balance, the position and shape of dict entries, and the
//! length and nesting limits the bus enforces.

use crate::error::{Result, SignatureError};
use crate::types::Type;
use log::trace;

mod parser;
use parser::SignatureParser;

/// Longest signature the bus accepts, in bytes.
pub const MAX_SIGNATURE_LEN: usize = 255;
/// Deepest nesting of arrays within one signature.
pub const MAX_ARRAY_DEPTH: usize = 32;
/// Deepest nesting of structs and dict entries within one signature.
pub const MAX_STRUCT_DEPTH: usize = 32;

/// Parses `sig` left to right into complete types, stopping after `limit`
/// of them (`None` parses the whole string).
///
/// Any failure is reported as [`Error::MalformedSignature`]; there is no
/// partial result. Bytes after the `limit`-th type are not checked.
///
/// [`Error::MalformedSignature`]: crate::error::Error::MalformedSignature
pub(crate) fn parse_types(sig: &str, limit: Option<usize>) -> Result<Vec<Type>> {
    let mut parser = SignatureParser::new(sig);
    if sig.is_empty() {
        return Err(parser.error_at(0, SignatureError::Empty));
    }
    if sig.len() > MAX_SIGNATURE_LEN {
        return Err(parser.error_at(MAX_SIGNATURE_LEN, SignatureError::TooLong));
    }

    let mut types = Vec::new();
    while !parser.is_exhausted() && limit.map_or(true, |limit| types.len() < limit) {
        types.push(parser.next_complete_type()?);
    }
    trace!("parsed {} complete types from {:?}", types.len(), sig);
    Ok(types)
}
