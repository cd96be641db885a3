use std::fmt::Display;

use serde::ser;

use crate::signature::{MAX_ARRAY_DEPTH, MAX_SIGNATURE_LEN, MAX_STRUCT_DEPTH};

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a type, signature or variant can be rejected.
///
/// None of these are fatal; a failed lookup leaves nothing behind.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A native type has no mapping onto a wire signature.
    #[error("unsupported type {ty}: {reason}")]
    UnsupportedType { ty: String, reason: String },

    /// Exactly one complete type was required, but `found` were produced.
    #[error("expected exactly one complete type for {subject}, found {found}")]
    MultiplicityViolation { subject: String, found: usize },

    /// A signature string is not valid under the wire grammar.
    #[error("malformed signature {signature:?} at byte {index}: {cause}")]
    MalformedSignature {
        signature: String,
        index: usize,
        #[source]
        cause: SignatureError,
    },

    #[error("cannot wrap an absent value in a variant")]
    NullValue,
}

impl Error {
    pub(crate) fn unsupported(ty: impl Display, reason: impl Display) -> Self {
        Error::UnsupportedType {
            ty: ty.to_string(),
            reason: reason.to_string(),
        }
    }
}

// Stands in for the type name until the caller that knows it fills it in.
pub(crate) const SERIALIZED_VALUE: &str = "serialized value";

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::unsupported(SERIALIZED_VALUE, msg)
    }
}

/// The reason a signature failed to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is empty")]
    Empty,
    #[error("unrecognized type code {0:?}")]
    UnknownCode(char),
    #[error("array has no element type")]
    MissingElementType,
    #[error("{0:?} is never closed")]
    Unclosed(char),
    #[error("{0:?} closes nothing")]
    UnexpectedClose(char),
    #[error("dict entry outside of an array")]
    DictEntryOutsideArray,
    #[error("dict entry key must be a basic type")]
    DictEntryKeyNotBasic,
    #[error("dict entry must hold exactly a key and a value")]
    DictEntryArity,
    #[error("struct has no fields")]
    EmptyStruct,
    #[error("signature is longer than {} bytes", MAX_SIGNATURE_LEN)]
    TooLong,
    #[error("arrays nested deeper than {}", MAX_ARRAY_DEPTH)]
    ArrayTooDeep,
    #[error("structs nested deeper than {}", MAX_STRUCT_DEPTH)]
    StructTooDeep,
}

#[cfg(test)]
mod tests {
    use super::{Error, SignatureError};
    use std::error::Error as _;
    use test_log::test;

    #[test]
    fn malformed_signature_exposes_cause() {
        let err = Error::MalformedSignature {
            signature: "a{sv".to_owned(),
            index: 4,
            cause: SignatureError::Unclosed('{'),
        };
        assert_eq!(
            err.to_string(),
            "malformed signature \"a{sv\" at byte 4: '{' is never closed"
        );
        let source = err.source().expect("cause is chained");
        assert_eq!(source.to_string(), "'{' is never closed");
    }

    #[test]
    fn unsupported_type_names_offender() {
        let err = Error::unsupported("Point", "no signature mapping registered");
        assert_eq!(
            err.to_string(),
            "unsupported type Point: no signature mapping registered"
        );
    }
}
