use crate::error::{Error, Result, SignatureError};
use crate::types::Type;
use log::trace;

use super::{MAX_ARRAY_DEPTH, MAX_STRUCT_DEPTH};

/// Recursive-descent cursor over a signature string.
///
/// Recursion is bounded by the array and struct depth limits, so a peer
/// cannot blow the stack with a deeply nested signature.
pub(super) struct SignatureParser<'s> {
    sig: &'s str,
    sig_ix: usize,
    array_depth: usize,
    struct_depth: usize,
}

impl<'s> SignatureParser<'s> {
    pub(super) fn new(sig: &'s str) -> Self {
        Self {
            sig,
            sig_ix: 0,
            array_depth: 0,
            struct_depth: 0,
        }
    }

    pub(super) fn is_exhausted(&self) -> bool {
        self.sig_ix >= self.sig.len()
    }

    pub(super) fn error_at(&self, index: usize, cause: SignatureError) -> Error {
        Error::MalformedSignature {
            signature: self.sig.to_owned(),
            index,
            cause,
        }
    }

    fn error(&self, cause: SignatureError) -> Error {
        self.error_at(self.sig_ix, cause)
    }

    fn peek(&self) -> Option<u8> {
        self.sig.as_bytes().get(self.sig_ix).copied()
    }

    fn eat_signature_byte(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.sig_ix += 1;
            true
        } else {
            false
        }
    }

    // Non-ASCII input is reported as the whole character, not a stray byte.
    fn unknown_code(&self) -> Error {
        let code = self.sig[self.sig_ix..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.error(SignatureError::UnknownCode(code))
    }

    /// Consumes exactly one complete type.
    pub(super) fn next_complete_type(&mut self) -> Result<Type> {
        let code = match self.peek() {
            Some(code) => code,
            None => return Err(self.error(SignatureError::Empty)),
        };

        if let Some(ty) = Type::from_basic_code(code) {
            self.sig_ix += 1;
            return Ok(ty);
        }

        match code {
            b'v' => {
                self.sig_ix += 1;
                Ok(Type::Variant)
            }
            b'a' => self.parse_array(),
            b'(' => self.parse_struct(),
            b'{' => Err(self.error(SignatureError::DictEntryOutsideArray)),
            b')' | b'}' => Err(self.error(SignatureError::UnexpectedClose(code as char))),
            _ => Err(self.unknown_code()),
        }
    }

    fn parse_array(&mut self) -> Result<Type> {
        let start = self.sig_ix;
        self.sig_ix += 1;
        if self.array_depth == MAX_ARRAY_DEPTH {
            return Err(self.error_at(start, SignatureError::ArrayTooDeep));
        }
        if self.is_exhausted() {
            return Err(self.error_at(start, SignatureError::MissingElementType));
        }

        self.array_depth += 1;
        let ty = if self.eat_signature_byte(b'{') {
            self.parse_dict_entry(start + 1)
        } else {
            self.next_complete_type().map(Type::array)
        };
        self.array_depth -= 1;
        ty
    }

    // The opening '{' has already been consumed.
    fn parse_dict_entry(&mut self, open_ix: usize) -> Result<Type> {
        self.enter_struct(open_ix)?;

        if self.is_exhausted() {
            return Err(self.error_at(open_ix, SignatureError::Unclosed('{')));
        }
        if self.peek() == Some(b'}') {
            return Err(self.error(SignatureError::DictEntryArity));
        }

        let key_ix = self.sig_ix;
        let key = self.next_complete_type()?;
        if !key.is_basic() {
            return Err(self.error_at(key_ix, SignatureError::DictEntryKeyNotBasic));
        }

        if self.is_exhausted() {
            return Err(self.error_at(open_ix, SignatureError::Unclosed('{')));
        }
        if self.peek() == Some(b'}') {
            return Err(self.error(SignatureError::DictEntryArity));
        }
        let value = self.next_complete_type()?;

        if self.eat_signature_byte(b'}') {
            self.struct_depth -= 1;
            trace!("dict entry {{{}, {}}} ends at {}", key, value, self.sig_ix);
            Ok(Type::dict(key, value))
        } else if self.is_exhausted() {
            Err(self.error_at(open_ix, SignatureError::Unclosed('{')))
        } else {
            Err(self.error(SignatureError::DictEntryArity))
        }
    }

    fn parse_struct(&mut self) -> Result<Type> {
        let open_ix = self.sig_ix;
        self.sig_ix += 1;
        self.enter_struct(open_ix)?;

        let mut fields = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(open_ix, SignatureError::Unclosed('('))),
                Some(b')') if fields.is_empty() => {
                    return Err(self.error_at(open_ix, SignatureError::EmptyStruct))
                }
                Some(b')') => {
                    self.sig_ix += 1;
                    break;
                }
                Some(_) => fields.push(self.next_complete_type()?),
            }
        }

        self.struct_depth -= 1;
        trace!("struct of {} fields ends at {}", fields.len(), self.sig_ix);
        Ok(Type::Struct(fields))
    }

    fn enter_struct(&mut self, open_ix: usize) -> Result<()> {
        if self.struct_depth == MAX_STRUCT_DEPTH {
            return Err(self.error_at(open_ix, SignatureError::StructTooDeep));
        }
        self.struct_depth += 1;
        Ok(())
    }
}
