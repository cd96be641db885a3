use std::fmt;

/// A native type descriptor, the thing a signature is computed from and
/// parsed back into.
///
/// Everything except [`Type::Tuple`] and [`Type::Named`] corresponds
/// one-to-one with a single complete type of the wire grammar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    UnixFd,
    Array(Box<Type>),
    Struct(Vec<Type>),
    /// A map, sent as an array of dict entries.
    Dict(Box<Type>, Box<Type>),
    Variant,
    /// Several independent values, one complete type each. Used for
    /// multiple method return values and only valid at the top level.
    Tuple(Vec<Type>),
    /// A name registered with a [`TypeRegistry`].
    ///
    /// [`TypeRegistry`]: crate::mapper::TypeRegistry
    Named(String),
}

impl Type {
    pub fn array(item: Type) -> Self {
        Type::Array(Box::new(item))
    }

    pub fn dict(key: Type, value: Type) -> Self {
        Type::Dict(Box::new(key), Box::new(value))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }

    /// The single-byte code of a basic type, or `None` for containers,
    /// variants, tuples and names.
    pub fn basic_code(&self) -> Option<u8> {
        let code = match self {
            Type::Byte => b'y',
            Type::Boolean => b'b',
            Type::Int16 => b'n',
            Type::UInt16 => b'q',
            Type::Int32 => b'i',
            Type::UInt32 => b'u',
            Type::Int64 => b'x',
            Type::UInt64 => b't',
            Type::Double => b'd',
            Type::String => b's',
            Type::ObjectPath => b'o',
            Type::Signature => b'g',
            Type::UnixFd => b'h',
            _ => return None,
        };
        Some(code)
    }

    pub(crate) fn from_basic_code(code: u8) -> Option<Self> {
        let ty = match code {
            b'y' => Type::Byte,
            b'b' => Type::Boolean,
            b'n' => Type::Int16,
            b'q' => Type::UInt16,
            b'i' => Type::Int32,
            b'u' => Type::UInt32,
            b'x' => Type::Int64,
            b't' => Type::UInt64,
            b'd' => Type::Double,
            b's' => Type::String,
            b'o' => Type::ObjectPath,
            b'g' => Type::Signature,
            b'h' => Type::UnixFd,
            _ => return None,
        };
        Some(ty)
    }

    /// Basic types are the only ones allowed as dict-entry keys.
    pub fn is_basic(&self) -> bool {
        self.basic_code().is_some()
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

/// Human readable, e.g. `array of struct(string, int32)`.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Byte => f.write_str("byte"),
            Type::Boolean => f.write_str("boolean"),
            Type::Int16 => f.write_str("int16"),
            Type::UInt16 => f.write_str("uint16"),
            Type::Int32 => f.write_str("int32"),
            Type::UInt32 => f.write_str("uint32"),
            Type::Int64 => f.write_str("int64"),
            Type::UInt64 => f.write_str("uint64"),
            Type::Double => f.write_str("double"),
            Type::String => f.write_str("string"),
            Type::ObjectPath => f.write_str("object path"),
            Type::Signature => f.write_str("signature"),
            Type::UnixFd => f.write_str("unix fd"),
            Type::Array(item) => write!(f, "array of {}", item),
            Type::Struct(fields) => {
                f.write_str("struct(")?;
                write_list(f, fields)?;
                f.write_str(")")
            }
            Type::Dict(key, value) => write!(f, "dict of {} to {}", key, value),
            Type::Variant => f.write_str("variant"),
            Type::Tuple(items) => {
                f.write_str("tuple(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Type::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Type;
    use test_log::test;

    #[test]
    fn basic_codes_are_inverse() {
        for code in b"ybnqiuxtdsogh" {
            let ty = Type::from_basic_code(*code).expect("basic code");
            assert_eq!(ty.basic_code(), Some(*code));
            assert!(ty.is_basic());
        }
        assert_eq!(Type::from_basic_code(b'v'), None);
        assert_eq!(Type::from_basic_code(b'a'), None);
    }

    #[test]
    fn containers_are_not_basic() {
        assert!(!Type::array(Type::Byte).is_basic());
        assert!(!Type::Struct(vec![Type::Int32]).is_basic());
        assert!(!Type::dict(Type::String, Type::Variant).is_basic());
        assert!(!Type::Variant.is_basic());
        assert!(!Type::named("Point").is_basic());
    }

    #[test]
    fn description() {
        let ty = Type::array(Type::Struct(vec![Type::String, Type::Int32]));
        assert_eq!(ty.to_string(), "array of struct(string, int32)");
        let ty = Type::dict(Type::String, Type::Variant);
        assert_eq!(ty.to_string(), "dict of string to variant");
        let ty = Type::Tuple(vec![Type::Boolean, Type::named("Point")]);
        assert_eq!(ty.to_string(), "tuple(boolean, Point)");
    }
}
