use crate::error::Result;
use crate::signature::parse_types;
use crate::types::Type;

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// Newtype struct names that runtime inference treats as wire types of
// their own rather than as transparent wrappers.
pub(crate) const OBJECT_PATH_NAME: &str = "$dbus_types::ObjectPath";
pub(crate) const SIGNATURE_NAME: &str = "$dbus_types::Signature";
pub(crate) const UNIX_FD_NAME: &str = "$dbus_types::UnixFd";
pub(crate) const TUPLE_NAME: &str = "$dbus_types::Tuple";
pub(crate) const VARIANT_NAME: &str = "$dbus_types::Variant";

/// Native types with a statically known wire type.
pub trait DBusType {
    fn dbus_type() -> Type;
}

macro_rules! basic_type {
    ($type:ty, $variant:ident) => {
        impl DBusType for $type {
            fn dbus_type() -> Type {
                Type::$variant
            }
        }
    };
}

basic_type!(u8, Byte);
basic_type!(bool, Boolean);
basic_type!(i16, Int16);
basic_type!(u16, UInt16);
basic_type!(i32, Int32);
basic_type!(u32, UInt32);
basic_type!(i64, Int64);
basic_type!(u64, UInt64);
basic_type!(f64, Double);
basic_type!(str, String);
basic_type!(String, String);
basic_type!(ObjectPath, ObjectPath);
basic_type!(Signature, Signature);
basic_type!(UnixFd, UnixFd);

impl<T: DBusType + ?Sized> DBusType for &T {
    fn dbus_type() -> Type {
        T::dbus_type()
    }
}

impl<T: DBusType> DBusType for [T] {
    fn dbus_type() -> Type {
        Type::array(T::dbus_type())
    }
}

impl<T: DBusType> DBusType for Vec<T> {
    fn dbus_type() -> Type {
        Type::array(T::dbus_type())
    }
}

impl<K: DBusType, V: DBusType, S> DBusType for HashMap<K, V, S> {
    fn dbus_type() -> Type {
        Type::dict(K::dbus_type(), V::dbus_type())
    }
}

impl<K: DBusType, V: DBusType> DBusType for BTreeMap<K, V> {
    fn dbus_type() -> Type {
        Type::dict(K::dbus_type(), V::dbus_type())
    }
}

/// The unit type carries no values at all.
impl DBusType for () {
    fn dbus_type() -> Type {
        Type::Tuple(Vec::new())
    }
}

/// Several values sent side by side instead of inside one struct, as
/// multiple return values of a method are.
///
/// `(A, B)` is a single struct `(ab)`, `Tuple((A, B))` is the two complete
/// types `a` and `b`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tuple<T>(pub T);

impl<T: Serialize> Serialize for Tuple<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(TUPLE_NAME, &self.0)
    }
}

macro_rules! tuple_types {
    ($($name:ident)+) => {
        impl<$($name: DBusType),+> DBusType for ($($name,)+) {
            fn dbus_type() -> Type {
                Type::Struct(vec![$($name::dbus_type()),+])
            }
        }

        impl<$($name: DBusType),+> DBusType for Tuple<($($name,)+)> {
            fn dbus_type() -> Type {
                Type::Tuple(vec![$($name::dbus_type()),+])
            }
        }
    };
}

tuple_types!(A);
tuple_types!(A B);
tuple_types!(A B C);
tuple_types!(A B C D);
tuple_types!(A B C D E);
tuple_types!(A B C D E F);
tuple_types!(A B C D E F G);
tuple_types!(A B C D E F G H);
tuple_types!(A B C D E F G H I);
tuple_types!(A B C D E F G H I J);
tuple_types!(A B C D E F G H I J K);
tuple_types!(A B C D E F G H I J K L);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath(pub String);

impl Serialize for ObjectPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(OBJECT_PATH_NAME, &self.0)
    }
}

/// Index of a file descriptor in the out-of-band descriptor array of a
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnixFd(pub u32);

impl Serialize for UnixFd {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(UNIX_FD_NAME, &self.0)
    }
}

/// A signature string that is known to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(String);

impl Signature {
    /// Validates `sig` as a sequence of one or more complete types.
    pub fn new(sig: impl Into<String>) -> Result<Self> {
        let sig = sig.into();
        parse_types(&sig, None)?;
        Ok(Signature(sig))
    }

    // Only for strings that came out of the parser or the renderer.
    pub(crate) fn from_validated(sig: String) -> Self {
        Signature(sig)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The complete types this signature is made of.
    pub fn types(&self) -> Vec<Type> {
        // A constructed signature always parses.
        parse_types(&self.0, None).unwrap_or_default()
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Signature {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(SIGNATURE_NAME, &self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DBusType, ObjectPath, Signature, Tuple, UnixFd};
    use crate::error::{Error, Result};
    use crate::types::Type;
    use std::collections::HashMap;
    use test_log::test;

    #[test]
    fn static_types() {
        assert_eq!(<i32>::dbus_type(), Type::Int32);
        assert_eq!(<&str>::dbus_type(), Type::String);
        assert_eq!(<Vec<u8>>::dbus_type(), Type::array(Type::Byte));
        assert_eq!(
            <HashMap<String, Vec<ObjectPath>>>::dbus_type(),
            Type::dict(Type::String, Type::array(Type::ObjectPath))
        );
        assert_eq!(
            <(String, i32)>::dbus_type(),
            Type::Struct(vec![Type::String, Type::Int32])
        );
        assert_eq!(
            <Tuple<(String, i32)>>::dbus_type(),
            Type::Tuple(vec![Type::String, Type::Int32])
        );
        assert_eq!(<UnixFd>::dbus_type(), Type::UnixFd);
        assert_eq!(<()>::dbus_type(), Type::Tuple(vec![]));
    }

    #[test]
    fn signature_validates() -> Result<()> {
        let sig = Signature::new("a{sv}")?;
        assert_eq!(sig, "a{sv}");
        assert_eq!(sig.types(), vec![Type::dict(Type::String, Type::Variant)]);

        let sig = Signature::new("ias")?;
        assert_eq!(sig.types().len(), 2);

        assert!(matches!(
            Signature::new("a{sv"),
            Err(Error::MalformedSignature { .. })
        ));
        Ok(())
    }
}
