use crate::primitives::{OBJECT_PATH_NAME, SIGNATURE_NAME, UNIX_FD_NAME, VARIANT_NAME};

use serde::{ser, Serialize};
use std::fmt;

/// Whether `value` is absent, i.e. serializes as `None`.
///
/// Only the outermost layers are looked at: `Some` and transparent newtypes
/// are unwrapped, and the first anything else ends the walk.
pub(crate) fn is_absent<T: Serialize + ?Sized>(value: &T) -> bool {
    value.serialize(AbsenceCheck).is_ok()
}

// `Ok` means a `None` was reached; `Err(Present)` stops at anything else.
struct AbsenceCheck;

#[derive(Debug)]
struct Present;

impl fmt::Display for Present {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value is present")
    }
}

impl std::error::Error for Present {}

impl ser::Error for Present {
    fn custom<T: fmt::Display>(_: T) -> Self {
        Present
    }
}

type Checked<T = ()> = Result<T, Present>;

macro_rules! present {
    ($($method:ident($($arg:ty),*) -> $ok:ty;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Checked<$ok> {
                Err(Present)
            }
        )*
    };
}

impl ser::Serializer for AbsenceCheck {
    type Ok = ();
    type Error = Present;

    type SerializeSeq = ser::Impossible<(), Present>;
    type SerializeTuple = ser::Impossible<(), Present>;
    type SerializeTupleStruct = ser::Impossible<(), Present>;
    type SerializeTupleVariant = ser::Impossible<(), Present>;
    type SerializeMap = ser::Impossible<(), Present>;
    type SerializeStruct = ser::Impossible<(), Present>;
    type SerializeStructVariant = ser::Impossible<(), Present>;

    present! {
        serialize_bool(bool) -> ();
        serialize_i8(i8) -> ();
        serialize_i16(i16) -> ();
        serialize_i32(i32) -> ();
        serialize_i64(i64) -> ();
        serialize_u8(u8) -> ();
        serialize_u16(u16) -> ();
        serialize_u32(u32) -> ();
        serialize_u64(u64) -> ();
        serialize_f32(f32) -> ();
        serialize_f64(f64) -> ();
        serialize_char(char) -> ();
        serialize_str(&str) -> ();
        serialize_bytes(&[u8]) -> ();
        serialize_unit() -> ();
        serialize_unit_struct(&'static str) -> ();
        serialize_unit_variant(&'static str, u32, &'static str) -> ();
        serialize_seq(Option<usize>) -> Self::SerializeSeq;
        serialize_tuple(usize) -> Self::SerializeTuple;
        serialize_tuple_struct(&'static str, usize) -> Self::SerializeTupleStruct;
        serialize_tuple_variant(&'static str, u32, &'static str, usize)
            -> Self::SerializeTupleVariant;
        serialize_map(Option<usize>) -> Self::SerializeMap;
        serialize_struct(&'static str, usize) -> Self::SerializeStruct;
        serialize_struct_variant(&'static str, u32, &'static str, usize)
            -> Self::SerializeStructVariant;
    }

    fn serialize_none(self) -> Checked {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Checked
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Checked
    where
        T: Serialize + ?Sized,
    {
        match name {
            OBJECT_PATH_NAME | SIGNATURE_NAME | UNIX_FD_NAME | VARIANT_NAME => Err(Present),
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Checked
    where
        T: Serialize + ?Sized,
    {
        Err(Present)
    }
}

#[cfg(test)]
mod tests {
    use super::is_absent;
    use crate::primitives::{ObjectPath, Tuple};
    use serde::{Serialize, Serializer};
    use std::cell::Cell;
    use test_log::test;

    // Counts how often it is asked to serialize itself.
    struct Counted<'a>(&'a Cell<usize>);

    impl Serialize for Counted<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.0.set(self.0.get() + 1);
            serializer.serialize_u8(0)
        }
    }

    #[test]
    fn absent_through_wrappers() {
        let none: Option<i32> = None;
        assert!(is_absent(&none));
        assert!(is_absent(&Some(none)));
        assert!(is_absent(&Tuple(none)));
        assert!(!is_absent(&Some(5)));
        assert!(!is_absent(&vec![none]));
        assert!(!is_absent(&ObjectPath(String::new())));
        assert!(!is_absent(&()));
        assert!(!is_absent(&5i128));
    }

    #[test]
    fn elements_are_not_visited() {
        let visits = Cell::new(0);
        let items: Vec<_> = (0..1000).map(|_| Counted(&visits)).collect();
        assert!(!is_absent(&items));
        assert!(!is_absent(&Some(&items)));
        assert_eq!(visits.get(), 0);
    }
}
