//! Inference of a [`Type`] from a value, through its `serde::Serialize`
//! implementation.
//!
//! This stands in for asking a value for its runtime class. The shape a
//! value serializes as decides its wire type:
//!
//! * integers, booleans, floats and strings map onto the matching basic
//!   type, with `i8` widened to `n`, `f32` to `d` and `char` sent as `u`;
//! * sequences whose elements all infer to the same type become `a` of that
//!   type, anything else (including an empty sequence) becomes `av`;
//! * maps need keys of one basic type and become `a{..}`, with `v` values
//!   when the value types differ; an empty map is `a{sv}`;
//! * tuples are structs, named structs follow the [`InferencePolicy`];
//! * unit enum variants are their index, `u`, other variants are `a{sv}`
//!   keyed by the variant name;
//! * [`ObjectPath`], [`Signature`], [`UnixFd`], [`Variant`] and [`Tuple`]
//!   are recognised by name.
//!
//! [`ObjectPath`]: crate::primitives::ObjectPath
//! [`Signature`]: crate::primitives::Signature
//! [`UnixFd`]: crate::primitives::UnixFd
//! [`Variant`]: crate::variant::Variant
//! [`Tuple`]: crate::primitives::Tuple

use crate::error::{Error, Result, SERIALIZED_VALUE};
use crate::primitives::{
    OBJECT_PATH_NAME, SIGNATURE_NAME, TUPLE_NAME, UNIX_FD_NAME, VARIANT_NAME,
};
use crate::types::Type;

use log::trace;
use serde::{ser, Serialize};
use std::any;

mod absence;
pub mod policy;

pub(crate) use absence::is_absent;
use policy::{InferencePolicy, StructStyle};

/// Infers the type of `value`. A top level `None` is
/// [`Error::NullValue`].
pub(crate) fn infer_type<T, P>(value: &T, policy: &P) -> Result<Type>
where
    T: Serialize + ?Sized,
    P: InferencePolicy,
{
    let inferred = value.serialize(TypeInferrer { policy }).map_err(|err| match err {
        Error::UnsupportedType { ty, reason } if ty == SERIALIZED_VALUE => Error::UnsupportedType {
            ty: any::type_name::<T>().to_owned(),
            reason,
        },
        other => other,
    })?;
    match inferred {
        Some(ty) => {
            trace!("inferred {}", ty);
            Ok(ty)
        }
        None => Err(Error::NullValue),
    }
}

// `None` in the Ok position means the value was absent.
type Inferred = Option<Type>;

// Containers only hold complete single types.
fn nested(ty: Inferred, container: &str) -> Result<Type> {
    match ty {
        Some(Type::Tuple(items)) => Err(Error::unsupported(
            Type::Tuple(items),
            format!("multiple values cannot be nested in {}", container),
        )),
        Some(ty) => Ok(ty),
        None => Err(Error::unsupported(
            "Option::None",
            format!("an absent value cannot be nested in {}", container),
        )),
    }
}

fn property_dict() -> Type {
    Type::dict(Type::String, Type::Variant)
}

struct TypeInferrer<'a, P> {
    policy: &'a P,
}

impl<'a, P> Clone for TypeInferrer<'a, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, P> Copy for TypeInferrer<'a, P> {}

impl<'a, P: InferencePolicy> ser::Serializer for TypeInferrer<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    type SerializeSeq = InferSeq<'a, P>;
    type SerializeTuple = InferTuple<'a, P>;
    type SerializeTupleStruct = InferTuple<'a, P>;
    type SerializeTupleVariant = InferTuple<'a, P>;
    type SerializeMap = InferMap<'a, P>;
    type SerializeStruct = InferStruct<'a, P>;
    type SerializeStructVariant = InferStruct<'a, P>;

    fn serialize_bool(self, _: bool) -> Result<Inferred> {
        Ok(Some(Type::Boolean))
    }

    fn serialize_i8(self, _: i8) -> Result<Inferred> {
        Ok(Some(Type::Int16))
    }

    fn serialize_i16(self, _: i16) -> Result<Inferred> {
        Ok(Some(Type::Int16))
    }

    fn serialize_i32(self, _: i32) -> Result<Inferred> {
        Ok(Some(Type::Int32))
    }

    fn serialize_i64(self, _: i64) -> Result<Inferred> {
        Ok(Some(Type::Int64))
    }

    fn serialize_u8(self, _: u8) -> Result<Inferred> {
        Ok(Some(Type::Byte))
    }

    fn serialize_u16(self, _: u16) -> Result<Inferred> {
        Ok(Some(Type::UInt16))
    }

    fn serialize_u32(self, _: u32) -> Result<Inferred> {
        Ok(Some(Type::UInt32))
    }

    fn serialize_u64(self, _: u64) -> Result<Inferred> {
        Ok(Some(Type::UInt64))
    }

    fn serialize_f32(self, _: f32) -> Result<Inferred> {
        Ok(Some(Type::Double))
    }

    fn serialize_f64(self, _: f64) -> Result<Inferred> {
        Ok(Some(Type::Double))
    }

    fn serialize_char(self, _: char) -> Result<Inferred> {
        Ok(Some(Type::UInt32))
    }

    fn serialize_str(self, _: &str) -> Result<Inferred> {
        Ok(Some(Type::String))
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<Inferred> {
        Ok(Some(Type::array(Type::Byte)))
    }

    fn serialize_none(self) -> Result<Inferred> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Inferred>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Inferred> {
        Ok(Some(Type::Tuple(Vec::new())))
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Inferred> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        variant_index: u32,
        _: &'static str,
    ) -> Result<Inferred> {
        variant_index.serialize(self)
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Inferred>
    where
        T: Serialize + ?Sized,
    {
        match name {
            OBJECT_PATH_NAME => Ok(Some(Type::ObjectPath)),
            SIGNATURE_NAME => Ok(Some(Type::Signature)),
            UNIX_FD_NAME => Ok(Some(Type::UnixFd)),
            VARIANT_NAME => Ok(Some(Type::Variant)),
            TUPLE_NAME => Ok(match value.serialize(self)? {
                Some(Type::Struct(items)) | Some(Type::Tuple(items)) => Some(Type::Tuple(items)),
                Some(single) => Some(Type::Tuple(vec![single])),
                None => None,
            }),
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Inferred>
    where
        T: Serialize + ?Sized,
    {
        let ty = value.serialize(self)?;
        trace!("variant {} holds {:?}", variant, ty);
        nested(ty, "a variant")?;
        Ok(Some(property_dict()))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(InferSeq {
            inferrer: self,
            item: None,
            mixed: false,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        Ok(InferTuple {
            inferrer: self,
            fields: Vec::with_capacity(len),
            as_dict: false,
        })
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(InferTuple {
            inferrer: self,
            fields: Vec::with_capacity(len),
            as_dict: true,
        })
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(InferMap {
            inferrer: self,
            key: None,
            value: None,
            mixed: false,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        let fields = match self.policy.query_struct_name(name) {
            StructStyle::Dict => None,
            StructStyle::StronglyTyped => Some(Vec::with_capacity(len)),
        };
        Ok(InferStruct {
            inferrer: self,
            fields,
        })
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(InferStruct {
            inferrer: self,
            fields: None,
        })
    }
}

struct InferSeq<'a, P> {
    inferrer: TypeInferrer<'a, P>,
    item: Option<Type>,
    mixed: bool,
}

impl<'a, P: InferencePolicy> ser::SerializeSeq for InferSeq<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let ty = nested(value.serialize(self.inferrer)?, "an array")?;
        match &self.item {
            None => self.item = Some(ty),
            Some(item) if *item != ty => self.mixed = true,
            Some(_) => (),
        }
        Ok(())
    }

    fn end(self) -> Result<Inferred> {
        let item = match self.item {
            Some(item) if !self.mixed => item,
            _ => Type::Variant,
        };
        Ok(Some(Type::array(item)))
    }
}

struct InferTuple<'a, P> {
    inferrer: TypeInferrer<'a, P>,
    fields: Vec<Type>,
    // Tuple enum variants are sent keyed by their name.
    as_dict: bool,
}

impl<'a, P: InferencePolicy> InferTuple<'a, P> {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let ty = nested(value.serialize(self.inferrer)?, "a struct")?;
        self.fields.push(ty);
        Ok(())
    }

    fn finish(self) -> Result<Inferred> {
        if self.as_dict {
            Ok(Some(property_dict()))
        } else {
            Ok(Some(Type::Struct(self.fields)))
        }
    }
}

impl<'a, P: InferencePolicy> ser::SerializeTuple for InferTuple<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Inferred> {
        self.finish()
    }
}

impl<'a, P: InferencePolicy> ser::SerializeTupleStruct for InferTuple<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Inferred> {
        self.finish()
    }
}

impl<'a, P: InferencePolicy> ser::SerializeTupleVariant for InferTuple<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Inferred> {
        self.finish()
    }
}

struct InferMap<'a, P> {
    inferrer: TypeInferrer<'a, P>,
    key: Option<Type>,
    value: Option<Type>,
    mixed: bool,
}

impl<'a, P: InferencePolicy> ser::SerializeMap for InferMap<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let ty = nested(key.serialize(self.inferrer)?, "a dict key")?;
        if !ty.is_basic() {
            return Err(Error::unsupported(ty, "dict keys must be basic types"));
        }
        match &self.key {
            None => self.key = Some(ty),
            Some(key) if *key != ty => {
                return Err(Error::unsupported(
                    ty,
                    format!("dict keys mix {} with another type", key),
                ));
            }
            Some(_) => (),
        }
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let ty = nested(value.serialize(self.inferrer)?, "a dict value")?;
        match &self.value {
            None => self.value = Some(ty),
            Some(value) if *value != ty => self.mixed = true,
            Some(_) => (),
        }
        Ok(())
    }

    fn end(self) -> Result<Inferred> {
        let ty = match (self.key, self.value) {
            (Some(key), Some(value)) if !self.mixed => Type::dict(key, value),
            (Some(key), _) => Type::dict(key, Type::Variant),
            (None, _) => property_dict(),
        };
        Ok(Some(ty))
    }
}

struct InferStruct<'a, P> {
    inferrer: TypeInferrer<'a, P>,
    // `None` while inferring a property dict.
    fields: Option<Vec<Type>>,
}

impl<'a, P: InferencePolicy> InferStruct<'a, P> {
    fn push<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let ty = value.serialize(self.inferrer)?;
        match &mut self.fields {
            Some(fields) => fields.push(nested(ty, "a struct")?),
            None => match ty {
                None => trace!("skipping absent property {}", name),
                Some(Type::Tuple(ref items)) if items.is_empty() => {
                    trace!("skipping empty property {}", name)
                }
                ty => {
                    nested(ty, "a property dict")?;
                }
            },
        }
        Ok(())
    }

    fn finish(self) -> Result<Inferred> {
        match self.fields {
            Some(fields) => Ok(Some(Type::Struct(fields))),
            None => Ok(Some(property_dict())),
        }
    }
}

impl<'a, P: InferencePolicy> ser::SerializeStruct for InferStruct<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_field<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(name, value)
    }

    fn end(self) -> Result<Inferred> {
        self.finish()
    }
}

impl<'a, P: InferencePolicy> ser::SerializeStructVariant for InferStruct<'a, P> {
    type Ok = Inferred;
    type Error = Error;

    fn serialize_field<T>(&mut self, name: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(name, value)
    }

    fn end(self) -> Result<Inferred> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::policy::{DictPolicy, NamedStructPolicy, StructPolicy};
    use super::{infer_type, is_absent};
    use crate::error::{Error, Result};
    use crate::primitives::{ObjectPath, Signature, Tuple, UnixFd};
    use crate::types::Type;
    use serde::Serialize;
    use std::collections::BTreeMap;
    use test_log::test;

    #[derive(Clone, Debug, Serialize)]
    struct Point {
        x: i32,
        y: i32,
        label: Option<String>,
    }

    #[test]
    fn infer_basic() -> Result<()> {
        assert_eq!(infer_type(&true, &DictPolicy)?, Type::Boolean);
        assert_eq!(infer_type(&3u8, &DictPolicy)?, Type::Byte);
        assert_eq!(infer_type(&-3i8, &DictPolicy)?, Type::Int16);
        assert_eq!(infer_type(&3u64, &DictPolicy)?, Type::UInt64);
        assert_eq!(infer_type(&0.5f32, &DictPolicy)?, Type::Double);
        assert_eq!(infer_type(&'x', &DictPolicy)?, Type::UInt32);
        assert_eq!(infer_type("hello", &DictPolicy)?, Type::String);
        assert_eq!(infer_type(&"hello".to_owned(), &DictPolicy)?, Type::String);
        Ok(())
    }

    #[test]
    fn infer_markers() -> Result<()> {
        let path = ObjectPath("/com/example/Foo".to_owned());
        assert_eq!(infer_type(&path, &DictPolicy)?, Type::ObjectPath);
        let sig = Signature::new("a{sv}")?;
        assert_eq!(infer_type(&sig, &DictPolicy)?, Type::Signature);
        assert_eq!(infer_type(&UnixFd(0), &DictPolicy)?, Type::UnixFd);
        assert_eq!(
            infer_type(&Tuple((1i32, "two")), &DictPolicy)?,
            Type::Tuple(vec![Type::Int32, Type::String])
        );
        assert_eq!(
            infer_type(&Tuple(7u16), &DictPolicy)?,
            Type::Tuple(vec![Type::UInt16])
        );
        Ok(())
    }

    #[test]
    fn infer_sequences() -> Result<()> {
        assert_eq!(
            infer_type(&vec![1, 3, 5, 6], &DictPolicy)?,
            Type::array(Type::Int32)
        );
        let empty: Vec<i32> = Vec::new();
        assert_eq!(infer_type(&empty, &DictPolicy)?, Type::array(Type::Variant));
        assert_eq!(
            infer_type(&vec![vec!["a"], vec!["b", "c"]], &DictPolicy)?,
            Type::array(Type::array(Type::String))
        );
        assert_eq!(
            infer_type(&vec![vec!["a"], vec![]], &DictPolicy)?,
            Type::array(Type::Variant)
        );
        Ok(())
    }

    #[test]
    fn infer_tuples_as_structs() -> Result<()> {
        let data = ("Hi", 0.2f64, ("Hello", 8.3f64));
        assert_eq!(
            infer_type(&data, &DictPolicy)?,
            Type::Struct(vec![
                Type::String,
                Type::Double,
                Type::Struct(vec![Type::String, Type::Double]),
            ])
        );
        Ok(())
    }

    #[test]
    fn infer_maps() -> Result<()> {
        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), 1u32);
        map.insert("b".to_owned(), 2u32);
        assert_eq!(
            infer_type(&map, &DictPolicy)?,
            Type::dict(Type::String, Type::UInt32)
        );

        let empty: BTreeMap<u8, u8> = BTreeMap::new();
        assert_eq!(
            infer_type(&empty, &DictPolicy)?,
            Type::dict(Type::String, Type::Variant)
        );

        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1u8);
        assert!(matches!(
            infer_type(&bad, &DictPolicy),
            Err(Error::UnsupportedType { .. })
        ));
        Ok(())
    }

    #[test]
    fn infer_structs_by_policy() -> Result<()> {
        let point = Point {
            x: 1,
            y: 2,
            label: None,
        };
        assert_eq!(
            infer_type(&point, &DictPolicy)?,
            Type::dict(Type::String, Type::Variant)
        );
        assert!(matches!(
            infer_type(&point, &StructPolicy),
            Err(Error::UnsupportedType { .. })
        ));

        let labelled = Point {
            label: Some("origin".to_owned()),
            ..point
        };
        assert_eq!(
            infer_type(&labelled, &StructPolicy)?,
            Type::Struct(vec![Type::Int32, Type::Int32, Type::String])
        );

        let policy = NamedStructPolicy::new().strongly_typed("Point");
        assert_eq!(
            infer_type(&labelled, &policy)?,
            Type::Struct(vec![Type::Int32, Type::Int32, Type::String])
        );
        Ok(())
    }

    #[test]
    fn infer_enums() -> Result<()> {
        #[derive(Serialize)]
        enum Shape {
            Empty,
            Circle(f64),
            Rect(f64, f64),
            Named { name: String },
        }

        assert_eq!(infer_type(&Shape::Empty, &DictPolicy)?, Type::UInt32);
        for shape in &[
            Shape::Circle(1.0),
            Shape::Rect(1.0, 2.0),
            Shape::Named {
                name: "n".to_owned(),
            },
        ] {
            assert_eq!(
                infer_type(shape, &DictPolicy)?,
                Type::dict(Type::String, Type::Variant)
            );
        }
        Ok(())
    }

    #[test]
    fn absent_values() {
        let none: Option<i32> = None;
        assert_eq!(infer_type(&none, &DictPolicy), Err(Error::NullValue));
        assert!(is_absent(&none));
        assert!(is_absent(&Some(none)));
        assert!(!is_absent(&Some(5)));
        assert!(!is_absent(&vec![none]));
        assert!(matches!(
            infer_type(&vec![none], &DictPolicy),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn unsupported_primitive_names_its_type() {
        assert_eq!(
            infer_type(&5i128, &DictPolicy),
            Err(Error::UnsupportedType {
                ty: "i128".to_owned(),
                reason: "i128 is not supported".to_owned(),
            })
        );
        match infer_type(&vec![1u128], &DictPolicy) {
            Err(Error::UnsupportedType { ty, .. }) => assert!(ty.contains("Vec<u128>"), "{}", ty),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unit_is_no_values() -> Result<()> {
        assert_eq!(infer_type(&(), &DictPolicy)?, Type::Tuple(vec![]));
        assert!(matches!(
            infer_type(&vec![(), ()], &DictPolicy),
            Err(Error::UnsupportedType { .. })
        ));
        Ok(())
    }
}
