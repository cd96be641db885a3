use crate::error::{Error, Result};
use crate::infer::is_absent;
use crate::infer::policy::InferencePolicy;
use crate::mapper::{default_mapper, Mapper};
use crate::primitives::{DBusType, Signature, VARIANT_NAME};
use crate::types::Type;

use log::debug;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value together with the single complete type it is sent as.
///
/// There are three ways to build one: let the type be inferred from the
/// value ([`Variant::new`]), name the type ([`Variant::with_type`],
/// [`Variant::of`]), or give the signature ([`Variant::with_signature`]).
/// All of them fail if the value is absent (`None`) or if the type does not
/// come to exactly one complete type.
///
/// Equality and hashing look at the value only.
///
/// ```
/// use dbus_types::{Type, Variant};
///
/// let v = Variant::new("hello")?;
/// assert_eq!(v.signature(), "s");
/// assert_eq!(v.ty(), &Type::String);
/// assert_eq!(v.to_string(), "[hello]");
/// # Ok::<_, dbus_types::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Variant<T> {
    value: T,
    ty: Type,
    sig: Signature,
}

impl<T: Serialize> Variant<T> {
    /// Wraps `value` as the type it infers to.
    pub fn new(value: T) -> Result<Self> {
        Self::new_in(default_mapper(), value)
    }

    /// Wraps `value` as `ty`, whatever the value itself would infer to.
    pub fn with_type(value: T, ty: Type) -> Result<Self> {
        Self::with_type_in(default_mapper(), value, ty)
    }

    /// Wraps `value` as the statically known type of `U`.
    pub fn of<U: DBusType + ?Sized>(value: T) -> Result<Self> {
        Self::with_type(value, U::dbus_type())
    }

    /// Wraps `value` as the single complete type `sig` spells out.
    pub fn with_signature(value: T, sig: &str) -> Result<Self> {
        Self::with_signature_in(default_mapper(), value, sig)
    }

    pub fn new_in<P: InferencePolicy>(mapper: &Mapper<P>, value: T) -> Result<Self> {
        let ty = mapper.infer(&value).map_err(|err| {
            debug!("cannot infer a variant type: {}", err);
            err
        })?;
        let sig = single_signature(mapper, &ty)?;
        Ok(Variant { value, ty, sig })
    }

    pub fn with_type_in<P: InferencePolicy>(
        mapper: &Mapper<P>,
        value: T,
        ty: Type,
    ) -> Result<Self> {
        if is_absent(&value) {
            return Err(Error::NullValue);
        }
        let sig = single_signature(mapper, &ty)?;
        Ok(Variant { value, ty, sig })
    }

    pub fn with_signature_in<P: InferencePolicy>(
        mapper: &Mapper<P>,
        value: T,
        sig: &str,
    ) -> Result<Self> {
        if is_absent(&value) {
            return Err(Error::NullValue);
        }
        let mut types = mapper.types_of(sig, None).map_err(|err| {
            debug!("cannot wrap {:?} in a variant: {}", sig, err);
            err
        })?;
        if types.len() != 1 {
            debug!("cannot wrap {:?} in a variant: {} types", sig, types.len());
            return Err(Error::MultiplicityViolation {
                subject: format!("signature {:?}", sig),
                found: types.len(),
            });
        }
        let ty = types.remove(0);
        Ok(Variant {
            value,
            ty,
            sig: Signature::from_validated(sig.to_owned()),
        })
    }
}

fn single_signature<P: InferencePolicy>(mapper: &Mapper<P>, ty: &Type) -> Result<Signature> {
    match mapper.signature_of(ty, false) {
        Ok(mut sigs) => match sigs.pop() {
            Some(sig) => Ok(sig),
            None => Err(Error::MultiplicityViolation {
                subject: ty.to_string(),
                found: 0,
            }),
        },
        Err(err) => {
            debug!("cannot wrap {} in a variant: {}", ty, err);
            Err(err)
        }
    }
}

impl<T> Variant<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for Variant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.value)
    }
}

impl<T: PartialEq<U>, U> PartialEq<Variant<U>> for Variant<T> {
    fn eq(&self, other: &Variant<U>) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Variant<T> {}

impl<T: Hash> Hash for Variant<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> DBusType for Variant<T> {
    fn dbus_type() -> Type {
        Type::Variant
    }
}

impl<T: Serialize> Serialize for Variant<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(VARIANT_NAME, &self.value)
    }
}
