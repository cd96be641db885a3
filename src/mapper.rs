//! The Type-Signature Mapper: native type descriptors in, signatures out,
//! and back again.
//!
//! ```
//! use dbus_types::{Mapper, Type};
//!
//! let mapper = Mapper::new();
//! let ty = Type::array(Type::Struct(vec![Type::String, Type::Int32]));
//! let sigs = mapper.signature_of(&ty, false)?;
//! assert_eq!(sigs[0], "a(si)");
//! assert_eq!(mapper.types_of("a(si)", None)?, vec![ty]);
//! # Ok::<_, dbus_types::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::infer::infer_type;
use crate::infer::policy::{DictPolicy, InferencePolicy};
use crate::primitives::Signature;
use crate::signature::{parse_types, MAX_SIGNATURE_LEN};
use crate::types::Type;

use serde::Serialize;
use std::slice;
use std::sync::{Arc, OnceLock};

mod registry;
pub use registry::{TypeRegistry, TypeRegistryBuilder};

/// Translates between [`Type`]s and signatures.
///
/// A mapper only reads its registry, so one can be shared freely between
/// threads.
#[derive(Clone, Debug)]
pub struct Mapper<P = DictPolicy> {
    registry: Arc<TypeRegistry>,
    policy: P,
}

impl Mapper<DictPolicy> {
    /// A mapper with no named types that infers named structs as `a{sv}`.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(TypeRegistry::default()))
    }

    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Mapper {
            registry,
            policy: DictPolicy,
        }
    }
}

impl Default for Mapper<DictPolicy> {
    fn default() -> Self {
        Self::new()
    }
}

/// The mapper behind [`Variant::new`] and friends, built on first use.
///
/// [`Variant::new`]: crate::variant::Variant::new
pub(crate) fn default_mapper() -> &'static Mapper {
    static DEFAULT: OnceLock<Mapper> = OnceLock::new();
    DEFAULT.get_or_init(Mapper::new)
}

impl<P: InferencePolicy> Mapper<P> {
    pub fn with_policy<Q: InferencePolicy>(self, policy: Q) -> Mapper<Q> {
        Mapper {
            registry: self.registry,
            policy,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The signature of `ty`, one entry per complete type.
    ///
    /// Only a [`Type::Tuple`] yields anything other than exactly one entry.
    /// Unless `allow_multiple` is set that is a
    /// [`Error::MultiplicityViolation`].
    pub fn signature_of(&self, ty: &Type, allow_multiple: bool) -> Result<Vec<Signature>> {
        let members = match self.resolve(ty)? {
            Type::Tuple(items) => items.as_slice(),
            single => slice::from_ref(single),
        };
        if !allow_multiple && members.len() != 1 {
            return Err(Error::MultiplicityViolation {
                subject: ty.to_string(),
                found: members.len(),
            });
        }
        members.iter().map(|member| self.single_signature(member)).collect()
    }

    /// Parses `signature` into complete types, stopping after `limit` of
    /// them. `None` parses everything.
    ///
    /// A limited parse does not look past the last type it returns, so
    /// `types_of("i)", Some(1))` yields `[Int32]`. Pass `None` to validate
    /// a whole signature.
    pub fn types_of(&self, signature: &str, limit: Option<usize>) -> Result<Vec<Type>> {
        parse_types(signature, limit)
    }

    /// The type of `value`, inferred from how it serializes.
    pub fn infer<T: Serialize + ?Sized>(&self, value: &T) -> Result<Type> {
        infer_type(value, &self.policy)
    }

    fn resolve<'t>(&'t self, ty: &'t Type) -> Result<&'t Type> {
        match ty {
            Type::Named(name) => self
                .registry
                .get(name)
                .ok_or_else(|| Error::unsupported(name, "no signature mapping registered")),
            other => Ok(other),
        }
    }

    fn single_signature(&self, ty: &Type) -> Result<Signature> {
        let mut sig = String::new();
        self.render(ty, &mut sig).map_err(|err| match err {
            Error::UnsupportedType { ty: member, reason } if member != ty.to_string() => {
                Error::unsupported(ty, format_args!("{}: {}", member, reason))
            }
            other => other,
        })?;

        // The wire limits are easiest checked on the finished string.
        match parse_types(&sig, None) {
            Ok(_) => Ok(Signature::from_validated(sig)),
            Err(Error::MalformedSignature { cause, .. }) => Err(Error::unsupported(ty, cause)),
            Err(err) => Err(err),
        }
    }

    fn render(&self, ty: &Type, out: &mut String) -> Result<()> {
        // Every level adds at least one byte, which bounds the recursion.
        if out.len() > MAX_SIGNATURE_LEN {
            return Err(Error::unsupported(
                ty,
                format!("signature is longer than {} bytes", MAX_SIGNATURE_LEN),
            ));
        }

        match ty {
            Type::Array(item) => {
                out.push('a');
                self.render(item, out)
            }
            Type::Struct(fields) => {
                out.push('(');
                for field in fields {
                    self.render(field, out)?;
                }
                out.push(')');
                Ok(())
            }
            Type::Dict(key, value) => {
                out.push_str("a{");
                self.render(key, out)?;
                self.render(value, out)?;
                out.push('}');
                Ok(())
            }
            Type::Variant => {
                out.push('v');
                Ok(())
            }
            Type::Tuple(_) => Err(Error::unsupported(
                ty,
                "multiple values cannot be nested in another type",
            )),
            Type::Named(_) => {
                let resolved = self.resolve(ty)?;
                self.render(resolved, out)
            }
            basic => match basic.basic_code() {
                Some(code) => {
                    out.push(char::from(code));
                    Ok(())
                }
                None => Err(Error::unsupported(basic, "no signature code")),
            },
        }
    }
}
