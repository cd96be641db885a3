//! The type system side of DBus: signatures, variants, and the identity of
//! remote objects.
//!
//! Sending and receiving messages is outside of the scope of this crate.
//! What it provides is the part every marshalling layer leans on:
//!
//! * a [`Mapper`], which turns a native type descriptor, a [`Type`], into
//!   the signature codes of the wire format and parses signatures back into
//!   types. Signatures come from peers, so the parser checks everything
//!   the bus would, down to nesting limits, and reports problems as typed
//!   errors rather than giving up halfway;
//! * [`Variant`], a value wrapped together with the single complete type it
//!   is sent as. The type can be inferred from the value (through its
//!   `serde` [`Serialize`] implementation, which takes the place of runtime
//!   type information), named explicitly, or given as a signature;
//! * [`RemoteObject`], the service/path/interface triple proxies are
//!   keyed by, and a [`ProxyCache`] keyed on it.
//!
//! Types with a compile-time wire type implement [`DBusType`]. Names for
//! user-defined types live in a [`TypeRegistry`], which is built once and
//! then frozen, so lookups from many threads need no locking.
//!
//! All failures are one of the four kinds of [`Error`]: an unsupported
//! type, the wrong number of complete types, a malformed signature, or an
//! absent value.
//!
//! [`Mapper`]: crate::mapper::Mapper
//! [`Type`]: crate::types::Type
//! [`Variant`]: crate::variant::Variant
//! [`Serialize`]: serde::Serialize
//! [`RemoteObject`]: crate::remote_object::RemoteObject
//! [`ProxyCache`]: crate::proxy_cache::ProxyCache
//! [`DBusType`]: crate::primitives::DBusType
//! [`TypeRegistry`]: crate::mapper::TypeRegistry
//! [`Error`]: crate::error::Error

pub mod error;
pub mod infer;
pub mod mapper;
pub mod primitives;
pub mod proxy_cache;
pub mod remote_object;
pub mod signature;
pub mod types;
pub mod variant;

pub use error::{Error, Result, SignatureError};
pub use infer::policy::{
    DictPolicy, InferencePolicy, NamedStructPolicy, StructPolicy, StructStyle,
};
pub use mapper::{Mapper, TypeRegistry, TypeRegistryBuilder};
pub use primitives::{DBusType, ObjectPath, Signature, Tuple, UnixFd};
pub use proxy_cache::ProxyCache;
pub use remote_object::{InterfaceDescriptor, RemoteInterface, RemoteObject};
pub use types::Type;
pub use variant::Variant;
