use std::borrow::Cow;
use std::fmt;

/// Implemented by the Rust side of an interface that remote objects
/// expose, to name it.
pub trait RemoteInterface {
    const INTERFACE: &'static str;
}

/// Names the capability set (methods, properties, signals) a remote object
/// is accessed through.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceDescriptor {
    name: Cow<'static, str>,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn of<I: RemoteInterface + ?Sized>() -> Self {
        Self::new(I::INTERFACE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity of a proxy: which service, which object, seen through which
/// interface.
///
/// Nothing is validated here; bus and path naming rules belong to the
/// connection. Two identities are equal when service, object path and
/// interface all are, compared in that order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteObject {
    service: String,
    object_path: String,
    interface: InterfaceDescriptor,
}

impl RemoteObject {
    pub fn new(
        service: impl Into<String>,
        object_path: impl Into<String>,
        interface: InterfaceDescriptor,
    ) -> Self {
        Self {
            service: service.into(),
            object_path: object_path.into(),
            interface,
        }
    }

    /// Shorthand for an interface known at compile time.
    pub fn of<I: RemoteInterface + ?Sized>(
        service: impl Into<String>,
        object_path: impl Into<String>,
    ) -> Self {
        Self::new(service, object_path, InterfaceDescriptor::of::<I>())
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.interface
    }
}

impl fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.service, self.object_path, self.interface)
    }
}

#[cfg(test)]
mod tests {
    use super::{InterfaceDescriptor, RemoteInterface, RemoteObject};
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};
    use test_log::test;

    struct Foo;

    impl RemoteInterface for Foo {
        const INTERFACE: &'static str = "com.example.Foo";
    }

    struct Bar;

    impl RemoteInterface for Bar {
        const INTERFACE: &'static str = "com.example.Bar";
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn foo() -> RemoteObject {
        RemoteObject::of::<Foo>("com.example.Foo", "/com/example/Foo")
    }

    #[test]
    fn identical_triples_are_equal() {
        let a = foo();
        let b = RemoteObject::new(
            "com.example.Foo".to_owned(),
            "/com/example/Foo".to_owned(),
            InterfaceDescriptor::new("com.example.Foo".to_owned()),
        );
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn any_field_breaks_equality() {
        let a = foo();
        assert_ne!(
            a,
            RemoteObject::of::<Foo>("com.example.Other", "/com/example/Foo")
        );
        assert_ne!(
            a,
            RemoteObject::of::<Foo>("com.example.Foo", "/com/example/Other")
        );
        assert_ne!(
            a,
            RemoteObject::of::<Bar>("com.example.Foo", "/com/example/Foo")
        );
    }

    #[test]
    fn deduplicates_as_key() {
        let mut set = HashSet::new();
        assert!(set.insert(foo()));
        assert!(!set.insert(foo()));
        assert!(set.insert(RemoteObject::of::<Bar>(":1.42", "/")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn stores_fields_verbatim() {
        let unchecked = RemoteObject::new("", "not/a/path", InterfaceDescriptor::new(""));
        assert_eq!(unchecked.service(), "");
        assert_eq!(unchecked.object_path(), "not/a/path");
        assert_eq!(unchecked.interface().name(), "");

        assert_eq!(
            foo().to_string(),
            "com.example.Foo:/com/example/Foo (com.example.Foo)"
        );
    }
}
