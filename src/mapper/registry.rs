use crate::error::{Error, Result};
use crate::primitives::DBusType;
use crate::types::Type;

use log::{debug, warn};
use std::collections::HashMap;

/// Named types, frozen once built.
///
/// Names inside registered types are expanded when the registry is built,
/// so a lookup always yields a type made only of wire types. There is no
/// way to add to a built registry; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Type>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    types: HashMap<String, Type>,
}

impl TypeRegistryBuilder {
    /// Registers `ty` under `name`. Registering a name twice keeps the
    /// later type.
    pub fn register(mut self, name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        if let Some(old) = self.types.insert(name.clone(), ty) {
            warn!("type {} registered twice, replacing {}", name, old);
        }
        self
    }

    pub fn register_type<T: DBusType + ?Sized>(self, name: impl Into<String>) -> Self {
        self.register(name, T::dbus_type())
    }

    /// Expands every name and freezes the result. Fails on references to
    /// names that were never registered and on recursive definitions.
    pub fn build(self) -> Result<TypeRegistry> {
        let mut types = HashMap::with_capacity(self.types.len());
        for (name, ty) in &self.types {
            let mut stack = vec![name.as_str()];
            let expanded = self.expand(ty, &mut stack).map_err(|err| {
                debug!("cannot register type {}: {}", name, err);
                err
            })?;
            types.insert(name.clone(), expanded);
        }
        Ok(TypeRegistry { types })
    }

    fn expand<'b>(&'b self, ty: &'b Type, stack: &mut Vec<&'b str>) -> Result<Type> {
        let expanded = match ty {
            Type::Named(name) => {
                if stack.contains(&name.as_str()) {
                    return Err(Error::unsupported(name, "recursive type definition"));
                }
                let definition = self
                    .types
                    .get(name)
                    .ok_or_else(|| Error::unsupported(name, "no signature mapping registered"))?;
                stack.push(name);
                let expanded = self.expand(definition, stack);
                stack.pop();
                expanded?
            }
            Type::Array(item) => Type::array(self.expand(item, stack)?),
            Type::Dict(key, value) => {
                Type::dict(self.expand(key, stack)?, self.expand(value, stack)?)
            }
            Type::Struct(fields) => Type::Struct(self.expand_all(fields, stack)?),
            Type::Tuple(items) => Type::Tuple(self.expand_all(items, stack)?),
            other => other.clone(),
        };
        Ok(expanded)
    }

    fn expand_all<'b>(&'b self, types: &'b [Type], stack: &mut Vec<&'b str>) -> Result<Vec<Type>> {
        types.iter().map(|ty| self.expand(ty, stack)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRegistry;
    use crate::error::{Error, Result};
    use crate::types::Type;
    use test_log::test;

    #[test]
    fn expands_nested_names() -> Result<()> {
        let registry = TypeRegistry::builder()
            .register_type::<(i32, i32)>("Point")
            .register(
                "Polygon",
                Type::Struct(vec![Type::String, Type::array(Type::named("Point"))]),
            )
            .build()?;

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("Polygon"),
            Some(&Type::Struct(vec![
                Type::String,
                Type::array(Type::Struct(vec![Type::Int32, Type::Int32])),
            ]))
        );
        assert!(registry.get("Line").is_none());
        Ok(())
    }

    #[test]
    fn rejects_unknown_reference() {
        let result = TypeRegistry::builder()
            .register("Polygon", Type::array(Type::named("Point")))
            .build();
        match result {
            Err(Error::UnsupportedType { ty, .. }) => assert_eq!(ty, "Point"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_recursion() {
        let result = TypeRegistry::builder()
            .register("Tree", Type::array(Type::named("Node")))
            .register("Node", Type::Struct(vec![Type::String, Type::named("Tree")]))
            .build();
        assert!(matches!(result, Err(Error::UnsupportedType { .. })));
    }

    #[test]
    fn later_registration_wins() -> Result<()> {
        let registry = TypeRegistry::builder()
            .register("Id", Type::UInt32)
            .register("Id", Type::UInt64)
            .build()?;
        assert_eq!(registry.get("Id"), Some(&Type::UInt64));
        Ok(())
    }
}
