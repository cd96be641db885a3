use std::collections::BTreeSet;

/// How a struct with named fields is inferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructStyle {
    /// `(...)`, one member per field, in declaration order.
    StronglyTyped,
    /// `a{sv}`, field names mapped to variant-wrapped values. Fields that
    /// are `None` are left out.
    Dict,
}

pub trait InferencePolicy {
    fn query_struct_name(&self, name: &str) -> StructStyle;
}

/// Infers every named struct as a property dict, `a{sv}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DictPolicy;

impl InferencePolicy for DictPolicy {
    fn query_struct_name(&self, _: &str) -> StructStyle {
        StructStyle::Dict
    }
}

/// Infers every named struct as a strongly typed struct.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructPolicy;

impl InferencePolicy for StructPolicy {
    fn query_struct_name(&self, _: &str) -> StructStyle {
        StructStyle::StronglyTyped
    }
}

/// Strongly typed for the listed struct names, dict style for the rest.
#[derive(Clone, Debug, Default)]
pub struct NamedStructPolicy {
    strongly_typed: BTreeSet<String>,
}

impl NamedStructPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strongly_typed(mut self, name: impl Into<String>) -> Self {
        self.strongly_typed.insert(name.into());
        self
    }
}

impl InferencePolicy for NamedStructPolicy {
    fn query_struct_name(&self, name: &str) -> StructStyle {
        if self.strongly_typed.contains(name) {
            StructStyle::StronglyTyped
        } else {
            StructStyle::Dict
        }
    }
}
