// Attribute module
// Registry of derived quantities driving inspection tables and classifier features

pub mod builtin;
pub mod registry;

pub use builtin::register_builtin;
pub use registry::{
    AttributeEntry, AttributeError, AttributeRegistry, AttributeResult, AttributeValue,
    ComputeFn, Entity, EntityKind, RegistryError,
};
