//! Admission validators for service instances and bindings.

pub mod binding;
pub mod instance;

pub use binding::{CFServiceBindingValidator, SERVICE_BINDING_ENTITY_TYPE};
pub use instance::{CFServiceInstanceValidator, SERVICE_INSTANCE_ENTITY_TYPE};
