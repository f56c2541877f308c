//! Admission validators for networking resources.

pub mod route;

pub use route::{CFRouteValidator, ROUTE_ENTITY_TYPE, UniqueRoute, unique_route_name};
