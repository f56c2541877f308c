//! Admission validators for orgs, spaces, apps, packages and tasks.

pub mod app;
pub mod org;
pub mod package;
pub mod space;
pub mod task;

pub use app::{APP_ENTITY_TYPE, CFAppValidator};
pub use org::{CFOrgValidator, ORG_ENTITY_TYPE, UniqueOrg};
pub use package::CFPackageValidator;
pub use space::{CFSpaceValidator, SPACE_ENTITY_TYPE};
pub use task::{CANCELATION_NOT_POSSIBLE_ERROR, CFTaskValidator};
