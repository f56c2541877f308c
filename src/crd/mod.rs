//! Custom Resource Definitions for the CF resource model.
//!
//! - Workloads: `CFOrg`, `CFSpace`, `CFApp`, `CFPackage`, `CFTask`
//! - Networking: `CFDomain`, `CFRoute`
//! - Services: `CFServiceInstance`, `CFServiceBinding`

mod common;
mod networking;
mod services;
mod workloads;

pub use common::*;
pub use networking::*;
pub use services::*;
pub use workloads::*;
