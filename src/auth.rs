//! Auth-domain identifiers, principal and credential models, and role levels.

pub mod credential;
pub mod id;
pub mod principal;
pub mod role;

pub use credential::*;
pub use id::*;
pub use principal::*;
pub use role::*;
