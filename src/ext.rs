//! Optional extension contracts implemented outside the broker core.

pub mod credential_refresh;

pub use credential_refresh::*;
