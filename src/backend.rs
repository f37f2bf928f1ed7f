//! Backend REST boundary: validated endpoint descriptor and typed endpoint calls.

pub mod client;
pub mod descriptor;

pub use client::*;
pub use descriptor::*;
