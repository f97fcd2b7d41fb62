//! Domain model: interface definitions and parameter descriptors.

mod interface;
mod parameter;

pub use interface::*;
pub use parameter::*;
