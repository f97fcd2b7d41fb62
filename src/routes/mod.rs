//! Route tables.

pub mod common;
pub mod interfaces;

pub use common::common_routes_with_ready;
pub use interfaces::{execute_routes, interface_routes, router};
