//! Interface definitions on the request side, their validation, and engine settings.

pub mod resolved;
pub mod settings;
pub mod types;
pub mod validator;

pub use resolved::*;
pub use settings::*;
pub use types::*;
pub use validator::*;
