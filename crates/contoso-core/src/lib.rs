pub mod config;
pub mod error;
pub mod types;

pub use config::ContosoConfig;
pub use error::{ContosoError, Result};
pub use types::*;
