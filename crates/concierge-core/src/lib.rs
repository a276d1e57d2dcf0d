pub mod config;
pub mod error;
pub mod records;
pub mod types;

pub use config::ConciergeConfig;
pub use error::{ConciergeError, Result};
pub use records::*;
pub use types::*;
