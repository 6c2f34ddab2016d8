// Declarative profiles for Verity

pub mod document;
pub mod error;
pub mod loader;

pub use document::ProfileDocument;
pub use error::{ConfigError, Result};
pub use loader::{FileFormat, PROFILE_ENV, ProfileLoader};
