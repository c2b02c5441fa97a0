pub mod types;
pub mod settings;
pub mod errors;
pub mod events;
#[cfg(feature = "desktop")]
pub mod emit;

// Re-export CommandError for convenience
pub use errors::{CommandError, CommandResult};
