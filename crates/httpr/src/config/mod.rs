//! Configuration loading

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{HttprConfig, NetworkConfig, RetryConfig};
