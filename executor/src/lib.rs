pub mod cli;
pub mod core;
pub mod error;
pub mod server;
pub mod service;
pub mod setup;
pub mod types;
pub mod utils;
pub mod worker;


// Re-export commonly used item
pub use error::{ExecutorError, ExecutorResult};
