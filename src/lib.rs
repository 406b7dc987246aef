pub mod config;
pub mod error;
pub mod report;
pub mod scratch;
pub mod server;
pub mod vision;

pub use error::{Error, Result};
