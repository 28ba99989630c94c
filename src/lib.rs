pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod server;
pub mod worker;

pub use error::{Error, Result};
