pub mod body;
pub mod config;
pub mod error;
pub mod infra;
pub mod model;
pub mod resource;
pub mod services;
pub mod state;
pub mod transport;

pub use error::{Error, Result};
