pub mod activity;
pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod io;
pub mod log_store;
pub mod paths;
pub mod project;
pub mod selection;
pub mod store;
pub mod timestamp;
pub mod types;

pub use error::{Result, SdlcaiError};
