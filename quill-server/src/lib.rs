//! quill-server: axum front end for the Quill blog service.

pub mod app;
mod error;
pub mod rest;

pub use app::{build, config_from_env, QuillApp};
pub use error::ApiError;
