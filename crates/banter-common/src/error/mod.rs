//! Unified error handling for the client library

mod app_error;

pub use app_error::{AppError, AppResult};
