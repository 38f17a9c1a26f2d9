//! YouTube Upload Service
//!
//! Web front end for uploading videos to the signed-in user's YouTube
//! channel: Google OAuth login, server-side sessions, multipart upload,
//! ffprobe-based Shorts detection and a resumable transfer to YouTube.

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;

// Public re-exports
pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, Result};
