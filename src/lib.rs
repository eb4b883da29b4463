// Public modules
pub mod audio;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod request_logger;
pub mod types;
pub mod utils;

// Re-exports
pub use audio::{AnnouncePlayer, AudioPlayer, CommandPlayer};
pub use client::{Backend, BaseUrl, HttpBackend, resolve_audio_url};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use request_logger::{RequestLogger, TracingLogger};
pub use types::*;
