//! Logging trait for backend requests.
//!
//! This module provides the [`RequestLogger`] trait that allows users to
//! capture every form submission made by an [`HttpBackend`](crate::HttpBackend)
//! along with the decoded response or the error it produced.

use serde_json::Value;

use crate::error::Error;
use crate::types::{Endpoint, FormRequest};

/// A trait for logging backend requests.
///
/// # Example
///
/// ```rust,ignore
/// use notechat::{Endpoint, Error, FormRequest, RequestLogger};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl RequestLogger for FileLogger {
///     fn log_request(&self, form: &FormRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "-> {}", form.summary()).unwrap();
///     }
///
///     fn log_response(&self, endpoint: Endpoint, body: &serde_json::Value) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "<- {endpoint} {body}").unwrap();
///     }
///
///     fn log_error(&self, endpoint: Endpoint, error: &Error) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "!! {endpoint} {error}").unwrap();
///     }
/// }
/// ```
pub trait RequestLogger: Send + Sync {
    /// Log a form just before it is submitted.
    fn log_request(&self, form: &FormRequest);

    /// Log the JSON body of a successful response.
    ///
    /// Called once per request that returned a success status.  Bodies that
    /// are not JSON are passed as a JSON string.
    fn log_response(&self, endpoint: Endpoint, body: &Value);

    /// Log a request that failed before a usable body was received.
    fn log_error(&self, endpoint: Endpoint, error: &Error);
}

/// A [`RequestLogger`] that forwards to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log_request(&self, form: &FormRequest) {
        tracing::debug!(request = %form.summary(), "submitting form");
    }

    fn log_response(&self, endpoint: Endpoint, body: &Value) {
        tracing::debug!(%endpoint, %body, "response received");
    }

    fn log_error(&self, endpoint: Endpoint, error: &Error) {
        tracing::debug!(%endpoint, %error, "request failed");
    }
}
