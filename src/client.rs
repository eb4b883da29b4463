use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    ASK_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
    TEXT_TO_VOICE_REQUESTS, UPLOAD_REQUESTS, VOICE_TO_TEXT_REQUESTS,
};
use crate::request_logger::RequestLogger;
use crate::types::{
    AskResponse, Endpoint, FormRequest, FormValue, SpeechResponse, TranscriptionResponse,
    UploadResponse,
};

/// Base URL used when nothing else is configured.  Development only.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "NOTECHAT_BASE_URL";

/// The four operations the chat backend offers.
///
/// Each call submits exactly one form and returns the decoded response.
/// Implementations must not retry.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Origin that root-relative paths returned by the backend resolve against.
    fn origin(&self) -> &Url;

    /// Submit a question to `/ask`.
    async fn ask(&self, form: FormRequest) -> Result<AskResponse>;

    /// Submit a notes file to `/upload-notes`.
    async fn upload_notes(&self, form: FormRequest) -> Result<UploadResponse>;

    /// Submit an audio file to `/voice-to-text`.
    async fn voice_to_text(&self, form: FormRequest) -> Result<TranscriptionResponse>;

    /// Submit text to `/text-to-voice`.
    async fn text_to_voice(&self, form: FormRequest) -> Result<SpeechResponse>;
}

/// The origin every endpoint and returned resource path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    origin: Url,
}

impl BaseUrl {
    /// Parse a base URL.  Only the scheme, host and port are kept: endpoint
    /// paths are root-relative.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::validation(
                    format!("unsupported scheme {other:?}; expected http or https"),
                    Some("base_url".to_string()),
                ));
            }
        }
        if url.host_str().is_none() {
            return Err(Error::validation(
                "base URL has no host",
                Some("base_url".to_string()),
            ));
        }
        let origin = url.join("/")?;
        Ok(Self { origin })
    }

    /// Read the base URL from `NOTECHAT_BASE_URL`, if set.
    pub fn from_env() -> Result<Option<Self>> {
        match env::var(BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::parse(value.trim()).map(Some),
            _ => Ok(None),
        }
    }

    /// The origin, always with a `/` path.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL for an endpoint.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        Ok(self.origin.join(endpoint.path())?)
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.origin)
    }
}

/// Resolve an audio path returned by `/text-to-voice` against `origin`.
///
/// The result always lives on `origin`: leading slashes are collapsed so the
/// path cannot be read as a network-path reference, and anything that still
/// escapes the origin is rejected.
pub fn resolve_audio_url(origin: &Url, audio: &str) -> Result<Url> {
    let path = audio.trim().trim_start_matches(['/', '\\']);
    if path.is_empty() {
        return Err(Error::validation(
            "backend returned an empty audio path",
            Some("audio".to_string()),
        ));
    }
    let url = origin.join(&format!("/{path}"))?;
    if url.origin() != origin.origin() {
        return Err(Error::validation(
            format!("audio path {audio:?} does not resolve on {origin}"),
            Some("audio".to_string()),
        ));
    }
    Ok(url)
}

/// Client for the chat backend over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: ReqwestClient,
    base_url: BaseUrl,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn RequestLogger>>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl HttpBackend {
    /// Create a new backend client for the given base URL, without a timeout.
    pub fn new(base_url: BaseUrl) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new backend client with custom settings.
    pub fn with_options(base_url: BaseUrl, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a request logger.
    pub fn with_logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Submit a form and return the raw response body.
    async fn submit(&self, form: FormRequest) -> Result<String> {
        let endpoint = form.endpoint();
        if let Some(logger) = &self.logger {
            logger.log_request(&form);
        }
        CLIENT_REQUESTS.click();
        match endpoint {
            Endpoint::Ask => ASK_REQUESTS.click(),
            Endpoint::UploadNotes => UPLOAD_REQUESTS.click(),
            Endpoint::VoiceToText => VOICE_TO_TEXT_REQUESTS.click(),
            Endpoint::TextToVoice => TEXT_TO_VOICE_REQUESTS.click(),
        }

        let start = Instant::now();
        let result = self.submit_inner(form).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        match result {
            Ok(body) => {
                if let Some(logger) = &self.logger {
                    let logged = serde_json::from_str::<Value>(&body)
                        .unwrap_or_else(|_| Value::String(body.clone()));
                    logger.log_response(endpoint, &logged);
                }
                Ok(body)
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                if let Some(logger) = &self.logger {
                    logger.log_error(endpoint, &err);
                }
                Err(err)
            }
        }
    }

    async fn submit_inner(&self, form: FormRequest) -> Result<String> {
        let endpoint = form.endpoint();
        let url = self.base_url.endpoint_url(endpoint)?;
        let multipart = into_multipart(form)?;

        let response = self
            .client
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(process_error_response(endpoint, response).await);
        }

        response.text().await.map_err(|e| {
            Error::http_client(
                format!("Failed to read response from {endpoint}: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn origin(&self) -> &Url {
        self.base_url.origin()
    }

    async fn ask(&self, form: FormRequest) -> Result<AskResponse> {
        let body = self.submit(form).await?;
        decode(Endpoint::Ask, &body)
    }

    async fn upload_notes(&self, form: FormRequest) -> Result<UploadResponse> {
        let body = self.submit(form).await?;
        // The upload confirmation is optional; an empty or non-JSON body
        // still means the upload went through.
        if body.trim().is_empty() {
            return Ok(UploadResponse::default());
        }
        match serde_json::from_str::<UploadResponse>(&body) {
            Ok(resp) => Ok(resp),
            Err(err) => {
                tracing::debug!(%err, "upload response is not a JSON object");
                Ok(UploadResponse::default())
            }
        }
    }

    async fn voice_to_text(&self, form: FormRequest) -> Result<TranscriptionResponse> {
        let body = self.submit(form).await?;
        decode(Endpoint::VoiceToText, &body)
    }

    async fn text_to_voice(&self, form: FormRequest) -> Result<SpeechResponse> {
        let body = self.submit(form).await?;
        decode(Endpoint::TextToVoice, &body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T> {
    serde_json::from_str::<T>(body).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response from {endpoint}: {}", e),
            Some(Box::new(e)),
        )
    })
}

fn into_multipart(form: FormRequest) -> Result<Form> {
    let mut multipart = Form::new();
    for (name, value) in form.into_fields() {
        multipart = match value {
            FormValue::Text(text) => multipart.text(name, text),
            FormValue::File(file) => {
                let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.name);
                if let Some(mime) = &file.mime {
                    part = part.mime_str(mime).map_err(|e| {
                        Error::validation(
                            format!("invalid content type {mime:?}: {}", e),
                            Some(name.clone()),
                        )
                    })?;
                }
                multipart.part(name, part)
            }
        };
    }
    Ok(multipart)
}

/// Process error responses and convert to our Error type
async fn process_error_response(endpoint: Endpoint, response: Response) -> Error {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            );
        }
    };

    error_from_status(endpoint, status, &body, retry_after)
}

/// Map a failed status and its body onto an [`Error`].
///
/// The backend reports failures as `{"detail": "..."}` or, for rejected
/// forms, `{"detail": [{"loc": [...], "msg": "..."}]}`.
fn error_from_status(
    endpoint: Endpoint,
    status: StatusCode,
    body: &str,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        detail: Option<Detail>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Detail {
        Message(String),
        Issues(Vec<Issue>),
    }

    #[derive(Deserialize)]
    struct Issue {
        #[serde(default)]
        loc: Vec<Value>,
        msg: String,
    }

    let (message, field) = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            detail: Some(Detail::Message(message)),
        }) => (message, None),
        Ok(ErrorResponse {
            detail: Some(Detail::Issues(issues)),
        }) if !issues.is_empty() => {
            let field = issues[0]
                .loc
                .last()
                .and_then(|v| v.as_str())
                .map(String::from);
            let message = issues
                .iter()
                .map(|issue| issue.msg.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            (message, field)
        }
        _ => {
            let body = body.trim();
            if body.is_empty() {
                (
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string(),
                    None,
                )
            } else {
                (body.to_string(), None)
            }
        }
    };

    let path = Some(endpoint.path().to_string());
    match status.as_u16() {
        400 | 422 => Error::bad_request(message, field),
        404 => Error::not_found(message, path),
        408 => Error::timeout(message, None),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        code => Error::api(code, message, path),
    }
}
