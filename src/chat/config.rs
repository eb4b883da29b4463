//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`].  Sources are layered:
//! command-line arguments win over `NOTECHAT_BASE_URL`, which wins over the
//! configuration file, which wins over the defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::BaseUrl;
use crate::error::{Error, Result};

/// Which flavor of the chat client to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// No session identifier, send failures surface as errors, and uploads
    /// are confirmed with a fixed message.
    Classic,

    /// Requests carry a session identifier, uploads carry the admin flag,
    /// send failures become a chat message, and upload confirmations come
    /// from the server.
    #[default]
    #[serde(alias = "session-aware")]
    Session,
}

impl Variant {
    /// Returns true for the session-aware variant.
    pub fn is_session_aware(&self) -> bool {
        matches!(self, Variant::Session)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Classic => write!(f, "classic"),
            Variant::Session => write!(f, "session"),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "basic" => Ok(Variant::Classic),
            "session" | "session-aware" => Ok(Variant::Session),
            _ => Err(Error::config(format!(
                "invalid variant: {s}. Valid options: classic, session"
            ))),
        }
    }
}

/// Command-line arguments for the notechat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://127.0.0.1:8000)", "URL")]
    pub base_url: Option<String>,

    /// Client variant.
    #[arrrg(optional, "Client variant: classic or session (default: session)", "VARIANT")]
    pub variant: Option<String>,

    /// External audio player command.
    #[arrrg(optional, "Command used to play synthesized answers, e.g. 'mpv --no-video'", "CMD")]
    pub player: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Path to a YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log every request to stderr.
    #[arrrg(flag, "Log requests and responses to stderr")]
    pub verbose: bool,
}

/// Contents of a YAML configuration file.
///
/// ```yaml
/// base_url: https://notes.example.com
/// variant: session
/// player: ffplay -nodisp -autoexit
/// timeout_secs: 30
/// no_color: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Backend base URL.
    pub base_url: Option<String>,
    /// Client variant.
    pub variant: Option<Variant>,
    /// External audio player command.
    pub player: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Disable ANSI colors and styles.
    pub no_color: Option<bool>,
}

impl ConfigFile {
    /// Load a configuration file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after layering
/// command-line arguments, the environment, and the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Origin all requests go to.
    pub base_url: BaseUrl,

    /// Client variant.
    pub variant: Variant,

    /// External audio player command; `None` announces the URL instead.
    pub player: Option<String>,

    /// Request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log requests to stderr.
    pub verbose: bool,

    /// The configuration file the values were read from, if any.
    pub config_path: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: http://127.0.0.1:8000
    /// - Variant: session
    /// - Player: none
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: BaseUrl::default(),
            variant: Variant::default(),
            player: None,
            timeout: None,
            use_color: true,
            verbose: false,
            config_path: None,
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the variant.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the audio player command.
    pub fn with_player(mut self, player: Option<String>) -> Self {
        self.player = player;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Enables request logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Applies the values present in a configuration file.
    pub fn apply_file(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(base_url) = file.base_url {
            self.base_url = BaseUrl::parse(&base_url)?;
        }
        if let Some(variant) = file.variant {
            self.variant = variant;
        }
        if file.player.is_some() {
            self.player = file.player;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
        if let Some(no_color) = file.no_color {
            self.use_color = !no_color;
        }
        Ok(self)
    }

    /// Loads defaults overlaid with a YAML configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::new().apply_file(ConfigFile::from_file(path)?)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Resolves the configuration from command-line arguments and an
    /// explicitly supplied environment value for the base URL.
    pub fn resolve(args: ChatArgs, env_base_url: Option<BaseUrl>) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::new(),
        };
        if let Some(base_url) = env_base_url {
            config.base_url = base_url;
        }
        if let Some(base_url) = &args.base_url {
            config.base_url = BaseUrl::parse(base_url)?;
        }
        if let Some(variant) = &args.variant {
            config.variant = variant.parse()?;
        }
        if args.player.is_some() {
            config.player = args.player;
        }
        if let Some(secs) = args.timeout_secs {
            config.timeout = timeout_from_secs(secs);
        }
        if args.no_color {
            config.use_color = false;
        }
        config.verbose = args.verbose;
        Ok(config)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        Self::resolve(args, BaseUrl::from_env()?)
    }
}

// Zero disables the timeout.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
