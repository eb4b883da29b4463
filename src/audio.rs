//! Playback of synthesized answers.
//!
//! The chat client never decodes audio itself.  It hands the resolved URL to
//! an [`AudioPlayer`], which either launches an external program or simply
//! tells the user where the audio lives.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::error::{Error, Result};

/// Something that can play an audio resource by URL.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start playback.  Implementations return once playback has been
    /// started; they do not wait for it to finish.
    async fn play(&self, url: &Url) -> Result<()>;
}

/// Plays audio by spawning an external program with the URL as its last
/// argument, e.g. `mpv --no-video` or `ffplay -nodisp -autoexit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Create a player for the given program and leading arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line such as `"mpv --no-video"`.
    pub fn parse(command: &str) -> Result<Self> {
        let mut words = command.split_whitespace().map(String::from);
        let program = words
            .next()
            .ok_or_else(|| Error::config("audio player command is empty"))?;
        Ok(Self::new(program, words.collect()))
    }

    /// The program that will be spawned.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed before the URL.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, url: &Url) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| Error::io(format!("failed to start {}", self.program), err))?;
        tracing::debug!(program = %self.program, %url, "audio playback started");
        // Reap the child in the background so it does not linger as a zombie.
        tokio::spawn(async move {
            if let Err(err) = child.wait().await {
                tracing::warn!(%err, "audio player did not exit cleanly");
            }
        });
        Ok(())
    }
}

/// Announces the audio URL instead of playing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnouncePlayer;

#[async_trait]
impl AudioPlayer for AnnouncePlayer {
    async fn play(&self, url: &Url) -> Result<()> {
        println!("Audio ready: {url}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_line() {
        let player = CommandPlayer::parse("ffplay -nodisp -autoexit").unwrap();
        assert_eq!(player.program(), "ffplay");
        assert_eq!(player.args(), ["-nodisp", "-autoexit"]);
        assert!(CommandPlayer::parse("   ").is_err());
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let player = CommandPlayer::new("/nonexistent/notechat-player", Vec::new());
        let url = Url::parse("http://127.0.0.1:8000/uploads/a.mp3").unwrap();
        let err = player.play(&url).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn announce_always_succeeds() {
        let url = Url::parse("http://127.0.0.1:8000/uploads/a.mp3").unwrap();
        assert!(tokio_test::block_on(AnnouncePlayer.play(&url)).is_ok());
    }
}
