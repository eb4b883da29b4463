//! Output rendering for the chat front-end.
//!
//! The session never prints; it emits [`ViewEvent`]s.  A [`Renderer`] turns
//! those events into terminal output.

use std::io::{self, Stdout, Write};

use url::Url;

use crate::chat::ViewEvent;
use crate::types::{Message, Sender};
use crate::utils::time::clock;

/// ANSI escape code for dim text (used for timestamps).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for alerts).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user's messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for answers).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for alerts and input).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for audio links).
const ANSI_MAGENTA: &str = "\x1b[35m";

///////////////////////////////////////// Formatting ////////////////////////////////////////

/// Display label for a sender.
pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Ai => "AI",
    }
}

/// Formats one conversation line: `[HH:MM:SS] You: text`.
///
/// Continuation lines of multi-line text are indented under the first.
pub fn format_message(message: &Message, use_color: bool) -> String {
    let label = sender_label(message.sender);
    let stamp = clock(message.sent_at);
    let indent = " ".repeat(stamp.len() + label.len() + 5);
    let text = message.text.replace('\n', &format!("\n{indent}"));
    if use_color {
        let color = match message.sender {
            Sender::User => ANSI_CYAN,
            Sender::Ai => ANSI_GREEN,
        };
        format!("{ANSI_DIM}[{stamp}]{ANSI_RESET} {color}{label}:{ANSI_RESET} {text}")
    } else {
        format!("[{stamp}] {label}: {text}")
    }
}

/// Formats an alert.
pub fn format_alert(alert: &str, use_color: bool) -> String {
    if use_color {
        format!("{ANSI_BOLD}{ANSI_YELLOW}! {alert}{ANSI_RESET}")
    } else {
        format!("! {alert}")
    }
}

/// Formats the notice shown when the input field is overwritten.
pub fn format_input_filled(text: &str, use_color: bool) -> String {
    if use_color {
        format!("{ANSI_DIM}[input]{ANSI_RESET} {ANSI_YELLOW}{text}{ANSI_RESET} {ANSI_DIM}(/send to ask){ANSI_RESET}")
    } else {
        format!("[input] {text} (/send to ask)")
    }
}

/// Formats the notice shown when synthesized audio is ready.
pub fn format_audio(url: &Url, use_color: bool) -> String {
    if use_color {
        format!("{ANSI_DIM}[audio]{ANSI_RESET} {ANSI_MAGENTA}{url}{ANSI_RESET}")
    } else {
        format!("[audio] {url}")
    }
}

///////////////////////////////////////// Rendering /////////////////////////////////////////

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print a conversation message.
    fn print_message(&mut self, message: &Message);

    /// Print an alert.  Alerts interrupt whatever the user is doing.
    fn print_alert(&mut self, alert: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Show that the input field now holds `text`.
    fn print_input_filled(&mut self, text: &str);

    /// Show that synthesized audio is available at `url`.
    fn print_audio(&mut self, url: &Url);

    /// Render a view event with the matching method.
    fn render(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::MessageAppended(message) => self.print_message(message),
            ViewEvent::Alert(alert) => self.print_alert(alert),
            ViewEvent::InputFilled(text) => self.print_input_filled(text),
            ViewEvent::PlayAudio(url) => self.print_audio(url),
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Returns true if ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn line(&mut self, text: &str) {
        let mut out = self.stdout.lock();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        let text = format_message(message, self.use_color);
        self.line(&text);
    }

    fn print_alert(&mut self, alert: &str) {
        let text = format_alert(alert, self.use_color);
        self.line(&text);
    }

    fn print_info(&mut self, info: &str) {
        self.line(info);
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_input_filled(&mut self, text: &str) {
        let text = format_input_filled(text, self.use_color);
        self.line(&text);
    }

    fn print_audio(&mut self, url: &Url) {
        let text = format_audio(url, self.use_color);
        self.line(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
    }

    impl Renderer for Recording {
        fn print_message(&mut self, message: &Message) {
            self.calls.push(format!("message:{}", message.text));
        }
        fn print_alert(&mut self, alert: &str) {
            self.calls.push(format!("alert:{alert}"));
        }
        fn print_info(&mut self, info: &str) {
            self.calls.push(format!("info:{info}"));
        }
        fn print_error(&mut self, error: &str) {
            self.calls.push(format!("error:{error}"));
        }
        fn print_input_filled(&mut self, text: &str) {
            self.calls.push(format!("input:{text}"));
        }
        fn print_audio(&mut self, url: &Url) {
            self.calls.push(format!("audio:{url}"));
        }
    }

    #[test]
    fn renderer_default_has_color() {
        assert!(PlainTextRenderer::new().use_color());
        assert!(!PlainTextRenderer::with_color(false).use_color());
    }

    #[test]
    fn plain_message_format() {
        let line = format_message(&Message::user("What is 2+2?"), false);
        assert!(line.starts_with('['));
        assert!(line.ends_with("] You: What is 2+2?"));
        let line = format_message(&Message::ai("4"), false);
        assert!(line.ends_with("] AI: 4"));
    }

    #[test]
    fn multi_line_messages_are_indented() {
        let line = format_message(&Message::ai("first\nsecond"), false);
        let mut lines = line.lines();
        let first = lines.next().unwrap();
        let second = lines.next().unwrap();
        assert!(first.ends_with("AI: first"));
        assert_eq!(second.trim_start(), "second");
        assert_eq!(second.len() - "second".len(), first.len() - "first".len());
    }

    #[test]
    fn colored_output_is_reset() {
        let line = format_alert("Choose a file.", true);
        assert!(line.contains("Choose a file."));
        assert!(line.ends_with(ANSI_RESET));
        assert_eq!(format_alert("Choose a file.", false), "! Choose a file.");
    }

    #[test]
    fn audio_format() {
        let url = Url::parse("http://127.0.0.1:8000/uploads/a.mp3").unwrap();
        assert_eq!(
            format_audio(&url, false),
            "[audio] http://127.0.0.1:8000/uploads/a.mp3"
        );
    }

    #[test]
    fn render_routes_events() {
        let mut renderer = Recording::default();
        renderer.render(&ViewEvent::MessageAppended(Message::ai("4")));
        renderer.render(&ViewEvent::Alert("No answer yet.".to_string()));
        renderer.render(&ViewEvent::InputFilled("what is osmosis".to_string()));
        renderer.render(&ViewEvent::PlayAudio(
            Url::parse("http://127.0.0.1:8000/a.mp3").unwrap(),
        ));
        assert_eq!(
            renderer.calls,
            vec![
                "message:4",
                "alert:No answer yet.",
                "input:what is osmosis",
                "audio:http://127.0.0.1:8000/a.mp3",
            ]
        );
    }
}
