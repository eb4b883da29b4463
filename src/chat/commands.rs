//! Slash command parsing for the chat application.
//!
//! Lines that start with `/` are commands; everything else is a question for
//! the backend.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Upload a notes file.  `None` means no file was chosen.
    Upload {
        /// Path of the notes file.
        path: Option<String>,
        /// Request global visibility for the upload.
        admin: bool,
    },

    /// Transcribe an audio file into the input field.
    Voice(Option<String>),

    /// Speak the last answer.
    Speak,

    /// Send the current contents of the input field.
    Send,

    /// Replace the input field, or show it when no text is given.
    Input(Option<String>),

    /// Print the conversation, optionally as JSON.
    History {
        /// Emit JSON instead of formatted lines.
        json: bool,
    },

    /// Show the session identifier and variant.
    Session,

    /// Display per-endpoint request statistics.
    Stats,

    /// Show the current configuration.
    Config,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a question.
///
/// # Examples
///
/// ```
/// # use notechat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert!(parse_command("/upload notes.pdf --admin").is_some());
/// assert!(parse_command("What is osmosis?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "upload" => parse_upload(argument, false),
        "upload!" => parse_upload(argument, true),
        "voice" | "transcribe" => ChatCommand::Voice(argument.map(String::from)),
        "speak" | "tts" => no_argument(ChatCommand::Speak, "/speak", argument),
        "send" => no_argument(ChatCommand::Send, "/send", argument),
        "input" => ChatCommand::Input(argument.map(String::from)),
        "history" => match argument {
            None => ChatCommand::History { json: false },
            Some(arg) if arg.eq_ignore_ascii_case("json") => ChatCommand::History { json: true },
            Some(_) => ChatCommand::Invalid("/history accepts only 'json'".to_string()),
        },
        "session" => ChatCommand::Session,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::Config,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_upload(argument: Option<&str>, admin: bool) -> ChatCommand {
    let mut admin = admin;
    let mut path = Vec::new();
    for token in argument.unwrap_or_default().split_whitespace() {
        match token {
            "--admin" | "!" => admin = true,
            _ => path.push(token),
        }
    }
    let path = (!path.is_empty()).then(|| path.join(" "));
    ChatCommand::Upload { path, admin }
}

fn no_argument(command: ChatCommand, name: &str, argument: Option<&str>) -> ChatCommand {
    match argument {
        None => command,
        Some(_) => ChatCommand::Invalid(format!("{name} takes no argument")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Type a question and press enter to ask it.

Available commands:
  /upload <file>         Upload a notes file
  /upload <file> --admin Upload for everyone (also /upload! <file>)
  /voice <file>          Transcribe an audio file into the input field
  /send                  Send the current input field
  /input [text]          Replace the input field (no argument shows it)
  /speak                 Read the last answer aloud
  /history [json]        Print the conversation
  /session               Show the session identifier
  /stats                 Show request statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /QUIT  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse_command("/upload notes.pdf"),
            Some(ChatCommand::Upload {
                path: Some("notes.pdf".to_string()),
                admin: false
            })
        );
        assert_eq!(
            parse_command("/upload"),
            Some(ChatCommand::Upload {
                path: None,
                admin: false
            })
        );
    }

    #[test]
    fn parse_admin_upload() {
        let expected = Some(ChatCommand::Upload {
            path: Some("notes.pdf".to_string()),
            admin: true,
        });
        assert_eq!(parse_command("/upload notes.pdf --admin"), expected);
        assert_eq!(parse_command("/upload --admin notes.pdf"), expected);
        assert_eq!(parse_command("/upload! notes.pdf"), expected);
        assert_eq!(parse_command("/upload notes.pdf !"), expected);
        assert_eq!(
            parse_command("/upload --admin"),
            Some(ChatCommand::Upload {
                path: None,
                admin: true
            })
        );
    }

    #[test]
    fn upload_path_keeps_inner_spaces() {
        assert_eq!(
            parse_command("/upload lecture notes.txt"),
            Some(ChatCommand::Upload {
                path: Some("lecture notes.txt".to_string()),
                admin: false
            })
        );
    }

    #[test]
    fn parse_voice() {
        assert_eq!(
            parse_command("/voice question.wav"),
            Some(ChatCommand::Voice(Some("question.wav".to_string())))
        );
        assert_eq!(parse_command("/voice"), Some(ChatCommand::Voice(None)));
        assert_eq!(
            parse_command("/transcribe q.mp3"),
            Some(ChatCommand::Voice(Some("q.mp3".to_string())))
        );
    }

    #[test]
    fn parse_speak_and_send() {
        assert_eq!(parse_command("/speak"), Some(ChatCommand::Speak));
        assert_eq!(parse_command("/tts"), Some(ChatCommand::Speak));
        assert_eq!(parse_command("/send"), Some(ChatCommand::Send));
        assert!(matches!(
            parse_command("/speak loudly"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("no argument")
        ));
    }

    #[test]
    fn parse_input() {
        assert_eq!(
            parse_command("/input what is 2+2?"),
            Some(ChatCommand::Input(Some("what is 2+2?".to_string())))
        );
        assert_eq!(parse_command("/input"), Some(ChatCommand::Input(None)));
    }

    #[test]
    fn parse_history() {
        assert_eq!(
            parse_command("/history"),
            Some(ChatCommand::History { json: false })
        );
        assert_eq!(
            parse_command("/history JSON"),
            Some(ChatCommand::History { json: true })
        );
        assert!(matches!(
            parse_command("/history yaml"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_info_commands() {
        assert_eq!(parse_command("/session"), Some(ChatCommand::Session));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::Config));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is osmosis?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_actions() {
        let help = help_text();
        assert!(help.contains("/upload"));
        assert!(help.contains("/voice"));
        assert!(help.contains("/speak"));
        assert!(help.contains("/quit"));
    }
}
