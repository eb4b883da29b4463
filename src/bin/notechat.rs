//! Interactive chat client for a notes question-answering backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on http://127.0.0.1:8000
//! notechat
//!
//! # Point at another backend, without a session identifier
//! notechat --base-url https://notes.example.com --variant classic
//!
//! # Play synthesized answers through mpv
//! notechat --player "mpv --no-video"
//! ```
//!
//! Anything typed that is not a slash command is asked as a question.  Every
//! action runs in the background; answers and alerts are printed as they
//! arrive.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::thread;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing_subscriber::EnvFilter;

use notechat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, Dispatcher, PlainTextRenderer, Renderer,
    UiEvent, View, ViewEvent, help_text, parse_command,
};
use notechat::render::format_message;
use notechat::{AnnouncePlayer, AudioPlayer, CommandPlayer, Error, HttpBackend, TracingLogger};

/// A line, or the reason there is none, from the prompt thread.
enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Main entry point for the notechat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("notechat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    init_tracing(config.verbose);

    let backend = HttpBackend::with_options(config.base_url.clone(), config.timeout)?
        .with_logger(Arc::new(TracingLogger));
    let (view, mut events) = View::channel();
    let dispatcher = Dispatcher::new(ChatSession::new(backend, config.variant, view));
    let player: Box<dyn AudioPlayer> = match config.player.as_deref() {
        Some(command) => Box::new(CommandPlayer::parse(command)?),
        None => Box::new(AnnouncePlayer),
    };
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let (line_tx, mut lines) = unbounded_channel();
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let (error_tx, mut errors) = unbounded_channel();
    spawn_prompt(line_tx, ready_rx)?;

    println!("Notes Chat ({})", config.base_url);
    if let Some(session_id) = dispatcher.session().session_id() {
        println!("Session: {session_id}");
    }
    println!("Type a question, /help for commands, /quit to exit\n");

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                renderer.render(&event);
                if let ViewEvent::PlayAudio(url) = &event
                    && let Err(err) = player.play(url).await
                {
                    renderer.print_error(&format!("Could not play audio: {err}"));
                }
            }
            Some(err) = errors.recv() => {
                renderer.print_error(&describe(&err));
            }
            input = lines.recv() => {
                match input {
                    Some(Input::Line(line)) => {
                        if !handle_line(&line, &dispatcher, &mut renderer, &config, &error_tx) {
                            println!("Goodbye!");
                            break;
                        }
                    }
                    Some(Input::Interrupted) => println!(),
                    Some(Input::Eof) | None => {
                        println!("\nGoodbye!");
                        break;
                    }
                    Some(Input::Failed(err)) => {
                        renderer.print_error(&format!("Input error: {err}"));
                        break;
                    }
                }
                if ready_tx.send(()).is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "notechat=debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads lines on a dedicated thread.  The next prompt is shown only after
/// the main loop has handled the previous line.
fn spawn_prompt(
    lines: UnboundedSender<Input>,
    ready: std_mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    thread::Builder::new()
        .name("notechat-prompt".to_string())
        .spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(err) => {
                    let _ = lines.send(Input::Failed(err.to_string()));
                    return;
                }
            };
            loop {
                let input = match rl.readline("> ") {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let _ = rl.add_history_entry(line.as_str());
                        Input::Line(line)
                    }
                    Err(ReadlineError::Interrupted) => Input::Interrupted,
                    Err(ReadlineError::Eof) => Input::Eof,
                    Err(err) => Input::Failed(err.to_string()),
                };
                let last = matches!(input, Input::Eof | Input::Failed(_));
                if lines.send(input).is_err() || last || ready.recv().is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

/// Handles one line of input.  Returns false when the user wants to quit.
fn handle_line(
    line: &str,
    dispatcher: &Dispatcher<HttpBackend>,
    renderer: &mut PlainTextRenderer,
    config: &ChatConfig,
    errors: &UnboundedSender<Error>,
) -> bool {
    let Some(command) = parse_command(line) else {
        spawn_action(dispatcher, UiEvent::Send(line.to_string()), renderer, errors);
        return true;
    };
    let session = dispatcher.session();
    match command {
        ChatCommand::Quit => return false,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::Upload { path, admin } => {
            if admin && !session.variant().is_session_aware() {
                renderer.print_info("The classic variant does not send the admin flag.");
            }
            let event = UiEvent::Upload {
                path: path.map(PathBuf::from),
                admin,
            };
            spawn_action(dispatcher, event, renderer, errors);
        }
        ChatCommand::Voice(path) => {
            let event = UiEvent::ConvertVoice(path.map(PathBuf::from));
            spawn_action(dispatcher, event, renderer, errors);
        }
        ChatCommand::Speak => spawn_action(dispatcher, UiEvent::TextToVoice, renderer, errors),
        ChatCommand::Send => spawn_action(dispatcher, UiEvent::SendInput, renderer, errors),
        ChatCommand::Input(Some(text)) => {
            session.set_input(text);
            renderer.print_info("Input updated. Use /send to ask it.");
        }
        ChatCommand::Input(None) => {
            let input = session.input();
            if input.is_empty() {
                renderer.print_info("Input: (empty)");
            } else {
                renderer.print_info(&format!("Input: {input}"));
            }
        }
        ChatCommand::History { json: true } => {
            match serde_json::to_string_pretty(&session.messages()) {
                Ok(json) => println!("{json}"),
                Err(err) => renderer.print_error(&format!("Failed to encode history: {err}")),
            }
        }
        ChatCommand::History { json: false } => {
            let messages = session.messages();
            if messages.is_empty() {
                renderer.print_info("No messages yet.");
            }
            for message in &messages {
                println!("{}", format_message(message, config.use_color));
            }
        }
        ChatCommand::Session => match session.session_id() {
            Some(id) => renderer.print_info(&format!("Session: {id} ({})", session.variant())),
            None => renderer.print_info(&format!("No session identifier ({})", session.variant())),
        },
        ChatCommand::Stats => print_stats(session),
        ChatCommand::Config => print_config(config),
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    true
}

/// Dispatches `event` in the background and forwards its error, if any.
fn spawn_action(
    dispatcher: &Dispatcher<HttpBackend>,
    event: UiEvent,
    renderer: &mut PlainTextRenderer,
    errors: &UnboundedSender<Error>,
) {
    match dispatcher.dispatch(event) {
        Ok(handle) => {
            let errors = errors.clone();
            tokio::spawn(async move {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        let _ = errors.send(err);
                    }
                    Err(err) => tracing::error!(%err, "action task panicked"),
                }
            });
        }
        Err(err) => renderer.print_error(&err.to_string()),
    }
}

fn describe(err: &Error) -> String {
    if err.is_network() {
        format!("Could not reach the server: {err}")
    } else {
        err.to_string()
    }
}

fn print_stats(session: &ChatSession<HttpBackend>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Variant: {}", stats.variant);
    match &stats.session_id {
        Some(id) => println!("      Session: {id}"),
        None => println!("      Session: (none)"),
    }
    println!(
        "      Messages: {} ({} yours, {} answers)",
        stats.message_count, stats.user_messages, stats.ai_messages
    );
    println!(
        "      Last answer: {}",
        if stats.has_answer { "available" } else { "(none)" }
    );
    println!("      Alerts: {}", stats.alerts);
    for endpoint in &stats.endpoints {
        println!(
            "      {}: {} requests, {} failed",
            endpoint.endpoint, endpoint.requests, endpoint.failures
        );
    }
    println!(
        "      Total: {} requests, {} failed",
        stats.total_requests(),
        stats.total_failures()
    );
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Base URL: {}", config.base_url);
    println!("      Variant: {}", config.variant);
    match &config.player {
        Some(player) => println!("      Player: {player}"),
        None => println!("      Player: (announce URL)"),
    }
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    println!(
        "      Color: {}",
        if config.use_color { "enabled" } else { "disabled" }
    );
    match &config.config_path {
        Some(path) => println!("      Config file: {}", path.display()),
        None => println!("      Config file: (none)"),
    }
}
