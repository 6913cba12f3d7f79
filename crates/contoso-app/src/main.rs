//! Contoso assistant binary - composition root.
//!
//! 1. Load configuration from TOML, then apply CLI/env overrides
//! 2. Open the confirmation store (SQLite, or memory with `--ephemeral`)
//! 3. Build the HTTP agent backend and the terminal speech services
//! 4. Run the conversation loop over stdin

mod cli;
mod platform;
mod render;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use contoso_chat::{
    ConfirmationStore, ConversationController, HttpBackend, IdentityGate,
    MemoryConfirmationStore, TurnOutcome, VoiceController,
};
use contoso_core::config::ContosoConfig;
use contoso_core::error::ContosoError;
use contoso_core::types::Identity;
use contoso_storage::{ConfirmationRepository, Database};

use cli::{CliArgs, Command, HELP_TEXT};
use platform::{ConsoleNarrator, KeyboardCapture};
use render::Renderer;

/// How long a turn may run before the typing indicator is shown.
const TYPING_DELAY: Duration = Duration::from_millis(250);

/// Expand a leading `~` to the home directory.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn report_config_load(path: &Path, error: Option<&ContosoError>) {
    match error {
        None => tracing::info!(path = %path.display(), "Configuration loaded"),
        Some(ContosoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No configuration file; using defaults")
        }
        Some(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to load configuration; using defaults"
        ),
    }
}

fn open_store(
    args: &CliArgs,
    config: &ContosoConfig,
) -> Result<Arc<dyn ConfirmationStore>, Box<dyn std::error::Error>> {
    if args.ephemeral {
        tracing::info!("Ephemeral session; confirmations kept in memory");
        return Ok(Arc::new(MemoryConfirmationStore::new()));
    }
    let db_path = resolve_data_dir(&config.general.data_dir).join(&config.storage.db_file);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");
    Ok(Arc::new(ConfirmationRepository::new(Arc::new(db))))
}

/// Drive `turn`, showing the typing indicator if the backend is slow.
async fn with_typing_indicator<F>(controller: &ConversationController, turn: F) -> TurnOutcome
where
    F: Future<Output = TurnOutcome>,
{
    tokio::pin!(turn);
    tokio::select! {
        biased;
        outcome = &mut turn => outcome,
        _ = tokio::time::sleep(TYPING_DELAY) => {
            if controller.is_typing() {
                println!("{}", render::TYPING_INDICATOR);
            }
            turn.await
        }
    }
}

async fn run_command(controller: &ConversationController, command: Command) {
    match command {
        Command::Say(text) => {
            with_typing_indicator(controller, controller.send_message(&text)).await;
        }
        Command::SendInput => {
            if !controller.input().trim().is_empty() {
                with_typing_indicator(controller, controller.send_input()).await;
            }
        }
        Command::Confirm => {
            if !controller.confirm_email() {
                println!("Nothing to confirm.");
            }
        }
        Command::Reject => {
            let outcome = with_typing_indicator(controller, controller.reject_email()).await;
            if outcome == TurnOutcome::Ignored {
                println!("Nothing to reject.");
            }
        }
        Command::Quick(index) => {
            let outcome =
                with_typing_indicator(controller, controller.select_quick_reply(index)).await;
            if outcome == TurnOutcome::Ignored {
                println!("No quick reply {} right now.", index + 1);
            }
        }
        Command::ToggleVoice => {
            let state = controller.voice_state();
            if !state.supported {
                println!("Voice is not available.");
            } else if controller.toggle_voice() {
                println!("Narration on.");
            } else {
                println!("Narration off.");
            }
        }
        Command::Listen => {
            if controller.start_listening() {
                println!("(listening: type what you would say)");
            } else {
                println!("Voice input is not available.");
            }
        }
        Command::Help => println!("{}", HELP_TEXT),
        Command::Quit => {}
    }
}

/// Print new messages, and the quick replies while they are offered.
fn refresh(controller: &ConversationController, renderer: &mut Renderer) {
    let out = renderer.render_new(&controller.messages());
    if out.is_empty() {
        return;
    }
    print!("{}", out);
    print!("{}", render::render_quick_replies(controller.quick_replies()));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Load problems are reported once tracing is up.
    let config_file = args.resolve_config_path();
    let (mut config, config_error) = ContosoConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);

    // Tracing. Logs go to stderr so they do not interleave with the chat.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Contoso assistant v{}", env!("CARGO_PKG_VERSION"));
    report_config_load(&config_file, config_error.as_ref());

    // Identity store.
    let store = open_store(&args, &config)?;

    // Backend.
    let backend = HttpBackend::new(&config.backend)?;
    tracing::info!(url = %backend.url(), "Agent backend configured");

    // Voice.
    let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();
    let capture = KeyboardCapture::new();
    let voice = VoiceController::new(
        Box::new(capture.clone()),
        Box::new(ConsoleNarrator::new(playback_tx)),
        config.voice.enabled,
    );

    let controller =
        ConversationController::new(Arc::new(backend), IdentityGate::new(store), voice)
            .with_config(&config);
    controller.initialize(Identity {
        email: args.email.clone().unwrap_or_default(),
        display_name: args.name.clone(),
    });

    let mut renderer = Renderer::default();
    refresh(&controller, &mut renderer);
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                if capture.is_armed() {
                    match controller.handle_capture_event(capture.take_line(&line)) {
                        Some(transcript) => println!("(heard) {}  [Enter to send]", transcript),
                        None => println!("(didn't catch that)"),
                    }
                    continue;
                }

                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => run_command(&controller, command).await,
                    Err(hint) => println!("{}", hint),
                }
                refresh(&controller, &mut renderer);
            }
            Some(event) = playback_rx.recv() => {
                controller.handle_playback_event(event);
            }
        }
    }

    controller.stop_listening();
    tracing::info!(session = %controller.session_id(), "Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_data_dir() {
        assert_eq!(resolve_data_dir("/srv/contoso"), PathBuf::from("/srv/contoso"));
    }

    #[test]
    fn test_resolve_home_data_dir() {
        let resolved = resolve_data_dir("~/.contoso/data");
        assert!(resolved.ends_with(".contoso/data"));
        assert!(!resolved.starts_with("~"));
    }
}
