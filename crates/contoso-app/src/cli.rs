//! CLI argument definitions and in-chat commands.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use contoso_core::config::ContosoConfig;

/// Contoso storefront assistant in the terminal.
#[derive(Parser, Debug)]
#[command(name = "contoso", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Email of the signed-in shopper.
    #[arg(short = 'e', long = "email")]
    pub email: Option<String>,

    /// Display name of the signed-in shopper.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Base URL of the agent service.
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Data directory for the SQLite file.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Start with narration switched off.
    #[arg(long = "no-voice")]
    pub no_voice: bool,

    /// Keep email confirmations in memory only.
    #[arg(long = "ephemeral")]
    pub ephemeral: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONTOSO_CONFIG env var > ~/.contoso/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CONTOSO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --backend-url flag > CONTOSO_BACKEND_URL env var.
    /// Returns `None` if neither is set (use config value).
    fn backend_url_or(&self, env_url: Option<String>) -> Option<String> {
        self.backend_url
            .clone()
            .or(env_url)
            .filter(|url| !url.trim().is_empty())
    }

    /// Apply flag and env overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ContosoConfig) {
        self.apply_with_env(config, std::env::var("CONTOSO_BACKEND_URL").ok());
    }

    fn apply_with_env(&self, config: &mut ContosoConfig, env_url: Option<String>) {
        if let Some(url) = self.backend_url_or(env_url) {
            config.backend.base_url = url;
        }
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.no_voice {
            config.voice.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".contoso").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".contoso").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// One line of shopper input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send as a turn.
    Say(String),
    /// Empty line: send whatever is in the input buffer.
    SendInput,
    Confirm,
    Reject,
    ToggleVoice,
    Listen,
    /// Zero-based index into the visible quick replies.
    Quick(usize),
    Help,
    Quit,
}

impl Command {
    /// Parse a line. Unknown or malformed slash commands return a usage hint.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Command::SendInput);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        match name {
            "confirm" | "yes" => Ok(Command::Confirm),
            "reject" | "no" => Ok(Command::Reject),
            "voice" => Ok(Command::ToggleVoice),
            "listen" | "mic" => Ok(Command::Listen),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "quick" => {
                let n = parts
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| "usage: /quick <n>".to_string())?;
                Ok(Command::Quick(n - 1))
            }
            other => Err(format!("unknown command: /{} (try /help)", other)),
        }
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  <text>       ask the assistant
  <enter>      send the input buffer (filled by /listen)
  /confirm     confirm the email on file
  /reject      the email on file is not mine
  /quick <n>   send quick reply number n
  /listen      dictate the next line
  /voice       toggle narration
  /quit        leave";

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["contoso"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_flags() {
        let a = args(&[
            "--email",
            "a@x.com",
            "--backend-url",
            "http://shop:9000",
            "--no-voice",
            "--ephemeral",
        ]);
        assert_eq!(a.email.as_deref(), Some("a@x.com"));
        assert!(a.no_voice);
        assert!(a.ephemeral);
        assert_eq!(a.config, None);
    }

    #[test]
    fn test_config_flag_wins() {
        let a = args(&["-c", "/tmp/contoso.toml"]);
        assert_eq!(a.resolve_config_path(), PathBuf::from("/tmp/contoso.toml"));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let a = args(&["-b", "http://shop:9000", "-d", "/srv/contoso", "-l", "debug", "--no-voice"]);
        let mut config = ContosoConfig::default();
        a.apply_with_env(&mut config, Some("http://ignored".to_string()));
        assert_eq!(config.backend.base_url, "http://shop:9000");
        assert_eq!(config.general.data_dir, "/srv/contoso");
        assert_eq!(config.general.log_level, "debug");
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_env_backend_url_used_without_flag() {
        let a = args(&[]);
        let mut config = ContosoConfig::default();
        a.apply_with_env(&mut config, Some("http://from-env:8000".to_string()));
        assert_eq!(config.backend.base_url, "http://from-env:8000");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let a = args(&[]);
        let mut config = ContosoConfig::default();
        a.apply_with_env(&mut config, None);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.voice.enabled);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Ok(Command::SendInput));
        assert_eq!(
            Command::parse(" show me phones "),
            Ok(Command::Say("show me phones".to_string()))
        );
        assert_eq!(Command::parse("/confirm"), Ok(Command::Confirm));
        assert_eq!(Command::parse("/reject"), Ok(Command::Reject));
        assert_eq!(Command::parse("/voice"), Ok(Command::ToggleVoice));
        assert_eq!(Command::parse("/listen"), Ok(Command::Listen));
        assert_eq!(Command::parse("/quit"), Ok(Command::Quit));
        assert_eq!(Command::parse("/quick 2"), Ok(Command::Quick(1)));
    }

    #[test]
    fn test_parse_bad_commands() {
        assert!(Command::parse("/quick").is_err());
        assert!(Command::parse("/quick 0").is_err());
        assert!(Command::parse("/quick two").is_err());
        assert!(Command::parse("/dance").is_err());
    }
}
