use std::path::PathBuf;

use clap::Parser;

/// Terminal client for the chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "chat-tui", version, about)]
pub struct Config {
    /// Base URL of the chat HTTP API
    #[arg(long, env = "CHAT_API_URL", default_value = "http://localhost:3001")]
    pub api_url: String,

    /// Websocket endpoint of the real-time channel
    #[arg(long, env = "CHAT_WS_URL", default_value = "ws://localhost:3001")]
    pub ws_url: String,

    /// Where the session is persisted across restarts
    #[arg(long, env = "CHAT_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// File receiving the tracing output, since the terminal is taken over by the UI
    #[arg(long, env = "CHAT_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| default_data_file("session.json"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_data_file("chat-tui.log"))
    }
}

fn default_data_file(name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chat-tui")
        .join(name)
}
