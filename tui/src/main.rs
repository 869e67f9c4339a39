use std::fs;

use anyhow::Context;
use clap::Parser;

use crate::{config::Config, state_store::StateStore, ui_management::UiManager};

mod config;
mod session;
mod state_store;
mod termination;
mod ui_management;

pub use termination::{create_termination, Interrupted, Terminator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_logging(&config)?;

    let (terminator, mut interrupt_rx) = create_termination();
    let (state_store, state_rx) = StateStore::new(config);
    let (ui_manager, action_rx) = UiManager::new();

    tokio::try_join!(
        state_store.main_loop(terminator, action_rx, interrupt_rx.resubscribe()),
        ui_manager.main_loop(state_rx, interrupt_rx.resubscribe()),
    )?;

    if let Ok(reason) = interrupt_rx.recv().await {
        match reason {
            Interrupted::UserInt => println!("exited per user request"),
            Interrupted::OsSig => println!("exited because of an os signal"),
        }
    } else {
        println!("exited because of an unexpected error");
    }

    Ok(())
}

/// The terminal is taken over by the UI, so tracing goes to a file instead
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let path = config.log_file();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create log directory {}", parent.display()))?;
    }
    let file = fs::File::create(&path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chat_tui=info,comms=info")),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();

    Ok(())
}
