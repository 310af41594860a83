//! Todo CLI - Command line client for a REST todo service

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use todo_cli::{execute, logging::init_logging, print_notifications, Cli, Commands};
use todo_sync_core::{Catalog, HttpTodoService, NotificationCenter, TodoStore};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // held until exit so buffered log lines are flushed
    let _log_guard = if cli.verbose || config.logging.log_file.is_some() {
        init_logging(&config.logging)?
    } else {
        None
    };
    debug!(base_url = %config.api.base_url, locale = %config.locale, "Configuration loaded");

    let service = HttpTodoService::new(&config.api).context("Failed to create API client")?;
    let notifications =
        NotificationCenter::new(config.notifications.clone(), Catalog::new(config.locale));
    let store = TodoStore::new(Arc::new(service), notifications.clone());

    let result = run(&cli, &store).await;

    if !cli.json {
        print_notifications(
            &notifications.notifications(),
            cli.verbose,
            &mut std::io::stderr(),
        )?;
    }
    notifications.shutdown();
    result
}

async fn run(cli: &Cli, store: &TodoStore) -> anyhow::Result<()> {
    // create refetches on its own
    if !matches!(cli.command, Commands::Add { .. }) {
        store.refresh().await?;
    }
    execute(&cli.command, store, cli.json, &mut std::io::stdout()).await
}
