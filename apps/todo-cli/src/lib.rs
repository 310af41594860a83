//! Todo CLI library
//!
//! Argument parsing, configuration overrides and output formatting for the
//! `todo` binary.

pub mod logging;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use todo_sync_common::{format_datetime, truncate_string};
use todo_sync_core::{
    ClientConfig, ConfigLoader, FilterCriteria, Locale, Notification, SortDirection,
    StatusFilter, Todo, TodoId, TodoStats, TodoStore,
};

const DESCRIPTION_PREVIEW_LEN: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(about = "Manage todos on a remote todo service")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides configuration and environment
    #[arg(long)]
    pub base_url: Option<String>,

    /// Message language (en, fr, es)
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List todos
    List {
        /// Status filter (all, active, completed)
        #[arg(long, short, default_value = "all")]
        filter: StatusFilter,
        /// Case-insensitive search in title and description
        #[arg(long, short)]
        search: Option<String>,
        /// Title sort direction (asc, desc)
        #[arg(long, default_value = "asc")]
        sort: SortDirection,
    },
    /// Add a todo
    Add {
        /// Title
        title: String,
        /// Optional description
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Edit a todo's title or description
    Edit {
        /// Todo id
        id: TodoId,
        /// New title
        #[arg(long, short)]
        title: Option<String>,
        /// New description
        #[arg(long, short, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
    },
    /// Flip a todo between active and completed
    Toggle {
        /// Todo id
        id: TodoId,
    },
    /// Delete a todo
    Delete {
        /// Todo id
        id: TodoId,
    },
    /// Show counts of active and completed todos
    Stats,
}

impl Cli {
    /// Resolve the configuration: defaults, files, environment, then flags
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    pub fn load_config(&self) -> anyhow::Result<ClientConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(anyhow!("Configuration file not found: {}", path.display()));
            }
            loader = loader.add_config_path(path);
        }
        let mut config = loader
            .with_validation(false)
            .load()
            .context("Failed to load configuration")?;
        self.apply_overrides(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Apply command line flags on top of a configuration
    pub fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url.clone_from(base_url);
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

/// Run one command against a loaded store
///
/// # Errors
/// Returns an error if the command fails or output cannot be written
pub async fn execute<W: Write>(
    command: &Commands,
    store: &TodoStore,
    json: bool,
    writer: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::List {
            filter,
            search,
            sort,
        } => {
            store.set_criteria(
                FilterCriteria::builder()
                    .status(*filter)
                    .search(search.as_deref().unwrap_or_default())
                    .sort(*sort)
                    .build(),
            );
            let todos = store.displayed_todos();
            if json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&todos)?)?;
            } else {
                print_todos(&todos, writer)?;
            }
        }
        Commands::Add { title, description } => {
            store.set_adding_task(true);
            let created = store
                .create_todo(Todo::create(title.clone(), description.clone()))
                .await?;
            print_result(&created, json, writer)?;
        }
        Commands::Edit {
            id,
            title,
            description,
            clear_description,
        } => {
            let mut todo = find(store, *id)?;
            if let Some(title) = title {
                Todo::validate_title(title)?;
                todo = todo.update_title(title.clone());
            }
            if *clear_description {
                todo = todo.update_description(None);
            } else if let Some(description) = description {
                todo = todo.update_description(Some(description.clone()));
            }
            store.update_todo(todo.clone()).await?;
            print_result(&todo, json, writer)?;
        }
        Commands::Toggle { id } => {
            let todo = find(store, *id)?;
            let toggled = store.toggle_todo_completion(&todo).await?;
            print_result(&toggled, json, writer)?;
        }
        Commands::Delete { id } => {
            let todo = find(store, *id)?;
            store.delete_todo(&todo).await?;
            if json {
                writeln!(writer, "{}", serde_json::json!({ "deleted": id }))?;
            }
        }
        Commands::Stats => {
            let stats = store.stats();
            if json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
            } else {
                print_stats(&stats, writer)?;
            }
        }
    }
    Ok(())
}

fn find(store: &TodoStore, id: TodoId) -> anyhow::Result<Todo> {
    store
        .get(id)
        .ok_or_else(|| anyhow!("No todo with id {id}"))
}

fn print_result<W: Write>(todo: &Todo, json: bool, writer: &mut W) -> anyhow::Result<()> {
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(todo)?)?;
    } else {
        print_todos(std::slice::from_ref(todo), writer)?;
    }
    Ok(())
}

/// Print todos to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_todos<W: Write>(todos: &[Todo], writer: &mut W) -> std::io::Result<()> {
    if todos.is_empty() {
        writeln!(writer, "No todos found")?;
        return Ok(());
    }

    for todo in todos {
        let mark = if todo.is_completed() { "x" } else { " " };
        let id = todo
            .id()
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        writeln!(writer, "[{mark}] {id:>4}  {}", todo.title())?;
        if let Some(description) = todo.description() {
            writeln!(
                writer,
                "          {}",
                truncate_string(description, DESCRIPTION_PREVIEW_LEN)
            )?;
        }
    }
    Ok(())
}

/// Print collection statistics
///
/// # Errors
/// Returns an error if writing fails
pub fn print_stats<W: Write>(stats: &TodoStats, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "Total:     {}", stats.total)?;
    writeln!(writer, "Active:    {}", stats.active)?;
    writeln!(writer, "Completed: {}", stats.completed)?;
    Ok(())
}

/// Print the notification queue, oldest first
///
/// # Errors
/// Returns an error if writing fails
pub fn print_notifications<W: Write>(
    notifications: &[Notification],
    with_timestamps: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    for notification in notifications {
        if with_timestamps {
            write!(writer, "{} ", format_datetime(&notification.created_at))?;
        }
        write!(writer, "{:<7} ", notification.kind.as_str())?;
        match &notification.title {
            Some(title) => writeln!(writer, "{title}: {}", notification.message)?,
            None => writeln!(writer, "{}", notification.message)?,
        }
    }
    Ok(())
}
