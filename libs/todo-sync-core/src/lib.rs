//! Todo Sync Core - Client-side synchronization for a remote todo list
//!
//! This library keeps a local todo cache consistent with a REST backend
//! using optimistic updates with snapshot rollback, derives filtered and
//! sorted views of the cache, and queues user-facing notifications.
//!
//! # Features
//!
//! - **Optimistic Mutations**: update, toggle and delete show up in the cache
//!   before the server answers and are rolled back if it refuses
//! - **Reconciliation**: every committed mutation is followed by a full refetch
//! - **View Filtering**: pure status/search/sort projection of the cache
//! - **Notifications**: bounded queue with auto-expiry and error de-duplication
//! - **Error Classification**: transport failures mapped to user messages
//! - **Localized Texts**: English, French and Spanish message catalogs
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_sync_core::{
//!     load_config, Catalog, HttpTodoService, NotificationCenter, Todo, TodoError, TodoStore,
//! };
//!
//! # async fn example() -> Result<(), TodoError> {
//! let config = load_config()?;
//! let service = Arc::new(HttpTodoService::new(&config.api)?);
//! let notifications =
//!     NotificationCenter::new(config.notifications.clone(), Catalog::new(config.locale));
//! let store = TodoStore::new(service, notifications);
//!
//! store.refresh().await?;
//! store.create_todo(Todo::create("Buy milk", None)).await?;
//!
//! for todo in store.displayed_todos() {
//!     println!("{}", todo.title());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `observability`: record `metrics` counters for mutations and notifications
//! - `test-utils`: in-memory `MockTodoService` and sample data for tests

pub mod config;
pub mod config_loader;
pub mod error;
pub mod filter;
pub mod messages;
pub mod models;
pub mod notifications;
pub mod observability;
pub mod service;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ApiConfig, ClientConfig, LoggingConfig, NotificationConfig};
pub use config_loader::{load_config, load_config_with_paths, ConfigLoader};
pub use error::{Result, TodoError, TransportError};
pub use filter::{
    project, project_localized, FilterCriteria, FilterCriteriaBuilder, SortDirection,
    StatusFilter,
};
pub use messages::{Catalog, Locale, MessageKey};
pub use models::{map_to_domain, map_to_remote, RemoteTodo, RemoteTodoInput, Todo, TodoId, TodoStats};
pub use notifications::{
    classify_failure, ErrorNotice, Failure, NewNotification, Notification, NotificationCenter,
    NotificationId, NotificationType,
};
pub use observability::{init_tracing, init_tracing_with_writer, ObservabilityError};
pub use service::{HttpTodoService, TodoService};
pub use sync::{MutationState, TodoStore};
