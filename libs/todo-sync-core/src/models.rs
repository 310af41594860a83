//! Data models for todos and their wire representation

use serde::{Deserialize, Serialize};

/// Server-assigned todo identifier
pub type TodoId = i64;

/// A single task
///
/// Values are immutable: every transformation returns a new `Todo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Server-assigned id, `None` until persisted
    id: Option<TodoId>,
    /// Task title
    title: String,
    /// Optional free-form description
    description: Option<String>,
    /// Completion flag
    is_completed: bool,
}

impl Todo {
    /// Build a todo from all of its parts
    #[must_use]
    pub fn new(
        id: Option<TodoId>,
        title: impl Into<String>,
        description: Option<String>,
        is_completed: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description,
            is_completed,
        }
    }

    /// Create a draft todo that has not been persisted yet
    ///
    /// Callers must make sure `title` is non-empty after trimming before
    /// submitting the draft; see [`Todo::validate_title`].
    #[must_use]
    pub fn create(title: impl Into<String>, description: Option<String>) -> Self {
        Self::new(None, title, description, false)
    }

    /// Check that a title is usable for submission
    ///
    /// # Errors
    /// Returns `TodoError::Validation` if the title is blank
    pub fn validate_title(title: &str) -> crate::Result<()> {
        if title.trim().is_empty() {
            return Err(crate::TodoError::validation("Title cannot be empty"));
        }
        Ok(())
    }

    #[must_use]
    pub const fn id(&self) -> Option<TodoId> {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Whether the server has assigned an id
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Flip the completion flag
    #[must_use]
    pub fn toggle_completion(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Replace the title
    #[must_use]
    pub fn update_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Replace (or clear) the description
    #[must_use]
    pub fn update_description(&self, description: Option<String>) -> Self {
        Self {
            description,
            ..self.clone()
        }
    }
}

/// Request body sent to the remote service for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTodoInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub done: bool,
}

/// Todo as returned by the remote service; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTodo {
    #[serde(default)]
    pub id: Option<TodoId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

/// Map a remote todo into the domain, defaulting absent fields
#[must_use]
pub fn map_to_domain(remote: RemoteTodo) -> Todo {
    Todo::new(
        remote.id,
        remote.title.unwrap_or_default(),
        remote.description,
        remote.done.unwrap_or(false),
    )
}

/// Map a domain todo into the request body the remote service expects
#[must_use]
pub fn map_to_remote(todo: &Todo) -> RemoteTodoInput {
    RemoteTodoInput {
        title: todo.title.clone(),
        description: todo.description.clone(),
        done: todo.is_completed,
    }
}

/// Counts over the cached collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TodoStats {
    /// Compute the counts for a collection
    #[must_use]
    pub fn from_todos(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|t| t.is_completed()).count();
        Self {
            total: todos.len(),
            active: todos.len() - completed,
            completed,
        }
    }
}
