//! Test utilities: an in-memory [`TodoService`] and sample data

use crate::error::{Result, TransportError};
use crate::models::{RemoteTodo, RemoteTodoInput, Todo, TodoId};
use crate::service::TodoService;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::watch;

/// Remote operation, used to target failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Self; 5] = [
        Self::List,
        Self::Get,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];
}

#[derive(Debug, Default)]
struct MockState {
    todos: Vec<RemoteTodo>,
    next_id: TodoId,
    failures: HashMap<Operation, VecDeque<TransportError>>,
    calls: HashMap<Operation, usize>,
}

/// In-memory todo server
///
/// Failures can be queued per operation, and [`MockTodoService::hold`]
/// keeps requests waiting until [`MockTodoService::release`] so a test can
/// look at the optimistic state.
#[derive(Debug)]
pub struct MockTodoService {
    state: Mutex<MockState>,
    /// Operations whose requests are currently held
    held: watch::Sender<HashSet<Operation>>,
}

impl Default for MockTodoService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTodoService {
    #[must_use]
    pub fn new() -> Self {
        let (held, _) = watch::channel(HashSet::new());
        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            }),
            held,
        }
    }

    /// Seed the server with todos; ids are kept when present
    #[must_use]
    pub fn with_todos(todos: &[Todo]) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.lock();
            for todo in todos {
                let id = todo.id().unwrap_or(state.next_id);
                state.next_id = state.next_id.max(id + 1);
                state.todos.push(RemoteTodo {
                    id: Some(id),
                    title: Some(todo.title().to_string()),
                    description: todo.description().map(str::to_string),
                    done: Some(todo.is_completed()),
                });
            }
        }
        service
    }

    /// Make the next call to `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: TransportError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Hold every request until [`MockTodoService::release`]
    pub fn hold(&self) {
        self.held.send_replace(Operation::ALL.into_iter().collect());
    }

    /// Hold requests for one operation only
    pub fn hold_operation(&self, operation: Operation) {
        self.held.send_modify(|held| {
            held.insert(operation);
        });
    }

    /// Let every held request through
    pub fn release(&self) {
        self.held.send_replace(HashSet::new());
    }

    pub fn release_operation(&self, operation: Operation) {
        self.held.send_modify(|held| {
            held.remove(&operation);
        });
    }

    /// Number of calls made to `operation`, including held ones
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    /// Wait until `operation` has been called at least `count` times
    ///
    /// # Panics
    /// Panics if that does not happen within five seconds
    pub async fn wait_for_calls(&self, operation: Operation, count: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls(operation) < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for {operation:?} calls");
    }

    /// Server-side contents
    #[must_use]
    pub fn server_todos(&self) -> Vec<RemoteTodo> {
        self.state.lock().todos.clone()
    }

    /// Change a todo behind the client's back
    pub fn set_server_done(&self, id: TodoId, done: bool) {
        if let Some(todo) = self
            .state
            .lock()
            .todos
            .iter_mut()
            .find(|t| t.id == Some(id))
        {
            todo.done = Some(done);
        }
    }

    async fn enter(&self, operation: Operation) -> Result<()> {
        *self.state.lock().calls.entry(operation).or_default() += 1;

        let mut held = self.held.subscribe();
        // the sender lives as long as self
        let _ = held.wait_for(|held| !held.contains(&operation)).await;

        let failure = self
            .state
            .lock()
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn not_found() -> TransportError {
        TransportError::http(404, Some("Todo not found".to_string()))
    }
}

#[async_trait]
impl TodoService for MockTodoService {
    async fn list_all(&self) -> Result<Vec<RemoteTodo>> {
        self.enter(Operation::List).await?;
        Ok(self.state.lock().todos.clone())
    }

    async fn get_by_id(&self, id: TodoId) -> Result<RemoteTodo> {
        self.enter(Operation::Get).await?;
        self.state
            .lock()
            .todos
            .iter()
            .find(|t| t.id == Some(id))
            .cloned()
            .ok_or_else(|| Self::not_found().into())
    }

    async fn create(&self, input: RemoteTodoInput) -> Result<RemoteTodo> {
        self.enter(Operation::Create).await?;
        if input.title.trim().is_empty() {
            return Err(TransportError::http(400, Some("Title is required".to_string())).into());
        }
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let created = RemoteTodo {
            id: Some(id),
            title: Some(input.title),
            description: input.description,
            done: Some(input.done),
        };
        state.todos.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: TodoId, input: RemoteTodoInput) -> Result<()> {
        self.enter(Operation::Update).await?;
        let mut state = self.state.lock();
        let todo = state
            .todos
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or_else(Self::not_found)?;
        todo.title = Some(input.title);
        todo.description = input.description;
        todo.done = Some(input.done);
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        self.enter(Operation::Delete).await?;
        let mut state = self.state.lock();
        let before = state.todos.len();
        state.todos.retain(|t| t.id != Some(id));
        if state.todos.len() == before {
            return Err(Self::not_found().into());
        }
        Ok(())
    }
}

/// Three persisted todos: "Buy milk" (active), "Write report" (done) and
/// "Call mom" (active, with a description)
#[must_use]
pub fn sample_todos() -> Vec<Todo> {
    vec![
        Todo::new(Some(1), "Buy milk", None, false),
        Todo::new(Some(2), "Write report", Some("Quarterly numbers".to_string()), true),
        Todo::new(Some(3), "Call mom", Some("Sunday afternoon".to_string()), false),
    ]
}
