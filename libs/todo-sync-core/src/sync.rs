//! Todo synchronization layer
//!
//! [`TodoStore`] owns the local todo cache and runs every mutation against a
//! [`TodoService`]. Update, toggle and delete are applied to the cache
//! immediately, rolled back from a snapshot when the request fails, and
//! reconciled with a full refetch when it succeeds. Create waits for the
//! server because there is no id to apply optimistically.
//!
//! Every failure is classified, shown through the [`NotificationCenter`] and
//! returned to the caller.

use crate::error::{Result, TodoError};
use crate::filter::{project_localized, FilterCriteria, SortDirection, StatusFilter};
use crate::messages::{Catalog, MessageKey};
use crate::models::{map_to_domain, map_to_remote, Todo, TodoId, TodoStats};
use crate::notifications::NotificationCenter;
use crate::observability::record_mutation;
use crate::service::TodoService;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationState {
    /// Nothing in flight for the todo
    Idle,
    /// Optimistic change applied, request outstanding
    Pending,
    /// Request succeeded, reconciliation under way
    Committed,
    /// Request failed, snapshot restored
    RolledBack,
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    todos: Vec<Todo>,
    /// Bumped by every optimistic mutation; reads started under an older
    /// generation are discarded.
    generation: u64,
    /// Fetches currently outstanding
    loading: usize,
    /// Optimistic mutations not yet settled
    in_flight: usize,
    /// A fetch was discarded while mutations were outstanding; the last one
    /// to settle refetches
    stale: bool,
    error: bool,
    criteria: FilterCriteria,
    adding: bool,
    /// Per-todo mutation state keyed by the generation that started it
    mutations: HashMap<TodoId, (u64, MutationState)>,
}

impl StoreState {
    fn transition(&mut self, id: TodoId, ticket: u64, to: MutationState) {
        // a newer mutation on the same id owns the entry
        let Some(entry) = self.mutations.get_mut(&id).filter(|e| e.0 == ticket) else {
            return;
        };
        debug!(id, from = %entry.1, to = %to, "Mutation transition");
        if to == MutationState::Idle {
            self.mutations.remove(&id);
        } else {
            entry.1 = to;
        }
    }
}

/// Local cache of todos kept in sync with a remote service
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct TodoStore {
    service: Arc<dyn TodoService>,
    notifications: NotificationCenter,
    catalog: Catalog,
    state: Arc<Mutex<StoreState>>,
}

impl fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TodoStore")
            .field("todos", &state.todos.len())
            .field("generation", &state.generation)
            .field("loading", &state.loading)
            .field("in_flight", &state.in_flight)
            .finish_non_exhaustive()
    }
}

impl TodoStore {
    /// Create an empty store
    ///
    /// Call [`TodoStore::refresh`] to load the initial collection.
    pub fn new(service: Arc<dyn TodoService>, notifications: NotificationCenter) -> Self {
        let catalog = notifications.catalog();
        Self {
            service,
            notifications,
            catalog,
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Current cache contents, in server order
    #[must_use]
    pub fn todos(&self) -> Vec<Todo> {
        self.state.lock().todos.clone()
    }

    /// Look a cached todo up by id
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.state
            .lock()
            .todos
            .iter()
            .find(|t| t.id() == Some(id))
            .cloned()
    }

    /// The cache projected through the current filter criteria
    #[must_use]
    pub fn displayed_todos(&self) -> Vec<Todo> {
        let state = self.state.lock();
        project_localized(&state.todos, &state.criteria, self.catalog.locale())
    }

    #[must_use]
    pub fn stats(&self) -> TodoStats {
        TodoStats::from_todos(&self.state.lock().todos)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading > 0
    }

    /// Whether the last fetch failed
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.state.lock().error
    }

    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        self.state.lock().criteria.clone()
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        self.state.lock().criteria = criteria;
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        self.state.lock().criteria.search_term = term.into();
    }

    pub fn set_filter(&self, filter: StatusFilter) {
        self.state.lock().criteria.filter = filter;
    }

    pub fn set_sort_direction(&self, direction: SortDirection) {
        self.state.lock().criteria.sort_direction = direction;
    }

    #[must_use]
    pub fn is_adding_task(&self) -> bool {
        self.state.lock().adding
    }

    pub fn set_adding_task(&self, adding: bool) {
        self.state.lock().adding = adding;
    }

    /// State of the newest mutation issued for `id`
    #[must_use]
    pub fn mutation_state(&self, id: TodoId) -> MutationState {
        self.state
            .lock()
            .mutations
            .get(&id)
            .map_or(MutationState::Idle, |(_, state)| *state)
    }

    /// Fetch the full collection and replace the cache
    ///
    /// A response that arrives after an optimistic mutation has started is
    /// dropped so it cannot overwrite the optimistic value. If that mutation
    /// is still outstanding the cache is marked stale and refetched once the
    /// last outstanding mutation settles; otherwise the fetch is reissued
    /// immediately.
    ///
    /// # Errors
    /// Returns the transport failure. Failures of a fetch that was not
    /// superseded are also surfaced as a notification.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        loop {
            let generation = {
                let mut state = self.state.lock();
                state.loading += 1;
                state.generation
            };

            let result = self.service.list_all().await;

            let mut state = self.state.lock();
            state.loading -= 1;
            let superseded = state.generation != generation;
            match result {
                Ok(_) if superseded && state.in_flight == 0 => {
                    debug!(
                        started = generation,
                        current = state.generation,
                        "Fetch superseded by settled mutations, refetching"
                    );
                }
                Ok(_) if superseded => {
                    state.stale = true;
                    debug!(
                        started = generation,
                        current = state.generation,
                        "Discarding superseded fetch"
                    );
                    return Ok(());
                }
                Ok(remote) => {
                    state.todos = remote.into_iter().map(map_to_domain).collect();
                    state.error = false;
                    state.stale = false;
                    debug!(count = state.todos.len(), "Cache refreshed");
                    return Ok(());
                }
                Err(e) if superseded => {
                    state.stale = true;
                    drop(state);
                    debug!(error = %e, "Superseded fetch failed");
                    return Err(e);
                }
                Err(e) => {
                    state.error = true;
                    drop(state);
                    warn!(error = %e, "Failed to fetch todos");
                    self.notifications.notify_failure(&e);
                    return Err(e);
                }
            }
        }
    }

    async fn reconcile(&self) {
        // refresh() has already surfaced the failure
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Reconciliation fetch failed");
        }
    }

    /// Count a mutation as settled and run a refetch that an earlier
    /// superseded fetch left pending
    async fn settle(&self) {
        let refetch = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0 && state.stale
        };
        if refetch {
            debug!("Refetching stale cache");
            self.reconcile().await;
        }
    }

    /// Create a todo on the server
    ///
    /// Nothing is inserted locally until the server has assigned an id; the
    /// cache is then refetched.
    ///
    /// # Errors
    /// Returns `TodoError::Validation` for a blank title without contacting
    /// the server, or the transport failure after surfacing it
    #[instrument(skip(self, draft), fields(title = %draft.title()))]
    pub async fn create_todo(&self, draft: Todo) -> Result<Todo> {
        if let Err(e) = Todo::validate_title(draft.title()) {
            warn!(error = %e, "Rejecting todo with blank title");
            record_mutation("create", "rejected");
            return Err(e);
        }

        match self.service.create(map_to_remote(&draft)).await {
            Ok(remote) => {
                let created = map_to_domain(remote);
                info!(id = ?created.id(), "Todo created");
                record_mutation("create", "committed");
                self.set_adding_task(false);
                self.notifications
                    .show_success(self.catalog.text(MessageKey::TaskCreated), None, None);
                self.reconcile().await;
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create todo");
                record_mutation("create", "failed");
                self.notifications.notify_failure(&e);
                Err(e)
            }
        }
    }

    /// Replace a todo with an edited version
    ///
    /// # Errors
    /// Returns `TodoError::MissingId` for an unsaved todo, or the transport
    /// failure after rolling back and surfacing it
    #[instrument(skip(self, todo), fields(id = ?todo.id()))]
    pub async fn update_todo(&self, todo: Todo) -> Result<()> {
        let id = require_id(&todo, "update")?;
        let input = map_to_remote(&todo);
        let replacement = todo.clone();
        self.run_optimistic(
            "update",
            id,
            move |todos| replace_by_id(todos, id, replacement),
            self.service.update(id, input),
            self.catalog.text(MessageKey::TaskUpdated),
        )
        .await
    }

    /// Flip a todo's completion flag
    ///
    /// Returns the toggled todo once the server has accepted it.
    ///
    /// # Errors
    /// Returns `TodoError::MissingId` for an unsaved todo, or the transport
    /// failure after rolling back and surfacing it
    #[instrument(skip(self, todo), fields(id = ?todo.id()))]
    pub async fn toggle_todo_completion(&self, todo: &Todo) -> Result<Todo> {
        let id = require_id(todo, "toggle")?;
        let toggled = todo.toggle_completion();
        let message = if todo.is_completed() {
            MessageKey::TaskMarkedIncomplete
        } else {
            MessageKey::TaskMarkedComplete
        };
        let replacement = toggled.clone();
        self.run_optimistic(
            "toggle",
            id,
            move |todos| replace_by_id(todos, id, replacement),
            self.service.update(id, map_to_remote(&toggled)),
            self.catalog.text(message),
        )
        .await?;
        Ok(toggled)
    }

    /// Delete a todo
    ///
    /// # Errors
    /// Returns `TodoError::MissingId` for an unsaved todo, or the transport
    /// failure after rolling back and surfacing it
    #[instrument(skip(self, todo), fields(id = ?todo.id()))]
    pub async fn delete_todo(&self, todo: &Todo) -> Result<()> {
        let id = require_id(todo, "delete")?;
        self.delete_todo_by_id(id).await
    }

    /// Delete a todo by id
    ///
    /// # Errors
    /// Returns the transport failure after rolling back and surfacing it
    #[instrument(skip(self))]
    pub async fn delete_todo_by_id(&self, id: TodoId) -> Result<()> {
        self.run_optimistic(
            "delete",
            id,
            move |todos| todos.retain(|t| t.id() != Some(id)),
            self.service.delete(id),
            self.catalog.text(MessageKey::TaskDeleted),
        )
        .await
    }

    /// Snapshot, apply, send; then commit and reconcile or roll back
    async fn run_optimistic<A, F>(
        &self,
        operation: &'static str,
        id: TodoId,
        apply: A,
        request: F,
        success_message: &str,
    ) -> Result<()>
    where
        A: FnOnce(&mut Vec<Todo>),
        F: Future<Output = Result<()>>,
    {
        let (snapshot, ticket) = {
            let mut state = self.state.lock();
            let snapshot = state.todos.clone();
            state.generation += 1;
            let ticket = state.generation;
            state.in_flight += 1;
            apply(&mut state.todos);
            state
                .mutations
                .insert(id, (ticket, MutationState::Pending));
            debug!(id, operation, generation = ticket, "Optimistic change applied");
            (snapshot, ticket)
        };

        match request.await {
            Ok(()) => {
                info!(id, operation, "Mutation committed");
                record_mutation(operation, "committed");
                self.state
                    .lock()
                    .transition(id, ticket, MutationState::Committed);
                self.notifications.show_success(success_message, None, None);
                self.reconcile().await;
                self.settle().await;
                self.state.lock().transition(id, ticket, MutationState::Idle);
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    state.todos = snapshot;
                    state.transition(id, ticket, MutationState::RolledBack);
                    state.transition(id, ticket, MutationState::Idle);
                }
                warn!(id, operation, error = %e, "Mutation failed, cache rolled back");
                record_mutation(operation, "rolled_back");
                self.notifications.notify_failure(&e);
                self.settle().await;
                Err(e)
            }
        }
    }
}

fn require_id(todo: &Todo, operation: &'static str) -> Result<TodoId> {
    todo.id().ok_or_else(|| {
        record_mutation(operation, "rejected");
        TodoError::missing_id(operation)
    })
}

fn replace_by_id(todos: &mut [Todo], id: TodoId, replacement: Todo) {
    if let Some(slot) = todos.iter_mut().find(|t| t.id() == Some(id)) {
        *slot = replacement;
    }
}
