//! Remote todo service
//!
//! [`TodoService`] is the contract the synchronization layer consumes.
//! [`HttpTodoService`] implements it against the REST API.

use crate::config::ApiConfig;
use crate::error::{Result, TodoError, TransportError};
use crate::models::{RemoteTodo, RemoteTodoInput, TodoId};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use todo_sync_common::{join_url, TODOS_API_PATH};
use tracing::{debug, error, instrument};

/// CRUD operations offered by the remote todo store
///
/// Every failure is reported as [`TodoError::Transport`].
#[async_trait]
pub trait TodoService: Send + Sync {
    /// Fetch every todo
    async fn list_all(&self) -> Result<Vec<RemoteTodo>>;

    /// Fetch a single todo
    async fn get_by_id(&self, id: TodoId) -> Result<RemoteTodo>;

    /// Create a todo and return what the server stored
    async fn create(&self, input: RemoteTodoInput) -> Result<RemoteTodo>;

    /// Replace a todo
    async fn update(&self, id: TodoId, input: RemoteTodoInput) -> Result<()>;

    /// Delete a todo
    async fn delete(&self, id: TodoId) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`TodoService`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpTodoService {
    client: Client,
    base_url: String,
}

impl HttpTodoService {
    /// Build a client for the configured API
    ///
    /// # Errors
    /// Returns `TodoError::Configuration` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout().min(Duration::from_secs(10)))
            .build()
            .map_err(|e| TodoError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        join_url(&self.base_url, TODOS_API_PATH)
    }

    fn item_url(&self, id: TodoId) -> String {
        format!("{}/{id}", self.collection_url())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let server_message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());
        error!(status = status.as_u16(), ?server_message, "Remote todo service returned an error");
        Err(TransportError::http(status.as_u16(), server_message).into())
    }

    async fn decode<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_failure)?;
        if bytes.is_empty() || status == StatusCode::NO_CONTENT {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            TransportError::decode(status.as_u16(), format!("Invalid response body: {e}")).into()
        })
    }
}

fn transport_failure(e: reqwest::Error) -> TodoError {
    let transport = if e.is_timeout() {
        TransportError::network(format!("Network Error: request timed out ({e})"))
    } else if e.is_connect() || e.is_request() {
        TransportError::network(format!("Network Error: {e}"))
    } else if let Some(status) = e.status() {
        TransportError::http(status.as_u16(), None)
    } else {
        TransportError::network(e.to_string())
    };
    error!(error = %transport, "Request to remote todo service failed");
    transport.into()
}

#[async_trait]
impl TodoService for HttpTodoService {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<RemoteTodo>> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        let todos: Vec<RemoteTodo> = Self::decode(response).await?;
        debug!(count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: TodoId) -> Result<RemoteTodo> {
        let response = self.send(self.client.get(self.item_url(id))).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    async fn create(&self, input: RemoteTodoInput) -> Result<RemoteTodo> {
        let request = self.client.post(self.collection_url()).json(&input);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: TodoId, input: RemoteTodoInput) -> Result<()> {
        let request = self.client.put(self.item_url(id)).json(&input);
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: TodoId) -> Result<()> {
        self.send(self.client.delete(self.item_url(id))).await?;
        Ok(())
    }
}
