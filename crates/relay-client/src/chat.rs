use crate::error::ClientError;
use crate::Result;
use relay_core::reconcile::{MessageCache, TempState};
use relay_core::types::{ChatMessage, Metadata, ResultEnvelope, Role, CLIENT_ID_KEY};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

// ─── ChatSession ──────────────────────────────────────────────────────────

/// Chat history with optimistic sends.
///
/// A submission appears in [`messages`](Self::messages) immediately under a
/// temporary id, is posted to the server with that id as `clientId`, and is
/// replaced by its permanent copy on the next [`refresh`](Self::refresh).
/// Only one submission may be in flight at a time.
pub struct ChatSession {
    http: reqwest::Client,
    base_url: String,
    cache: Mutex<MessageCache>,
    /// Where each unreconciled temporary was posted, so a retry goes back
    /// to the same endpoint.
    routes: Mutex<HashMap<String, Route>>,
    in_flight: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Message,
    Command,
}

impl Route {
    fn path(self) -> &'static str {
        match self {
            Route::Message => "/api/messages",
            Route::Command => "/api/command",
        }
    }
}

impl ChatSession {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Mutex::new(MessageCache::new()),
            routes: Mutex::new(HashMap::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Everything the UI should render, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.cache().messages()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn state(&self, temp_id: &str) -> Option<TempState> {
        self.cache().state(temp_id)
    }

    /// Fetch the authoritative history and drop reconciled temporaries.
    /// Returns the temporary ids that were replaced.
    pub async fn refresh(&self) -> Result<Vec<String>> {
        let response = self.http.get(self.url("/api/messages")).send().await?;
        let list: Vec<ChatMessage> = check(response).await?.json().await?;
        let reconciled = self.cache().apply_authoritative(list);
        if !reconciled.is_empty() {
            debug!(count = reconciled.len(), "reconciled optimistic messages");
            let mut routes = self.routes();
            for id in &reconciled {
                routes.remove(id);
            }
        }
        Ok(reconciled)
    }

    /// Store a plain chat message. Returns its temporary id.
    pub async fn submit(&self, content: &str) -> Result<String> {
        let _guard = self.begin()?;
        let temp_id = self.stage(content, Route::Message);
        self.deliver(&temp_id, Route::Message, content).await?;
        Ok(temp_id)
    }

    /// Run a command through the server; the input is shown optimistically
    /// and the reply arrives with the refreshed history.
    pub async fn send_command(&self, content: &str) -> Result<ResultEnvelope> {
        let _guard = self.begin()?;
        let temp_id = self.stage(content, Route::Command);
        let body = self.deliver(&temp_id, Route::Command, content).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Resubmit a message that previously failed, to the endpoint it was
    /// first sent to. A retried command returns its reply envelope.
    pub async fn retry(&self, temp_id: &str) -> Result<Option<ResultEnvelope>> {
        let _guard = self.begin()?;
        let message = self
            .cache()
            .retry(temp_id)
            .ok_or_else(|| ClientError::UnknownMessage(temp_id.to_string()))?;
        let route = self.routes().get(temp_id).copied().unwrap_or(Route::Message);
        let body = self.deliver(temp_id, route, &message.content).await?;
        match route {
            Route::Command => Ok(Some(serde_json::from_value(body)?)),
            Route::Message => Ok(None),
        }
    }

    fn stage(&self, content: &str, route: Route) -> String {
        let temp_id = self.cache().insert_optimistic(Role::User, content, Metadata::new());
        self.routes().insert(temp_id.clone(), route);
        temp_id
    }

    async fn deliver(&self, temp_id: &str, route: Route, content: &str) -> Result<Value> {
        let body = json!({
            "content": content,
            "metadata": { CLIENT_ID_KEY: temp_id },
        });
        let sent = async {
            let response = self.http.post(self.url(route.path())).json(&body).send().await?;
            let value: Value = check(response).await?.json().await?;
            Ok::<_, ClientError>(value)
        }
        .await;

        match sent {
            Ok(value) => {
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "history refresh after send failed");
                }
                Ok(value)
            }
            Err(e) => {
                warn!(temp_id, error = %e, "message delivery failed");
                self.cache().mark_failed(temp_id);
                Err(e)
            }
        }
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ClientError::Busy)?;
        Ok(InFlight(&self.in_flight))
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, MessageCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Route>> {
        self.routes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Clears the in-flight flag when the submission finishes, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        body,
    })
}
