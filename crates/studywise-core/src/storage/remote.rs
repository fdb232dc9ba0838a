//! Session log backed by a remote StudyWise server.
//!
//! Talks to the `/users/{user_id}/sessions` and `/users/{user_id}/stats`
//! endpoints. The async client is driven through the current tokio handle,
//! so calls must come from a blocking thread inside a runtime
//! (e.g. `spawn_blocking`).

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{SessionLog, SessionRecord, SessionStats};
use crate::error::DatabaseError;
use crate::timer::PomodoroSession;

#[derive(Deserialize)]
struct Appended {
    id: i64,
}

pub struct HttpSessionLog {
    base_url: Url,
    client: Client,
}

impl HttpSessionLog {
    /// `base_url` is the server root, e.g. `http://localhost:3001/`.
    pub fn new(base_url: &str) -> Result<Self, DatabaseError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DatabaseError::Remote(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DatabaseError::Remote(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    fn endpoint(&self, user_id: &str, leaf: &str) -> Result<Url, DatabaseError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DatabaseError::Remote("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["users", user_id, leaf]);
        Ok(url)
    }

    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, DatabaseError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| DatabaseError::Remote(format!("no async runtime available: {e}")))?;
        Ok(handle.block_on(fut))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, DatabaseError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        Err(DatabaseError::Remote(format!("HTTP {status}: {text}")))
    }
}

fn remote(e: reqwest::Error) -> DatabaseError {
    DatabaseError::Remote(e.to_string())
}

impl SessionLog for HttpSessionLog {
    fn append(&self, user_id: &str, session: &PomodoroSession) -> Result<i64, DatabaseError> {
        let url = self.endpoint(user_id, "sessions")?;
        self.block_on(async {
            let resp = self.client.post(url).json(session).send().await.map_err(remote)?;
            let resp = Self::check(resp).await?;
            let body: Appended = resp.json().await.map_err(remote)?;
            Ok(body.id)
        })?
    }

    fn list(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut url = self.endpoint(user_id, "sessions")?;
        if let Some(limit) = limit {
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
        }
        self.block_on(async {
            let resp = self.client.get(url).send().await.map_err(remote)?;
            let resp = Self::check(resp).await?;
            resp.json::<Vec<SessionRecord>>().await.map_err(remote)
        })?
    }

    fn stats(&self, user_id: &str) -> Result<SessionStats, DatabaseError> {
        let url = self.endpoint(user_id, "stats")?;
        self.block_on(async {
            let resp = self.client.get(url).send().await.map_err(remote)?;
            let resp = Self::check(resp).await?;
            resp.json::<SessionStats>().await.map_err(remote)
        })?
    }
}
