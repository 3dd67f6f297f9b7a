//! Conduit API task source.
//!
//! Lists the open and closed tasks tagged with the tracked project through
//! `maniphest.search`, then pulls their histories through
//! `maniphest.gettasktransactions`. Read-only: nothing is written back.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use boardpulse_core::{ConduitConfig, Task, TaskId};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{assemble_tasks, Result, SourceError, TaskListing, TaskSource};

/// Page size for `maniphest.search`.
const SEARCH_LIMIT: usize = 100;

/// Task ids per `maniphest.gettasktransactions` call.
const TRANSACTION_BATCH: usize = 100;

/// Envelope of every Conduit answer.
#[derive(Debug, Deserialize)]
struct ConduitResponse<T> {
    result: Option<T>,
    error_code: Option<String>,
    error_info: Option<String>,
}

impl<T> ConduitResponse<T> {
    fn into_result(self) -> Result<T> {
        if let Some(code) = self.error_code {
            return Err(SourceError::Conduit {
                code,
                info: self.error_info.unwrap_or_default(),
            });
        }
        self.result.ok_or_else(|| SourceError::Conduit {
            code: "ERR-EMPTY".to_string(),
            info: "response carried no result".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    data: Vec<SearchRow>,
    #[serde(default)]
    cursor: SearchCursor,
}

#[derive(Debug, Default, Deserialize)]
struct SearchCursor {
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    id: u64,
    fields: SearchFields,
}

#[derive(Debug, Deserialize)]
struct SearchFields {
    name: String,
}

/// Task source reading from a Conduit endpoint.
#[derive(Clone)]
pub struct ConduitSource {
    /// HTTP client
    client: Client,

    /// Base URL without trailing slash
    base_url: String,

    /// API token
    api_token: String,

    /// Tracked project
    project_phid: String,
}

impl ConduitSource {
    /// Create a source from connection settings.
    pub fn new(config: &ConduitConfig) -> Result<Self> {
        let api_token = config
            .api_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SourceError::Config("Conduit API token is not set".to_string()))?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token,
            project_phid: config.project_phid.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<(String, String)>) -> Result<T> {
        let mut form = vec![("api.token".to_string(), self.api_token.clone())];
        form.extend(params);

        debug!(method, "Calling Conduit");

        let response = self
            .client
            .post(format!("{}/api/{}", self.base_url, method))
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let envelope: ConduitResponse<T> = response.json().await?;
        envelope.into_result()
    }

    async fn list_tasks(&self) -> Result<Vec<TaskListing>> {
        let mut listings = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page: SearchPage = self
                .call("maniphest.search", search_params(&self.project_phid, after.as_deref()))
                .await?;

            listings.extend(page.data.into_iter().map(|row| TaskListing {
                id: TaskId::new(row.id),
                title: row.fields.name,
            }));

            match page.cursor.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        Ok(listings)
    }

    async fn fetch_logs(&self, ids: &[TaskId]) -> Result<HashMap<TaskId, Vec<Value>>> {
        let mut logs = HashMap::with_capacity(ids.len());

        for batch in ids.chunks(TRANSACTION_BATCH) {
            let result: Value = self
                .call("maniphest.gettasktransactions", transaction_params(batch))
                .await?;
            logs.extend(parse_transaction_map(result)?);
        }

        Ok(logs)
    }
}

#[async_trait]
impl TaskSource for ConduitSource {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let listings = self.list_tasks().await?;
        let ids: Vec<TaskId> = listings.iter().map(|l| l.id).collect();
        let logs = self.fetch_logs(&ids).await?;

        let tasks = assemble_tasks(listings, logs);
        info!(
            project = %self.project_phid,
            tasks = tasks.len(),
            "Fetched tasks from Conduit"
        );
        Ok(tasks)
    }
}

fn search_params(project_phid: &str, after: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![
        ("constraints[projects][0]".to_string(), project_phid.to_string()),
        ("limit".to_string(), SEARCH_LIMIT.to_string()),
    ];
    if let Some(cursor) = after {
        params.push(("after".to_string(), cursor.to_string()));
    }
    params
}

fn transaction_params(ids: &[TaskId]) -> Vec<(String, String)> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (format!("ids[{}]", i), id.get().to_string()))
        .collect()
}

/// Parse the `{"<id>": [transactions...]}` result.
///
/// An empty result comes back as `[]` rather than `{}`. Records are left
/// as JSON; a log that is not a list is dropped and the task skipped.
fn parse_transaction_map(result: Value) -> Result<HashMap<TaskId, Vec<Value>>> {
    match result {
        Value::Object(entries) => Ok(entries
            .into_iter()
            .filter_map(|(key, txs)| {
                let id = key.parse::<TaskId>().ok()?;
                match txs {
                    Value::Array(txs) => Some((id, txs)),
                    other => {
                        warn!(task = %id, log = %other, "Transaction log is not a list");
                        None
                    }
                }
            })
            .collect()),
        Value::Array(items) if items.is_empty() => Ok(HashMap::new()),
        other => Err(SourceError::Conduit {
            code: "ERR-SHAPE".to_string(),
            info: format!("unexpected transaction result: {}", other),
        }),
    }
}
