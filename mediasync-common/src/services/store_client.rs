//! REST client for the remote video table
//!
//! Speaks the PostgREST dialect: upsert via `POST` with
//! `Prefer: resolution=merge-duplicates`, filtered `GET` queries and
//! single-row `PATCH` updates. Every request carries the service credential
//! both as `apikey` and as a bearer token.

use crate::config::StoreConfig;
use crate::models::StoreRow;
use crate::{Error, Result};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::USER_AGENT;

/// Upper bound on ids returned by the missing-duration query
pub const MISSING_DURATION_LIMIT: usize = 1000;

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";
const RETURN_REPRESENTATION: &str = "return=representation";
const COMBINED_MISSING_FILTER: &str = "(duration.is.null,duration_seconds.is.null)";
const STORE_TIMEOUT_SECS: u64 = 30;
const UPSERT_TIMEOUT_SECS: u64 = 20;

/// Result of a successful upsert
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertResponse {
    pub status: u16,
    /// Echoed rows as JSON, or the raw text when the body is not JSON
    pub body: Value,
}

impl UpsertResponse {
    /// Number of echoed rows, when the body is a JSON array
    pub fn row_count(&self) -> Option<usize> {
        self.body.as_array().map(Vec::len)
    }
}

/// Result of a single-row patch
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// Rows the store reports as updated
    Updated(Vec<Value>),
    /// Nothing matched; the row is gone or no longer matches
    NoOp,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    video_id: Option<String>,
}

/// Video table client
pub struct StoreClient {
    http_client: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(STORE_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    /// Insert or merge rows keyed by `video_id`, in one request
    pub async fn upsert(&self, rows: &[StoreRow]) -> Result<UpsertResponse> {
        tracing::debug!(rows = rows.len(), table = %self.config.table, "Upserting rows");

        let response = self
            .authorized(self.http_client.post(self.table_url()))
            .header("Prefer", UPSERT_PREFER)
            .timeout(Duration::from_secs(UPSERT_TIMEOUT_SECS))
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::StoreWrite {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(UpsertResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Ids of rows whose duration is unknown, at most [`MISSING_DURATION_LIMIT`].
    ///
    /// The combined `duration`/`duration_seconds` filter is tried first; if
    /// the store rejects it (e.g. the seconds column does not exist yet) the
    /// query is retried once with `duration` alone.
    pub async fn query_missing_durations(&self) -> Result<Vec<String>> {
        let limit = MISSING_DURATION_LIMIT.to_string();

        let combined = [
            ("select", "video_id"),
            ("or", COMBINED_MISSING_FILTER),
            ("limit", limit.as_str()),
        ];
        match self.query_ids(&combined).await {
            Ok(ids) => Ok(ids),
            Err(e) => {
                tracing::warn!(error = %e, "Combined missing-duration query failed, retrying with duration IS NULL only");
                let narrow = [
                    ("select", "video_id"),
                    ("duration", "is.null"),
                    ("limit", limit.as_str()),
                ];
                self.query_ids(&narrow).await
            }
        }
    }

    async fn query_ids(&self, params: &[(&str, &str)]) -> Result<Vec<String>> {
        let response = self
            .authorized(self.http_client.get(self.table_url()))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::StoreQuery {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<IdRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.video_id.filter(|id| !id.is_empty()))
            .collect())
    }

    /// Set the duration columns of one row
    pub async fn patch_duration(
        &self,
        video_id: &str,
        duration_iso: &str,
        duration_seconds: u64,
    ) -> Result<PatchOutcome> {
        let payload = serde_json::json!({
            "duration": duration_iso,
            "duration_seconds": duration_seconds,
        });

        let response = self
            .authorized(self.http_client.patch(self.table_url()))
            .query(&[("video_id", format!("eq.{}", video_id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::StoreWrite {
                status: status.as_u16(),
                body: text,
            });
        }

        let rows: Vec<Value> = if text.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&text)?
        };

        if rows.is_empty() {
            Ok(PatchOutcome::NoOp)
        } else {
            Ok(PatchOutcome::Updated(rows))
        }
    }
}
