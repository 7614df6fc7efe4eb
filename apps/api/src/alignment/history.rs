//! History recorder: an append-only log of successful alignments in a key-value store.
//!
//! Keys are `alignment:<ISO-8601 timestamp>`, so they sort chronologically. Records are
//! written once and never mutated. There is no deletion policy.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::alignment::models::{AlignedResumeResult, AlignmentRequest};

pub const HISTORY_PREFIX: &str = "alignment:";
/// Characters of each input kept in a history record.
pub const TRUNCATE_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One stored alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub resume_text: String,
    pub job_description: String,
    pub alignment_level: u8,
    pub result: AlignedResumeResult,
    pub timestamp: String,
}

impl HistoryRecord {
    pub fn new(request: &AlignmentRequest, result: AlignedResumeResult, at: DateTime<Utc>) -> Self {
        Self {
            resume_text: truncate_chars(&request.resume_text, TRUNCATE_CHARS),
            job_description: truncate_chars(&request.job_description, TRUNCATE_CHARS),
            alignment_level: request.alignment_level,
            result,
            timestamp: iso_timestamp(at),
        }
    }

    pub fn key(&self) -> String {
        format!("{HISTORY_PREFIX}{}", self.timestamp)
    }
}

/// `2024-05-01T12:30:45.123Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// First `max` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Key-value store backing the history log.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn put(&self, key: &str, record: &HistoryRecord) -> Result<(), HistoryError>;

    /// All records whose key starts with `prefix`, ordered by key.
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<HistoryRecord>, HistoryError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisHistoryStore {
    client: Client,
}

impl RedisHistoryStore {
    /// Opens the client and verifies the connection with `PING`.
    pub async fn connect(redis_url: &str) -> Result<Self, HistoryError> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis history store connected");
        Ok(Self { client })
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn put(&self, key: &str, record: &HistoryRecord) -> Result<(), HistoryError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(key, json).await?;
        debug!(key = %key, "Stored history record");
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pattern = format!("{prefix}*");

        let mut keys = Vec::new();
        let mut cursor = 0u64;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort();
        keys.dedup();

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            // Absent if deleted between SCAN and GET.
            let data: Option<String> = conn.get(&key).await?;
            if let Some(json) = data {
                records.push(serde_json::from_str(&json)?);
            }
        }
        Ok(records)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-process
// ────────────────────────────────────────────────────────────────────────────

/// Ordered in-memory store. Used when no Redis URL is configured, and in tests.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: RwLock<BTreeMap<String, HistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn put(&self, key: &str, record: &HistoryRecord) -> Result<(), HistoryError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .entries
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }
}
