//! Alignment pipeline: the one implementation shared by every execution context.
//!
//! Flow: validate request → build prompt → retry{ generate → decode → validate result }
//!       → record history (if a store is attached) → return.
//!
//! The HTTP server attaches a history store; the CLI runs without one. Everything else
//! (schema, backoff constants, style thresholds) is identical.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::alignment::decoder::decode_model_output;
use crate::alignment::error::{AlignmentError, AttemptError};
use crate::alignment::history::{HistoryRecord, HistoryStore};
use crate::alignment::models::{AlignedResumeResult, AlignmentRequest};
use crate::alignment::prompts::{build_alignment_prompt, AlignmentStyle};
use crate::alignment::retry::{run_with_retry, AlignmentAttempt, RetryPolicy};
use crate::alignment::schema::aligned_resume_schema;
use crate::alignment::validator::validate_result;
use crate::llm_client::GenerationClient;

/// A successful alignment.
#[derive(Debug)]
pub struct AlignmentOutcome {
    pub result: AlignedResumeResult,
    pub style: AlignmentStyle,
    pub attempts: Vec<AlignmentAttempt>,
}

#[derive(Clone)]
pub struct AlignmentPipeline {
    generator: Arc<dyn GenerationClient>,
    history: Option<Arc<dyn HistoryStore>>,
    policy: RetryPolicy,
}

impl AlignmentPipeline {
    pub fn new(generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            generator,
            history: None,
            policy: RetryPolicy::default(),
        }
    }

    /// Records every success in `store`.
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Runs one alignment end to end.
    ///
    /// Invalid requests fail before the provider is contacted. A history write failure
    /// is logged and does not fail the alignment.
    pub async fn align(&self, request: &AlignmentRequest) -> Result<AlignmentOutcome, AlignmentError> {
        request.validate()?;

        let span = info_span!(
            "align",
            request_id = %Uuid::new_v4(),
            level = request.alignment_level
        );

        async move {
            let style = AlignmentStyle::from_level(request.alignment_level);
            info!(
                "Aligning resume with alignment level: {}% ({style})",
                request.alignment_level
            );

            let prompt = build_alignment_prompt(request);
            let schema = aligned_resume_schema();

            let retried =
                run_with_retry(&self.policy, |_| self.attempt(&prompt, &schema)).await?;

            info!(
                "Successfully aligned resume after {} attempt(s)",
                retried.attempts.len()
            );

            self.record(request, &retried.value).await;

            Ok::<_, AlignmentError>(AlignmentOutcome {
                result: retried.value,
                style,
                attempts: retried.attempts,
            })
        }
        .instrument(span)
        .await
    }

    /// generate → decode → validate, once.
    async fn attempt(&self, prompt: &str, schema: &Value) -> Result<AlignedResumeResult, AttemptError> {
        info!("Calling generation provider...");
        let raw = self.generator.generate(prompt, schema).await?;
        info!("Provider raw response length: {}", raw.len());

        let value = decode_model_output(&raw)?;
        Ok(validate_result(value)?)
    }

    async fn record(&self, request: &AlignmentRequest, result: &AlignedResumeResult) {
        let Some(store) = &self.history else {
            return;
        };

        let record = HistoryRecord::new(request, result.clone(), Utc::now());
        let key = record.key();
        match store.put(&key, &record).await {
            Ok(()) => info!(key = %key, "Alignment recorded in history"),
            Err(e) => error!(key = %key, "Failed to record alignment history: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::alignment::error::SchemaError;
    use crate::alignment::history::{HistoryError, InMemoryHistoryStore, HISTORY_PREFIX};
    use crate::alignment::retry::AttemptOutcome;
    use crate::llm_client::scripted::{auth_rejected, rate_limited, ScriptedClient};

    fn valid_json() -> String {
        json!({
            "alignedResume": {
                "name": "Jane Doe",
                "title": "Python Backend Engineer",
                "summary": "Backend engineer focused on Python services [INFERRED]",
                "experience": ["Designed REST APIs serving 1M requests/day [ENHANCED]"],
                "education": "BSc Computer Science"
            },
            "matchedSkills": ["Python", "REST"],
            "suggestedAdditions": ["Celery"],
            "improvements": ["Led with backend impact"],
            "companyInsights": "Looks for pragmatic backend engineers."
        })
        .to_string()
    }

    fn request() -> AlignmentRequest {
        AlignmentRequest::new(
            "Jane Doe\nEngineer\nBuilt internal tools in Python",
            "Looking for a Python backend engineer to own our API platform.",
            80,
        )
    }

    struct FailingStore;

    #[async_trait]
    impl HistoryStore for FailingStore {
        async fn put(&self, _key: &str, _record: &HistoryRecord) -> Result<(), HistoryError> {
            Err(HistoryError::Serialization(
                serde_json::from_str::<Value>("{").unwrap_err(),
            ))
        }

        async fn list_by_prefix(&self, _prefix: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_success_returns_result_unchanged_and_records_history() {
        let client = Arc::new(ScriptedClient::new([Ok(valid_json())]));
        let store = Arc::new(InMemoryHistoryStore::new());
        let pipeline = AlignmentPipeline::new(client.clone()).with_history(store.clone());

        let outcome = pipeline.align(&request()).await.unwrap();

        assert_eq!(outcome.style, AlignmentStyle::Aggressive);
        assert_eq!(
            serde_json::to_value(&outcome.result).unwrap(),
            serde_json::from_str::<Value>(&valid_json()).unwrap()
        );
        assert_eq!(client.calls(), 1);
        assert!(client.prompts()[0].contains("Alignment style: aggressive"));

        let keys = store.keys().await;
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(HISTORY_PREFIX));
        let stamp = keys[0].trim_start_matches(HISTORY_PREFIX);
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());

        let records = store.list_by_prefix(HISTORY_PREFIX).await.unwrap();
        assert_eq!(records[0].result, outcome.result);
        assert_eq!(records[0].alignment_level, 80);
    }

    #[tokio::test]
    async fn test_blank_resume_never_reaches_provider() {
        let client = Arc::new(ScriptedClient::new([Ok(valid_json())]));
        let pipeline = AlignmentPipeline::new(client.clone());

        let err = pipeline
            .align(&AlignmentRequest::new("", "Python role", 50))
            .await
            .unwrap_err();

        assert!(matches!(err, AlignmentError::Validation(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_then_success_waits_two_then_four_seconds() {
        let client = Arc::new(ScriptedClient::new([
            rate_limited(),
            rate_limited(),
            Ok(valid_json()),
        ]));
        let pipeline = AlignmentPipeline::new(client.clone());
        let start = Instant::now();

        let outcome = pipeline.align(&request()).await.unwrap();

        assert_eq!(client.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        let outcomes: Vec<AttemptOutcome> = outcome.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::RateLimited,
                AttemptOutcome::RateLimited,
                AttemptOutcome::Success
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_rate_limits_surface_rate_limited() {
        let client = Arc::new(ScriptedClient::new([
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Ok(valid_json()),
        ]));
        let store = Arc::new(InMemoryHistoryStore::new());
        let pipeline = AlignmentPipeline::new(client.clone()).with_history(store.clone());

        let err = pipeline.align(&request()).await.unwrap_err();

        assert!(matches!(err, AlignmentError::RateLimited { attempts: 3 }));
        assert_eq!(client.calls(), 3);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_rejection_is_not_retried() {
        let client = Arc::new(ScriptedClient::new([auth_rejected(), Ok(valid_json())]));
        let pipeline = AlignmentPipeline::new(client.clone());
        let start = Instant::now();

        let err = pipeline.align(&request()).await.unwrap_err();

        assert!(matches!(err, AlignmentError::AuthRejected { .. }));
        assert_eq!(client.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrapped_json_is_recovered() {
        let wrapped = format!("here is your result: {} thanks!", valid_json());
        let client = Arc::new(ScriptedClient::new([Ok(wrapped)]));
        let pipeline = AlignmentPipeline::new(client.clone());

        let outcome = pipeline.align(&request()).await.unwrap();
        assert_eq!(outcome.result.matched_skills, vec!["Python", "REST"]);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_response_is_retried_then_fails() {
        let incomplete = json!({
            "alignedResume": {"name": "A", "title": "B", "summary": "C", "experience": [], "education": "D"},
            "improvements": []
        })
        .to_string();
        let client = Arc::new(ScriptedClient::new([
            Ok(incomplete.clone()),
            Ok("not json at all".to_string()),
            Ok(incomplete),
        ]));
        let pipeline = AlignmentPipeline::new(client.clone());

        let err = pipeline.align(&request()).await.unwrap_err();

        assert_eq!(client.calls(), 3);
        match err {
            AlignmentError::Failed { attempts, last } => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    last,
                    AttemptError::from(SchemaError::MissingField("matchedSkills"))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_failure_does_not_fail_alignment() {
        let client = Arc::new(ScriptedClient::new([Ok(valid_json())]));
        let pipeline = AlignmentPipeline::new(client).with_history(Arc::new(FailingStore));

        assert!(pipeline.align(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_credential_maps_to_config_error() {
        let client = Arc::new(ScriptedClient::new([Err(
            crate::llm_client::GenerationError::MissingCredential,
        )]));
        let pipeline = AlignmentPipeline::new(client.clone());

        let err = pipeline.align(&request()).await.unwrap_err();
        assert!(matches!(err, AlignmentError::Config));
        assert_eq!(client.calls(), 1);
    }
}
