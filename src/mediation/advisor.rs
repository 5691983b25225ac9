//! Advisory oracle client for the mediation engine.
//!
//! All three operations here are one-shot calls against an external
//! text/JSON completion service. The fail-open policy is structural:
//! every error is converted to a documented fallback value at this
//! boundary, so no caller ever sees the oracle as unavailable.

use crate::types::{ActivityLog, AdOffer, User};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Advice returned when the oracle replies with empty text.
const ADVICE_ON_EMPTY_REPLY: &str =
    "Optimize video stream density to maximize Level 5 yield targets.";
/// Advice returned when the oracle call fails outright.
const ADVICE_ON_FAILURE: &str = "Prioritize high-CPM video streams for maximum session ROI.";

/// Configuration for the advisory oracle transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Opaque API credential, supplied out-of-band
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub request_timeout_seconds: u64,
    pub requests_per_second: u32,
    pub advice_cache_ttl_seconds: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            request_timeout_seconds: 20,
            requests_per_second: 2,
            advice_cache_ttl_seconds: 300,
        }
    }
}

impl AdvisorConfig {
    /// Build a config from the environment (`GEMINI_API_KEY`).
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            ..Self::default()
        }
    }
}

/// One outbound completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Natural-language instruction, with any JSON payload embedded
    pub prompt: String,
    /// Response schema constraint; `None` requests free text
    pub response_schema: Option<serde_json::Value>,
}

/// Transport seam for the completion service. Production uses
/// [`GeminiClient`]; tests substitute deterministic stand-ins.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Issue exactly one completion request and return the raw text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// reqwest-backed client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    config: AdvisorConfig,
}

impl GeminiClient {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client for advisory oracle")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    #[instrument(skip(self, request))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("No advisory API credential configured"))?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, api_key
        );

        let mut body = json!({
            "contents": [{ "parts": [{ "text": &request.prompt }] }]
        });
        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Advisory oracle request failed")?
            .error_for_status()
            .context("Advisory oracle returned an error status")?;

        let payload: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode advisory oracle response body")?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("Advisory oracle response carried no text candidate"))?;

        Ok(text.to_string())
    }
}

/// Result of a fraud-risk audit over session telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAudit {
    /// Risk score in [0, 100]
    pub risk_score: f64,
    pub reason: String,
}

impl FraudAudit {
    /// Fallback verdict when the audit call fails.
    pub fn bypass() -> Self {
        Self {
            risk_score: 5.0,
            reason: "Manual audit bypass enabled".to_string(),
        }
    }
}

/// Fail-open guard: run a single advisory operation and collapse any
/// error into the supplied fallback. Exactly one outbound attempt, no
/// retries.
pub(crate) async fn or_fallback<T, F>(op: F, fallback: impl FnOnce() -> T) -> T
where
    F: Future<Output = Result<T>>,
{
    match op.await {
        Ok(value) => value,
        Err(e) => {
            warn!("Advisory call failed, using fallback: {:#}", e);
            fallback()
        }
    }
}

/// High-level advisory operations used by the mediation flow.
///
/// Owns the transport, an outbound rate limit, and a TTL cache for
/// advice strings so dashboard refreshes don't re-bill the oracle.
pub struct MediationAdvisor {
    model: Arc<dyn CompletionModel>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    advice_cache: Cache<String, String>,
}

impl MediationAdvisor {
    pub fn new(model: Arc<dyn CompletionModel>, config: &AdvisorConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap()),
        );
        let advice_cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(config.advice_cache_ttl_seconds))
            .build();
        Self {
            model,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            advice_cache,
        }
    }

    /// Issue one rate-limited completion request.
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.rate_limiter.until_ready().await;
        self.model.complete(&request).await
    }

    /// Ask the oracle to pick the ids of the offers worth presenting.
    ///
    /// A reply that is not a JSON array of strings counts as "the
    /// oracle selected nothing" and yields `Ok(vec![])`; only
    /// transport errors surface as `Err`, for the optimizer's
    /// deterministic fallback.
    #[instrument(skip(self, offers), fields(candidates = offers.len()))]
    pub async fn rank_offers(&self, offers: &[AdOffer]) -> Result<Vec<String>> {
        let bids = serde_json::to_string(offers).context("Failed to serialize offer bids")?;
        let prompt = format!(
            "You are an Ad-Tech Mediation Engine. Analyze these bids from AdMob, Unity, and AppLovin. \
             Select the 5 highest-CPM offers that maintain a high ROI. \
             Bids: {bids}. \
             Return ONLY a JSON array of the selected offer IDs. Prioritize high CPM and high fillRate."
        );
        let request = CompletionRequest {
            prompt,
            response_schema: Some(json!({
                "type": "ARRAY",
                "items": { "type": "STRING" }
            })),
        };

        let text = self.complete(request).await?;
        let selected: Vec<String> = serde_json::from_str(&text).unwrap_or_default();
        debug!("Oracle selected {} offer ids", selected.len());
        Ok(selected)
    }

    /// Short strategic advice for the user's dashboard. Total: any
    /// failure resolves to one of two fixed literals.
    #[instrument(skip(self, user), fields(user = %user.id))]
    pub async fn earnings_advice(&self, user: &User) -> String {
        if let Some(cached) = self.advice_cache.get(&user.id).await {
            debug!("Serving cached earnings advice");
            return cached;
        }

        let prompt = format!(
            "As an AI Revenue Specialist, give a short, punchy (15-20 words) strategic advice for this user. \
             User Data: Level {}, XP {}, Balance {}. \
             Focus on scaling, referral network, or high-yield video ads. Use a technical, \"elite\" tone.",
            user.level, user.xp, user.balance
        );
        let request = CompletionRequest {
            prompt,
            response_schema: None,
        };

        let advice = or_fallback(
            async {
                let text = self.complete(request).await?;
                let text = text.trim();
                Ok(if text.is_empty() {
                    ADVICE_ON_EMPTY_REPLY.to_string()
                } else {
                    text.to_string()
                })
            },
            || ADVICE_ON_FAILURE.to_string(),
        )
        .await;

        self.advice_cache.insert(user.id.clone(), advice.clone()).await;
        advice
    }

    /// Audit session telemetry for fraud signatures. Total: any
    /// failure resolves to the bypass verdict.
    #[instrument(skip(self, activity), fields(user = %activity.user_id))]
    pub async fn fraud_audit(&self, activity: &ActivityLog) -> FraudAudit {
        let audit = or_fallback(
            async {
                let log = serde_json::to_string(activity)
                    .context("Failed to serialize activity log")?;
                let prompt = format!(
                    "Audit this user telemetry for fraud signatures (proxy usage, click-farming, emulator UUIDs). \
                     Log: {log}. Return risk score (0-100) and reason."
                );
                let request = CompletionRequest {
                    prompt,
                    response_schema: Some(json!({
                        "type": "OBJECT",
                        "properties": {
                            "riskScore": { "type": "NUMBER" },
                            "reason": { "type": "STRING" }
                        },
                        "required": ["riskScore", "reason"]
                    })),
                };
                let text = self.complete(request).await?;
                if text.trim().is_empty() {
                    return Ok(FraudAudit {
                        risk_score: 0.0,
                        reason: "Verified User".to_string(),
                    });
                }
                serde_json::from_str::<FraudAudit>(&text)
                    .context("Audit reply did not match the declared schema")
            },
            FraudAudit::bypass,
        )
        .await;

        FraudAudit {
            risk_score: audit.risk_score.clamp(0.0, 100.0),
            ..audit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo_user, offer_catalog};

    struct CannedModel(Result<String, ()>);

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(anyhow!("simulated transport failure")),
            }
        }
    }

    fn advisor(reply: Result<String, ()>) -> MediationAdvisor {
        MediationAdvisor::new(Arc::new(CannedModel(reply)), &AdvisorConfig::default())
    }

    #[tokio::test]
    async fn rank_offers_treats_garbage_as_empty_selection() {
        let advisor = advisor(Ok("not json at all".to_string()));
        let ids = advisor.rank_offers(&offer_catalog()).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn rank_offers_surfaces_transport_errors() {
        let advisor = advisor(Err(()));
        assert!(advisor.rank_offers(&offer_catalog()).await.is_err());
    }

    #[tokio::test]
    async fn advice_falls_back_on_failure_and_empty_reply() {
        let failed = advisor(Err(()));
        assert_eq!(failed.earnings_advice(&demo_user()).await, ADVICE_ON_FAILURE);

        let empty = advisor(Ok("   ".to_string()));
        assert_eq!(
            empty.earnings_advice(&demo_user()).await,
            ADVICE_ON_EMPTY_REPLY
        );
    }

    struct CountingModel(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl CompletionModel for CountingModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("Scale your referral mesh.".to_string())
        }
    }

    #[tokio::test]
    async fn advice_is_cached_per_user() {
        let model = Arc::new(CountingModel(std::sync::atomic::AtomicUsize::new(0)));
        let advisor = MediationAdvisor::new(model.clone(), &AdvisorConfig::default());
        let user = demo_user();

        let first = advisor.earnings_advice(&user).await;
        let second = advisor.earnings_advice(&user).await;
        assert_eq!(first, second);
        // The second read came from the cache, not the oracle.
        assert_eq!(model.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fraud_audit_bypasses_on_any_failure() {
        let activity = ActivityLog {
            user_id: "user_123".into(),
            session_minutes: 42,
            offers_completed: 7,
            avg_completion_seconds: 12.5,
            device_fingerprint: "pixel-8a-3f9c".into(),
            ip_changes: 1,
        };

        let failed = advisor(Err(()));
        assert_eq!(failed.fraud_audit(&activity).await, FraudAudit::bypass());

        let malformed = advisor(Ok("{\"unexpected\": true}".to_string()));
        assert_eq!(malformed.fraud_audit(&activity).await, FraudAudit::bypass());
    }

    #[tokio::test]
    async fn fraud_audit_clamps_out_of_range_scores() {
        let advisor = advisor(Ok(
            "{\"riskScore\": 240.0, \"reason\": \"Emulator UUID reuse\"}".to_string(),
        ));
        let activity = ActivityLog {
            user_id: "user_123".into(),
            session_minutes: 3,
            offers_completed: 60,
            avg_completion_seconds: 0.8,
            device_fingerprint: "qemu-generic".into(),
            ip_changes: 14,
        };
        let audit = advisor.fraud_audit(&activity).await;
        assert_eq!(audit.risk_score, 100.0);
        assert_eq!(audit.reason, "Emulator UUID reuse");
    }
}
