//! Core types and data structures for the AdQuest revenue system.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mediation providers the platform can source inventory from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdProvider {
    Admob,
    UnityAds,
    Applovin,
    Ironsource,
    Pollfish,
}

impl fmt::Display for AdProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AdProvider::Admob => "ADMOB",
            AdProvider::UnityAds => "UNITY_ADS",
            AdProvider::Applovin => "APPLOVIN",
            AdProvider::Ironsource => "IRONSOURCE",
            AdProvider::Pollfish => "POLLFISH",
        };
        f.write_str(tag)
    }
}

/// Offer formats supported by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdType {
    Video,
    Install,
    Survey,
}

/// A single presentable ad unit from a mediation provider.
///
/// Offers are immutable once loaded from the catalog; the serialized
/// form (camelCase) is what gets embedded into advisory prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdOffer {
    pub id: String,
    /// Provider display name, e.g. "AdMob (Google)"
    pub provider: String,
    pub provider_id: AdProvider,
    pub title: String,
    pub description: String,
    /// Coins credited to the user on completion
    pub reward_coins: u32,
    /// Cost per mille, the platform-side valuation used for ranking
    pub cpm: f64,
    #[serde(rename = "type")]
    pub ad_type: AdType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Display glyph shown on the offer card
    pub icon: String,
    /// Likelihood the creative loads successfully, in [0, 1]
    pub fill_rate: f64,
    /// Playable asset for VIDEO offers; offers without one run simulated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl AdOffer {
    /// Whether this offer carries a playable asset.
    pub fn has_playable_asset(&self) -> bool {
        self.ad_type == AdType::Video && self.video_url.is_some()
    }

    /// Catalog invariants: `fill_rate` must stay within [0, 1].
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.fill_rate) {
            anyhow::bail!(
                "offer {} has fill_rate {} outside [0, 1]",
                self.id,
                self.fill_rate
            );
        }
        if !self.cpm.is_finite() || self.cpm < 0.0 {
            anyhow::bail!("offer {} has invalid cpm {}", self.id, self.cpm);
        }
        Ok(())
    }
}

/// The session's user account. Mutated only through [`crate::session::Session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Spendable coin balance
    pub balance: u32,
    /// Lifetime experience points, monotonically non-decreasing
    pub xp: u32,
    /// Derived from xp; see [`User::level_for_xp`]
    pub level: u32,
    pub referral_code: String,
    pub referrals_count: u32,
    pub fraud_score: f64,
    pub is_flagged: bool,
    /// Cumulative EARN settlements, monotonically non-decreasing
    pub total_earned: u32,
    pub joined_date: NaiveDate,
}

impl User {
    /// Level curve: one level per 1000 XP, starting at level 1.
    pub fn level_for_xp(xp: u32) -> u32 {
        xp / 1000 + 1
    }
}

/// Direction/category of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Earn,
    Withdraw,
    Referral,
}

/// Lifecycle state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

/// One ledger entry. Entries are never mutated after creation; the
/// ledger is the strict audit trail for every balance change in the
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub amount: u32,
    pub kind: TxKind,
    pub status: TxStatus,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Notification events emitted by session mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The settlement pushed the user over a level boundary
    LevelUp { level: u32 },
    /// Plain settlement credit
    Settled { coins: u32 },
    /// A referred user generated commission
    Referral { coins: u32, referred: String },
}

impl Notice {
    /// User-facing toast text.
    pub fn message(&self) -> String {
        match self {
            Notice::LevelUp { level } => format!("PROMOTED: Reached Level {}!", level),
            Notice::Settled { coins } => format!("SETTLEMENT: +{} Coins.", coins),
            Notice::Referral { coins, referred } => {
                format!("NETWORK: +{} Coins from {}.", coins, referred)
            }
        }
    }
}

/// Session telemetry handed to the fraud audit. Serialized (camelCase)
/// straight into the audit prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub user_id: String,
    pub session_minutes: u32,
    pub offers_completed: u32,
    /// Mean seconds between offer launch and completion
    pub avg_completion_seconds: f64,
    pub device_fingerprint: String,
    pub ip_changes: u32,
}

/// Aggregate platform figures shown on the admin panel. Static mock
/// numbers in this build; a reporting backend would supply them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub total_revenue: f64,
    pub total_payouts: f64,
    pub active_users: u32,
    pub average_cpm: f64,
    /// Percentage of traffic flagged as fraudulent
    pub fraud_rate: f64,
    pub roi: f64,
}

impl PlatformMetrics {
    /// Inverse of the fraud rate, as displayed on the admin panel.
    pub fn integrity_score(&self) -> f64 {
        100.0 - self.fraud_rate
    }

    /// Revenue retained after payouts.
    pub fn net_margin(&self) -> f64 {
        self.total_revenue - self.total_payouts
    }
}
