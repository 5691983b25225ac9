//! Static offer catalog and demo session fixtures.
//!
//! All data here is mock state: the catalog stands in for live
//! mediation inventory, and the demo user/ledger seed a session the
//! way a login flow would.

use crate::types::{
    AdOffer, AdProvider, AdType, PlatformMetrics, Transaction, TxKind, TxStatus, User,
};
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};

/// The full candidate inventory handed to the mediation optimizer.
pub fn offer_catalog() -> Vec<AdOffer> {
    vec![
        AdOffer {
            id: "off_admob_1".into(),
            provider: "AdMob (Google)".into(),
            provider_id: AdProvider::Admob,
            title: "Clash Royale: Hero Quest".into(),
            description: "Experience the new arena with premium rewards.".into(),
            reward_coins: 150,
            cpm: 28.5,
            ad_type: AdType::Video,
            duration_seconds: Some(15),
            icon: "🏰".into(),
            fill_rate: 0.98,
            video_url: Some(
                "https://assets.mixkit.co/videos/preview/mixkit-animation-of-a-futuristic-city-with-neon-lights-40143-large.mp4"
                    .into(),
            ),
        },
        AdOffer {
            id: "off_unity_1".into(),
            provider: "Unity Ads".into(),
            provider_id: AdProvider::UnityAds,
            title: "Subway Surfers: Cyberpunk".into(),
            description: "Watch the trailer for exclusive in-game items.".into(),
            reward_coins: 120,
            cpm: 22.2,
            ad_type: AdType::Video,
            duration_seconds: Some(10),
            icon: "🏃".into(),
            fill_rate: 0.95,
            video_url: Some(
                "https://assets.mixkit.co/videos/preview/mixkit-driving-in-a-futuristic-city-at-night-40144-large.mp4"
                    .into(),
            ),
        },
        AdOffer {
            id: "off_applovin_1".into(),
            provider: "AppLovin MAX".into(),
            provider_id: AdProvider::Applovin,
            title: "Solitaire: Grand Harvest".into(),
            description: "Complete the tutorial to unlock vault access.".into(),
            reward_coins: 2800,
            cpm: 155.0,
            ad_type: AdType::Install,
            duration_seconds: None,
            icon: "🃏".into(),
            fill_rate: 0.88,
            video_url: None,
        },
        AdOffer {
            id: "off_ironsource_1".into(),
            provider: "IronSource".into(),
            provider_id: AdProvider::Ironsource,
            title: "Match 3: Masters Arena".into(),
            description: "Puzzle your way to crypto rewards.".into(),
            reward_coins: 90,
            cpm: 15.0,
            ad_type: AdType::Video,
            duration_seconds: Some(12),
            icon: "🧩".into(),
            fill_rate: 0.99,
            video_url: Some(
                "https://assets.mixkit.co/videos/preview/mixkit-futuristic-buildings-at-night-with-neon-lights-40145-large.mp4"
                    .into(),
            ),
        },
        AdOffer {
            id: "off_admob_2".into(),
            provider: "AdMob (Google)".into(),
            provider_id: AdProvider::Admob,
            title: "Coin Master: Viking Blitz".into(),
            description: "Join the raid and earn your daily chest.".into(),
            reward_coins: 180,
            cpm: 32.0,
            ad_type: AdType::Video,
            duration_seconds: Some(15),
            icon: "🐷".into(),
            fill_rate: 0.97,
            video_url: Some(
                "https://assets.mixkit.co/videos/preview/mixkit-rotating-hologram-of-a-human-head-40140-large.mp4"
                    .into(),
            ),
        },
        AdOffer {
            id: "off_pollfish_1".into(),
            provider: "Pollfish".into(),
            provider_id: AdProvider::Pollfish,
            title: "Global Tech Census 2025".into(),
            description: "High-yield 2-minute market research.".into(),
            reward_coins: 750,
            cpm: 85.0,
            ad_type: AdType::Survey,
            duration_seconds: None,
            icon: "📊".into(),
            fill_rate: 0.75,
            video_url: None,
        },
    ]
}

/// Validate every catalog entry against the offer invariants.
pub fn validate_catalog(offers: &[AdOffer]) -> Result<()> {
    for offer in offers {
        offer.validate()?;
    }
    Ok(())
}

/// The demo account a session boots with.
pub fn demo_user() -> User {
    User {
        id: "user_123".into(),
        username: "QuestMaster99".into(),
        email: "quest@example.com".into(),
        balance: 1250,
        xp: 450,
        level: 4,
        referral_code: "ADQ-8821".into(),
        referrals_count: 12,
        fraud_score: 5.0,
        is_flagged: false,
        total_earned: 5800,
        joined_date: NaiveDate::from_ymd_opt(2023, 10, 1).expect("valid fixture date"),
    }
}

/// Seed ledger entries, newest first.
pub fn demo_transactions() -> Vec<Transaction> {
    let now = Utc::now();
    vec![
        Transaction {
            id: "tx_1".into(),
            user_id: "user_123".into(),
            amount: 500,
            kind: TxKind::Earn,
            status: TxStatus::Completed,
            timestamp: now,
            description: "Unity Ads: Subway Surfers".into(),
        },
        Transaction {
            id: "tx_2".into(),
            user_id: "user_123".into(),
            amount: 50,
            kind: TxKind::Earn,
            status: TxStatus::Completed,
            timestamp: now - Duration::hours(1),
            description: "AdMob: Hero Quest".into(),
        },
        Transaction {
            id: "tx_3".into(),
            user_id: "user_123".into(),
            amount: 150,
            kind: TxKind::Referral,
            status: TxStatus::Completed,
            timestamp: now - Duration::days(1),
            description: "Network: Level 2 Bonus".into(),
        },
        Transaction {
            id: "tx_4".into(),
            user_id: "user_123".into(),
            amount: 1200,
            kind: TxKind::Withdraw,
            status: TxStatus::Pending,
            timestamp: now - Duration::days(2),
            description: "Vault: External Transfer".into(),
        },
    ]
}

/// Platform-wide aggregate figures for the admin panel.
pub fn platform_metrics() -> PlatformMetrics {
    PlatformMetrics {
        total_revenue: 452_000.0,
        total_payouts: 218_500.0,
        active_users: 84_200,
        average_cpm: 24.5,
        fraud_rate: 1.2,
        roi: 2.07,
    }
}

/// One day of the admin panel's revenue-vs-payout series.
#[derive(Debug, Clone)]
pub struct RevenuePoint {
    pub day: &'static str,
    pub revenue: f64,
    pub payouts: f64,
}

/// Weekly financial dynamics series backing the admin chart.
pub fn weekly_revenue_series() -> Vec<RevenuePoint> {
    vec![
        RevenuePoint { day: "Mon", revenue: 4200.0, payouts: 2100.0 },
        RevenuePoint { day: "Tue", revenue: 5500.0, payouts: 2800.0 },
        RevenuePoint { day: "Wed", revenue: 4800.0, payouts: 3100.0 },
        RevenuePoint { day: "Thu", revenue: 7200.0, payouts: 3400.0 },
        RevenuePoint { day: "Fri", revenue: 6900.0, payouts: 2900.0 },
        RevenuePoint { day: "Sat", revenue: 8400.0, payouts: 4200.0 },
        RevenuePoint { day: "Sun", revenue: 9200.0, payouts: 4100.0 },
    ]
}
