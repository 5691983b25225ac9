//! AdQuest - rewarded-advertising revenue core
//!
//! This crate provides the mediation, playback-verification, and
//! reward-settlement engine behind the AdQuest dashboard: an
//! AI-advised offer auction with deterministic fallbacks, a simulated
//! ad-verification state machine, and a session ledger for
//! settlements, referrals, and cashouts.

pub mod catalog;
pub mod mediation;
pub mod playback;
pub mod session;
pub mod types;
pub mod wallet;

// Re-export main types for convenience
pub use mediation::{MediationAdvisor, MediationOptimizer};
pub use playback::AdPlayer;
pub use session::Session;
pub use types::{AdOffer, Notice, Transaction, User};
