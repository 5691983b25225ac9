//! Session context - the single owner of user and ledger state.
//!
//! All balance/XP mutations in the app go through [`Session`] methods,
//! each of which pairs its user mutation with exactly one ledger
//! entry. The ledger is append-only and newest-first; entries are
//! never edited after creation.

use crate::types::{AdOffer, Notice, Transaction, TxKind, TxStatus, User};
use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;

/// Flat XP award per completed offer, independent of offer size.
pub const XP_PER_COMPLETION: u32 = 50;

/// One user session: account state, the transaction ledger, and the
/// notice channel feeding UI toasts.
pub struct Session {
    user: User,
    ledger: Vec<Transaction>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Session {
    /// Open a session over an account and its seed ledger. The
    /// returned receiver yields every notice the session emits.
    pub fn new(
        user: User,
        seed_ledger: Vec<Transaction>,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        (
            Self {
                user,
                ledger: seed_ledger,
                notices,
            },
            receiver,
        )
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Ledger entries, newest first.
    pub fn ledger(&self) -> &[Transaction] {
        &self.ledger
    }

    /// Settle a completed offer: credit the reward, award XP,
    /// recompute the level, and append the EARN entry. One atomic
    /// update - callers never observe the user changed without the
    /// matching ledger entry.
    pub fn settle(&mut self, offer: &AdOffer) -> &Transaction {
        let new_xp = self.user.xp + XP_PER_COMPLETION;
        let new_level = User::level_for_xp(new_xp);
        let notice = if new_level > self.user.level {
            Notice::LevelUp { level: new_level }
        } else {
            Notice::Settled {
                coins: offer.reward_coins,
            }
        };

        self.user.balance += offer.reward_coins;
        self.user.total_earned += offer.reward_coins;
        self.user.xp = new_xp;
        self.user.level = new_level;

        let entry = Transaction {
            id: next_entry_id(&format!("tx_{}", offer.provider_id.to_string().to_lowercase())),
            user_id: self.user.id.clone(),
            amount: offer.reward_coins,
            kind: TxKind::Earn,
            status: TxStatus::Completed,
            timestamp: Utc::now(),
            description: format!("{}: {}", offer.provider, offer.title),
        };

        info!(
            "Settled offer {}: +{} coins, balance now {}",
            offer.id, offer.reward_coins, self.user.balance
        );
        self.notify(notice);
        self.prepend(entry)
    }

    /// Credit referral commission from a referred user's activity.
    /// Touches balance and the referral counter, never `total_earned`
    /// (that field tracks EARN settlements only).
    pub fn credit_referral(&mut self, coins: u32, referred: &str) -> &Transaction {
        self.user.balance += coins;
        self.user.referrals_count += 1;

        let entry = Transaction {
            id: next_entry_id("tx_ref"),
            user_id: self.user.id.clone(),
            amount: coins,
            kind: TxKind::Referral,
            status: TxStatus::Completed,
            timestamp: Utc::now(),
            description: format!("Network: Commission from {}", referred),
        };

        info!("Referral commission: +{} coins from {}", coins, referred);
        self.notify(Notice::Referral {
            coins,
            referred: referred.to_string(),
        });
        self.prepend(entry)
    }

    /// The join URL carrying this user's referral code.
    pub fn referral_link(&self) -> String {
        format!("https://adquest.app/join?ref={}", self.user.referral_code)
    }

    pub(crate) fn user_mut(&mut self) -> &mut User {
        &mut self.user
    }

    /// Prepend an entry and return a reference to it.
    pub(crate) fn prepend(&mut self, entry: Transaction) -> &Transaction {
        self.ledger.insert(0, entry);
        &self.ledger[0]
    }

    pub(crate) fn notify(&self, notice: Notice) {
        // The UI may have dropped its receiver during shutdown;
        // notices are best-effort.
        let _ = self.notices.send(notice);
    }
}

/// Freshly generated ledger entry id: prefix, creation millis, and a
/// random nonce to separate entries created in the same instant.
pub(crate) fn next_entry_id(prefix: &str) -> String {
    let nonce: u16 = rand::thread_rng().gen();
    format!("{}_{}_{:04x}", prefix, Utc::now().timestamp_millis(), nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{demo_transactions, demo_user, offer_catalog};

    #[test]
    fn settlement_prepends_matching_ledger_entry() {
        let (mut session, mut notices) = Session::new(demo_user(), demo_transactions());
        let offer = &offer_catalog()[0];
        let before = session.user().balance;

        let entry = session.settle(offer);
        assert_eq!(entry.kind, TxKind::Earn);
        assert_eq!(entry.status, TxStatus::Completed);
        assert_eq!(entry.amount, offer.reward_coins);
        assert_eq!(entry.description, "AdMob (Google): Clash Royale: Hero Quest");

        assert_eq!(session.user().balance, before + offer.reward_coins);
        assert_eq!(session.ledger()[0].amount, offer.reward_coins);
        assert_eq!(
            notices.try_recv().unwrap(),
            Notice::Settled {
                coins: offer.reward_coins
            }
        );
    }

    #[test]
    fn referral_credit_leaves_total_earned_alone() {
        let (mut session, mut notices) = Session::new(demo_user(), Vec::new());
        let earned_before = session.user().total_earned;
        let referrals_before = session.user().referrals_count;

        session.credit_referral(150, "NeonHarvester");

        assert_eq!(session.user().total_earned, earned_before);
        assert_eq!(session.user().referrals_count, referrals_before + 1);
        assert_eq!(session.ledger()[0].kind, TxKind::Referral);
        assert!(matches!(
            notices.try_recv().unwrap(),
            Notice::Referral { coins: 150, .. }
        ));
    }

    #[test]
    fn referral_link_carries_code() {
        let (session, _notices) = Session::new(demo_user(), Vec::new());
        assert_eq!(
            session.referral_link(),
            "https://adquest.app/join?ref=ADQ-8821"
        );
    }

    #[test]
    fn entry_ids_carry_prefix() {
        let id = next_entry_id("tx_admob");
        assert!(id.starts_with("tx_admob_"));
    }
}
