//! Payout methods and the cashout flow.
//!
//! Cashout is an independent flow over the same session state as
//! settlement: one precondition check, then an atomic
//! balance-zeroing paired with a pending WITHDRAW entry. The fee is
//! informational only - the real deduction belongs to a payment
//! backend this build does not have.

use crate::session::{next_entry_id, Session};
use crate::types::{Transaction, TxKind, TxStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Supported payout rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutChannel {
    Upi,
    Paypal,
}

/// Read-only payout configuration; exactly two fixed entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutMethod {
    pub id: PayoutChannel,
    pub name: String,
    pub fee_percent: f64,
    /// Minimum balance required to initiate a cashout
    pub min_coins: u32,
    pub processing_time: String,
}

/// The fixed payout method table.
pub fn payout_methods() -> Vec<PayoutMethod> {
    vec![
        PayoutMethod {
            id: PayoutChannel::Upi,
            name: "Direct UPI Hub".into(),
            fee_percent: 0.0,
            min_coins: 500,
            processing_time: "Instant".into(),
        },
        PayoutMethod {
            id: PayoutChannel::Paypal,
            name: "PayPal / Ledger".into(),
            fee_percent: 2.5,
            min_coins: 1000,
            processing_time: "1h - 4h".into(),
        },
    ]
}

/// Errors surfaced by the cashout flow. User-recoverable: nothing is
/// mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Minimum cashout is {required} coins")]
    InsufficientBalance { required: u32 },
}

/// Display quote for a prospective cashout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashoutQuote {
    /// Full pre-fee balance; this is what the ledger records
    pub gross: u32,
    pub fee: u32,
    /// What the payout rail advertises the user will receive
    pub net: u32,
}

impl CashoutQuote {
    pub fn for_balance(balance: u32, method: &PayoutMethod) -> Self {
        let fee = (balance as f64 * method.fee_percent / 100.0).floor() as u32;
        Self {
            gross: balance,
            fee,
            net: balance - fee,
        }
    }
}

impl Session {
    /// Initiate a withdrawal of the full balance over `method`.
    ///
    /// Fails without mutating anything when the balance is below the
    /// method's minimum. On success the WITHDRAW entry records the
    /// full pre-fee balance and the balance drops to zero, atomically.
    pub fn initiate_cashout(
        &mut self,
        method: &PayoutMethod,
    ) -> Result<&Transaction, WalletError> {
        let balance = self.user().balance;
        if balance < method.min_coins {
            warn!(
                "Cashout refused: balance {} below {} minimum of {}",
                balance, method.name, method.min_coins
            );
            return Err(WalletError::InsufficientBalance {
                required: method.min_coins,
            });
        }

        let quote = CashoutQuote::for_balance(balance, method);
        info!(
            "Cashout via {}: gross {}, fee {}, net {}",
            method.name, quote.gross, quote.fee, quote.net
        );

        let entry = Transaction {
            id: next_entry_id("tx_out"),
            user_id: self.user().id.clone(),
            amount: quote.gross,
            kind: TxKind::Withdraw,
            status: TxStatus::Pending,
            timestamp: Utc::now(),
            description: format!("Settlement: {}", method.name),
        };

        self.user_mut().balance = 0;
        Ok(self.prepend(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upi() -> PayoutMethod {
        payout_methods()
            .into_iter()
            .find(|m| m.id == PayoutChannel::Upi)
            .unwrap()
    }

    fn paypal() -> PayoutMethod {
        payout_methods()
            .into_iter()
            .find(|m| m.id == PayoutChannel::Paypal)
            .unwrap()
    }

    #[test]
    fn quote_floors_the_fee() {
        let quote = CashoutQuote::for_balance(1011, &paypal());
        // 2.5% of 1011 is 25.275, floored to 25.
        assert_eq!(quote.fee, 25);
        assert_eq!(quote.net, 986);
        assert_eq!(quote.gross, 1011);
    }

    #[test]
    fn zero_fee_method_quotes_full_balance() {
        let quote = CashoutQuote::for_balance(800, &upi());
        assert_eq!(quote.fee, 0);
        assert_eq!(quote.net, 800);
    }

    #[test]
    fn method_table_is_fixed() {
        let methods = payout_methods();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].min_coins, 500);
        assert_eq!(methods[1].min_coins, 1000);
    }
}
