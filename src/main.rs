//! Main entry point for the AdQuest revenue core demo
//!
//! Runs one full session end to end: mediation auction, offer
//! playback with reward verification, settlement, fraud audit, and a
//! cashout attempt.

use adquest::catalog;
use adquest::mediation::{AdvisorConfig, GeminiClient, MediationAdvisor, MediationOptimizer};
use adquest::playback::{AdPlayer, PlayerEvent, PlayerMode};
use adquest::session::Session;
use adquest::types::{ActivityLog, AdOffer};
use adquest::wallet::{self, CashoutQuote};
use anyhow::{Context, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting AdQuest revenue core demo");

    let offers = catalog::offer_catalog();
    catalog::validate_catalog(&offers)?;

    let config = AdvisorConfig::from_env();
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set; advisory calls will resolve to their fallbacks");
    }
    let model = Arc::new(GeminiClient::new(config.clone())?);
    let advisor = Arc::new(MediationAdvisor::new(model, &config));
    let optimizer = MediationOptimizer::new(advisor.clone());

    // Mediation auction over the full catalog
    let presented = optimizer.optimize(&offers).await;
    info!("Presenting {} offers:", presented.len());
    for offer in &presented {
        info!(
            "  {} {} (+{} coins, cpm {:.1}, fill {:.0}%)",
            offer.icon,
            offer.title,
            offer.reward_coins,
            offer.cpm,
            offer.fill_rate * 100.0
        );
    }

    let (mut session, mut notices) =
        Session::new(catalog::demo_user(), catalog::demo_transactions());

    let insight = advisor.earnings_advice(session.user()).await;
    info!("Live insight: \"{}\"", insight);

    // Play the top offer through verification
    let offer = presented
        .first()
        .cloned()
        .context("Mediation produced no offers to present")?;
    info!("Launching offer: {}", offer.title);

    if let Some(done) = run_playback(offer).await {
        session.settle(&done);
        if let Ok(notice) = notices.try_recv() {
            info!("{}", notice.message());
        }
    }

    // Audit this session's telemetry
    let activity = ActivityLog {
        user_id: session.user().id.clone(),
        session_minutes: 12,
        offers_completed: 1,
        avg_completion_seconds: 6.0,
        device_fingerprint: "pixel-8a-3f9c".into(),
        ip_changes: 0,
    };
    let audit = advisor.fraud_audit(&activity).await;
    info!(
        "Fraud audit: risk {:.0}/100 ({})",
        audit.risk_score, audit.reason
    );

    // Wallet: quote and attempt a cashout over UPI
    let methods = wallet::payout_methods();
    let upi = &methods[0];
    let quote = CashoutQuote::for_balance(session.user().balance, upi);
    info!(
        "Cashout quote via {}: gross {}, fee {}, net {}",
        upi.name, quote.gross, quote.fee, quote.net
    );
    match session.initiate_cashout(upi) {
        Ok(entry) => info!("Withdrawal pending: {} coins ({})", entry.amount, entry.id),
        Err(e) => warn!("Cashout refused: {}", e),
    }

    // Admin snapshot
    let metrics = catalog::platform_metrics();
    info!(
        "Platform: integrity {:.1}%, ROI {:.2}, {} active users",
        metrics.integrity_score(),
        metrics.roi,
        metrics.active_users
    );
    if let Some(peak) = catalog::weekly_revenue_series()
        .iter()
        .max_by(|a, b| a.revenue.total_cmp(&b.revenue))
    {
        info!("Peak revenue day: {} (${:.0})", peak.day, peak.revenue);
    }

    info!(
        "Session ledger holds {} entries; head: {}",
        session.ledger().len(),
        session.ledger()[0].description
    );
    info!("Share link: {}", session.referral_link());

    Ok(())
}

/// Drive one offer's playback to completion, emulating the asset
/// callbacks a video surface would deliver. Returns the offer once
/// verification completes.
async fn run_playback(offer: AdOffer) -> Option<AdOffer> {
    let (mut player, mut events) = AdPlayer::new(offer.clone());
    player.start();

    if player.mode() == PlayerMode::Live {
        // Sample the fill rate once to decide whether the creative loads.
        let loads = rand::thread_rng().gen_bool(offer.fill_rate.clamp(0.0, 1.0));
        if loads {
            let duration = f64::from(offer.duration_seconds.unwrap_or(15));
            let mut position = 0.0;
            while position < duration {
                position += duration / 10.0;
                player.report_position(position, duration);
                tokio::time::sleep(Duration::from_millis(120)).await;
            }
            player.asset_ended();
        } else {
            warn!("Creative failed to load; failing over to simulated verification");
            player.fail_over();
        }
    }

    while let Some(event) = events.recv().await {
        match event {
            PlayerEvent::Log(line) => info!("{}", line),
            PlayerEvent::Progress { progress, phase } => {
                if progress % 25 == 0 {
                    debug!("{}% - {}", progress, phase.label());
                }
            }
            PlayerEvent::Completed(done) => {
                info!("Verification complete for {}", done.title);
                return Some(done);
            }
        }
    }
    None
}
