//! Probe to demonstrate the three mediation paths without a network

use adquest::catalog;
use adquest::mediation::{
    AdvisorConfig, CompletionModel, CompletionRequest, MediationAdvisor, MediationOptimizer,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber;

/// Stand-in oracle with a scripted reply.
struct ScriptedOracle {
    reply: Option<String>,
}

#[async_trait]
impl CompletionModel for ScriptedOracle {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(anyhow!("scripted transport failure")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let offers = catalog::offer_catalog();
    info!("Probing mediation over {} catalog offers", offers.len());

    let scenarios: Vec<(&str, Option<String>)> = vec![
        (
            "oracle ranks a subset",
            Some(r#"["off_applovin_1", "off_pollfish_1", "off_admob_2"]"#.to_string()),
        ),
        ("oracle selects nothing usable", Some("[]".to_string())),
        ("oracle replies with garbage", Some("definitely not json".to_string())),
        ("oracle transport fails", None),
    ];

    for (label, reply) in scenarios {
        let advisor = Arc::new(MediationAdvisor::new(
            Arc::new(ScriptedOracle { reply }),
            &AdvisorConfig::default(),
        ));
        let optimizer = MediationOptimizer::new(advisor);

        let presented = optimizer.optimize(&offers).await;
        info!("--- {} ---", label);
        for offer in &presented {
            info!("  {} (cpm {:.1})", offer.id, offer.cpm);
        }
    }

    Ok(())
}
