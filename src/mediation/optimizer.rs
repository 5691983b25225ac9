//! Mediation optimizer - turns the raw catalog into the presented list.
//!
//! The primary path asks the advisory oracle which offers to present.
//! Both fallback paths are total: a degenerate oracle selection keeps
//! the catalog head, and a transport failure drops to the classic
//! waterfall (cpm descending). The user always gets a usable list.

use crate::mediation::advisor::MediationAdvisor;
use crate::types::AdOffer;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Hard cap on how many offers a session is shown at once.
pub const MAX_PRESENTED_OFFERS: usize = 5;

/// Selects an ordered subset of the offer catalog for presentation.
pub struct MediationOptimizer {
    advisor: Arc<MediationAdvisor>,
}

impl MediationOptimizer {
    pub fn new(advisor: Arc<MediationAdvisor>) -> Self {
        Self { advisor }
    }

    /// Run one mediation auction over the catalog.
    ///
    /// Never returns more than [`MAX_PRESENTED_OFFERS`]; returns fewer
    /// only when the catalog itself is smaller. Never fails.
    #[instrument(skip(self, offers), fields(candidates = offers.len()))]
    pub async fn optimize(&self, offers: &[AdOffer]) -> Vec<AdOffer> {
        debug!("Starting mediation auction for current session");

        match self.advisor.rank_offers(offers).await {
            Ok(selected_ids) => {
                let wanted: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
                let optimized: Vec<AdOffer> = offers
                    .iter()
                    .filter(|offer| wanted.contains(offer.id.as_str()))
                    .take(MAX_PRESENTED_OFFERS)
                    .cloned()
                    .collect();

                if optimized.is_empty() {
                    // Degenerate selection: nothing matched the catalog.
                    warn!("Oracle selected no known offers; presenting catalog head");
                    offers.iter().take(MAX_PRESENTED_OFFERS).cloned().collect()
                } else {
                    info!(
                        "Auction complete. Selected {} high-yield providers",
                        optimized.len()
                    );
                    optimized
                }
            }
            Err(e) => {
                warn!("Mediation failed, falling back to standard waterfall: {:#}", e);
                waterfall_by_cpm(offers)
            }
        }
    }
}

/// Deterministic waterfall: top offers by cpm descending, ties keeping
/// catalog order.
pub fn waterfall_by_cpm(offers: &[AdOffer]) -> Vec<AdOffer> {
    let mut ranked: Vec<AdOffer> = offers.to_vec();
    // Stable sort, so equal-cpm offers stay in catalog order.
    ranked.sort_by(|a, b| b.cpm.partial_cmp(&a.cpm).unwrap_or(Ordering::Equal));
    ranked.truncate(MAX_PRESENTED_OFFERS);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::offer_catalog;
    use crate::types::{AdProvider, AdType};

    fn offer(id: &str, cpm: f64) -> AdOffer {
        AdOffer {
            id: id.to_string(),
            provider: "Unity Ads".into(),
            provider_id: AdProvider::UnityAds,
            title: id.to_string(),
            description: String::new(),
            reward_coins: 10,
            cpm,
            ad_type: AdType::Survey,
            duration_seconds: None,
            icon: "📊".into(),
            fill_rate: 0.9,
            video_url: None,
        }
    }

    #[test]
    fn waterfall_sorts_by_cpm_descending() {
        let presented = waterfall_by_cpm(&offer_catalog());
        assert_eq!(presented.len(), MAX_PRESENTED_OFFERS);
        assert_eq!(presented[0].id, "off_applovin_1");
        assert_eq!(presented[1].id, "off_pollfish_1");
        for pair in presented.windows(2) {
            assert!(pair[0].cpm >= pair[1].cpm);
        }
    }

    #[test]
    fn waterfall_breaks_ties_by_catalog_order() {
        let offers = vec![
            offer("a", 10.0),
            offer("b", 20.0),
            offer("c", 20.0),
            offer("d", 5.0),
        ];
        let presented = waterfall_by_cpm(&offers);
        assert_eq!(
            presented.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "c", "a", "d"]
        );
    }

    #[test]
    fn waterfall_handles_short_catalogs() {
        let offers = vec![offer("solo", 1.0)];
        assert_eq!(waterfall_by_cpm(&offers).len(), 1);
        assert!(waterfall_by_cpm(&[]).is_empty());
    }
}
