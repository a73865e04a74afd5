// ============================================================================
// Ratio or / argent
// ============================================================================

use crate::models::{HistorySample, PriceSnapshot};

/// Onces d'argent pour une once d'or, None si un des prix est absent ou nul
pub fn gold_silver_ratio(gold: Option<f64>, silver: Option<f64>) -> Option<f64> {
    let gold = gold.filter(|v| v.is_finite() && *v != 0.0)?;
    let silver = silver.filter(|v| v.is_finite() && *v != 0.0)?;
    Some(gold / silver)
}

/// Ratio courant à partir des cotations internationales du snapshot
pub fn current_ratio(snapshot: &PriceSnapshot) -> Option<f64> {
    gold_silver_ratio(snapshot.intl_gold.price, snapshot.intl_silver.price)
}

/// Point de la série historique du ratio
#[derive(Debug, Clone, PartialEq)]
pub struct RatioPoint {
    /// "YYYY-MM-DD"
    pub day: String,
    pub ratio: f64,
}

/// Série historique : seules les lignes avec les deux prix sont gardées
pub fn ratio_history(samples: &[HistorySample]) -> Vec<RatioPoint> {
    samples
        .iter()
        .filter_map(|sample| {
            gold_silver_ratio(sample.intl_gold_usd_oz, sample.intl_silver_usd_oz).map(|ratio| RatioPoint {
                day: sample.day(),
                ratio,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_requires_both_prices() {
        assert_eq!(gold_silver_ratio(Some(2600.0), Some(32.5)), Some(80.0));
        assert_eq!(gold_silver_ratio(Some(2600.0), None), None);
        assert_eq!(gold_silver_ratio(Some(2600.0), Some(0.0)), None);
        assert_eq!(gold_silver_ratio(Some(0.0), Some(30.0)), None);
    }

    #[test]
    fn test_ratio_history_skips_incomplete_rows() {
        let samples = vec![
            HistorySample {
                ts: "2025-01-09T00:00:00".to_string(),
                intl_gold_usd_oz: Some(2500.0),
                intl_silver_usd_oz: Some(25.0),
                ..Default::default()
            },
            HistorySample {
                ts: "2025-01-10T00:00:00".to_string(),
                intl_gold_usd_oz: Some(2600.0),
                ..Default::default()
            },
        ];

        let series = ratio_history(&samples);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].day, "2025-01-09");
        assert_eq!(series[0].ratio, 100.0);
    }

    #[test]
    fn test_current_ratio_from_snapshot() {
        let mut snapshot = PriceSnapshot::default();
        assert_eq!(current_ratio(&snapshot), None);
        snapshot.intl_gold.price = Some(3000.0);
        snapshot.intl_silver.price = Some(30.0);
        assert_eq!(current_ratio(&snapshot), Some(100.0));
    }
}
