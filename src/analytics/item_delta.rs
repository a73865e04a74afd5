// ============================================================================
// Variations de prix d'un produit (SJC / Phú Quý)
// ============================================================================
// Pour l'historique d'un produit sélectionné, compare le dernier point :
// - au point immédiatement précédent, quelle que soit sa date
// - au dernier point du jour calendaire précédent (jour UTC), en sautant
//   les points du même jour
//
// L'entrée est triée par timestamp avant le calcul ; les points dont le
// timestamp ne se parse pas sont ignorés.
// ============================================================================

use chrono::{DateTime, Utc};

use crate::models::{parse_timestamp, ItemSample};

/// Variation entre une valeur et sa référence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDelta {
    pub absolute: f64,
    /// None quand la référence vaut exactement 0
    pub percent: Option<f64>,
}

impl PriceDelta {
    /// None si l'une des deux valeurs manque
    pub fn between(current: Option<f64>, baseline: Option<f64>) -> Option<Self> {
        let current = current.filter(|v| v.is_finite())?;
        let baseline = baseline.filter(|v| v.is_finite())?;
        let absolute = current - baseline;
        let percent = (baseline != 0.0).then(|| absolute / baseline * 100.0);
        Some(Self { absolute, percent })
    }
}

/// Variations achat et vente par rapport à un point de référence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideDeltas {
    pub buy: Option<PriceDelta>,
    pub sell: Option<PriceDelta>,
}

impl SideDeltas {
    fn compare(latest: &ItemSample, baseline: Option<&ItemSample>) -> Self {
        match baseline {
            Some(base) => Self {
                buy: PriceDelta::between(latest.buy_price, base.buy_price),
                sell: PriceDelta::between(latest.sell_price, base.sell_price),
            },
            None => Self::default(),
        }
    }
}

/// Résultat complet pour l'en-tête de la modale produit
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDeltas {
    pub latest: ItemSample,
    pub vs_previous: SideDeltas,
    pub vs_previous_day: SideDeltas,
}

/// Calcule les deux variations ; None si aucun point exploitable
pub fn compute_item_deltas(samples: &[ItemSample]) -> Option<ItemDeltas> {
    let sorted = sort_by_timestamp(samples);
    let (latest_ts, latest) = sorted.last()?;
    let latest_day = latest_ts.date_naive();

    let previous = sorted.len().checked_sub(2).map(|i| sorted[i].1);
    let previous_day = sorted
        .iter()
        .rev()
        .find(|(ts, _)| ts.date_naive() < latest_day)
        .map(|(_, sample)| *sample);

    Some(ItemDeltas {
        latest: (*latest).clone(),
        vs_previous: SideDeltas::compare(latest, previous),
        vs_previous_day: SideDeltas::compare(latest, previous_day),
    })
}

/// Tri stable par timestamp UTC, en écartant les timestamps illisibles
fn sort_by_timestamp(samples: &[ItemSample]) -> Vec<(DateTime<Utc>, &ItemSample)> {
    let mut parsed: Vec<(DateTime<Utc>, &ItemSample)> = samples
        .iter()
        .filter_map(|sample| parse_timestamp(&sample.ts).map(|ts| (ts, sample)))
        .collect();
    parsed.sort_by_key(|(ts, _)| *ts);
    parsed
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_day_samples_are_skipped_for_previous_day() {
        let samples = vec![
            ItemSample::new("2025-01-09T15:00:00", Some(9.0), Some(9.5)),
            ItemSample::new("2025-01-10T08:00:00", Some(10.0), Some(10.5)),
            ItemSample::new("2025-01-10T14:00:00", Some(12.0), Some(12.5)),
        ];

        let deltas = compute_item_deltas(&samples).unwrap();

        assert_eq!(deltas.vs_previous.buy.unwrap().absolute, 2.0);
        assert_eq!(deltas.vs_previous_day.buy.unwrap().absolute, 3.0);
        assert_eq!(deltas.vs_previous_day.sell.unwrap().absolute, 3.0);
        assert_eq!(deltas.latest.buy_price, Some(12.0));
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let samples = vec![
            ItemSample::new("2025-01-10T14:00:00", Some(12.0), None),
            ItemSample::new("2025-01-09T15:00:00", Some(9.0), None),
            ItemSample::new("2025-01-10T08:00:00", Some(10.0), None),
        ];

        let deltas = compute_item_deltas(&samples).unwrap();
        assert_eq!(deltas.vs_previous.buy.unwrap().absolute, 2.0);
        assert_eq!(deltas.vs_previous_day.buy.unwrap().absolute, 3.0);
        assert_eq!(deltas.vs_previous.sell, None);
    }

    #[test]
    fn test_zero_baseline_has_no_percent() {
        let samples = vec![
            ItemSample::new("2025-01-09T08:00:00", Some(0.0), None),
            ItemSample::new("2025-01-10T08:00:00", Some(5.0), None),
        ];

        let delta = compute_item_deltas(&samples).unwrap().vs_previous.buy.unwrap();
        assert_eq!(delta.absolute, 5.0);
        assert_eq!(delta.percent, None);
    }

    #[test]
    fn test_percent_relative_to_baseline() {
        let delta = PriceDelta::between(Some(110.0), Some(100.0)).unwrap();
        assert!((delta.percent.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(PriceDelta::between(None, Some(1.0)), None);
    }

    #[test]
    fn test_single_sample_has_no_baseline() {
        let samples = vec![ItemSample::new("2025-01-10T08:00:00", Some(5.0), Some(6.0))];
        let deltas = compute_item_deltas(&samples).unwrap();
        assert_eq!(deltas.vs_previous, SideDeltas::default());
        assert_eq!(deltas.vs_previous_day, SideDeltas::default());
    }

    #[test]
    fn test_unparsable_timestamps_are_dropped() {
        let samples = vec![
            ItemSample::new("n/a", Some(1.0), None),
            ItemSample::new("2025-01-10T08:00:00", Some(5.0), None),
        ];
        let deltas = compute_item_deltas(&samples).unwrap();
        assert_eq!(deltas.vs_previous.buy, None);

        assert!(compute_item_deltas(&[ItemSample::new("", None, None)]).is_none());
        assert!(compute_item_deltas(&[]).is_none());
    }

    #[test]
    fn test_day_boundary_is_utc() {
        // 06:00 à UTC+7 le 10 = 23:00 UTC le 9 : même jour UTC que le point précédent
        let samples = vec![
            ItemSample::new("2025-01-09T10:00:00Z", Some(9.0), None),
            ItemSample::new("2025-01-10T06:00:00+07:00", Some(11.0), None),
        ];
        let deltas = compute_item_deltas(&samples).unwrap();
        assert_eq!(deltas.vs_previous.buy.unwrap().absolute, 2.0);
        assert_eq!(deltas.vs_previous_day.buy, None);
    }
}
