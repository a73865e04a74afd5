// ============================================================================
// Moteur de valorisation du portefeuille
// ============================================================================
// Combine les prix unitaires historiques, les quantités détenues et le taux
// USD/VND journalier pour produire :
// - une série de valeur par actif et une série totale (une valeur par date)
// - une valorisation "maintenant" à partir du snapshot le plus récent
// - les variations jour/jour et la part de chaque actif dans le total
//
// Règles :
// 1. Chaque série de prix brute (et la série FX) est reportée (forward-fill)
//    indépendamment
// 2. Domestique : valeur = prix × quantité
// 3. International / token : valeur = prix × FX × quantité ; si un facteur
//    manque à cette date, la valeur est None (jamais 0)
// 4. Total = somme des composantes définies ; None si aucune ne l'est
// 5. "Maintenant" = même formule appliquée au snapshot, pas à la dernière
//    ligne d'historique
// 6. Variation jour = total à la dernière date définie moins total à la date
//    définie précédente (les trous sont sautés)
// 7. Part = valeur actuelle / total actuel × 100, None si total nul ou absent
// ============================================================================

use std::collections::BTreeMap;

use crate::analytics::forward_fill::forward_fill_by;
use crate::models::{AssetKey, HistorySample, Holdings, PriceSnapshot};

/// Valeur d'une position pour un prix unitaire et un taux donnés
///
/// CONCEPT RUST : Option comme "valeur inconnue"
/// - prix connu et quantité 0 → Some(0.0)
/// - prix inconnu → None, quelle que soit la quantité
/// - produit non fini (débordement) → None, comme pour le total
pub fn asset_value(key: AssetKey, unit_price: Option<f64>, fx: Option<f64>, quantity: f64) -> Option<f64> {
    let price = unit_price?;
    let value = if key.is_fx_converted() {
        price * fx? * quantity
    } else {
        price * quantity
    };
    value.is_finite().then_some(value)
}

/// Somme des valeurs définies ; None si aucune ne l'est
pub fn sum_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Indices (précédent, dernier) des deux points définis les plus récents
pub fn latest_defined_pair(series: &[Option<f64>]) -> Option<(usize, usize)> {
    let mut defined = series
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, v)| v.is_some())
        .map(|(i, _)| i);

    let latest = defined.next()?;
    let previous = defined.next()?;
    Some((previous, latest))
}

/// Variation entre les deux points définis les plus récents
///
/// [None, None, 100, None, 130] → Some(30)
pub fn latest_change(series: &[Option<f64>]) -> Option<f64> {
    let (previous, latest) = latest_defined_pair(series)?;
    Some(series[latest]? - series[previous]?)
}

/// Part d'une valeur dans le total, en pourcentage
pub fn share_percent(value: Option<f64>, total: Option<f64>) -> Option<f64> {
    let total = total.filter(|t| *t != 0.0)?;
    Some(value? / total * 100.0)
}

// ============================================================================
// Série historique
// ============================================================================

/// Valeur du portefeuille sur l'axe de dates de l'historique
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioHistory {
    /// Axe des dates ("YYYY-MM-DD"), aligné sur les lignes d'historique
    pub dates: Vec<String>,
    /// Taux USD/VND reporté
    pub fx: Vec<Option<f64>>,
    /// Valeur par actif et par date, en VND
    pub assets: BTreeMap<AssetKey, Vec<Option<f64>>>,
    /// Valeur totale par date, en VND
    pub total: Vec<Option<f64>>,
}

impl PortfolioHistory {
    /// Recalcule toute la série (pas de mise à jour incrémentale)
    pub fn compute(samples: &[HistorySample], holdings: &Holdings) -> Self {
        let dates: Vec<String> = samples.iter().map(HistorySample::day).collect();
        let fx = forward_fill_by(samples, |s| s.usd_vnd);

        let assets: BTreeMap<AssetKey, Vec<Option<f64>>> = AssetKey::ALL
            .into_iter()
            .map(|key| {
                let quantity = holdings.get(key);
                let prices = forward_fill_by(samples, |s| key.history_price(s));
                let values = prices
                    .iter()
                    .zip(&fx)
                    .map(|(&price, &rate)| asset_value(key, price, rate, quantity))
                    .collect();
                (key, values)
            })
            .collect();

        let total = (0..dates.len())
            .map(|i| sum_defined(assets.values().map(|series| series[i])))
            .collect();

        Self {
            dates,
            fx,
            assets,
            total,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Série de valeurs d'un actif
    pub fn asset(&self, key: AssetKey) -> &[Option<f64>] {
        self.assets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dernier total défini
    pub fn latest_total(&self) -> Option<f64> {
        self.total.iter().rev().find_map(|v| *v)
    }

    /// Variation jour du total (règle 6)
    pub fn total_change(&self) -> Option<f64> {
        latest_change(&self.total)
    }

    /// Variation jour d'un actif, mesurée entre les deux mêmes dates que
    /// la variation du total
    pub fn asset_change(&self, key: AssetKey) -> Option<f64> {
        let (previous, latest) = latest_defined_pair(&self.total)?;
        let series = self.asset(key);
        Some((*series.get(latest)?)? - (*series.get(previous)?)?)
    }

    /// Dernier taux USD/VND connu
    pub fn latest_fx(&self) -> Option<f64> {
        self.fx.last().copied().flatten()
    }
}

// ============================================================================
// Valorisation "maintenant"
// ============================================================================

/// Valorisation à partir du snapshot courant
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotValuation {
    pub fx: Option<f64>,
    pub unit_prices: BTreeMap<AssetKey, Option<f64>>,
    pub values: BTreeMap<AssetKey, Option<f64>>,
    pub total: Option<f64>,
}

impl SnapshotValuation {
    pub fn compute(snapshot: &PriceSnapshot, holdings: &Holdings) -> Self {
        let fx = snapshot.usd_vnd.filter(|v| v.is_finite());

        let unit_prices: BTreeMap<AssetKey, Option<f64>> = AssetKey::ALL
            .into_iter()
            .map(|key| (key, key.snapshot_price(snapshot).filter(|v| v.is_finite())))
            .collect();

        let values: BTreeMap<AssetKey, Option<f64>> = unit_prices
            .iter()
            .map(|(&key, &price)| (key, asset_value(key, price, fx, holdings.get(key))))
            .collect();

        let total = sum_defined(values.values().copied());

        Self {
            fx,
            unit_prices,
            values,
            total,
        }
    }

    pub fn value(&self, key: AssetKey) -> Option<f64> {
        self.values.get(&key).copied().flatten()
    }

    pub fn unit_price(&self, key: AssetKey) -> Option<f64> {
        self.unit_prices.get(&key).copied().flatten()
    }

    /// Part de l'actif dans le total actuel (règle 7)
    pub fn share_percent(&self, key: AssetKey) -> Option<f64> {
        share_percent(self.value(key), self.total)
    }
}

// ============================================================================
// Vue combinée pour l'onglet Portfolio
// ============================================================================

/// Une ligne du tableau des actifs
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRow {
    pub key: AssetKey,
    pub quantity: f64,
    pub unit_price_now: Option<f64>,
    pub value_now: Option<f64>,
    pub share_percent: Option<f64>,
    pub day_change: Option<f64>,
}

/// Valorisation complète : historique + maintenant
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioValuation {
    pub history: PortfolioHistory,
    pub now: SnapshotValuation,
}

impl PortfolioValuation {
    /// Sans snapshot, la valorisation "maintenant" est entièrement inconnue
    pub fn compute(samples: &[HistorySample], snapshot: Option<&PriceSnapshot>, holdings: &Holdings) -> Self {
        let now = match snapshot {
            Some(snapshot) => SnapshotValuation::compute(snapshot, holdings),
            None => SnapshotValuation::compute(&PriceSnapshot::default(), holdings),
        };

        Self {
            history: PortfolioHistory::compute(samples, holdings),
            now,
        }
    }

    /// Lignes du tableau, filtrées si `hide_zero`
    pub fn rows(&self, holdings: &Holdings, hide_zero: bool) -> Vec<AssetRow> {
        holdings
            .visible_assets(hide_zero)
            .into_iter()
            .map(|key| AssetRow {
                key,
                quantity: holdings.get(key),
                unit_price_now: self.now.unit_price(key),
                value_now: self.now.value(key),
                share_percent: self.now.share_percent(key),
                day_change: self.history.asset_change(key),
            })
            .collect()
    }

    pub fn total_now(&self) -> Option<f64> {
        self.now.total
    }

    pub fn total_change(&self) -> Option<f64> {
        self.history.total_change()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarketQuote;

    fn sample(ts: &str) -> HistorySample {
        HistorySample {
            ts: ts.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_domestic_asset_end_to_end() {
        let holdings = Holdings::new().with(AssetKey::SjcGold, 2.0);
        let samples = vec![HistorySample {
            sjc_vnd_luong: Some(75_000_000.0),
            ..sample("2025-01-10T00:00:00")
        }];

        let history = PortfolioHistory::compute(&samples, &holdings);
        assert_eq!(history.asset(AssetKey::SjcGold), &[Some(150_000_000.0)]);
        assert_eq!(history.total, vec![Some(150_000_000.0)]);

        let mut snapshot = PriceSnapshot::default();
        snapshot.sjc_gold.price = Some(75_000_000.0);
        let now = SnapshotValuation::compute(&snapshot, &holdings);
        assert_eq!(now.total, Some(150_000_000.0));
        assert_eq!(now.share_percent(AssetKey::SjcGold), Some(100.0));
    }

    #[test]
    fn test_zero_holdings_give_zero_not_none() {
        let holdings = Holdings::new();
        let samples = vec![
            HistorySample {
                usd_vnd: Some(25_000.0),
                sjc_vnd_luong: Some(80_000_000.0),
                intl_gold_usd_oz: Some(2_600.0),
                ..sample("2025-01-10")
            },
            sample("2025-01-11"),
        ];

        let history = PortfolioHistory::compute(&samples, &holdings);

        assert_eq!(history.asset(AssetKey::SjcGold), &[Some(0.0), Some(0.0)]);
        assert_eq!(history.asset(AssetKey::IntlGold), &[Some(0.0), Some(0.0)]);
        // Prix jamais vu : None, même avec une quantité nulle
        assert_eq!(history.asset(AssetKey::Paxg), &[None, None]);
        assert_eq!(history.total, vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_unknown_price_is_none_regardless_of_quantity() {
        let holdings = Holdings::new().with(AssetKey::Xaut, 10.0);
        let samples = vec![
            HistorySample {
                usd_vnd: Some(25_000.0),
                ..sample("2025-01-10")
            },
            sample("2025-01-11"),
        ];

        let history = PortfolioHistory::compute(&samples, &holdings);
        assert_eq!(history.asset(AssetKey::Xaut), &[None, None]);
        assert_eq!(history.total, vec![None, None]);
    }

    #[test]
    fn test_missing_fx_makes_intl_value_none() {
        let holdings = Holdings::new()
            .with(AssetKey::IntlGold, 1.0)
            .with(AssetKey::SjcGold, 1.0);
        let samples = vec![
            HistorySample {
                intl_gold_usd_oz: Some(2_000.0),
                sjc_vnd_luong: Some(80_000_000.0),
                ..sample("2025-01-10")
            },
            HistorySample {
                usd_vnd: Some(25_000.0),
                ..sample("2025-01-11")
            },
        ];

        let history = PortfolioHistory::compute(&samples, &holdings);

        assert_eq!(history.asset(AssetKey::IntlGold), &[None, Some(50_000_000.0)]);
        // Le total ne garde que les composantes définies
        assert_eq!(history.total, vec![Some(80_000_000.0), Some(130_000_000.0)]);
    }

    #[test]
    fn test_forward_fill_carries_prices_and_fx() {
        let holdings = Holdings::new().with(AssetKey::IntlSilver, 100.0);
        let samples = vec![
            HistorySample {
                usd_vnd: Some(25_000.0),
                intl_silver_usd_oz: Some(30.0),
                ..sample("2025-01-10")
            },
            HistorySample {
                intl_silver_usd_oz: Some(31.0),
                ..sample("2025-01-11")
            },
            sample("2025-01-12"),
        ];

        let history = PortfolioHistory::compute(&samples, &holdings);
        assert_eq!(
            history.asset(AssetKey::IntlSilver),
            &[Some(75_000_000.0), Some(77_500_000.0), Some(77_500_000.0)]
        );
        assert_eq!(history.latest_fx(), Some(25_000.0));
        assert_eq!(history.dates, vec!["2025-01-10", "2025-01-11", "2025-01-12"]);
    }

    #[test]
    fn test_overflowing_value_is_unknown_in_row_and_total() {
        let holdings = Holdings::new()
            .with(AssetKey::Paxg, 1e300)
            .with(AssetKey::SjcGold, 1.0);
        let samples = vec![HistorySample {
            usd_vnd: Some(25_000.0),
            paxg_usd_oz: Some(1e10),
            sjc_vnd_luong: Some(5.0),
            ..sample("2025-01-10")
        }];

        let history = PortfolioHistory::compute(&samples, &holdings);

        assert_eq!(history.asset(AssetKey::Paxg), &[None]);
        assert_eq!(history.total, vec![Some(5.0)]);
        assert_eq!(asset_value(AssetKey::SjcGold, Some(f64::MAX), None, 2.0), None);
    }

    #[test]
    fn test_total_is_sum_of_defined_components() {
        assert_eq!(sum_defined([None, Some(1.0), None, Some(2.5)]), Some(3.5));
        assert_eq!(sum_defined([None, None]), None);
        assert_eq!(sum_defined(Vec::<Option<f64>>::new()), None);
        assert_eq!(sum_defined([Some(0.0)]), Some(0.0));
    }

    #[test]
    fn test_latest_change_skips_gaps() {
        assert_eq!(latest_change(&[None, None, Some(100.0), None, Some(130.0)]), Some(30.0));
        assert_eq!(latest_change(&[Some(100.0)]), None);
        assert_eq!(latest_change(&[None, Some(5.0), None]), None);
        assert_eq!(latest_defined_pair(&[Some(1.0), None, Some(2.0), None]), Some((0, 2)));
    }

    #[test]
    fn test_asset_change_uses_total_indices() {
        let holdings = Holdings::new().with(AssetKey::SjcGold, 1.0);
        let samples = vec![
            HistorySample {
                sjc_vnd_luong: Some(100.0),
                ..sample("2025-01-10")
            },
            HistorySample {
                sjc_vnd_luong: Some(130.0),
                ..sample("2025-01-11")
            },
        ];

        let history = PortfolioHistory::compute(&samples, &holdings);
        assert_eq!(history.total_change(), Some(30.0));
        assert_eq!(history.asset_change(AssetKey::SjcGold), Some(30.0));
        // Actif sans prix : pas de variation
        assert_eq!(history.asset_change(AssetKey::Paxg), None);
    }

    #[test]
    fn test_share_percent_undefined_on_zero_or_missing_total() {
        assert_eq!(share_percent(Some(10.0), Some(0.0)), None);
        assert_eq!(share_percent(Some(10.0), None), None);
        assert_eq!(share_percent(None, Some(10.0)), None);
        assert_eq!(share_percent(Some(25.0), Some(100.0)), Some(25.0));
    }

    #[test]
    fn test_now_uses_snapshot_not_last_history_row() {
        let holdings = Holdings::new().with(AssetKey::Paxg, 2.0);
        let samples = vec![HistorySample {
            usd_vnd: Some(24_000.0),
            paxg_usd_oz: Some(2_000.0),
            ..sample("2025-01-09")
        }];
        let mut snapshot = PriceSnapshot::default();
        snapshot.usd_vnd = Some(25_000.0);
        snapshot.paxg = MarketQuote {
            price: Some(2_100.0),
            ..MarketQuote::absent()
        };

        let valuation = PortfolioValuation::compute(&samples, Some(&snapshot), &holdings);

        assert_eq!(valuation.history.latest_total(), Some(96_000_000.0));
        assert_eq!(valuation.total_now(), Some(105_000_000.0));

        let rows = valuation.rows(&holdings, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, AssetKey::Paxg);
        assert_eq!(rows[0].unit_price_now, Some(2_100.0));
        assert_eq!(rows[0].share_percent, Some(100.0));
    }

    #[test]
    fn test_without_snapshot_now_is_unknown() {
        let holdings = Holdings::new().with(AssetKey::SjcGold, 1.0);
        let valuation = PortfolioValuation::compute(&[], None, &holdings);
        assert_eq!(valuation.total_now(), None);
        assert!(valuation.history.is_empty());
        assert_eq!(valuation.total_change(), None);
    }
}
