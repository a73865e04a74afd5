// ============================================================================
// Réserves des banques centrales
// ============================================================================
// Données en lecture seule, indépendantes du cœur de calcul des prix :
// - classement Banque mondiale (or / hors or / total)
// - série pluriannuelle d'un pays (ISO2)
// - classement World Gold Council (tonnes ou valeur USD)
// ============================================================================

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Type de réserve pour /api/reserves/top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservesKind {
    Gold,
    NonGold,
    Total,
}

impl ReservesKind {
    /// Valeur du paramètre de requête
    pub fn as_param(&self) -> &'static str {
        match self {
            ReservesKind::Gold => "gold",
            ReservesKind::NonGold => "non_gold",
            ReservesKind::Total => "total",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReservesKind::Gold => "Or",
            ReservesKind::NonGold => "Hors or",
            ReservesKind::Total => "Total",
        }
    }

    /// Cycle gold → non_gold → total → gold
    pub fn next(&self) -> ReservesKind {
        match self {
            ReservesKind::Gold => ReservesKind::NonGold,
            ReservesKind::NonGold => ReservesKind::Total,
            ReservesKind::Total => ReservesKind::Gold,
        }
    }
}

impl Default for ReservesKind {
    fn default() -> Self {
        ReservesKind::Gold
    }
}

/// Critère de tri du classement WGC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WgcSort {
    Tonnes,
    ValueUsd,
}

impl WgcSort {
    pub fn as_param(&self) -> &'static str {
        match self {
            WgcSort::Tonnes => "tonnes",
            WgcSort::ValueUsd => "value_usd",
        }
    }

    pub fn toggle(&self) -> WgcSort {
        match self {
            WgcSort::Tonnes => WgcSort::ValueUsd,
            WgcSort::ValueUsd => WgcSort::Tonnes,
        }
    }
}

impl Default for WgcSort {
    fn default() -> Self {
        WgcSort::Tonnes
    }
}

/// Une ligne du classement Banque mondiale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservesTopRow {
    pub rank: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub iso2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country_name: String,
    pub value_usd: Option<f64>,
    pub data_end_year: Option<i32>,
}

/// Réponse de GET /api/reserves/top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservesTop {
    #[serde(default)]
    pub success: bool,
    pub kind: ReservesKind,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub global_end_year: Option<i32>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub data: Vec<ReservesTopRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservesCountryMeta {
    #[serde(deserialize_with = "null_as_default")]
    pub iso2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country_name: String,
    pub year_range: Option<YearRange>,
    pub note: Option<String>,
}

/// Une année de la série d'un pays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservesCountryRow {
    pub year: i32,
    pub total_reserves_usd: Option<f64>,
    pub non_gold_reserves_usd: Option<f64>,
    pub gold_value_usd_inferred: Option<f64>,
    pub quality_flag: Option<String>,
}

/// Réponse de GET /api/reserves/country
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservesCountry {
    pub success: bool,
    pub global_year_range: Option<YearRange>,
    pub country: ReservesCountryMeta,
    pub data: Vec<ReservesCountryRow>,
    pub count: usize,
}

/// Une ligne du classement WGC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WgcGoldRow {
    pub rank: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub country_name: String,
    pub iso2: Option<String>,
    pub tonnes: Option<f64>,
    pub pct_of_reserves: Option<f64>,
    pub value_usd: Option<f64>,
    pub holdings_as_of: Option<String>,
    pub retrieved_at_utc: Option<String>,
    pub source: Option<String>,
}

/// Prix spot utilisé par le backend pour valoriser les tonnes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WgcValuation {
    pub spot_price_usd_oz: Option<f64>,
    pub spot_source: Option<String>,
    pub spot_retrieved_at: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WgcMeta {
    pub holdings_as_of: Option<String>,
    pub retrieved_at_utc: Option<String>,
    pub valuation: Option<WgcValuation>,
}

/// Réponse de GET /api/reserves/wgc/top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WgcTop {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub meta: Option<WgcMeta>,
    #[serde(default)]
    pub sort: WgcSort,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub data: Vec<WgcGoldRow>,
}

/// Réponse de POST /api/reserves/wgc/refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WgcRefresh {
    pub success: bool,
    pub meta: Option<WgcMeta>,
    pub count: usize,
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserves_top_decoding() {
        let json = r#"{
            "success": true, "kind": "non_gold", "year": 2023, "global_end_year": 2023, "count": 1,
            "data": [{"rank": 1, "iso2": "CN", "country_name": "China", "value_usd": 3.2e12, "data_end_year": 2023}]
        }"#;
        let top: ReservesTop = serde_json::from_str(json).unwrap();

        assert_eq!(top.kind, ReservesKind::NonGold);
        assert_eq!(top.data[0].iso2, "CN");
        assert_eq!(top.data[0].value_usd, Some(3.2e12));
    }

    #[test]
    fn test_wgc_top_tolerates_null_meta() {
        let json = r#"{"success": true, "meta": null, "sort": "value_usd", "count": 0, "data": []}"#;
        let top: WgcTop = serde_json::from_str(json).unwrap();
        assert_eq!(top.sort, WgcSort::ValueUsd);
        assert!(top.meta.is_none());
    }

    #[test]
    fn test_kind_cycle_and_params() {
        assert_eq!(ReservesKind::Total.next(), ReservesKind::Gold);
        assert_eq!(ReservesKind::NonGold.as_param(), "non_gold");
        assert_eq!(WgcSort::Tonnes.toggle().as_param(), "value_usd");
    }
}
