// ============================================================================
// Structure : PriceSnapshot
// ============================================================================
// Vue "instantanée" de tous les actifs suivis, telle que renvoyée par
// GET /api/prices/today
//
// CONCEPTS RUST :
// 1. Option<f64> : un prix absent = source indisponible en ce moment
// 2. #[serde(default)] : un champ manquant dans le JSON devient None / vide
//    au lieu de faire échouer toute la désérialisation
// 3. Normalisation à la frontière : les blocs "token" (PAXG, XAUT) peuvent
//    être absents du JSON, on les remplace par une forme par défaut
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};

use super::null_as_default;

/// Unité par défaut des cotations internationales
pub const USD_PER_OZ: &str = "USD/oz";

/// Cotation domestique (SJC, Phú Quý) : pas de variation fournie par le backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomesticQuote {
    /// Prix en VND par unité locale (lượng)
    pub price: Option<f64>,
    /// Unité affichée (ex: "VND/lượng")
    #[serde(deserialize_with = "null_as_default")]
    pub unit: String,
    pub source: Option<String>,
}

/// Cotation internationale ou token (USD/oz)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketQuote {
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    #[serde(deserialize_with = "usd_oz_if_null")]
    pub unit: String,
    pub source: Option<String>,
}

fn usd_oz_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| USD_PER_OZ.to_string()))
}

impl MarketQuote {
    /// Forme utilisée quand le bloc est totalement absent de la réponse :
    /// tous les champs numériques à None, unité "USD/oz"
    pub fn absent() -> Self {
        Self {
            price: None,
            change: None,
            change_percent: None,
            unit: USD_PER_OZ.to_string(),
            source: None,
        }
    }
}

impl Default for MarketQuote {
    fn default() -> Self {
        Self::absent()
    }
}

/// Écart entre prix domestique et prix international converti
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spread {
    pub spread_vnd: Option<f64>,
    pub spread_percent: Option<f64>,
    pub intl_in_vnd: Option<f64>,
    pub intl_per_luong: Option<f64>,
    pub unit: Option<String>,
}

/// Snapshot tel qu'il arrive sur le fil : les blocs token peuvent manquer
///
/// CONCEPT RUST : Option<Struct> comme type somme Present | Absent
/// - Some(quote) : le backend a fourni le bloc
/// - None : bloc absent, normalisé par into_snapshot()
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPriceSnapshot {
    pub update_time: Option<String>,
    pub usd_vnd: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub sjc_gold: DomesticQuote,
    #[serde(deserialize_with = "null_as_default")]
    pub phuquy_silver: DomesticQuote,
    #[serde(deserialize_with = "null_as_default")]
    pub intl_gold: MarketQuote,
    #[serde(deserialize_with = "null_as_default")]
    pub intl_silver: MarketQuote,
    pub paxg: Option<MarketQuote>,
    pub xaut: Option<MarketQuote>,
    #[serde(deserialize_with = "null_as_default")]
    pub gold_spread: Spread,
    #[serde(deserialize_with = "null_as_default")]
    pub silver_spread: Spread,
}

impl RawPriceSnapshot {
    /// Remplace les blocs token absents par MarketQuote::absent()
    ///
    /// Après cet appel, le code en aval n'a plus jamais à tester l'absence
    /// d'un bloc, seulement la nullité de ses champs.
    pub fn into_snapshot(self) -> PriceSnapshot {
        PriceSnapshot {
            update_time: self.update_time,
            usd_vnd: self.usd_vnd,
            sjc_gold: self.sjc_gold,
            phuquy_silver: self.phuquy_silver,
            intl_gold: self.intl_gold,
            intl_silver: self.intl_silver,
            paxg: self.paxg.unwrap_or_else(MarketQuote::absent),
            xaut: self.xaut.unwrap_or_else(MarketQuote::absent),
            gold_spread: self.gold_spread,
            silver_spread: self.silver_spread,
        }
    }
}

/// Snapshot normalisé, remplacé en bloc à chaque rafraîchissement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub update_time: Option<String>,
    /// Taux de change : VND pour 1 USD
    pub usd_vnd: Option<f64>,
    pub sjc_gold: DomesticQuote,
    pub phuquy_silver: DomesticQuote,
    pub intl_gold: MarketQuote,
    pub intl_silver: MarketQuote,
    pub paxg: MarketQuote,
    pub xaut: MarketQuote,
    pub gold_spread: Spread,
    pub silver_spread: Spread,
}

impl Default for PriceSnapshot {
    fn default() -> Self {
        RawPriceSnapshot::default().into_snapshot()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_blocks_get_default_shape() {
        let json = r#"{
            "update_time": "2025-01-10T08:00:00",
            "usd_vnd": 25400.0,
            "sjc_gold": {"price": 85000000.0, "unit": "VND/lượng", "source": "vnstock"},
            "intl_gold": {"price": 2650.5, "change": 10.0, "change_percent": 0.38, "unit": "USD/oz", "source": "MSN"}
        }"#;

        let raw: RawPriceSnapshot = serde_json::from_str(json).unwrap();
        let snapshot = raw.into_snapshot();

        assert_eq!(snapshot.paxg, MarketQuote::absent());
        assert_eq!(snapshot.xaut.unit, "USD/oz");
        assert_eq!(snapshot.xaut.price, None);
        assert_eq!(snapshot.xaut.source, None);
        assert_eq!(snapshot.intl_gold.price, Some(2650.5));
        // Bloc totalement absent côté argent : champs à None, pas d'erreur
        assert_eq!(snapshot.intl_silver.price, None);
        assert_eq!(snapshot.phuquy_silver.price, None);
    }

    #[test]
    fn test_present_token_block_is_kept() {
        let json = r#"{"paxg": {"price": 2660.0, "change": null, "change_percent": null, "unit": "USD/oz", "source": "CryptoCompare"}}"#;
        let snapshot = serde_json::from_str::<RawPriceSnapshot>(json)
            .unwrap()
            .into_snapshot();

        assert_eq!(snapshot.paxg.price, Some(2660.0));
        assert_eq!(snapshot.paxg.source.as_deref(), Some("CryptoCompare"));
    }

    #[test]
    fn test_null_fields_are_tolerated() {
        let json = r#"{
            "usd_vnd": null,
            "gold_spread": {"spread_vnd": null, "spread_percent": 3.2},
            "intl_silver": {"price": 30.1, "unit": null},
            "sjc_gold": {"price": null, "unit": null},
            "intl_gold": null,
            "xaut": null
        }"#;
        let snapshot = serde_json::from_str::<RawPriceSnapshot>(json)
            .unwrap()
            .into_snapshot();

        assert_eq!(snapshot.usd_vnd, None);
        assert_eq!(snapshot.intl_silver.unit, "USD/oz");
        assert_eq!(snapshot.sjc_gold.unit, "");
        assert_eq!(snapshot.intl_gold, MarketQuote::absent());
        assert_eq!(snapshot.xaut, MarketQuote::absent());
        assert_eq!(snapshot.gold_spread.spread_percent, Some(3.2));
    }
}
