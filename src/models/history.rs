// ============================================================================
// Structure : HistorySample
// ============================================================================
// Une ligne d'historique (en pratique une par jour), triée par ts croissant
//
// CONCEPTS RUST :
// 1. Option<f64> partout : chaque source peut manquer un jour donné
// 2. DateTime<Utc> : les timestamps sont ramenés en UTC pour le découpage
//    par jour calendaire
// ============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Échantillon historique renvoyé par GET /api/prices/history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySample {
    /// Timestamp brut du backend (ISO 8601, avec ou sans offset)
    pub ts: String,
    pub usd_vnd: Option<f64>,
    pub sjc_vnd_luong: Option<f64>,
    pub phuquy_silver_vnd: Option<f64>,
    pub phuquy_silver_unit: Option<String>,
    pub intl_gold_usd_oz: Option<f64>,
    pub intl_gold_source: Option<String>,
    pub intl_silver_usd_oz: Option<f64>,
    pub intl_silver_source: Option<String>,
    pub paxg_usd_oz: Option<f64>,
    pub paxg_source: Option<String>,
    pub xaut_usd_oz: Option<f64>,
    pub xaut_source: Option<String>,
    pub gold_spread_vnd: Option<f64>,
    pub gold_spread_percent: Option<f64>,
    pub silver_spread_vnd: Option<f64>,
    pub silver_spread_percent: Option<f64>,
    pub silver_spread_unit: Option<String>,
}

impl HistorySample {
    /// Clé de jour pour l'axe des dates ("YYYY-MM-DD")
    pub fn day(&self) -> String {
        day_label(&self.ts)
    }
}

/// Les 10 premiers caractères d'un timestamp ISO, utilisés comme label d'axe
///
/// CONCEPT RUST : chars().take()
/// - On découpe en caractères, pas en octets, pour ne jamais couper
///   une séquence UTF-8 en deux
pub fn day_label(ts: &str) -> String {
    ts.chars().take(10).collect()
}

/// Parse un timestamp du backend en UTC
///
/// Formats acceptés :
/// - RFC 3339 avec offset ("2025-01-10T08:00:00+07:00") : converti en UTC
/// - naïf avec 'T' ou espace, fractions optionnelles : interprété comme UTC
/// - date seule ("2025-01-10") : minuit UTC
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Enum : HistoryRange
// ============================================================================
// Plages proposées dans les sélecteurs "Days" de l'UI
// ============================================================================

/// Période d'historique demandée au backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
}

impl HistoryRange {
    /// Nombre de jours correspondant
    pub fn to_days(&self) -> u32 {
        match self {
            HistoryRange::OneWeek => 7,
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 90,
            HistoryRange::SixMonths => 180,
            HistoryRange::OneYear => 365,
            HistoryRange::TwoYears => 730,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryRange::OneWeek => "7D",
            HistoryRange::OneMonth => "30D",
            HistoryRange::ThreeMonths => "90D",
            HistoryRange::SixMonths => "180D",
            HistoryRange::OneYear => "1Y",
            HistoryRange::TwoYears => "2Y",
        }
    }

    /// Plage suivante (cycle), touche ]
    pub fn next(&self) -> HistoryRange {
        match self {
            HistoryRange::OneWeek => HistoryRange::OneMonth,
            HistoryRange::OneMonth => HistoryRange::ThreeMonths,
            HistoryRange::ThreeMonths => HistoryRange::SixMonths,
            HistoryRange::SixMonths => HistoryRange::OneYear,
            HistoryRange::OneYear => HistoryRange::TwoYears,
            HistoryRange::TwoYears => HistoryRange::OneWeek,
        }
    }

    /// Plage précédente (cycle), touche [
    pub fn previous(&self) -> HistoryRange {
        match self {
            HistoryRange::OneWeek => HistoryRange::TwoYears,
            HistoryRange::OneMonth => HistoryRange::OneWeek,
            HistoryRange::ThreeMonths => HistoryRange::OneMonth,
            HistoryRange::SixMonths => HistoryRange::ThreeMonths,
            HistoryRange::OneYear => HistoryRange::SixMonths,
            HistoryRange::TwoYears => HistoryRange::OneYear,
        }
    }
}

impl Default for HistoryRange {
    /// 30 jours, comme l'onglet History
    fn default() -> Self {
        HistoryRange::OneMonth
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_day_label() {
        assert_eq!(day_label("2025-01-10T08:00:00"), "2025-01-10");
        assert_eq!(day_label("2025-01"), "2025-01");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let naive = parse_timestamp("2025-01-10T08:30:00").unwrap();
        assert_eq!(naive.hour(), 8);

        let spaced = parse_timestamp("2025-01-10 08:30:00.123456").unwrap();
        assert_eq!(spaced.minute(), 30);

        let date_only = parse_timestamp("2025-01-10").unwrap();
        assert_eq!(date_only.day(), 10);
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("pas une date").is_none());
    }

    #[test]
    fn test_offset_timestamp_is_converted_to_utc() {
        // 01:00 à Hanoï (UTC+7) = 18:00 la veille en UTC
        let dt = parse_timestamp("2025-01-10T01:00:00+07:00").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        assert_eq!(dt.hour(), 18);
    }

    #[test]
    fn test_history_sample_missing_fields() {
        let sample: HistorySample =
            serde_json::from_str(r#"{"ts": "2025-01-10T00:00:00", "usd_vnd": 25400}"#).unwrap();
        assert_eq!(sample.day(), "2025-01-10");
        assert_eq!(sample.usd_vnd, Some(25400.0));
        assert_eq!(sample.paxg_usd_oz, None);
    }

    #[test]
    fn test_history_range_cycle() {
        assert_eq!(HistoryRange::TwoYears.next(), HistoryRange::OneWeek);
        assert_eq!(HistoryRange::OneWeek.previous(), HistoryRange::TwoYears);
        assert_eq!(HistoryRange::default().to_days(), 30);
    }
}
