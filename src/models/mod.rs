// ============================================================================
// Module : models
// ============================================================================
// Structures de données échangées avec le backend et manipulées par l'UI
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : sous-module public
// - "pub use" : re-export pour des imports plus courts
// ============================================================================

pub mod history;   // Lignes d'historique + parsing des timestamps
pub mod holdings;  // Quantités détenues et clés d'actifs
pub mod items;     // Produits SJC / Phú Quý
pub mod reserves;  // Réserves Banque mondiale et WGC
pub mod snapshot;  // Prix du jour

pub use history::{day_label, parse_timestamp, HistoryRange, HistorySample};
pub use holdings::{normalize_holding_value, AssetKey, Holdings};
pub use items::{ItemClass, ItemId, ItemSample, ProductItem};
pub use reserves::{
    ReservesCountry, ReservesCountryRow, ReservesKind, ReservesTop, ReservesTopRow, WgcGoldRow,
    WgcMeta, WgcRefresh, WgcSort, WgcTop,
};
pub use snapshot::{DomesticQuote, MarketQuote, PriceSnapshot, RawPriceSnapshot, Spread};

use serde::{Deserialize, Deserializer};

/// Désérialise `null` comme la valeur par défaut du type
///
/// CONCEPT SERDE : deserialize_with
/// - #[serde(default)] ne couvre que les champs absents
/// - un champ présent mais `null` passerait par ce helper
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
