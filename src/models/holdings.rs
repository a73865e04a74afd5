// ============================================================================
// Holdings : quantités détenues par l'utilisateur
// ============================================================================
// Six actifs fixes :
// - domestiques (VND par lượng) : Vàng SJC, Bạc Phú Quý
// - internationaux / tokens (USD par once troy) : XAU, XAG, PAXG, XAUT
//
// INVARIANT : chaque quantité est un nombre fini >= 0.
// Les champs sont privés, toute écriture passe par set() qui normalise.
// ============================================================================

use serde::{Deserialize, Serialize};

use super::{HistorySample, PriceSnapshot};

/// Clé d'un actif du portefeuille
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKey {
    SjcGold,
    PhuQuySilver,
    IntlGold,
    IntlSilver,
    Paxg,
    Xaut,
}

impl AssetKey {
    /// Tous les actifs, dans l'ordre d'affichage
    pub const ALL: [AssetKey; 6] = [
        AssetKey::SjcGold,
        AssetKey::PhuQuySilver,
        AssetKey::IntlGold,
        AssetKey::IntlSilver,
        AssetKey::Paxg,
        AssetKey::Xaut,
    ];

    /// Clé JSON dans le store local (compatible avec les données existantes)
    pub fn storage_key(&self) -> &'static str {
        match self {
            AssetKey::SjcGold => "sjc_luong",
            AssetKey::PhuQuySilver => "phuquy_luong",
            AssetKey::IntlGold => "xau_oz",
            AssetKey::IntlSilver => "xag_oz",
            AssetKey::Paxg => "paxg_oz",
            AssetKey::Xaut => "xaut_oz",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetKey::SjcGold => "Vàng SJC",
            AssetKey::PhuQuySilver => "Bạc Phú Quý",
            AssetKey::IntlGold => "XAU (Gold Intl)",
            AssetKey::IntlSilver => "XAG (Silver Intl)",
            AssetKey::Paxg => "PAXG",
            AssetKey::Xaut => "XAUT",
        }
    }

    /// Unité de quantité
    pub fn unit(&self) -> &'static str {
        if self.is_fx_converted() {
            "oz"
        } else {
            "lượng"
        }
    }

    /// Unité du prix unitaire
    pub fn price_unit(&self) -> &'static str {
        if self.is_fx_converted() {
            "USD/oz"
        } else {
            "VND/lượng"
        }
    }

    /// true si le prix est en USD et doit être multiplié par le taux USD/VND
    pub fn is_fx_converted(&self) -> bool {
        !matches!(self, AssetKey::SjcGold | AssetKey::PhuQuySilver)
    }

    /// Prix unitaire brut dans une ligne d'historique
    pub fn history_price(&self, sample: &HistorySample) -> Option<f64> {
        match self {
            AssetKey::SjcGold => sample.sjc_vnd_luong,
            AssetKey::PhuQuySilver => sample.phuquy_silver_vnd,
            AssetKey::IntlGold => sample.intl_gold_usd_oz,
            AssetKey::IntlSilver => sample.intl_silver_usd_oz,
            AssetKey::Paxg => sample.paxg_usd_oz,
            AssetKey::Xaut => sample.xaut_usd_oz,
        }
    }

    /// Prix unitaire courant dans le snapshot
    pub fn snapshot_price(&self, snapshot: &PriceSnapshot) -> Option<f64> {
        match self {
            AssetKey::SjcGold => snapshot.sjc_gold.price,
            AssetKey::PhuQuySilver => snapshot.phuquy_silver.price,
            AssetKey::IntlGold => snapshot.intl_gold.price,
            AssetKey::IntlSilver => snapshot.intl_silver.price,
            AssetKey::Paxg => snapshot.paxg.price,
            AssetKey::Xaut => snapshot.xaut.price,
        }
    }

    fn index(&self) -> usize {
        match self {
            AssetKey::SjcGold => 0,
            AssetKey::PhuQuySilver => 1,
            AssetKey::IntlGold => 2,
            AssetKey::IntlSilver => 3,
            AssetKey::Paxg => 4,
            AssetKey::Xaut => 5,
        }
    }
}

/// Convertit une saisie utilisateur en quantité valide
///
/// Saisie invalide, non finie ou négative → 0 (jamais d'erreur)
/// La virgule décimale est acceptée ("1,5" = 1.5).
pub fn normalize_holding_value(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) => sanitize_quantity(value),
        Err(_) => 0.0,
    }
}

/// Ramène une quantité dans le domaine valide : fini et >= 0
pub fn sanitize_quantity(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Quantités détenues pour les six actifs
///
/// CONCEPT RUST : Encapsulation d'un invariant
/// - Le tableau est privé
/// - set() est le seul point d'écriture et normalise toujours
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Holdings {
    quantities: [f64; 6],
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: AssetKey) -> f64 {
        self.quantities[key.index()]
    }

    /// Écrit une quantité (normalisée : non fini ou négatif → 0)
    pub fn set(&mut self, key: AssetKey, quantity: f64) {
        self.quantities[key.index()] = sanitize_quantity(quantity);
    }

    /// Builder pratique pour les tests et les valeurs initiales
    pub fn with(mut self, key: AssetKey, quantity: f64) -> Self {
        self.set(key, quantity);
        self
    }

    /// Applique une saisie texte brute
    pub fn set_from_input(&mut self, key: AssetKey, input: &str) {
        self.set(key, normalize_holding_value(input));
    }

    /// true si au moins un actif a une quantité > 0
    pub fn any_held(&self) -> bool {
        self.quantities.iter().any(|&q| q > 0.0)
    }

    /// Actifs visibles selon le filtre "masquer les quantités nulles"
    pub fn visible_assets(&self, hide_zero: bool) -> Vec<AssetKey> {
        AssetKey::ALL
            .into_iter()
            .filter(|&key| !hide_zero || self.get(key) > 0.0)
            .collect()
    }
}

/// Sérialisation en objet JSON { "sjc_luong": 2.0, ... }
impl Serialize for Holdings {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(AssetKey::ALL.len()))?;
        for key in AssetKey::ALL {
            map.serialize_entry(key.storage_key(), &self.get(key))?;
        }
        map.end()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_holding_value() {
        assert_eq!(normalize_holding_value("2"), 2.0);
        assert_eq!(normalize_holding_value(" 1,5 "), 1.5);
        assert_eq!(normalize_holding_value("-3"), 0.0);
        assert_eq!(normalize_holding_value("abc"), 0.0);
        assert_eq!(normalize_holding_value(""), 0.0);
        assert_eq!(normalize_holding_value("inf"), 0.0);
        assert_eq!(normalize_holding_value("NaN"), 0.0);
    }

    #[test]
    fn test_set_enforces_invariant() {
        let mut holdings = Holdings::new();
        holdings.set(AssetKey::IntlGold, f64::NAN);
        holdings.set(AssetKey::Paxg, -1.0);
        holdings.set(AssetKey::SjcGold, 2.5);

        assert_eq!(holdings.get(AssetKey::IntlGold), 0.0);
        assert_eq!(holdings.get(AssetKey::Paxg), 0.0);
        assert_eq!(holdings.get(AssetKey::SjcGold), 2.5);
        assert!(holdings.any_held());
    }

    #[test]
    fn test_visible_assets() {
        let holdings = Holdings::new().with(AssetKey::Xaut, 1.0);
        assert_eq!(holdings.visible_assets(true), vec![AssetKey::Xaut]);
        assert_eq!(holdings.visible_assets(false).len(), 6);
    }

    #[test]
    fn test_serialize_uses_storage_keys() {
        let holdings = Holdings::new().with(AssetKey::SjcGold, 2.0);
        let json = serde_json::to_value(holdings).unwrap();
        assert_eq!(json["sjc_luong"], 2.0);
        assert_eq!(json["xaut_oz"], 0.0);
    }

    #[test]
    fn test_fx_conversion_flags() {
        assert!(!AssetKey::SjcGold.is_fx_converted());
        assert!(!AssetKey::PhuQuySilver.is_fx_converted());
        assert!(AssetKey::Paxg.is_fx_converted());
        assert_eq!(AssetKey::IntlSilver.unit(), "oz");
    }
}
