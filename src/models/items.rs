// ============================================================================
// Produits des marchés domestiques (SJC, Phú Quý)
// ============================================================================
// Deux marchés exposent une liste de produits nommés (et des succursales
// pour SJC), chacun avec son propre historique de prix achat/vente.
// ============================================================================

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Marché domestique qui publie une liste de produits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemClass {
    /// Vàng SJC : produits + succursales
    Sjc,
    /// Bạc Phú Quý : produits avec unité
    PhuQuy,
}

impl ItemClass {
    pub fn label(&self) -> &'static str {
        match self {
            ItemClass::Sjc => "Vàng SJC",
            ItemClass::PhuQuy => "Bạc Phú Quý",
        }
    }

    /// Endpoint de la liste à plat
    pub fn list_endpoint(&self) -> &'static str {
        match self {
            ItemClass::Sjc => "/api/prices/sjc-items",
            ItemClass::PhuQuy => "/api/prices/phuquy-items",
        }
    }

    /// Endpoint de l'historique d'un produit
    pub fn history_endpoint(&self) -> &'static str {
        match self {
            ItemClass::Sjc => "/api/prices/sjc-item-history",
            ItemClass::PhuQuy => "/api/prices/phuquy-item-history",
        }
    }
}

/// Une ligne de la liste de produits
///
/// CONCEPT SERDE : alias
/// - SJC envoie "name", Phú Quý envoie "product"
/// - alias = "product" permet de décoder les deux dans le même champ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductItem {
    pub ts: Option<String>,
    #[serde(alias = "product", deserialize_with = "null_as_default")]
    pub name: String,
    pub branch: Option<String>,
    pub unit: Option<String>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub date: Option<String>,
}

impl ProductItem {
    /// Filtre de recherche : sous-chaîne insensible à la casse sur nom et succursale
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let branch = self.branch.as_deref().unwrap_or("").to_lowercase();
        self.name.to_lowercase().contains(&query) || branch.contains(&query)
    }

    /// Identifiant utilisé pour demander l'historique de ce produit
    pub fn id(&self, class: ItemClass) -> ItemId {
        ItemId {
            class,
            name: self.name.clone(),
            branch: self.branch.clone().filter(|b| !b.is_empty()),
        }
    }
}

/// Identifie un produit pour /api/prices/*-item-history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemId {
    pub class: ItemClass,
    pub name: String,
    /// Succursale (SJC uniquement)
    pub branch: Option<String>,
}

/// Un point d'historique de prix pour un produit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSample {
    #[serde(deserialize_with = "null_as_default")]
    pub ts: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
}

impl ItemSample {
    pub fn new(ts: &str, buy_price: Option<f64>, sell_price: Option<f64>) -> Self {
        Self {
            ts: ts.to_string(),
            buy_price,
            sell_price,
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phuquy_product_alias() {
        let item: ProductItem = serde_json::from_str(
            r#"{"ts": "2025-01-10T08:00:00", "product": "Bạc miếng 1 lượng", "unit": "VND/lượng", "buy_price": 1000000}"#,
        )
        .unwrap();

        assert_eq!(item.name, "Bạc miếng 1 lượng");
        assert_eq!(item.buy_price, Some(1_000_000.0));
        assert_eq!(item.sell_price, None);
    }

    #[test]
    fn test_search_matches_name_and_branch() {
        let item = ProductItem {
            name: "Vàng miếng SJC".to_string(),
            branch: Some("Hồ Chí Minh".to_string()),
            ..Default::default()
        };

        assert!(item.matches("miếng"));
        assert!(item.matches("HỒ CHÍ"));
        assert!(item.matches(""));
        assert!(!item.matches("Hà Nội"));
    }

    #[test]
    fn test_item_id_drops_empty_branch() {
        let item = ProductItem {
            name: "Nhẫn".to_string(),
            branch: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(item.id(ItemClass::Sjc).branch, None);
    }
}
