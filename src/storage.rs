// ============================================================================
// Persistance locale des préférences du portefeuille
// ============================================================================
// Seules deux entrées sont persistées :
// - portfolio_holdings_v1 : objet JSON des six quantités
// - portfolio_hide_zero_v1 : "1" ou "0" (défaut : masquer = true)
//
// Une donnée absente ou illisible est ignorée et remplacée par la valeur par
// défaut, jamais une erreur bloquante.
//
// CONCEPT RUST : Trait objet
// - KeyValueStore abstrait le support (sled sur disque, HashMap en mémoire)
// - PortfolioPrefs reçoit un Box<dyn KeyValueStore> explicite, pas de
//   singleton global
// ============================================================================

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::models::holdings::sanitize_quantity;
use crate::models::{AssetKey, Holdings};

pub const HOLDINGS_KEY: &str = "portfolio_holdings_v1";
pub const HIDE_ZERO_KEY: &str = "portfolio_hide_zero_v1";

/// Stockage clé → valeur texte
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

// ============================================================================
// Sled : base embarquée sur disque
// ============================================================================

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("Impossible d'ouvrir la base locale {}", path.display()))?;
        debug!(path = %path.display(), "Opened preference store");
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key)
            .with_context(|| format!("Lecture de {} impossible", key))?;
        Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key, value.as_bytes())
            .with_context(|| format!("Écriture de {} impossible", key))?;
        // Bloque jusqu'à ce que l'écriture soit stable sur disque
        self.db.flush().context("Flush de la base locale impossible")?;
        Ok(())
    }
}

// ============================================================================
// Mémoire : tests et repli quand la base ne s'ouvre pas
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("MemoryStore empoisonné"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("MemoryStore empoisonné"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Préférences du portefeuille
// ============================================================================

pub struct PortfolioPrefs {
    store: Box<dyn KeyValueStore>,
}

impl PortfolioPrefs {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Préférences en mémoire uniquement
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Quantités enregistrées, ou toutes à 0 si absentes / illisibles
    pub fn load_holdings(&self) -> Holdings {
        let raw = match self.store.get(HOLDINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Holdings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored holdings");
                return Holdings::default();
            }
        };

        match parse_holdings(&raw) {
            Some(holdings) => holdings,
            None => {
                warn!("Stored holdings are malformed, using defaults");
                Holdings::default()
            }
        }
    }

    pub fn save_holdings(&self, holdings: &Holdings) -> Result<()> {
        let json = serde_json::to_string(holdings).context("Sérialisation des quantités impossible")?;
        self.store.set(HOLDINGS_KEY, &json)
    }

    /// "1" → true, "0" → false, sinon true
    pub fn load_hide_zero(&self) -> bool {
        match self.store.get(HIDE_ZERO_KEY) {
            Ok(Some(raw)) => match raw.as_str() {
                "0" => false,
                "1" => true,
                _ => true,
            },
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "Failed to read hide-zero flag");
                true
            }
        }
    }

    pub fn save_hide_zero(&self, hide_zero: bool) -> Result<()> {
        self.store.set(HIDE_ZERO_KEY, if hide_zero { "1" } else { "0" })
    }
}

/// Objet JSON → Holdings ; None si ce n'est pas un objet
///
/// Chaque entrée qui n'est pas un nombre fini vaut 0, les négatifs sont
/// ramenés à 0, les clés inconnues sont ignorées.
fn parse_holdings(raw: &str) -> Option<Holdings> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let mut holdings = Holdings::default();
    for key in AssetKey::ALL {
        let quantity = object
            .get(key.storage_key())
            .and_then(serde_json::Value::as_f64)
            .map(sanitize_quantity)
            .unwrap_or(0.0);
        holdings.set(key, quantity);
    }
    Some(holdings)
}

// ============================================================================
// Tests unitaires
// ============================================================================
