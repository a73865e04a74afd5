// ============================================================================
// Configuration
// ============================================================================
// Fichier YAML géré par confy dans le répertoire de config utilisateur
// (ex: ~/.config/goldwatch/config.yml), puis surcharges par variables
// d'environnement :
// - NEXT_PUBLIC_API_URL ou BACKEND_URL (la première définie gagne) → backend_url
// - GOLDWATCH_PROXY_URL → proxy_url
// ============================================================================

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Nom de l'application pour confy et dirs
pub const APP_NAME: &str = "goldwatch";
const CONFIG_NAME: &str = "config";

/// Paramètres de l'application
///
/// CONCEPT SERDE : #[serde(default)] au niveau de la struct
/// - Un fichier de config partiel reste valide
/// - Les champs manquants prennent la valeur de Config::default()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origine directe du backend, utilisée en dernier recours
    pub backend_url: String,
    /// Origine "même site" (reverse proxy) essayée en premier si définie
    pub proxy_url: Option<String>,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    /// Rafraîchissement automatique actif au démarrage
    pub auto_refresh: bool,
    /// Jours d'historique pour l'onglet Today et la variation jour
    pub history_days: u32,
    /// Historique long (onglet Portfolio)
    pub long_history_days: u32,
    pub reserves_limit: u32,
    /// Répertoire de données (logs, base sled) ; défaut : data_local_dir/goldwatch
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            proxy_url: None,
            request_timeout_secs: 15,
            refresh_interval_secs: 60,
            auto_refresh: false,
            history_days: 7,
            long_history_days: 730,
            reserves_limit: 20,
            data_dir: None,
        }
    }
}

impl Config {
    /// Charge le fichier (créé avec les valeurs par défaut s'il n'existe pas),
    /// applique l'environnement puis valide
    pub fn load() -> Result<Self> {
        let mut config: Config = confy::load(APP_NAME, CONFIG_NAME)
            .context("Impossible de lire le fichier de configuration")?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        info!(backend = %config.backend_url, proxy = ?config.proxy_url, "Configuration loaded");
        Ok(config)
    }

    /// Chemin du fichier de configuration
    pub fn path() -> Result<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
            .context("Impossible de déterminer le chemin du fichier de configuration")
    }

    /// Applique les surcharges d'environnement
    ///
    /// CONCEPT RUST : closure en paramètre
    /// - `lookup` abstrait std::env::var pour tester sans toucher
    ///   l'environnement du processus
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("NEXT_PUBLIC_API_URL").or_else(|| non_empty("BACKEND_URL")) {
            debug!(url = %url, "Backend URL overridden from environment");
            self.backend_url = url;
        }
        if let Some(url) = non_empty("GOLDWATCH_PROXY_URL") {
            debug!(url = %url, "Proxy URL overridden from environment");
            self.proxy_url = Some(url);
        }
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.backend_url)
            .with_context(|| format!("backend_url invalide : {}", self.backend_url))?;
        if let Some(proxy) = &self.proxy_url {
            reqwest::Url::parse(proxy).with_context(|| format!("proxy_url invalide : {}", proxy))?;
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs doit être > 0");
        }
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs doit être > 0");
        }
        if self.history_days == 0 || self.long_history_days == 0 {
            bail!("history_days et long_history_days doivent être > 0");
        }
        if self.reserves_limit == 0 {
            bail!("reserves_limit doit être > 0");
        }
        Ok(())
    }

    /// Répertoire de données effectif
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_NAME))
                .context("Impossible de déterminer le répertoire de données"),
        }
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("prefs.sled"))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.long_history_days, 730);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_precedence() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("NEXT_PUBLIC_API_URL", "https://api.example.com"),
            ("BACKEND_URL", "http://ignored:8000"),
        ]));
        assert_eq!(config.backend_url, "https://api.example.com");

        let mut config = Config::default();
        config.apply_env(env(&[("NEXT_PUBLIC_API_URL", " "), ("BACKEND_URL", "http://backend:8000")]));
        assert_eq!(config.backend_url, "http://backend:8000");
        assert_eq!(config.proxy_url, None);

        config.apply_env(env(&[("GOLDWATCH_PROXY_URL", "http://localhost:3000")]));
        assert_eq!(config.proxy_url.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            backend_url: "pas une url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"backend_url": "http://x:1", "auto_refresh": true}"#).unwrap();
        assert_eq!(config.backend_url, "http://x:1");
        assert!(config.auto_refresh);
        assert_eq!(config.reserves_limit, 20);
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/gw")),
            ..Config::default()
        };
        assert_eq!(config.log_dir().unwrap(), PathBuf::from("/tmp/gw/logs"));
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/tmp/gw/prefs.sled"));
    }
}
