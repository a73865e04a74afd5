// ============================================================================
// API Client : backend des prix et des réserves
// ============================================================================
// Appelle les endpoints /api/... du backend et renvoie des structures typées
//
// Stratégie de transport :
// - liste ordonnée d'origines candidates : [proxy même-site ?, backend direct]
// - chaque requête /api/* essaie les origines dans l'ordre, une seule fois
//   chacune ; la première réponse valide gagne
// - si toutes échouent, la dernière erreur remonte à l'appelant
// - pas de retry supplémentaire, pas de cache
//
// CONCEPTS RUST :
// 1. Générique async : request::<T>() désérialise vers n'importe quel T
// 2. Boucle explicite sur les origines (pas de contrôle de flux par erreur)
// 3. #[instrument] : chaque appel ouvre un span tracing avec ses paramètres
// ============================================================================

use std::time::Duration;

use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::error::ApiError;
use crate::config::Config;
use crate::models::{
    HistorySample, ItemClass, ItemId, ItemSample, PriceSnapshot, ProductItem, RawPriceSnapshot,
    ReservesCountry, ReservesKind, ReservesTop, WgcRefresh, WgcSort, WgcTop,
};

const USER_AGENT: &str = concat!("goldwatch/", env!("CARGO_PKG_VERSION"));

/// Enveloppe commune { success, data, count }
///
/// CONCEPT SERDE : Option<T> pour un champ
/// - un champ absent devient None sans #[serde(default)]
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, endpoint: &str) -> Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ApiError::Unsuccessful {
                endpoint: endpoint.to_string(),
            }),
        }
    }
}

/// Réponse de GET /api/health
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: Option<String>,
}

/// Origines candidates, dans l'ordre d'essai
///
/// Les "/" finaux sont retirés et les doublons supprimés : un proxy égal au
/// backend ne provoque pas deux appels identiques.
pub fn candidate_origins(proxy_url: Option<&str>, backend_url: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in proxy_url.into_iter().chain(std::iter::once(backend_url)) {
        let origin = origin.trim().trim_end_matches('/');
        if !origin.is_empty() && !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

/// Client HTTP du backend
///
/// CONCEPT RUST : Clone bon marché
/// - reqwest::Client contient un Arc interne
/// - cloner ApiClient partage le même pool de connexions entre tâches
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    origins: Vec<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_origins(
            candidate_origins(config.proxy_url.as_deref(), &config.backend_url),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_origins(origins: Vec<String>, timeout: Duration) -> Result<Self, ApiError> {
        debug!(origins = ?origins, "Creating HTTP client");
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: String::new(),
                source,
            })?;

        Ok(Self::with_http_client(http, origins))
    }

    /// Réutilise un reqwest::Client déjà configuré
    pub fn with_http_client(http: reqwest::Client, origins: Vec<String>) -> Self {
        Self { http, origins }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// Envoie la requête à chaque origine candidate jusqu'au premier succès
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let origins = &self.origins;
        let mut last_error = ApiError::NoOrigin {
            endpoint: endpoint.to_string(),
        };

        for (attempt, origin) in origins.iter().enumerate() {
            match self.attempt(method.clone(), origin, endpoint, query).await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(origin = %origin, endpoint, "Request succeeded on fallback origin");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt + 1 < origins.len() {
                        warn!(origin = %origin, endpoint, error = %err, "Request failed, trying next origin");
                    }
                    last_error = err;
                }
            }
        }

        error!(endpoint, error = %last_error, "API request failed on every origin");
        Err(last_error)
    }

    /// Une tentative sur une origine : statut HTTP puis décodage JSON
    async fn attempt<T: DeserializeOwned>(
        &self,
        method: Method,
        origin: &str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", origin, endpoint);
        debug!(url = %url, method = %method, "Sending HTTP request");

        let response = self
            .http
            .request(method, &url)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().to_string();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        // Lecture en texte puis serde_json : l'erreur de décodage garde sa position
        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: final_url.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: final_url,
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, query).await
    }

    // ========================================================================
    // Prix
    // ========================================================================

    /// Snapshot du jour, blocs token normalisés
    #[instrument(skip(self))]
    pub async fn fetch_today(&self) -> Result<PriceSnapshot, ApiError> {
        let endpoint = "/api/prices/today";
        let envelope: Envelope<RawPriceSnapshot> = self.get(endpoint, &[]).await?;
        let snapshot = envelope.into_data(endpoint)?.into_snapshot();

        info!(update_time = ?snapshot.update_time, "Fetched today's prices");
        Ok(snapshot)
    }

    /// Historique des N derniers jours (N > 0)
    #[instrument(skip(self))]
    pub async fn fetch_history(&self, days: u32) -> Result<Vec<HistorySample>, ApiError> {
        ensure_positive_days(days)?;

        let endpoint = "/api/prices/history";
        let envelope: Envelope<Vec<HistorySample>> = self.get(endpoint, &[("days", days.to_string())]).await?;
        let samples = envelope.into_data(endpoint)?;

        info!(samples = samples.len(), "Fetched price history");
        Ok(samples)
    }

    /// Liste à plat des produits d'un marché domestique
    #[instrument(skip(self))]
    pub async fn fetch_item_list(&self, class: ItemClass) -> Result<Vec<ProductItem>, ApiError> {
        let endpoint = class.list_endpoint();
        let envelope: Envelope<Vec<ProductItem>> = self.get(endpoint, &[]).await?;
        let items = envelope.into_data(endpoint)?;

        info!(items = items.len(), "Fetched product list");
        Ok(items)
    }

    /// Historique d'un produit
    ///
    /// SJC : name (+ branch si connue) ; Phú Quý : product
    #[instrument(skip(self, item), fields(name = %item.name, branch = ?item.branch))]
    pub async fn fetch_item_history(&self, item: &ItemId, days: u32) -> Result<Vec<ItemSample>, ApiError> {
        ensure_positive_days(days)?;

        let mut query = match item.class {
            ItemClass::Sjc => vec![("name", item.name.clone())],
            ItemClass::PhuQuy => vec![("product", item.name.clone())],
        };
        if let (ItemClass::Sjc, Some(branch)) = (item.class, &item.branch) {
            query.push(("branch", branch.clone()));
        }
        query.push(("days", days.to_string()));

        let endpoint = item.class.history_endpoint();
        let envelope: Envelope<Vec<ItemSample>> = self.get(endpoint, &query).await?;
        let samples = envelope.into_data(endpoint)?;

        info!(samples = samples.len(), "Fetched product history");
        Ok(samples)
    }

    // ========================================================================
    // Réserves
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn fetch_reserves_top(&self, kind: ReservesKind, limit: u32) -> Result<ReservesTop, ApiError> {
        let endpoint = "/api/reserves/top";
        let top: ReservesTop = self
            .get(endpoint, &[("kind", kind.as_param().to_string()), ("limit", limit.to_string())])
            .await?;
        ensure_success(top.success, endpoint)?;

        info!(rows = top.data.len(), year = ?top.year, "Fetched reserves ranking");
        Ok(top)
    }

    /// Série pluriannuelle d'un pays ; le code ISO2 est validé avant l'appel
    #[instrument(skip(self))]
    pub async fn fetch_reserves_country(&self, iso2: &str) -> Result<ReservesCountry, ApiError> {
        let iso2 = normalize_iso2(iso2)?;

        let endpoint = "/api/reserves/country";
        let country: ReservesCountry = self.get(endpoint, &[("iso2", iso2)]).await?;
        ensure_success(country.success, endpoint)?;

        info!(years = country.data.len(), "Fetched country reserves");
        Ok(country)
    }

    #[instrument(skip(self))]
    pub async fn fetch_wgc_top(&self, limit: u32, sort: WgcSort) -> Result<WgcTop, ApiError> {
        let endpoint = "/api/reserves/wgc/top";
        let top: WgcTop = self
            .get(endpoint, &[("limit", limit.to_string()), ("sort", sort.as_param().to_string())])
            .await?;
        ensure_success(top.success, endpoint)?;

        info!(rows = top.data.len(), "Fetched WGC ranking");
        Ok(top)
    }

    /// Demande au backend de recharger la source WGC
    #[instrument(skip(self))]
    pub async fn refresh_wgc(&self) -> Result<WgcRefresh, ApiError> {
        let endpoint = "/api/reserves/wgc/refresh";
        let refresh: WgcRefresh = self.request(Method::POST, endpoint, &[]).await?;
        ensure_success(refresh.success, endpoint)?;

        info!(count = refresh.count, "WGC source refreshed");
        Ok(refresh)
    }

    /// Sonde de disponibilité
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/api/health", &[]).await
    }
}

fn ensure_positive_days(days: u32) -> Result<(), ApiError> {
    if days == 0 {
        return Err(ApiError::InvalidArgument("days doit être > 0".to_string()));
    }
    Ok(())
}

fn ensure_success(success: bool, endpoint: &str) -> Result<(), ApiError> {
    if success {
        Ok(())
    } else {
        Err(ApiError::Unsuccessful {
            endpoint: endpoint.to_string(),
        })
    }
}

/// Deux lettres ASCII, renvoyées en majuscules
pub fn normalize_iso2(iso2: &str) -> Result<String, ApiError> {
    let iso2 = iso2.trim();
    if iso2.len() == 2 && iso2.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(iso2.to_ascii_uppercase())
    } else {
        Err(ApiError::InvalidArgument(format!("code ISO2 invalide : {:?}", iso2)))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Les appels réseau sont testés contre un petit serveur HTTP local (tokio)
// qui renvoie une réponse fixe et enregistre les lignes de requête reçues.
// ============================================================================
