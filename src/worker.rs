// ============================================================================
// Background Worker
// ============================================================================
// Thread séparé qui possède un runtime tokio et exécute les appels API
//
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des AppCommand (std mpsc, non async)
// - Le worker lance une tâche tokio par commande : les fetchs indépendants
//   tournent en parallèle et un échec n'interrompt pas les autres
// - Chaque tâche renvoie un seul AppResult ; l'UI les lit sans bloquer
// ============================================================================

use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, HealthStatus};
use crate::models::{
    HistorySample, ItemClass, ItemId, ItemSample, PriceSnapshot, ProductItem, ReservesCountry,
    ReservesKind, ReservesTop, WgcRefresh, WgcSort, WgcTop,
};

/// Quelle série d'historique une requête alimente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySlot {
    /// Historique court (variation jour, ratio)
    Recent,
    /// Plage choisie dans l'onglet History
    Range,
    /// Plage choisie dans l'onglet Portfolio
    Portfolio,
    /// Historique long, partagé par les plages de deux ans
    Long,
    /// Résumé or / argent international de la modale
    Intl,
}

/// Commandes envoyées au worker
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    FetchToday,
    FetchHistory { slot: HistorySlot, days: u32 },
    FetchItemList(ItemClass),
    FetchItemHistory { item: ItemId, days: u32 },
    FetchReservesTop { kind: ReservesKind, limit: u32 },
    FetchReservesCountry { iso2: String },
    FetchWgcTop { limit: u32, sort: WgcSort },
    /// POST de rafraîchissement puis relecture du classement
    RefreshWgc { limit: u32, sort: WgcSort },
    CheckHealth,
}

/// Résultats renvoyés par le worker
///
/// Chaque variante rappelle les paramètres de la commande : l'UI peut ignorer
/// une réponse qui ne correspond plus à ce qui est affiché.
#[derive(Debug)]
pub enum AppResult {
    Today(Result<PriceSnapshot, ApiError>),
    History {
        slot: HistorySlot,
        days: u32,
        result: Result<Vec<HistorySample>, ApiError>,
    },
    ItemList {
        class: ItemClass,
        result: Result<Vec<ProductItem>, ApiError>,
    },
    ItemHistory {
        item: ItemId,
        result: Result<Vec<ItemSample>, ApiError>,
    },
    ReservesTop {
        kind: ReservesKind,
        result: Result<ReservesTop, ApiError>,
    },
    ReservesCountry {
        iso2: String,
        result: Result<ReservesCountry, ApiError>,
    },
    WgcTop {
        sort: WgcSort,
        result: Result<WgcTop, ApiError>,
    },
    WgcRefreshed {
        refresh: Result<WgcRefresh, ApiError>,
        sort: WgcSort,
        top: Option<Result<WgcTop, ApiError>>,
    },
    Health(Result<HealthStatus, ApiError>),
}

/// Exécute une commande et produit son résultat
pub async fn execute(client: &ApiClient, command: AppCommand) -> AppResult {
    match command {
        AppCommand::FetchToday => AppResult::Today(client.fetch_today().await),
        AppCommand::FetchHistory { slot, days } => AppResult::History {
            slot,
            days,
            result: client.fetch_history(days).await,
        },
        AppCommand::FetchItemList(class) => AppResult::ItemList {
            class,
            result: client.fetch_item_list(class).await,
        },
        AppCommand::FetchItemHistory { item, days } => {
            let result = client.fetch_item_history(&item, days).await;
            AppResult::ItemHistory { item, result }
        }
        AppCommand::FetchReservesTop { kind, limit } => AppResult::ReservesTop {
            kind,
            result: client.fetch_reserves_top(kind, limit).await,
        },
        AppCommand::FetchReservesCountry { iso2 } => {
            let result = client.fetch_reserves_country(&iso2).await;
            AppResult::ReservesCountry { iso2, result }
        }
        AppCommand::FetchWgcTop { limit, sort } => AppResult::WgcTop {
            sort,
            result: client.fetch_wgc_top(limit, sort).await,
        },
        AppCommand::RefreshWgc { limit, sort } => {
            let refresh = client.refresh_wgc().await;
            // Relecture seulement si le rafraîchissement a réussi
            let top = match &refresh {
                Ok(_) => Some(client.fetch_wgc_top(limit, sort).await),
                Err(_) => None,
            };
            AppResult::WgcRefreshed { refresh, sort, top }
        }
        AppCommand::CheckHealth => AppResult::Health(client.health().await),
    }
}

/// Lance le worker thread
///
/// CONCEPT RUST : Thread + async runtime
/// - Le runtime est créé avant le thread pour que son échec remonte ici
/// - std::thread::spawn() déplace (move) le runtime et le client dans le thread
/// - La boucle s'arrête quand l'UI lâche le Sender (channel fermé)
pub fn spawn_background_worker(
    client: ApiClient,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let handle = std::thread::Builder::new()
        .name("goldwatch-worker".to_string())
        .spawn(move || {
            while let Ok(command) = command_rx.recv() {
                info!(?command, "Worker received command");

                let client = client.clone();
                let result_tx = result_tx.clone();
                runtime.spawn(async move {
                    let result = execute(&client, command).await;
                    if result_tx.send(result).is_err() {
                        debug!("UI gone, dropping worker result");
                    }
                });
            }
            info!("Worker thread exiting (channel closed)");
        })
        .context("Échec du lancement du worker thread")?;

    Ok(handle)
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Sans origine configurée, chaque appel échoue immédiatement (NoOrigin) :
// on vérifie le routage commande → résultat sans réseau.
// ============================================================================
