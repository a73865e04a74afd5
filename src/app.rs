// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Enums génériques : Loadable<T> pour l'état de chaque source de données
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les méthodes qui ont besoin du réseau renvoient des AppCommand :
//   l'event loop les transmet au worker, App reste testable sans I/O
// ============================================================================

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::analytics::{compute_item_deltas, ItemDeltas, PortfolioValuation};
use crate::config::Config;
use crate::models::{
    AssetKey, HistoryRange, HistorySample, Holdings, ItemClass, ItemId, ItemSample, PriceSnapshot,
    ProductItem, ReservesCountry, ReservesKind, ReservesTop, WgcSort, WgcTop,
};
use crate::storage::PortfolioPrefs;
use crate::worker::{AppCommand, AppResult, HistorySlot};

/// Jours d'historique demandés pour un produit SJC / Phú Quý
pub const ITEM_HISTORY_DAYS: u32 = 30;

// Messages fixes affichés quand une source ne répond pas
const TODAY_ERROR: &str = "Impossible de charger les prix du jour";
const HISTORY_ERROR: &str = "Impossible de charger l'historique";
const ITEMS_ERROR: &str = "Impossible de charger la liste des produits";
const ITEM_HISTORY_ERROR: &str = "Impossible de charger l'historique du produit";
const RESERVES_ERROR: &str = "Impossible de charger les réserves";
const COUNTRY_ERROR: &str = "Impossible de charger les données du pays";
const WGC_ERROR: &str = "Impossible de charger le classement WGC";

// ============================================================================
// Enum : Tab
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul onglet actif à la fois
// - Le compilateur force à gérer tous les cas (exhaustivité)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Today,
    History,
    Comparison,
    Portfolio,
    Reserves,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Today, Tab::History, Tab::Comparison, Tab::Portfolio, Tab::Reserves];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Today => "Today",
            Tab::History => "History",
            Tab::Comparison => "Comparison",
            Tab::Portfolio => "Portfolio",
            Tab::Reserves => "Reserves",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn previous(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    /// '1'..'5' → onglet
    pub fn from_digit(c: char) -> Option<Tab> {
        let index = c.to_digit(10)?.checked_sub(1)? as usize;
        Tab::ALL.get(index).copied()
    }
}

// ============================================================================
// Enum : Loadable
// ============================================================================
// CONCEPT RUST : Enum générique
// - Chaque source (prix, historique, réserves...) a son propre état
// - Un échec reste local à sa source
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// true si aucune donnée n'est disponible ni en cours de chargement
    pub fn needs_load(&self) -> bool {
        matches!(self, Loadable::Idle | Loadable::Failed(_))
    }

    /// Passe en chargement ; les données déjà affichées restent visibles
    fn begin(&mut self) {
        if !matches!(self, Loadable::Loaded(_)) {
            *self = Loadable::Loading;
        }
    }

    /// Applique un résultat : succès → Loaded, échec → message fixe
    fn settle<E: std::fmt::Display>(&mut self, result: Result<T, E>, message: &str) {
        *self = match result {
            Ok(data) => Loadable::Loaded(data),
            Err(e) => {
                warn!(error = %e, "{}", message);
                Loadable::Failed(message.to_string())
            }
        };
    }
}

// ============================================================================
// Modales
// ============================================================================

/// Liste des produits d'un marché + historique du produit choisi
#[derive(Debug, Clone, PartialEq)]
pub struct ProductModal {
    pub class: ItemClass,
    pub query: String,
    /// true tant que les touches alimentent la recherche
    pub searching: bool,
    pub selected: usize,
    pub item: Option<ItemId>,
    pub history: Loadable<Vec<ItemSample>>,
}

impl ProductModal {
    fn new(class: ItemClass) -> Self {
        Self {
            class,
            query: String::new(),
            searching: false,
            selected: 0,
            item: None,
            history: Loadable::Idle,
        }
    }
}

/// Série pluriannuelle des réserves d'un pays
#[derive(Debug, Clone, PartialEq)]
pub struct CountryModal {
    pub iso2: String,
    pub country: Loadable<ReservesCountry>,
}

/// Résumé d'un métal international : dernière ligne de l'historique
#[derive(Debug, Clone, PartialEq)]
pub struct IntlModal {
    pub asset: AssetKey,
    pub history: Loadable<Vec<HistorySample>>,
}

impl IntlModal {
    /// (horodatage, prix USD/oz) de la ligne la plus récente
    pub fn latest(&self) -> Option<(&str, Option<f64>)> {
        let last = self.history.data()?.last()?;
        Some((last.ts.as_str(), self.asset.history_price(last)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    Products(ProductModal),
    Country(CountryModal),
    Intl(IntlModal),
}

/// Classement affiché et piloté au clavier dans l'onglet Reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservesPane {
    WorldBank,
    Wgc,
}

/// Saisie en cours d'une quantité
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingInput {
    pub asset: AssetKey,
    pub buffer: String,
}

/// Paramètres issus de la configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppSettings {
    pub refresh_interval: Duration,
    pub history_days: u32,
    pub long_history_days: u32,
    pub reserves_limit: u32,
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            refresh_interval: Duration::from_secs(config.refresh_interval_secs),
            history_days: config.history_days,
            long_history_days: config.long_history_days,
            reserves_limit: config.reserves_limit,
        }
    }
}

// ============================================================================
// Structure : App
// ============================================================================

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : première pression de 'q' → true, deuxième → sortie
    pub confirm_quit: bool,

    pub tab: Tab,

    pub today: Loadable<PriceSnapshot>,
    /// Historique court (history_days)
    pub recent_history: Loadable<Vec<HistorySample>>,
    /// Historique de la plage sélectionnée (onglets History et Comparison)
    pub range_history: Loadable<Vec<HistorySample>>,
    /// Historique de la plage sélectionnée dans l'onglet Portfolio
    pub portfolio_history: Loadable<Vec<HistorySample>>,
    /// Historique long (plages de deux ans)
    pub long_history: Loadable<Vec<HistorySample>>,
    pub history_range: HistoryRange,
    pub portfolio_range: HistoryRange,
    /// Actif tracé dans l'onglet History
    pub history_asset: AssetKey,

    pub sjc_items: Loadable<Vec<ProductItem>>,
    pub phuquy_items: Loadable<Vec<ProductItem>>,

    pub reserves_kind: ReservesKind,
    pub reserves_top: Loadable<ReservesTop>,
    pub wgc_sort: WgcSort,
    pub wgc_top: Loadable<WgcTop>,
    pub wgc_refreshing: bool,
    pub reserves_pane: ReservesPane,
    pub reserves_selected: usize,

    pub modal: Option<Modal>,

    pub holdings: Holdings,
    pub hide_zero: bool,
    /// Curseur sur les six actifs de l'éditeur de quantités
    pub portfolio_selected: usize,
    pub editing: Option<HoldingInput>,

    pub auto_refresh: bool,
    pub backend_healthy: Option<bool>,
    /// Dernier message de statut (barre du bas)
    pub status_message: Option<String>,

    settings: AppSettings,
    last_today_request: Option<Instant>,
    prefs: PortfolioPrefs,
}

impl App {
    /// Crée l'état initial à partir de la configuration et des préférences
    /// persistées
    pub fn new(config: &Config, prefs: PortfolioPrefs) -> Self {
        let holdings = prefs.load_holdings();
        let hide_zero = prefs.load_hide_zero();
        debug!(?holdings, hide_zero, "Loaded portfolio preferences");

        Self {
            running: true,
            confirm_quit: false,
            tab: Tab::Today,
            today: Loadable::Idle,
            recent_history: Loadable::Idle,
            range_history: Loadable::Idle,
            portfolio_history: Loadable::Idle,
            long_history: Loadable::Idle,
            history_range: HistoryRange::default(),
            portfolio_range: HistoryRange::ThreeMonths,
            history_asset: AssetKey::SjcGold,
            sjc_items: Loadable::Idle,
            phuquy_items: Loadable::Idle,
            reserves_kind: ReservesKind::default(),
            reserves_top: Loadable::Idle,
            wgc_sort: WgcSort::default(),
            wgc_top: Loadable::Idle,
            wgc_refreshing: false,
            reserves_pane: ReservesPane::WorldBank,
            reserves_selected: 0,
            modal: None,
            holdings,
            hide_zero,
            portfolio_selected: 0,
            editing: None,
            auto_refresh: config.auto_refresh,
            backend_healthy: None,
            status_message: None,
            settings: AppSettings::from(config),
            last_today_request: None,
            prefs,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    /// Commandes du démarrage : santé du backend, prix du jour, historique court
    pub fn initial_commands(&mut self, now: Instant) -> Vec<AppCommand> {
        let mut commands = vec![AppCommand::CheckHealth];
        commands.extend(self.request_today(now));
        commands.extend(self.request_recent_history());
        commands.extend(self.load_tab_data(self.tab));
        commands
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Relance le snapshot quand le rafraîchissement automatique est actif et
    /// que l'intervalle est écoulé. Les requêtes qui se chevauchent ne sont
    /// pas fusionnées : la dernière réponse reçue gagne.
    pub fn tick(&mut self, now: Instant) -> Vec<AppCommand> {
        if !self.auto_refresh {
            return Vec::new();
        }
        let due = match self.last_today_request {
            Some(last) => now.saturating_duration_since(last) >= self.settings.refresh_interval,
            None => true,
        };
        if due {
            debug!("Auto-refresh interval elapsed");
            self.request_today(now)
        } else {
            Vec::new()
        }
    }

    pub fn toggle_auto_refresh(&mut self, now: Instant) {
        self.auto_refresh = !self.auto_refresh;
        if self.auto_refresh {
            // Le prochain fetch automatique part un intervalle plus tard
            self.last_today_request = Some(now);
        }
        info!(enabled = self.auto_refresh, "Auto-refresh toggled");
        self.status_message = Some(if self.auto_refresh {
            format!("Auto-refresh activé ({} s)", self.settings.refresh_interval.as_secs())
        } else {
            "Auto-refresh désactivé".to_string()
        });
    }

    fn request_today(&mut self, now: Instant) -> Vec<AppCommand> {
        self.today.begin();
        self.last_today_request = Some(now);
        vec![AppCommand::FetchToday]
    }

    fn request_recent_history(&mut self) -> Vec<AppCommand> {
        self.recent_history.begin();
        vec![AppCommand::FetchHistory {
            slot: HistorySlot::Recent,
            days: self.settings.history_days,
        }]
    }

    fn request_range_history(&mut self) -> Vec<AppCommand> {
        if self.reuses_long_history(self.history_range) {
            return self.request_long_history_if_needed();
        }
        self.range_history.begin();
        vec![AppCommand::FetchHistory {
            slot: HistorySlot::Range,
            days: self.history_range.to_days(),
        }]
    }

    fn request_portfolio_history(&mut self) -> Vec<AppCommand> {
        if self.reuses_long_history(self.portfolio_range) {
            return self.request_long_history_if_needed();
        }
        self.portfolio_history.begin();
        vec![AppCommand::FetchHistory {
            slot: HistorySlot::Portfolio,
            days: self.portfolio_range.to_days(),
        }]
    }

    fn request_long_history(&mut self) -> Vec<AppCommand> {
        self.long_history.begin();
        vec![AppCommand::FetchHistory {
            slot: HistorySlot::Long,
            days: self.settings.long_history_days,
        }]
    }

    fn request_long_history_if_needed(&mut self) -> Vec<AppCommand> {
        if self.long_history.needs_load() {
            self.request_long_history()
        } else {
            Vec::new()
        }
    }

    fn request_reserves_top(&mut self) -> Vec<AppCommand> {
        self.reserves_top.begin();
        vec![AppCommand::FetchReservesTop {
            kind: self.reserves_kind,
            limit: self.settings.reserves_limit,
        }]
    }

    fn request_wgc_top(&mut self) -> Vec<AppCommand> {
        self.wgc_top.begin();
        vec![AppCommand::FetchWgcTop {
            limit: self.settings.reserves_limit,
            sort: self.wgc_sort,
        }]
    }

    /// Données nécessaires à un onglet, chargées à la première visite
    fn load_tab_data(&mut self, tab: Tab) -> Vec<AppCommand> {
        let mut commands = Vec::new();
        match tab {
            Tab::Today => {}
            Tab::History | Tab::Comparison => {
                if self.history_for_range().needs_load() {
                    commands.extend(self.request_range_history());
                }
            }
            Tab::Portfolio => {
                if self.portfolio_history_for_range().needs_load() {
                    commands.extend(self.request_portfolio_history());
                }
            }
            Tab::Reserves => {
                if self.reserves_top.needs_load() {
                    commands.extend(self.request_reserves_top());
                }
                if self.wgc_top.needs_load() {
                    commands.extend(self.request_wgc_top());
                }
            }
        }
        commands
    }

    /// Touche 'r' : snapshot + données de l'onglet courant
    pub fn refresh(&mut self, now: Instant) -> Vec<AppCommand> {
        info!(tab = self.tab.title(), "Manual refresh");
        let mut commands = self.request_today(now);
        match self.tab {
            Tab::Today => commands.extend(self.request_recent_history()),
            Tab::History | Tab::Comparison => commands.extend(self.request_range_history()),
            Tab::Portfolio if self.reuses_long_history(self.portfolio_range) => {
                commands.extend(self.request_long_history())
            }
            Tab::Portfolio => commands.extend(self.request_portfolio_history()),
            Tab::Reserves => {
                commands.extend(self.request_reserves_top());
                commands.extend(self.request_wgc_top());
            }
        }
        commands
    }

    // ========================================================================
    // Onglets
    // ========================================================================

    pub fn select_tab(&mut self, tab: Tab) -> Vec<AppCommand> {
        if self.tab != tab {
            debug!(tab = tab.title(), "Switching tab");
        }
        self.tab = tab;
        self.load_tab_data(tab)
    }

    pub fn next_tab(&mut self) -> Vec<AppCommand> {
        self.select_tab(self.tab.next())
    }

    pub fn previous_tab(&mut self) -> Vec<AppCommand> {
        self.select_tab(self.tab.previous())
    }

    // ========================================================================
    // Onglet History / Comparison
    // ========================================================================

    /// La plage de deux ans réutilise l'historique long déjà chargé
    fn reuses_long_history(&self, range: HistoryRange) -> bool {
        range.to_days() == self.settings.long_history_days
    }

    /// Historique à afficher pour la plage sélectionnée
    pub fn history_for_range(&self) -> &Loadable<Vec<HistorySample>> {
        if self.reuses_long_history(self.history_range) {
            &self.long_history
        } else {
            &self.range_history
        }
    }

    pub fn next_range(&mut self) -> Vec<AppCommand> {
        self.history_range = self.history_range.next();
        self.on_range_changed()
    }

    pub fn previous_range(&mut self) -> Vec<AppCommand> {
        self.history_range = self.history_range.previous();
        self.on_range_changed()
    }

    fn on_range_changed(&mut self) -> Vec<AppCommand> {
        info!(range = self.history_range.label(), "History range changed");
        if self.reuses_long_history(self.history_range) {
            return self.request_long_history_if_needed();
        }
        // Les données de l'ancienne plage ne correspondent plus
        self.range_history = Loadable::Idle;
        self.request_range_history()
    }

    pub fn next_history_asset(&mut self) {
        self.history_asset = cycle_asset(self.history_asset, 1);
    }

    pub fn previous_history_asset(&mut self) {
        self.history_asset = cycle_asset(self.history_asset, AssetKey::ALL.len() - 1);
    }

    // ========================================================================
    // Onglet Portfolio
    // ========================================================================

    /// Historique de la plage du portefeuille
    pub fn portfolio_history_for_range(&self) -> &Loadable<Vec<HistorySample>> {
        if self.reuses_long_history(self.portfolio_range) {
            &self.long_history
        } else {
            &self.portfolio_history
        }
    }

    pub fn next_portfolio_range(&mut self) -> Vec<AppCommand> {
        self.portfolio_range = self.portfolio_range.next();
        self.on_portfolio_range_changed()
    }

    pub fn previous_portfolio_range(&mut self) -> Vec<AppCommand> {
        self.portfolio_range = self.portfolio_range.previous();
        self.on_portfolio_range_changed()
    }

    fn on_portfolio_range_changed(&mut self) -> Vec<AppCommand> {
        info!(range = self.portfolio_range.label(), "Portfolio range changed");
        if self.reuses_long_history(self.portfolio_range) {
            return self.request_long_history_if_needed();
        }
        self.portfolio_history = Loadable::Idle;
        self.request_portfolio_history()
    }

    /// Valorisation complète, recalculée à chaque appel
    pub fn portfolio_valuation(&self) -> PortfolioValuation {
        let samples = self.portfolio_history_for_range().data().map(Vec::as_slice).unwrap_or(&[]);
        PortfolioValuation::compute(samples, self.today.data(), &self.holdings)
    }

    pub fn selected_asset(&self) -> AssetKey {
        AssetKey::ALL[self.portfolio_selected.min(AssetKey::ALL.len() - 1)]
    }

    pub fn start_editing(&mut self) {
        let asset = self.selected_asset();
        let current = self.holdings.get(asset);
        let buffer = if current > 0.0 { current.to_string() } else { String::new() };
        debug!(asset = asset.storage_key(), "Editing holding");
        self.editing = Some(HoldingInput { asset, buffer });
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Seuls les caractères d'un nombre décimal sont acceptés
    pub fn edit_push(&mut self, c: char) {
        if let Some(input) = &mut self.editing {
            if c.is_ascii_digit() || c == '.' || c == ',' {
                input.buffer.push(c);
            }
        }
    }

    pub fn edit_backspace(&mut self) {
        if let Some(input) = &mut self.editing {
            input.buffer.pop();
        }
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    /// Valide la saisie (invalide → 0) et persiste les quantités
    pub fn commit_editing(&mut self) {
        let Some(input) = self.editing.take() else {
            return;
        };
        self.holdings.set_from_input(input.asset, &input.buffer);
        info!(asset = input.asset.storage_key(), quantity = self.holdings.get(input.asset), "Holding updated");

        if let Err(e) = self.prefs.save_holdings(&self.holdings) {
            warn!(error = ?e, "Failed to save holdings");
            self.status_message = Some("Quantités non enregistrées".to_string());
        }
    }

    pub fn toggle_hide_zero(&mut self) {
        self.hide_zero = !self.hide_zero;
        if let Err(e) = self.prefs.save_hide_zero(self.hide_zero) {
            warn!(error = ?e, "Failed to save hide-zero flag");
        }
    }

    // ========================================================================
    // Onglet Reserves
    // ========================================================================

    pub fn cycle_reserves_kind(&mut self) -> Vec<AppCommand> {
        self.reserves_kind = self.reserves_kind.next();
        self.reserves_top = Loadable::Idle;
        self.reserves_selected = 0;
        self.request_reserves_top()
    }

    pub fn toggle_wgc_sort(&mut self) -> Vec<AppCommand> {
        self.wgc_sort = self.wgc_sort.toggle();
        self.wgc_top = Loadable::Idle;
        self.reserves_selected = 0;
        self.request_wgc_top()
    }

    /// POST de rafraîchissement WGC (ignoré si déjà en cours)
    pub fn refresh_wgc(&mut self) -> Vec<AppCommand> {
        if self.wgc_refreshing {
            return Vec::new();
        }
        self.wgc_refreshing = true;
        self.status_message = Some("Rafraîchissement WGC...".to_string());
        vec![AppCommand::RefreshWgc {
            limit: self.settings.reserves_limit,
            sort: self.wgc_sort,
        }]
    }

    pub fn switch_reserves_pane(&mut self) {
        self.reserves_pane = match self.reserves_pane {
            ReservesPane::WorldBank => ReservesPane::Wgc,
            ReservesPane::Wgc => ReservesPane::WorldBank,
        };
        self.reserves_selected = 0;
    }

    fn reserves_row_count(&self) -> usize {
        match self.reserves_pane {
            ReservesPane::WorldBank => self.reserves_top.data().map_or(0, |t| t.data.len()),
            ReservesPane::Wgc => self.wgc_top.data().map_or(0, |t| t.data.len()),
        }
    }

    /// Code ISO2 de la ligne sélectionnée
    fn selected_iso2(&self) -> Option<String> {
        match self.reserves_pane {
            ReservesPane::WorldBank => self
                .reserves_top
                .data()
                .and_then(|t| t.data.get(self.reserves_selected))
                .map(|row| row.iso2.clone()),
            ReservesPane::Wgc => self
                .wgc_top
                .data()
                .and_then(|t| t.data.get(self.reserves_selected))
                .and_then(|row| row.iso2.clone()),
        }
        .filter(|iso2| !iso2.is_empty())
    }

    /// Ouvre la modale pays pour la ligne sélectionnée
    pub fn open_selected_country(&mut self) -> Vec<AppCommand> {
        let Some(iso2) = self.selected_iso2() else {
            self.status_message = Some("Pas de code pays pour cette ligne".to_string());
            return Vec::new();
        };
        info!(iso2 = %iso2, "Opening country modal");
        self.modal = Some(Modal::Country(CountryModal {
            iso2: iso2.clone(),
            country: Loadable::Loading,
        }));
        vec![AppCommand::FetchReservesCountry { iso2 }]
    }

    // ========================================================================
    // Modale produits
    // ========================================================================

    pub fn items(&self, class: ItemClass) -> &Loadable<Vec<ProductItem>> {
        match class {
            ItemClass::Sjc => &self.sjc_items,
            ItemClass::PhuQuy => &self.phuquy_items,
        }
    }

    fn items_mut(&mut self, class: ItemClass) -> &mut Loadable<Vec<ProductItem>> {
        match class {
            ItemClass::Sjc => &mut self.sjc_items,
            ItemClass::PhuQuy => &mut self.phuquy_items,
        }
    }

    pub fn open_products(&mut self, class: ItemClass) -> Vec<AppCommand> {
        info!(class = class.label(), "Opening product modal");
        self.modal = Some(Modal::Products(ProductModal::new(class)));

        let items = self.items_mut(class);
        if items.needs_load() {
            items.begin();
            vec![AppCommand::FetchItemList(class)]
        } else {
            Vec::new()
        }
    }

    fn product_modal(&self) -> Option<&ProductModal> {
        match &self.modal {
            Some(Modal::Products(modal)) => Some(modal),
            _ => None,
        }
    }

    fn product_modal_mut(&mut self) -> Option<&mut ProductModal> {
        match &mut self.modal {
            Some(Modal::Products(modal)) => Some(modal),
            _ => None,
        }
    }

    /// Produits visibles après filtrage par la recherche
    pub fn filtered_products(&self) -> Vec<&ProductItem> {
        let Some(modal) = self.product_modal() else {
            return Vec::new();
        };
        self.items(modal.class)
            .data()
            .map(|items| items.iter().filter(|item| item.matches(&modal.query)).collect())
            .unwrap_or_default()
    }

    pub fn is_searching(&self) -> bool {
        self.product_modal().map_or(false, |m| m.searching)
    }

    pub fn start_search(&mut self) {
        if let Some(modal) = self.product_modal_mut() {
            modal.searching = true;
        }
    }

    pub fn end_search(&mut self) {
        if let Some(modal) = self.product_modal_mut() {
            modal.searching = false;
        }
    }

    pub fn search_push(&mut self, c: char) {
        if let Some(modal) = self.product_modal_mut() {
            modal.query.push(c);
            modal.selected = 0;
        }
    }

    pub fn search_backspace(&mut self) {
        if let Some(modal) = self.product_modal_mut() {
            modal.query.pop();
            modal.selected = 0;
        }
    }

    /// Charge l'historique du produit sélectionné
    pub fn select_product(&mut self) -> Vec<AppCommand> {
        let Some(class) = self.product_modal().map(|m| m.class) else {
            return Vec::new();
        };
        let selected = self.product_modal().map_or(0, |m| m.selected);
        let Some(item) = self.filtered_products().get(selected).map(|p| p.id(class)) else {
            return Vec::new();
        };

        info!(name = %item.name, branch = ?item.branch, "Product selected");
        if let Some(modal) = self.product_modal_mut() {
            modal.item = Some(item.clone());
            modal.history = Loadable::Loading;
        }
        vec![AppCommand::FetchItemHistory {
            item,
            days: ITEM_HISTORY_DAYS,
        }]
    }

    /// Variations du produit affiché dans la modale
    pub fn item_deltas(&self) -> Option<ItemDeltas> {
        let samples = self.product_modal()?.history.data()?;
        compute_item_deltas(samples)
    }

    /// Ouvre le résumé or / argent international (autres actifs ignorés)
    pub fn open_intl_summary(&mut self, asset: AssetKey) -> Vec<AppCommand> {
        if !matches!(asset, AssetKey::IntlGold | AssetKey::IntlSilver) {
            return Vec::new();
        }
        info!(asset = asset.storage_key(), "Opening international summary");
        self.modal = Some(Modal::Intl(IntlModal {
            asset,
            history: Loadable::Loading,
        }));
        vec![AppCommand::FetchHistory {
            slot: HistorySlot::Intl,
            days: ITEM_HISTORY_DAYS,
        }]
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    // ========================================================================
    // Navigation contextuelle
    // ========================================================================
    // CONCEPT RUST : Saturating arithmetic
    // - saturating_sub() ne descend pas en dessous de 0
    // - min() borne l'index au dernier élément
    // ========================================================================

    pub fn navigate_up(&mut self) {
        match &mut self.modal {
            Some(Modal::Products(modal)) => modal.selected = modal.selected.saturating_sub(1),
            Some(Modal::Country(_) | Modal::Intl(_)) => {}
            None => match self.tab {
                Tab::Portfolio => self.portfolio_selected = self.portfolio_selected.saturating_sub(1),
                Tab::Reserves => self.reserves_selected = self.reserves_selected.saturating_sub(1),
                _ => {}
            },
        }
    }

    pub fn navigate_down(&mut self) {
        if self.product_modal().is_some() {
            let max_index = self.filtered_products().len().saturating_sub(1);
            if let Some(modal) = self.product_modal_mut() {
                modal.selected = (modal.selected + 1).min(max_index);
            }
            return;
        }
        if self.modal.is_some() {
            return;
        }
        match self.tab {
            Tab::Portfolio => {
                let max_index = AssetKey::ALL.len() - 1;
                self.portfolio_selected = (self.portfolio_selected + 1).min(max_index);
            }
            Tab::Reserves => {
                let max_index = self.reserves_row_count().saturating_sub(1);
                self.reserves_selected = (self.reserves_selected + 1).min(max_index);
            }
            _ => {}
        }
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Applique un résultat du worker (la dernière réponse reçue gagne)
    ///
    /// Les réponses qui ne correspondent plus à l'affichage (autre plage,
    /// autre produit, modale fermée) sont ignorées.
    pub fn apply(&mut self, result: AppResult) {
        match result {
            AppResult::Today(result) => self.today.settle(result, TODAY_ERROR),

            AppResult::History { slot, days, result } => match slot {
                HistorySlot::Recent if days == self.settings.history_days => {
                    self.recent_history.settle(result, HISTORY_ERROR)
                }
                HistorySlot::Range if days == self.history_range.to_days() => {
                    self.range_history.settle(result, HISTORY_ERROR)
                }
                HistorySlot::Portfolio if days == self.portfolio_range.to_days() => {
                    self.portfolio_history.settle(result, HISTORY_ERROR)
                }
                HistorySlot::Long if days == self.settings.long_history_days => {
                    self.long_history.settle(result, HISTORY_ERROR)
                }
                HistorySlot::Intl => match &mut self.modal {
                    Some(Modal::Intl(modal)) if days == ITEM_HISTORY_DAYS => {
                        modal.history.settle(result, HISTORY_ERROR)
                    }
                    _ => debug!(days, "Dropping international summary for closed modal"),
                },
                _ => debug!(?slot, days, "Dropping stale history result"),
            },

            AppResult::ItemList { class, result } => self.items_mut(class).settle(result, ITEMS_ERROR),

            AppResult::ItemHistory { item, result } => match self.product_modal_mut() {
                Some(modal) if modal.item.as_ref() == Some(&item) => {
                    modal.history.settle(result, ITEM_HISTORY_ERROR)
                }
                _ => debug!(name = %item.name, "Dropping item history for closed selection"),
            },

            AppResult::ReservesTop { kind, result } => {
                if kind == self.reserves_kind {
                    self.reserves_top.settle(result, RESERVES_ERROR);
                }
            }

            AppResult::ReservesCountry { iso2, result } => match &mut self.modal {
                Some(Modal::Country(modal)) if modal.iso2 == iso2 => modal.country.settle(result, COUNTRY_ERROR),
                _ => debug!(iso2 = %iso2, "Dropping country result for closed modal"),
            },

            AppResult::WgcTop { sort, result } => {
                if sort == self.wgc_sort {
                    self.wgc_top.settle(result, WGC_ERROR);
                }
            }

            AppResult::WgcRefreshed { refresh, sort, top } => {
                self.wgc_refreshing = false;
                match refresh {
                    Ok(refresh) => {
                        info!(count = refresh.count, "WGC refresh done");
                        self.status_message = Some(format!("WGC rafraîchi ({} pays)", refresh.count));
                    }
                    Err(e) => {
                        warn!(error = %e, "WGC refresh failed");
                        self.status_message = Some("Rafraîchissement WGC impossible".to_string());
                    }
                }
                if let Some(result) = top {
                    if sort == self.wgc_sort {
                        self.wgc_top.settle(result, WGC_ERROR);
                    }
                }
            }

            AppResult::Health(result) => {
                self.backend_healthy = Some(match result {
                    Ok(health) => {
                        info!(status = %health.status, "Backend health");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "Backend health check failed");
                        false
                    }
                });
            }
        }
    }
}

/// Actif suivant dans l'ordre d'affichage, en cycle
fn cycle_asset(asset: AssetKey, step: usize) -> AssetKey {
    let index = AssetKey::ALL.iter().position(|a| *a == asset).unwrap_or(0);
    AssetKey::ALL[(index + step) % AssetKey::ALL.len()]
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    fn app() -> App {
        App::new(&Config::default(), PortfolioPrefs::in_memory())
    }

    fn offline() -> ApiError {
        ApiError::NoOrigin {
            endpoint: "/api/test".to_string(),
        }
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert_eq!(app.tab, Tab::Today);
        assert!(app.hide_zero);
        assert_eq!(app.holdings, Holdings::default());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = app();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_initial_commands() {
        let mut app = app();
        let commands = app.initial_commands(Instant::now());

        assert!(commands.contains(&AppCommand::CheckHealth));
        assert!(commands.contains(&AppCommand::FetchToday));
        assert!(commands.contains(&AppCommand::FetchHistory {
            slot: HistorySlot::Recent,
            days: 7
        }));
        assert!(app.today.is_loading());
    }

    #[test]
    fn test_tab_cycle_and_digits() {
        assert_eq!(Tab::Reserves.next(), Tab::Today);
        assert_eq!(Tab::Today.previous(), Tab::Reserves);
        assert_eq!(Tab::from_digit('4'), Some(Tab::Portfolio));
        assert_eq!(Tab::from_digit('0'), None);
        assert_eq!(Tab::from_digit('9'), None);
    }

    #[test]
    fn test_tabs_load_once() {
        let mut app = app();
        let commands = app.select_tab(Tab::Reserves);
        assert_eq!(commands.len(), 2);

        // En cours de chargement : pas de deuxième requête
        assert!(app.select_tab(Tab::Reserves).is_empty());

        let commands = app.select_tab(Tab::Portfolio);
        assert_eq!(
            commands,
            vec![AppCommand::FetchHistory {
                slot: HistorySlot::Portfolio,
                days: 90
            }]
        );
    }

    #[test]
    fn test_portfolio_range_switches_and_drops_stale_results() {
        let mut app = app();
        app.select_tab(Tab::Portfolio);
        assert_eq!(app.portfolio_range, HistoryRange::ThreeMonths);

        let commands = app.next_portfolio_range();
        assert_eq!(
            commands,
            vec![AppCommand::FetchHistory {
                slot: HistorySlot::Portfolio,
                days: 180
            }]
        );

        // Réponse de l'ancienne plage : ignorée
        app.apply(AppResult::History {
            slot: HistorySlot::Portfolio,
            days: 90,
            result: Ok(vec![HistorySample::default()]),
        });
        assert!(app.portfolio_history.is_loading());

        app.apply(AppResult::History {
            slot: HistorySlot::Portfolio,
            days: 180,
            result: Ok(vec![HistorySample::default(), HistorySample::default()]),
        });
        assert_eq!(app.portfolio_valuation().history.dates.len(), 2);
    }

    #[test]
    fn test_two_year_portfolio_range_reuses_long_history() {
        let mut app = app();
        app.apply(AppResult::History {
            slot: HistorySlot::Long,
            days: 730,
            result: Ok(vec![HistorySample::default(); 3]),
        });

        app.portfolio_range = HistoryRange::OneYear;
        assert!(app.next_portfolio_range().is_empty());
        assert_eq!(app.portfolio_range, HistoryRange::TwoYears);
        assert_eq!(app.portfolio_history_for_range().data().map(Vec::len), Some(3));
        assert_eq!(app.portfolio_valuation().history.dates.len(), 3);

        // Rafraîchir en deux ans relit l'historique long
        app.tab = Tab::Portfolio;
        let commands = app.refresh(Instant::now());
        assert!(commands.contains(&AppCommand::FetchHistory {
            slot: HistorySlot::Long,
            days: 730
        }));
    }

    #[test]
    fn test_two_year_range_reuses_long_history() {
        let mut app = app();
        app.history_range = HistoryRange::OneYear;

        let commands = app.next_range();
        assert_eq!(app.history_range, HistoryRange::TwoYears);
        assert_eq!(
            commands,
            vec![AppCommand::FetchHistory {
                slot: HistorySlot::Long,
                days: 730
            }]
        );

        app.apply(AppResult::History {
            slot: HistorySlot::Long,
            days: 730,
            result: Ok(vec![HistorySample::default()]),
        });
        assert_eq!(app.history_for_range().data().map(Vec::len), Some(1));

        // Retour à 7 jours : nouvelle requête sur la plage
        app.history_range = HistoryRange::OneMonth;
        let commands = app.previous_range();
        assert_eq!(
            commands,
            vec![AppCommand::FetchHistory {
                slot: HistorySlot::Range,
                days: 7
            }]
        );
    }

    #[test]
    fn test_intl_summary_shows_latest_row() {
        let mut app = app();
        assert!(app.open_intl_summary(AssetKey::Paxg).is_empty());
        assert!(app.modal.is_none());

        let commands = app.open_intl_summary(AssetKey::IntlSilver);
        assert_eq!(
            commands,
            vec![AppCommand::FetchHistory {
                slot: HistorySlot::Intl,
                days: ITEM_HISTORY_DAYS
            }]
        );

        app.apply(AppResult::History {
            slot: HistorySlot::Intl,
            days: ITEM_HISTORY_DAYS,
            result: Ok(vec![
                HistorySample {
                    ts: "2025-01-09T08:00:00".to_string(),
                    intl_silver_usd_oz: Some(29.5),
                    ..Default::default()
                },
                HistorySample {
                    ts: "2025-01-10T08:00:00".to_string(),
                    intl_gold_usd_oz: Some(2_650.0),
                    intl_silver_usd_oz: Some(30.1),
                    ..Default::default()
                },
            ]),
        });

        match &app.modal {
            Some(Modal::Intl(modal)) => {
                assert_eq!(modal.latest(), Some(("2025-01-10T08:00:00", Some(30.1))));
            }
            other => panic!("unexpected modal: {:?}", other),
        }
    }

    #[test]
    fn test_intl_summary_dropped_after_close() {
        let mut app = app();
        app.open_intl_summary(AssetKey::IntlGold);
        app.close_modal();

        app.apply(AppResult::History {
            slot: HistorySlot::Intl,
            days: ITEM_HISTORY_DAYS,
            result: Ok(vec![HistorySample::default()]),
        });
        assert!(app.modal.is_none());
        assert!(app.recent_history.data().is_none());
    }

    #[test]
    fn test_stale_range_result_is_dropped() {
        let mut app = app();
        app.select_tab(Tab::History);
        app.next_range(); // 30 → 90 jours

        app.apply(AppResult::History {
            slot: HistorySlot::Range,
            days: 30,
            result: Ok(vec![HistorySample::default()]),
        });
        assert!(app.range_history.is_loading());

        app.apply(AppResult::History {
            slot: HistorySlot::Range,
            days: 90,
            result: Err(offline()),
        });
        assert_eq!(app.range_history.error(), Some(HISTORY_ERROR));
    }

    #[test]
    fn test_failures_stay_local() {
        let mut app = app();
        app.apply(AppResult::Today(Ok(PriceSnapshot::default())));
        app.apply(AppResult::ReservesTop {
            kind: ReservesKind::Gold,
            result: Err(offline()),
        });

        assert!(app.today.data().is_some());
        assert_eq!(app.reserves_top.error(), Some(RESERVES_ERROR));
    }

    #[test]
    fn test_auto_refresh_interval() {
        let mut app = app();
        let start = Instant::now();
        assert!(app.tick(start).is_empty());

        app.toggle_auto_refresh(start);
        assert!(app.tick(start + Duration::from_secs(30)).is_empty());
        assert_eq!(app.tick(start + Duration::from_secs(60)), vec![AppCommand::FetchToday]);
        // Le timer repart de la dernière requête
        assert!(app.tick(start + Duration::from_secs(61)).is_empty());
    }

    #[test]
    fn test_holding_edit_commits_and_persists() {
        let mut app = app();
        app.select_tab(Tab::Portfolio);
        app.navigate_down(); // Bạc Phú Quý

        app.start_editing();
        for c in "1,5x".chars() {
            app.edit_push(c);
        }
        app.commit_editing();

        assert_eq!(app.holdings.get(AssetKey::PhuQuySilver), 1.5);
        assert_eq!(app.prefs.load_holdings().get(AssetKey::PhuQuySilver), 1.5);
        assert!(!app.is_editing());
    }

    #[test]
    fn test_invalid_holding_input_becomes_zero() {
        let mut app = app();
        app.holdings.set(AssetKey::SjcGold, 3.0);
        app.start_editing();
        app.edit_backspace();
        app.edit_backspace();
        app.edit_backspace();
        app.edit_push('.');
        app.commit_editing();
        assert_eq!(app.holdings.get(AssetKey::SjcGold), 0.0);
    }

    #[test]
    fn test_hide_zero_is_persisted() {
        let mut app = app();
        app.toggle_hide_zero();
        assert!(!app.hide_zero);
        assert!(!app.prefs.load_hide_zero());
    }

    #[test]
    fn test_portfolio_valuation_uses_snapshot() {
        let mut app = app();
        app.holdings.set(AssetKey::SjcGold, 2.0);
        let mut snapshot = PriceSnapshot::default();
        snapshot.sjc_gold.price = Some(75_000_000.0);
        app.apply(AppResult::Today(Ok(snapshot)));

        let valuation = app.portfolio_valuation();
        assert_eq!(valuation.total_now(), Some(150_000_000.0));
        assert_eq!(valuation.rows(&app.holdings, app.hide_zero).len(), 1);
    }

    #[test]
    fn test_product_search_and_selection() {
        let mut app = app();
        let commands = app.open_products(ItemClass::Sjc);
        assert_eq!(commands, vec![AppCommand::FetchItemList(ItemClass::Sjc)]);

        app.apply(AppResult::ItemList {
            class: ItemClass::Sjc,
            result: Ok(vec![
                ProductItem {
                    name: "Vàng miếng SJC".to_string(),
                    branch: Some("Hồ Chí Minh".to_string()),
                    ..Default::default()
                },
                ProductItem {
                    name: "Nhẫn SJC".to_string(),
                    branch: Some("Hà Nội".to_string()),
                    ..Default::default()
                },
            ]),
        });

        app.start_search();
        for c in "hà nội".chars() {
            app.search_push(c);
        }
        assert_eq!(app.filtered_products().len(), 1);

        let commands = app.select_product();
        let expected = ItemId {
            class: ItemClass::Sjc,
            name: "Nhẫn SJC".to_string(),
            branch: Some("Hà Nội".to_string()),
        };
        assert_eq!(
            commands,
            vec![AppCommand::FetchItemHistory {
                item: expected.clone(),
                days: ITEM_HISTORY_DAYS
            }]
        );

        app.apply(AppResult::ItemHistory {
            item: expected,
            result: Ok(vec![
                ItemSample::new("2025-01-09T15:00:00", Some(9.0), None),
                ItemSample::new("2025-01-10T08:00:00", Some(10.0), None),
                ItemSample::new("2025-01-10T14:00:00", Some(12.0), None),
            ]),
        });

        let deltas = app.item_deltas().unwrap();
        assert_eq!(deltas.vs_previous.buy.unwrap().absolute, 2.0);
        assert_eq!(deltas.vs_previous_day.buy.unwrap().absolute, 3.0);

        // Liste déjà chargée : pas de nouvelle requête
        app.close_modal();
        assert!(app.open_products(ItemClass::Sjc).is_empty());
    }

    #[test]
    fn test_item_history_for_closed_modal_is_dropped() {
        let mut app = app();
        app.apply(AppResult::ItemHistory {
            item: ItemId {
                class: ItemClass::PhuQuy,
                name: "Bạc".to_string(),
                branch: None,
            },
            result: Ok(Vec::new()),
        });
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_country_modal_from_reserves() {
        let mut app = app();
        app.select_tab(Tab::Reserves);
        app.apply(AppResult::ReservesTop {
            kind: ReservesKind::Gold,
            result: Ok(serde_json::from_str(
                r#"{"success": true, "kind": "gold", "data": [
                    {"rank": 1, "iso2": "US", "country_name": "United States"},
                    {"rank": 2, "iso2": "DE", "country_name": "Germany"}
                ]}"#,
            )
            .unwrap()),
        });

        app.navigate_down();
        let commands = app.open_selected_country();
        assert_eq!(
            commands,
            vec![AppCommand::FetchReservesCountry {
                iso2: "DE".to_string()
            }]
        );
        assert!(matches!(app.modal, Some(Modal::Country(_))));
    }

    #[test]
    fn test_wgc_refresh_flow() {
        let mut app = app();
        assert_eq!(app.refresh_wgc().len(), 1);
        assert!(app.refresh_wgc().is_empty());

        app.apply(AppResult::WgcRefreshed {
            refresh: Err(offline()),
            sort: WgcSort::Tonnes,
            top: None,
        });
        assert!(!app.wgc_refreshing);
        assert_eq!(app.status_message.as_deref(), Some("Rafraîchissement WGC impossible"));
    }

    #[test]
    fn test_kind_change_drops_old_ranking() {
        let mut app = app();
        let commands = app.cycle_reserves_kind();
        assert_eq!(
            commands,
            vec![AppCommand::FetchReservesTop {
                kind: ReservesKind::NonGold,
                limit: 20
            }]
        );

        app.apply(AppResult::ReservesTop {
            kind: ReservesKind::Gold,
            result: Err(offline()),
        });
        assert!(app.reserves_top.is_loading());
    }

    #[test]
    fn test_history_asset_cycle() {
        let mut app = app();
        app.previous_history_asset();
        assert_eq!(app.history_asset, AssetKey::Xaut);
        app.next_history_asset();
        assert_eq!(app.history_asset, AssetKey::SjcGold);
    }
}
