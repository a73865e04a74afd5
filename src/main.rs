// ============================================================================
// GoldWatch - Tableau de bord des métaux précieux
// ============================================================================
// Programme TUI : prix du jour, historique, portefeuille et réserves
// Les données viennent du backend goldwatch via l'API HTTP
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread : les appels async tournent hors de la boucle UI
// ============================================================================

use std::io;
use std::sync::mpsc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use goldwatch::api::ApiClient;
use goldwatch::app::{App, Tab};
use goldwatch::config::{Config, APP_NAME};
use goldwatch::models::{AssetKey, ItemClass};
use goldwatch::storage::{PortfolioPrefs, SledStore};
use goldwatch::ui::{events::EventHandler, render};
use goldwatch::worker::{spawn_background_worker, AppCommand, AppResult};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - stdout appartient au TUI, on log vers un fichier
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits dans `<data dir>/goldwatch/logs/goldwatch.log.<date>`
///
/// ```bash
/// tail -f ~/.local/share/goldwatch/logs/goldwatch.log.*
/// RUST_LOG=goldwatch=trace goldwatch
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, format!("{}.log", APP_NAME));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // RUST_LOG prioritaire, sinon debug pour goldwatch et info pour le reste
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goldwatch=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

/// Préférences sur disque, ou en mémoire si la base ne s'ouvre pas
fn open_prefs(config: &Config) -> PortfolioPrefs {
    let store = config.store_path().and_then(|path| SledStore::open(&path));
    match store {
        Ok(store) => PortfolioPrefs::new(Box::new(store)),
        Err(e) => {
            warn!(error = ?e, "Preference store unavailable, holdings will not persist");
            PortfolioPrefs::in_memory()
        }
    }
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // --config-path : affiche l'emplacement du fichier de configuration
    if std::env::args().skip(1).any(|arg| arg == "--config-path") {
        println!("{}", Config::path()?.display());
        return Ok(());
    }

    let config = Config::load()?;

    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });
    info!(version = env!("CARGO_PKG_VERSION"), backend = %config.backend_url, "GoldWatch starting up");

    let client = ApiClient::new(&config).context("Impossible de créer le client HTTP")?;
    let prefs = open_prefs(&config);
    let mut app = App::new(&config, prefs);

    // CONCEPT RUST : mpsc channels
    // - command_tx/rx : UI → worker
    // - result_tx/rx : worker → UI
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    let worker = spawn_background_worker(client, command_rx, result_tx)?;

    send_commands(&command_tx, app.initial_commands(Instant::now()));

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    // Fermer le channel arrête le worker
    drop(command_tx);
    if worker.join().is_err() {
        error!("Worker thread panicked");
    }

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Transmet des commandes au worker
fn send_commands(command_tx: &mpsc::Sender<AppCommand>, commands: Vec<AppCommand>) {
    for command in commands {
        debug!(?command, "Sending command to worker");
        if command_tx.send(command).is_err() {
            error!("Worker thread disconnected, command dropped");
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================
// 0. RÉSULTATS : applique tout ce que le worker a renvoyé
// 1. RENDER : dessine l'interface
// 2. INPUT : traite un événement (ou un Tick après 250ms)
// 3. UPDATE : auto-refresh si l'intervalle est écoulé
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // CONCEPT : Non-blocking receive avec try_recv
        // - On vide le channel à chaque tour : plusieurs fetchs peuvent
        //   se terminer pendant un même poll
        loop {
            match result_rx.try_recv() {
                Ok(result) => app.apply(result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        terminal.draw(|frame| render(frame, app))?;

        match events.next() {
            Ok(event) => {
                let commands = handle_event(app, event);
                send_commands(command_tx, commands);
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }

        let commands = app.tick(Instant::now());
        send_commands(command_tx, commands);
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// CONCEPT RUST : Pattern matching avec guards
// - L'ordre des bras compte : saisie en cours, puis modale, puis onglet
// - Chaque bras renvoie les commandes à transmettre au worker
// ============================================================================

fn handle_event(app: &mut App, event: goldwatch::ui::events::Event) -> Vec<AppCommand> {
    use goldwatch::ui::events::{
        get_char_from_event, get_tab_digit, is_auto_refresh_event, is_backspace_event, is_down_event,
        is_edit_event, is_enter_event, is_escape_event, is_hide_zero_event, is_intl_gold_event,
        is_intl_silver_event, is_left_event,
        is_next_range_event, is_next_tab_event, is_number_char_event, is_phuquy_products_event,
        is_previous_range_event, is_previous_tab_event, is_quit_event, is_refresh_event,
        is_reserves_kind_event, is_right_event, is_search_event, is_sjc_products_event,
        is_text_char_event, is_up_event, is_wgc_refresh_event, is_wgc_sort_event, Event,
    };

    if let Event::Tick = event {
        return Vec::new();
    }

    // ========================================
    // Saisie d'une quantité
    // ========================================
    if app.is_editing() {
        match event {
            _ if is_escape_event(&event) => app.cancel_editing(),
            _ if is_enter_event(&event) => app.commit_editing(),
            _ if is_backspace_event(&event) => app.edit_backspace(),
            _ if is_number_char_event(&event) => {
                if let Some(c) = get_char_from_event(&event) {
                    app.edit_push(c);
                }
            }
            _ => {}
        }
        return Vec::new();
    }

    // ========================================
    // Recherche dans la modale produits
    // ========================================
    if app.is_searching() {
        match event {
            _ if is_escape_event(&event) || is_enter_event(&event) => app.end_search(),
            _ if is_backspace_event(&event) => app.search_backspace(),
            _ if is_text_char_event(&event) => {
                if let Some(c) = get_char_from_event(&event) {
                    app.search_push(c);
                }
            }
            _ => {}
        }
        return Vec::new();
    }

    let now = Instant::now();

    match event {
        // Touche 'q' : quit confirmation two-step
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
            Vec::new()
        }

        // ========================================
        // Modale ouverte
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.modal.is_some() => {
            app.cancel_quit();
            debug!("User closed modal");
            app.close_modal();
            Vec::new()
        }
        Event::Key(_) if is_search_event(&event) && app.modal.is_some() => {
            app.cancel_quit();
            app.start_search();
            Vec::new()
        }
        Event::Key(_) if is_enter_event(&event) && app.modal.is_some() => {
            app.cancel_quit();
            app.select_product()
        }
        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
            Vec::new()
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
            Vec::new()
        }
        Event::Key(_) if app.modal.is_some() => {
            app.cancel_quit();
            Vec::new()
        }

        // ========================================
        // Commandes globales
        // ========================================
        Event::Key(_) if is_next_tab_event(&event) => {
            app.cancel_quit();
            app.next_tab()
        }
        Event::Key(_) if is_previous_tab_event(&event) => {
            app.cancel_quit();
            app.previous_tab()
        }
        Event::Key(_) if get_tab_digit(&event).and_then(Tab::from_digit).is_some() => {
            app.cancel_quit();
            match get_tab_digit(&event).and_then(Tab::from_digit) {
                Some(tab) => app.select_tab(tab),
                None => Vec::new(),
            }
        }
        Event::Key(_) if is_refresh_event(&event) => {
            app.cancel_quit();
            app.refresh(now)
        }
        Event::Key(_) if is_auto_refresh_event(&event) => {
            app.cancel_quit();
            app.toggle_auto_refresh(now);
            Vec::new()
        }
        Event::Key(_) if is_sjc_products_event(&event) => {
            app.cancel_quit();
            app.open_products(ItemClass::Sjc)
        }
        Event::Key(_) if is_phuquy_products_event(&event) => {
            app.cancel_quit();
            app.open_products(ItemClass::PhuQuy)
        }
        Event::Key(_) if is_intl_gold_event(&event) => {
            app.cancel_quit();
            app.open_intl_summary(AssetKey::IntlGold)
        }
        Event::Key(_) if is_intl_silver_event(&event) => {
            app.cancel_quit();
            app.open_intl_summary(AssetKey::IntlSilver)
        }

        // ========================================
        // History / Comparison
        // ========================================
        Event::Key(_) if is_next_range_event(&event) && matches!(app.tab, Tab::History | Tab::Comparison) => {
            app.cancel_quit();
            app.next_range()
        }
        Event::Key(_) if is_previous_range_event(&event) && matches!(app.tab, Tab::History | Tab::Comparison) => {
            app.cancel_quit();
            app.previous_range()
        }
        Event::Key(_) if is_right_event(&event) && app.tab == Tab::History => {
            app.cancel_quit();
            app.next_history_asset();
            Vec::new()
        }
        Event::Key(_) if is_left_event(&event) && app.tab == Tab::History => {
            app.cancel_quit();
            app.previous_history_asset();
            Vec::new()
        }

        // ========================================
        // Portfolio
        // ========================================
        Event::Key(_) if (is_edit_event(&event) || is_enter_event(&event)) && app.tab == Tab::Portfolio => {
            app.cancel_quit();
            app.start_editing();
            Vec::new()
        }
        Event::Key(_) if is_next_range_event(&event) && app.tab == Tab::Portfolio => {
            app.cancel_quit();
            app.next_portfolio_range()
        }
        Event::Key(_) if is_previous_range_event(&event) && app.tab == Tab::Portfolio => {
            app.cancel_quit();
            app.previous_portfolio_range()
        }
        Event::Key(_) if is_hide_zero_event(&event) && app.tab == Tab::Portfolio => {
            app.cancel_quit();
            app.toggle_hide_zero();
            Vec::new()
        }

        // ========================================
        // Reserves
        // ========================================
        Event::Key(_) if (is_left_event(&event) || is_right_event(&event)) && app.tab == Tab::Reserves => {
            app.cancel_quit();
            app.switch_reserves_pane();
            Vec::new()
        }
        Event::Key(_) if is_reserves_kind_event(&event) && app.tab == Tab::Reserves => {
            app.cancel_quit();
            app.cycle_reserves_kind()
        }
        Event::Key(_) if is_wgc_sort_event(&event) && app.tab == Tab::Reserves => {
            app.cancel_quit();
            app.toggle_wgc_sort()
        }
        Event::Key(_) if is_wgc_refresh_event(&event) && app.tab == Tab::Reserves => {
            app.cancel_quit();
            app.refresh_wgc()
        }
        Event::Key(_) if is_enter_event(&event) && app.tab == Tab::Reserves => {
            app.cancel_quit();
            app.open_selected_country()
        }

        // Toute autre touche : annule la confirmation de quit
        Event::Key(_) => {
            app.cancel_quit();
            Vec::new()
        }

        Event::Tick => Vec::new(),
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
