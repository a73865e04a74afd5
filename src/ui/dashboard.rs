// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// CONCEPTS RUST :
// 1. Emprunts partagés : &App, le rendu ne modifie jamais l'état
// 2. Builder pattern : construction fluide des widgets
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Tabs / Table / Paragraph : widgets de base
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::analytics::{current_ratio, forward_fill, ratio_history};
use crate::app::{App, Tab};
use crate::format::{
    format_number, format_percent, format_signed, format_signed_percent, format_usd, format_vnd,
};
use crate::models::{AssetKey, HistorySample, PriceSnapshot, Spread};
use crate::ui::chart::{loaded_or_render, render_line_chart, render_no_data, LineSeries};
use crate::ui::{modal, portfolio, reserves};

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit que chaque onglet a son rendu
/// - La modale éventuelle est dessinée en dernier, par-dessus le reste
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.tab {
        Tab::Today => render_today(frame, app, chunks[1]),
        Tab::History => render_history(frame, app, chunks[1]),
        Tab::Comparison => render_comparison(frame, app, chunks[1]),
        Tab::Portfolio => portfolio::render_portfolio(frame, app, chunks[1]),
        Tab::Reserves => reserves::render_reserves(frame, app, chunks[1]),
    }

    if app.is_editing() {
        render_input_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }

    if app.modal.is_some() {
        modal::render_modal(frame, app);
    }
}

/// Header, contenu, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Onglets
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : onglets + état du backend
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(34)])
        .split(area);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
        .collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" GoldWatch "),
        )
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let (health_text, health_color) = match app.backend_healthy {
        Some(true) => ("● backend", Color::Green),
        Some(false) => ("● backend", Color::Red),
        None => ("○ backend", Color::Gray),
    };
    let auto = if app.auto_refresh {
        Span::styled(
            format!(" auto {}s", app.settings().refresh_interval.as_secs()),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled(" auto off", Style::default().fg(Color::Gray))
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(health_text, Style::default().fg(health_color)),
        auto,
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
    .alignment(Alignment::Center);
    frame.render_widget(status, chunks[1]);
}

// ============================================================================
// Helpers partagés par les onglets
// ============================================================================

/// Prix dans la devise native de l'actif
pub fn format_asset_price(asset: AssetKey, value: Option<f64>) -> String {
    if asset.is_fx_converted() {
        format_usd(value)
    } else {
        format_vnd(value)
    }
}

/// Vert si positif, rouge si négatif, gris sinon
pub fn change_color(value: Option<f64>) -> Color {
    match value {
        Some(v) if v > 0.0 => Color::Green,
        Some(v) if v < 0.0 => Color::Red,
        _ => Color::Gray,
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

// ============================================================================
// Onglet Today : cartes de prix + spreads
// ============================================================================

fn render_today(frame: &mut Frame, app: &App, area: Rect) {
    let Some(snapshot) = loaded_or_render(frame, area, "Prix du jour", &app.today) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Taux + heure de mise à jour
            Constraint::Length(6), // Cartes ligne 1
            Constraint::Length(6), // Cartes ligne 2
            Constraint::Length(5), // Spreads
            Constraint::Min(0),    // Spread sur l'historique court
        ])
        .split(area);

    let info = Line::from(vec![
        Span::raw(" USD/VND "),
        Span::styled(format_number(snapshot.usd_vnd), Style::default().fg(Color::Cyan)),
        Span::raw("   Mise à jour "),
        Span::styled(
            snapshot.update_time.clone().unwrap_or_else(|| "N/A".to_string()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(Paragraph::new(info), chunks[0]);

    for (row, assets) in AssetKey::ALL.chunks(3).enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(chunks[1 + row]);
        for (i, asset) in assets.iter().enumerate() {
            render_price_card(frame, snapshot, *asset, cells[i]);
        }
    }

    render_spreads(frame, snapshot, chunks[3]);

    let Some(samples) = app.recent_history.data() else {
        render_no_data(frame, chunks[4], "Spread 7 jours", "Historique indisponible");
        return;
    };
    let dates: Vec<String> = samples.iter().map(HistorySample::day).collect();
    let gold = forward_fill(&samples.iter().map(|s| s.gold_spread_percent).collect::<Vec<_>>());
    let silver = forward_fill(&samples.iter().map(|s| s.silver_spread_percent).collect::<Vec<_>>());
    render_line_chart(
        frame,
        chunks[4],
        "Spread domestique / international (%)",
        &dates,
        &[
            LineSeries {
                name: "Or".to_string(),
                color: Color::Yellow,
                values: &gold,
            },
            LineSeries {
                name: "Argent".to_string(),
                color: Color::White,
                values: &silver,
            },
        ],
        |v| format_percent(v, 1),
    );
}

/// Carte d'un actif : prix, variation, source
fn render_price_card(frame: &mut Frame, snapshot: &PriceSnapshot, asset: AssetKey, area: Rect) {
    let price = asset.snapshot_price(snapshot);

    let (change, change_percent, source) = match asset {
        AssetKey::SjcGold => (None, None, snapshot.sjc_gold.source.clone()),
        AssetKey::PhuQuySilver => (None, None, snapshot.phuquy_silver.source.clone()),
        AssetKey::IntlGold => market_fields(&snapshot.intl_gold),
        AssetKey::IntlSilver => market_fields(&snapshot.intl_silver),
        AssetKey::Paxg => market_fields(&snapshot.paxg),
        AssetKey::Xaut => market_fields(&snapshot.xaut),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format_asset_price(asset, price),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(asset.price_unit(), Style::default().fg(Color::Gray))),
    ];
    if asset.is_fx_converted() {
        lines.push(Line::from(Span::styled(
            format!("{} ({})", format_signed(change), format_signed_percent(change_percent, 2)),
            Style::default().fg(change_color(change)),
        )));
    }
    if let Some(source) = source {
        lines.push(Line::from(Span::styled(source, Style::default().fg(Color::DarkGray))));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", asset.label())),
        )
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn market_fields(quote: &crate::models::MarketQuote) -> (Option<f64>, Option<f64>, Option<String>) {
    (quote.change, quote.change_percent, quote.source.clone())
}

fn render_spreads(frame: &mut Frame, snapshot: &PriceSnapshot, area: Rect) {
    let spread_row = |label: &'static str, spread: &Spread| {
        Row::new(vec![
            Cell::from(label),
            Cell::from(format_vnd(spread.spread_vnd)),
            Cell::from(format_signed_percent(spread.spread_percent, 2))
                .style(Style::default().fg(change_color(spread.spread_percent))),
            Cell::from(format_vnd(spread.intl_in_vnd)),
            Cell::from(spread.unit.clone().unwrap_or_default()),
        ])
    };

    let table = Table::new(
        vec![
            spread_row("Or SJC", &snapshot.gold_spread),
            spread_row("Argent Phú Quý", &snapshot.silver_spread),
        ],
        [
            Constraint::Length(16),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Min(0),
        ],
    )
    .header(Row::new(vec!["", "Écart", "Écart %", "Intl en VND", "Unité"]).style(header_style()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Spreads "),
    );
    frame.render_widget(table, area);
}

// ============================================================================
// Onglet History : un actif sur la plage choisie
// ============================================================================

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let asset = app.history_asset;
    let title = format!("{} - {}", asset.label(), app.history_range.label());

    let Some(samples) = loaded_or_render(frame, area, &title, app.history_for_range()) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let dates: Vec<String> = samples.iter().map(HistorySample::day).collect();
    let raw: Vec<Option<f64>> = samples.iter().map(|s| asset.history_price(s)).collect();
    let filled = forward_fill(&raw);

    let defined: Vec<f64> = filled.iter().flatten().copied().collect();
    let first = defined.first().copied();
    let last = defined.last().copied();
    let change = first.zip(last).map(|(first, last)| last - first);
    let change_percent = first
        .zip(change)
        .filter(|(first, _)| *first != 0.0)
        .map(|(first, change)| change / first * 100.0);
    let min = defined.iter().copied().reduce(f64::min);
    let max = defined.iter().copied().reduce(f64::max);

    let stats = Line::from(vec![
        Span::raw("Dernier "),
        Span::styled(format_asset_price(asset, last), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  Variation "),
        Span::styled(
            format!("{} ({})", format_signed(change), format_signed_percent(change_percent, 2)),
            Style::default().fg(change_color(change)),
        ),
        Span::raw("  Min "),
        Span::raw(format_asset_price(asset, min)),
        Span::raw("  Max "),
        Span::raw(format_asset_price(asset, max)),
    ]);
    frame.render_widget(
        Paragraph::new(stats)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
            .alignment(Alignment::Center),
        chunks[0],
    );

    let format_y: fn(Option<f64>) -> String = if asset.is_fx_converted() { format_usd } else { format_number };
    render_line_chart(
        frame,
        chunks[1],
        &title,
        &dates,
        &[LineSeries {
            name: asset.label().to_string(),
            color: Color::Yellow,
            values: &filled,
        }],
        format_y,
    );
}

// ============================================================================
// Onglet Comparison : tableau des prix + ratio or / argent
// ============================================================================

fn render_comparison(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    if let Some(snapshot) = loaded_or_render(frame, chunks[0], "Comparaison", &app.today) {
        render_comparison_table(frame, snapshot, chunks[0]);
    }

    let title = format!("Ratio or / argent - {}", app.history_range.label());
    let Some(samples) = loaded_or_render(frame, chunks[1], &title, app.history_for_range()) else {
        return;
    };

    let points = ratio_history(samples);
    let dates: Vec<String> = points.iter().map(|p| p.day.clone()).collect();
    let ratios: Vec<Option<f64>> = points.iter().map(|p| Some(p.ratio)).collect();
    let now = app.today.data().and_then(current_ratio);

    render_line_chart(
        frame,
        chunks[1],
        &format!("{} (actuel {})", title, format_number(now)),
        &dates,
        &[LineSeries {
            name: "XAU/XAG".to_string(),
            color: Color::Yellow,
            values: &ratios,
        }],
        format_number,
    );
}

/// Une ligne par actif ; les prix USD sont aussi convertis en VND
fn render_comparison_table(frame: &mut Frame, snapshot: &PriceSnapshot, area: Rect) {
    let fx = snapshot.usd_vnd;

    let rows: Vec<Row> = AssetKey::ALL
        .iter()
        .map(|&asset| {
            let price = asset.snapshot_price(snapshot);
            let in_vnd = if asset.is_fx_converted() {
                price.zip(fx).map(|(p, fx)| p * fx)
            } else {
                price
            };
            Row::new(vec![
                Cell::from(asset.label()),
                Cell::from(format_asset_price(asset, price)),
                Cell::from(asset.price_unit()),
                Cell::from(format_vnd(in_vnd)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Min(0),
        ],
    )
    .header(Row::new(vec!["Actif", "Prix", "Unité", "En VND"]).style(header_style()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Comparaison (ratio or/argent {}) ", format_number(current_ratio(snapshot)))),
    );
    frame.render_widget(table, area);
}

// ============================================================================
// Footer : raccourcis
// ============================================================================

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

/// Raccourcis de l'onglet courant
fn tab_shortcuts(app: &App) -> Vec<Span<'static>> {
    match app.tab {
        Tab::Today => vec![
            key("[s/p]"),
            Span::raw(" Produits  "),
            key("[x/v]"),
            Span::raw(" Or/argent intl  "),
        ],
        Tab::History => vec![
            key("[[ ]]"),
            Span::raw(" Période  "),
            key("[←→]"),
            Span::raw(" Actif  "),
        ],
        Tab::Comparison => vec![key("[[ ]]"), Span::raw(" Période  ")],
        Tab::Portfolio => vec![
            key("[[ ]]"),
            Span::raw(" Période  "),
            key("[↑↓]"),
            Span::raw(" Actif  "),
            key("[e]"),
            Span::raw(" Quantité  "),
            key("[z]"),
            Span::raw(if app.hide_zero { " Afficher 0  " } else { " Masquer 0  " }),
        ],
        Tab::Reserves => vec![
            key("[←→]"),
            Span::raw(" Classement  "),
            key("[g]"),
            Span::raw(" Type  "),
            key("[o]"),
            Span::raw(" Tri  "),
            key("[u]"),
            Span::raw(" MAJ WGC  "),
            key("[Enter]"),
            Span::raw(" Pays  "),
        ],
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    // CONCEPT : Confirmation de quit two-step
    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        let mut spans = vec![
            key("[q]"),
            Span::raw(" Quit  "),
            key("[Tab/1-5]"),
            Span::raw(" Onglets  "),
            key("[r]"),
            Span::raw(" Refresh  "),
            key("[a]"),
            Span::raw(" Auto  "),
        ];
        spans.extend(tab_shortcuts(app));
        if let Some(message) = &app.status_message {
            spans.push(Span::styled(format!("│ {}", message), Style::default().fg(Color::Cyan)));
        }
        Line::from(spans)
    };

    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Footer en mode saisie d'une quantité
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let Some(input) = &app.editing else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" [Enter] Valider  [ESC] Annuler ");

    let line = Line::from(vec![
        Span::styled(
            format!("{} ({}) : ", input.asset.label(), input.asset.unit()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(input.buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
