// ============================================================================
// Onglet Portfolio
// ============================================================================
// Éditeur de quantités, valorisation "maintenant" et courbe de valeur totale
//
// La valorisation est recalculée à chaque frame depuis App : quantités,
// snapshot et historique long. Rien n'est mis en cache.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::analytics::PortfolioValuation;
use crate::app::{App, Loadable};
use crate::format::{format_compact_number, format_number, format_percent, format_signed, format_vnd};
use crate::models::AssetKey;
use crate::ui::chart::{render_line_chart, render_no_data, LineSeries};
use crate::ui::dashboard::{change_color, format_asset_price};

/// Couleur de chaque actif dans le graphique
fn asset_color(asset: AssetKey) -> Color {
    match asset {
        AssetKey::SjcGold => Color::Yellow,
        AssetKey::PhuQuySilver => Color::White,
        AssetKey::IntlGold => Color::LightYellow,
        AssetKey::IntlSilver => Color::Gray,
        AssetKey::Paxg => Color::Magenta,
        AssetKey::Xaut => Color::LightRed,
    }
}

pub fn render_portfolio(frame: &mut Frame, app: &App, area: Rect) {
    let valuation = app.portfolio_valuation();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(rows[0]);

    render_holdings_editor(frame, app, top[0]);
    render_valuation_table(frame, app, &valuation, top[1]);
    render_value_chart(frame, app, &valuation, rows[1]);
}

/// Les six actifs, toujours visibles pour pouvoir saisir une quantité
fn render_holdings_editor(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = AssetKey::ALL
        .iter()
        .enumerate()
        .map(|(i, &asset)| {
            let text = format!(
                " {:<18} {:>9} {}",
                asset.label(),
                format_number(Some(app.holdings.get(asset))),
                asset.unit()
            );
            let style = if i == app.portfolio_selected {
                Style::default().add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(Span::styled(text, style))
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Quantités "),
    );
    frame.render_widget(paragraph, area);
}

fn render_valuation_table(frame: &mut Frame, app: &App, valuation: &PortfolioValuation, area: Rect) {
    let title = format!(
        " Total {}  ({} sur 1 jour) ",
        format_vnd(valuation.total_now()),
        format_signed(valuation.total_change())
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let asset_rows = valuation.rows(&app.holdings, app.hide_zero);
    if asset_rows.is_empty() {
        let message = if app.holdings.any_held() {
            "Aucun actif à afficher"
        } else {
            "Aucune quantité saisie (e pour éditer)"
        };
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from(message)])
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = asset_rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.key.label()),
                Cell::from(format!("{} {}", format_number(Some(row.quantity)), row.key.unit())),
                Cell::from(format_asset_price(row.key, row.unit_price_now)),
                Cell::from(format_vnd(row.value_now)),
                Cell::from(format_percent(row.share_percent, 1)),
                Cell::from(format_signed(row.day_change)).style(Style::default().fg(change_color(row.day_change))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Min(0),
        ],
    )
    .header(
        Row::new(vec!["Actif", "Quantité", "Prix", "Valeur", "Part", "1 jour"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(block);
    frame.render_widget(table, area);
}

/// Valeur totale + une courbe par actif visible
fn render_value_chart(frame: &mut Frame, app: &App, valuation: &PortfolioValuation, area: Rect) {
    let title = format!("Valeur du portefeuille (VND) - {}", app.portfolio_range.label());
    match app.portfolio_history_for_range() {
        Loadable::Loading if valuation.history.is_empty() => {
            render_no_data(frame, area, &title, "Chargement...");
            return;
        }
        Loadable::Failed(message) => {
            render_no_data(frame, area, &title, message);
            return;
        }
        _ => {}
    }

    let history = &valuation.history;
    let mut series = vec![LineSeries {
        name: "Total".to_string(),
        color: Color::Green,
        values: &history.total,
    }];
    for asset in app.holdings.visible_assets(app.hide_zero) {
        series.push(LineSeries {
            name: asset.label().to_string(),
            color: asset_color(asset),
            values: history.asset(asset),
        });
    }

    render_line_chart(frame, area, &title, &history.dates, &series, format_compact_number);
}
