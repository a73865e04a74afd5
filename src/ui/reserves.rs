// ============================================================================
// Onglet Reserves
// ============================================================================
// Deux classements côte à côte :
// - Banque mondiale : réserves par type (or, hors or, total) en USD
// - World Gold Council : or détenu en tonnes, trié par tonnes ou valeur
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::app::{App, ReservesPane};
use crate::format::{format_compact_number, format_percent, format_tonnes};
use crate::models::{ReservesTop, WgcSort, WgcTop};
use crate::ui::chart::loaded_or_render;

pub fn render_reserves(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let world_bank_title = format!("Banque mondiale - {}", app.reserves_kind.label());
    if let Some(top) = loaded_or_render(frame, chunks[0], &world_bank_title, &app.reserves_top) {
        let selected = selection(app, ReservesPane::WorldBank);
        render_world_bank(frame, top, &world_bank_title, selected, chunks[0]);
    }

    let wgc_title = match app.wgc_sort {
        WgcSort::Tonnes => "WGC - tri tonnes",
        WgcSort::ValueUsd => "WGC - tri valeur",
    };
    let wgc_title = if app.wgc_refreshing {
        format!("{} (rafraîchissement...)", wgc_title)
    } else {
        wgc_title.to_string()
    };
    if let Some(top) = loaded_or_render(frame, chunks[1], &wgc_title, &app.wgc_top) {
        let selected = selection(app, ReservesPane::Wgc);
        render_wgc(frame, top, &wgc_title, selected, chunks[1]);
    }
}

/// Index sélectionné si le classement a le focus
fn selection(app: &App, pane: ReservesPane) -> Option<usize> {
    (app.reserves_pane == pane).then_some(app.reserves_selected)
}

/// "$1.23B", ou "N/A" sans symbole
fn compact_usd(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${}", format_compact_number(Some(v))),
        _ => format_compact_number(None),
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

fn row_style(index: usize, selected: Option<usize>) -> Style {
    if selected == Some(index) {
        Style::default().add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn header_row(titles: Vec<&'static str>) -> Row<'static> {
    Row::new(titles).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn render_world_bank(frame: &mut Frame, top: &ReservesTop, title: &str, selected: Option<usize>, area: Rect) {
    let rows: Vec<Row> = top
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.rank.to_string()),
                Cell::from(row.country_name.clone()),
                Cell::from(compact_usd(row.value_usd)),
                Cell::from(row.data_end_year.map(|y| y.to_string()).unwrap_or_default()),
            ])
            .style(row_style(i, selected))
        })
        .collect();

    let year = top.year.or(top.global_end_year).map(|y| format!(" {}", y)).unwrap_or_default();
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(header_row(vec!["#", "Pays", "USD", "Année"]))
    .block(pane_block(format!(" {}{} ", title, year), selected.is_some()));
    frame.render_widget(table, area);
}

fn render_wgc(frame: &mut Frame, top: &WgcTop, title: &str, selected: Option<usize>, area: Rect) {
    let rows: Vec<Row> = top
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.rank.map(|r| r.to_string()).unwrap_or_default()),
                Cell::from(row.country_name.clone()),
                Cell::from(format_tonnes(row.tonnes, 3)),
                Cell::from(format_percent(row.pct_of_reserves, 1)),
                Cell::from(compact_usd(row.value_usd)),
            ])
            .style(row_style(i, selected))
        })
        .collect();

    let as_of = top
        .meta
        .as_ref()
        .and_then(|m| m.holdings_as_of.clone())
        .map(|d| format!(" au {}", d))
        .unwrap_or_default();
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(10),
        ],
    )
    .header(header_row(vec!["#", "Pays", "Tonnes", "% rés.", "USD"]))
    .block(pane_block(format!(" {}{} ", title, as_of), selected.is_some()));
    frame.render_widget(table, area);
}
