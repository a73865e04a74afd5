// ============================================================================
// Modales : produits SJC / Phú Quý et réserves d'un pays
// ============================================================================
// CONCEPT RATATUI : Clear widget
// - Efface la zone avant de dessiner la modale par-dessus l'onglet
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::analytics::{forward_fill, PriceDelta, SideDeltas};
use crate::app::{App, CountryModal, IntlModal, Modal, ProductModal, ITEM_HISTORY_DAYS};
use crate::format::{format_compact_number, format_number, format_signed, format_signed_percent, format_usd};
use crate::models::day_label;
use crate::ui::chart::{loaded_or_render, render_line_chart, LineSeries};
use crate::ui::dashboard::change_color;

/// Zone centrée de `percent_x` × `percent_y` de l'écran
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn render_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(90, 85, frame.size());
    frame.render_widget(Clear, area);

    match &app.modal {
        Some(Modal::Products(modal)) => render_products(frame, app, modal, area),
        Some(Modal::Country(modal)) => render_country(frame, modal, area),
        Some(Modal::Intl(modal)) => render_intl(frame, modal, area),
        None => {}
    }
}

// ============================================================================
// Produits
// ============================================================================

fn render_products(frame: &mut Frame, app: &App, modal: &ProductModal, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Produits {}  [/] Rechercher  [Enter] Historique  [ESC] Fermer ", modal.class.label()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);

    render_product_list(frame, app, modal, columns[0]);
    render_product_history(frame, app, modal, columns[1]);
}

fn render_product_list(frame: &mut Frame, app: &App, modal: &ProductModal, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search_style = if modal.searching {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut search = vec![Span::raw(modal.query.as_str())];
    if modal.searching {
        search.push(Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(search)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(search_style)
                .title(" Recherche "),
        ),
        chunks[0],
    );

    let title = "Produits";
    if loaded_or_render(frame, chunks[1], title, app.items(modal.class)).is_none() {
        return;
    }

    let products = app.filtered_products();
    let rows: Vec<Row> = products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let style = if i == modal.selected {
                Style::default().add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(product.name.clone()),
                Cell::from(product.branch.clone().or_else(|| product.unit.clone()).unwrap_or_default()),
                Cell::from(format_number(product.buy_price)),
                Cell::from(format_number(product.sell_price)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(14),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["Produit", "Succursale", "Achat", "Vente"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ({}) ", title, products.len())),
    );
    frame.render_widget(table, chunks[1]);
}

/// "+200,000 (+1.25%)"
fn format_delta(delta: Option<PriceDelta>) -> Span<'static> {
    match delta {
        Some(delta) => Span::styled(
            format!("{} ({})", format_signed(Some(delta.absolute)), format_signed_percent(delta.percent, 2)),
            Style::default().fg(change_color(Some(delta.absolute))),
        ),
        None => Span::styled("N/A", Style::default().fg(Color::Gray)),
    }
}

fn delta_line(label: &'static str, deltas: &SideDeltas) -> Line<'static> {
    Line::from(vec![
        Span::raw(label),
        Span::raw("  achat "),
        format_delta(deltas.buy),
        Span::raw("  vente "),
        format_delta(deltas.sell),
    ])
}

fn render_product_history(frame: &mut Frame, app: &App, modal: &ProductModal, area: Rect) {
    let Some(item) = &modal.item else {
        frame.render_widget(
            Paragraph::new("Sélectionnez un produit (Enter)")
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan))),
            area,
        );
        return;
    };

    let title = match &item.branch {
        Some(branch) => format!("{} - {} ({} j)", item.name, branch, ITEM_HISTORY_DAYS),
        None => format!("{} ({} j)", item.name, ITEM_HISTORY_DAYS),
    };
    let Some(samples) = loaded_or_render(frame, area, &title, &modal.history) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let summary = match app.item_deltas() {
        Some(deltas) => vec![
            Line::from(vec![
                Span::raw("Dernier "),
                Span::styled(deltas.latest.ts.clone(), Style::default().fg(Color::Gray)),
                Span::raw("  achat "),
                Span::styled(format_number(deltas.latest.buy_price), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  vente "),
                Span::styled(format_number(deltas.latest.sell_price), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            delta_line("Précédent", &deltas.vs_previous),
            delta_line("Veille   ", &deltas.vs_previous_day),
        ],
        None => vec![Line::from("Pas d'historique pour ce produit")],
    };
    frame.render_widget(
        Paragraph::new(summary)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan))),
        chunks[0],
    );

    let dates: Vec<String> = samples.iter().map(|s| day_label(&s.ts)).collect();
    let buy = forward_fill(&samples.iter().map(|s| s.buy_price).collect::<Vec<_>>());
    let sell = forward_fill(&samples.iter().map(|s| s.sell_price).collect::<Vec<_>>());
    render_line_chart(
        frame,
        chunks[1],
        &title,
        &dates,
        &[
            LineSeries {
                name: "Achat".to_string(),
                color: Color::Green,
                values: &buy,
            },
            LineSeries {
                name: "Vente".to_string(),
                color: Color::Red,
                values: &sell,
            },
        ],
        format_number,
    );
}

// ============================================================================
// Réserves d'un pays
// ============================================================================

fn render_country(frame: &mut Frame, modal: &CountryModal, area: Rect) {
    let title = format!("Réserves {}  [ESC] Fermer", modal.iso2);
    let Some(country) = loaded_or_render(frame, area, &title, &modal.country) else {
        return;
    };

    let name = if country.country.country_name.is_empty() {
        modal.iso2.clone()
    } else {
        format!("{} ({})", country.country.country_name, modal.iso2)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let years: Vec<String> = country.data.iter().map(|row| row.year.to_string()).collect();
    let gold: Vec<Option<f64>> = country.data.iter().map(|row| row.gold_value_usd_inferred).collect();
    let total: Vec<Option<f64>> = country.data.iter().map(|row| row.total_reserves_usd).collect();
    render_line_chart(
        frame,
        chunks[0],
        &format!("{}  [ESC] Fermer", name),
        &years,
        &[
            LineSeries {
                name: "Total".to_string(),
                color: Color::Cyan,
                values: &total,
            },
            LineSeries {
                name: "Or".to_string(),
                color: Color::Yellow,
                values: &gold,
            },
        ],
        format_compact_number,
    );

    // Années les plus récentes en premier
    let rows: Vec<Row> = country
        .data
        .iter()
        .rev()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.year.to_string()),
                Cell::from(format_compact_number(row.total_reserves_usd)),
                Cell::from(format_compact_number(row.non_gold_reserves_usd)),
                Cell::from(format_compact_number(row.gold_value_usd_inferred)),
                Cell::from(row.quality_flag.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let note = country.country.note.clone().unwrap_or_default();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(0),
        ],
    )
    .header(
        Row::new(vec!["Année", "Total", "Hors or", "Or (déduit)", "Qualité"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", note)),
    );
    frame.render_widget(table, chunks[1]);
}

// ============================================================================
// Or / argent international
// ============================================================================

fn render_intl(frame: &mut Frame, modal: &IntlModal, area: Rect) {
    let title = format!("{}  [ESC] Fermer", modal.asset.label());
    if loaded_or_render(frame, area, &title, &modal.history).is_none() {
        return;
    }

    let rows: Vec<Row> = modal
        .latest()
        .map(|(ts, price)| {
            Row::new(vec![
                Cell::from(modal.asset.label()),
                Cell::from(format_usd(price)),
                Cell::from(ts.to_string()),
            ])
        })
        .into_iter()
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(18), Constraint::Length(14), Constraint::Length(22)],
    )
    .header(
        Row::new(vec!["Actif", "Prix (USD/oz)", "Date"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", title)),
    );
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(90, 85, area);
        assert!(inner.x >= area.x && inner.right() <= area.right());
        assert!(inner.y >= area.y && inner.bottom() <= area.bottom());
        assert!(inner.width >= 80);
    }
}
