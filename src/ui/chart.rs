// ============================================================================
// Chart - Graphique ligne générique
// ============================================================================
// Trace une ou plusieurs séries alignées sur un même axe de dates
//
// CONCEPTS RUST :
// 1. Option handling : les trous (None) ne sont pas tracés
// 2. Iterator chaining : transformer les séries en points (x, y)
// 3. Pointeurs de fonction : le formatage des labels Y est fourni par l'appelant
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::Loadable;

/// Une série à tracer
pub struct LineSeries<'a> {
    pub name: String,
    pub color: Color,
    /// Une valeur par date ; None = pas de point
    pub values: &'a [Option<f64>],
}

/// Points (index, valeur) des valeurs définies et finies
fn to_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
        .collect()
}

/// Bornes Y avec 5% de marge
fn y_bounds(points: &[Vec<(f64, f64)>]) -> Option<(f64, f64)> {
    let (min, max) = points
        .iter()
        .flatten()
        .fold((f64::MAX, f64::MIN), |(min, max), &(_x, y)| (min.min(y), max.max(y)));

    if min > max {
        return None;
    }
    let margin = ((max - min) * 0.05).max(max.abs() * 0.001);
    // Série plate à zéro : marge fixe, sinon l'axe est vide
    let margin = if margin > 0.0 { margin } else { 1.0 };
    Some((min - margin, max + margin))
}

/// Dessine un graphique ligne
///
/// `dates` donne l'axe X ; seuls la première, la date du milieu et la
/// dernière sont affichées en label.
pub fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    dates: &[String],
    series: &[LineSeries],
    format_y: fn(Option<f64>) -> String,
) {
    let points: Vec<Vec<(f64, f64)>> = series.iter().map(|s| to_points(s.values)).collect();

    let Some((y_min, y_max)) = y_bounds(&points) else {
        render_no_data(frame, area, title, "Pas de données à afficher");
        return;
    };

    // CONCEPT RATATUI : Marker types
    // - Braille : résolution 2x4 par cellule, adapté aux longues séries
    let datasets: Vec<Dataset> = series
        .iter()
        .zip(points.iter())
        .map(|(s, pts)| {
            Dataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(s.color))
                .data(pts)
        })
        .collect();

    let x_max = dates.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => vec![
            Span::raw(first.clone()),
            Span::raw(dates[dates.len() / 2].clone()),
            Span::raw(last.clone()),
        ],
        _ => Vec::new(),
    };

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max])
        .labels(x_labels);

    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format_y(Some(y_min))),
            Span::raw(format_y(Some((y_min + y_max) / 2.0))),
            Span::raw(format_y(Some(y_max))),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", title)),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

// ============================================================================
// Helpers : messages à la place d'un contenu
// ============================================================================

/// Affiche un message dans un cadre
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    render_message(frame, area, title, message, Color::Gray);
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Rend l'état d'un Loadable qui n'a pas (encore) de données
///
/// Retourne les données si elles sont disponibles, sinon dessine
/// "Chargement..." ou le message d'erreur et retourne None.
pub fn loaded_or_render<'a, T>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    state: &'a Loadable<T>,
) -> Option<&'a T> {
    match state {
        Loadable::Loaded(data) => Some(data),
        Loadable::Loading => {
            render_message(frame, area, title, "Chargement...", Color::Yellow);
            None
        }
        Loadable::Failed(message) => {
            render_message(frame, area, title, &format!("⚠ {} (r pour réessayer)", message), Color::Red);
            None
        }
        Loadable::Idle => {
            render_no_data(frame, area, title, "Pas encore chargé");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_are_skipped() {
        let points = to_points(&[None, Some(1.0), Some(f64::NAN), Some(3.0)]);
        assert_eq!(points, vec![(1.0, 1.0), (3.0, 3.0)]);
    }

    #[test]
    fn test_y_bounds() {
        assert_eq!(y_bounds(&[Vec::new()]), None);

        let (min, max) = y_bounds(&[vec![(0.0, 100.0), (1.0, 200.0)]]).unwrap();
        assert!((min - 95.0).abs() < 1e-9);
        assert!((max - 205.0).abs() < 1e-9);

        // Série plate : marge non nulle
        let (min, max) = y_bounds(&[vec![(0.0, 50.0)]]).unwrap();
        assert!(min < 50.0 && max > 50.0);
    }

    #[test]
    fn test_y_bounds_flat_zero_series() {
        // Portefeuille vide : toutes les valeurs valent 0
        let (min, max) = y_bounds(&[vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]]).unwrap();
        assert_eq!((min, max), (-1.0, 1.0));
    }
}
