// ============================================================================
// Formatage des nombres pour l'affichage
// ============================================================================
// Fonctions pures : nombre (optionnel) → String
// - séparateur de milliers ",", point décimal "." (style en-US)
// - None, NaN et ±Infinity → "N/A"
// ============================================================================

/// Texte affiché pour une valeur inconnue
pub const NOT_AVAILABLE: &str = "N/A";

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Insère un "," toutes les trois positions dans une partie entière
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Arrondi à `min..=max` décimales avec séparateurs de milliers
fn format_decimal(value: f64, min_digits: usize, max_digits: usize) -> String {
    let fixed = format!("{:.*}", max_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (fixed.as_str(), ""),
    };

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_digits {
        frac.push('0');
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac.chars().all(|c| c == '0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac.is_empty() {
        format!("{}{}", sign, group_thousands(int_part))
    } else {
        format!("{}{}.{}", sign, group_thousands(int_part), frac)
    }
}

/// Nombre avec au plus 2 décimales : 1234.5 → "1,234.5"
pub fn format_number(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format_decimal(v, 0, 2),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Entier arrondi : 84999999.6 → "85,000,000"
pub fn format_integer(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format_decimal(v, 0, 0),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Notation compacte : 1.5e6 → "1.50M", 2e9 → "2B", 950 → "950"
///
/// Seul un suffixe ".00" exact est retiré ; en dessous de 1 000 le nombre est
/// arrondi à l'entier avec séparateurs.
pub fn format_compact_number(value: Option<f64>) -> String {
    let Some(value) = finite(value) else {
        return NOT_AVAILABLE.to_string();
    };

    const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let abs = value.abs();
    for (scale, suffix) in SCALES {
        if abs >= scale {
            let fixed = format!("{:.2}", value / scale);
            let trimmed = fixed.strip_suffix(".00").unwrap_or(&fixed);
            return format!("{}{}", trimmed, suffix);
        }
    }
    format_decimal(value, 0, 0)
}

/// Pourcentage à `digits` décimales fixes : 3.14159 → "3.14%"
pub fn format_percent(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format!("{:.*}%", digits, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Tonnes avec au plus `digits` décimales (3 par défaut côté UI)
pub fn format_tonnes(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) => format_decimal(v, 0, digits),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Variation signée : "+1,200", "-350.5", "0"
pub fn format_signed(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => {
            let text = format_decimal(v, 0, 2);
            if v > 0.0 && text != "0" {
                format!("+{}", text)
            } else {
                text
            }
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Variation en pourcentage signée : "+2.35%"
pub fn format_signed_percent(value: Option<f64>, digits: usize) -> String {
    match finite(value) {
        Some(v) if v > 0.0 => format!("+{:.*}%", digits, v),
        Some(v) => format!("{:.*}%", digits, v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Prix en dollars, deux décimales fixes : "$2,650.50"
pub fn format_usd(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) if v < 0.0 => format!("-${}", format_decimal(v.abs(), 2, 2)),
        Some(v) => format!("${}", format_decimal(v, 2, 2)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Prix en dongs, entier : "85,000,000 VND"
pub fn format_vnd(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{} VND", format_decimal(v, 0, 0)),
        None => NOT_AVAILABLE.to_string(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1234.5)), "1,234.5");
        assert_eq!(format_number(Some(1234.567)), "1,234.57");
        assert_eq!(format_number(Some(85_000_000.0)), "85,000,000");
        assert_eq!(format_number(Some(-0.001)), "0");
        assert_eq!(format_number(None), "N/A");
        assert_eq!(format_number(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_format_integer() {
        assert_eq!(format_integer(Some(999.6)), "1,000");
        assert_eq!(format_integer(Some(-1_234_567.0)), "-1,234,567");
        assert_eq!(format_integer(Some(f64::INFINITY)), "N/A");
    }

    #[test]
    fn test_format_compact_number() {
        assert_eq!(format_compact_number(Some(1_500_000.0)), "1.50M");
        assert_eq!(format_compact_number(Some(2_000_000_000.0)), "2B");
        assert_eq!(format_compact_number(Some(3.25e12)), "3.25T");
        assert_eq!(format_compact_number(Some(1_234.0)), "1.23K");
        assert_eq!(format_compact_number(Some(-1_500.0)), "-1.50K");
        assert_eq!(format_compact_number(Some(950.4)), "950");
        assert_eq!(format_compact_number(None), "N/A");
    }

    #[test]
    fn test_format_percent_and_tonnes() {
        assert_eq!(format_percent(Some(3.14159), 2), "3.14%");
        assert_eq!(format_percent(Some(80.0), 1), "80.0%");
        assert_eq!(format_percent(None, 2), "N/A");
        assert_eq!(format_tonnes(Some(8133.46), 3), "8,133.46");
        assert_eq!(format_tonnes(Some(2279.5612), 3), "2,279.561");
        assert_eq!(format_tonnes(Some(f64::NAN), 3), "N/A");
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(format_signed(Some(1200.0)), "+1,200");
        assert_eq!(format_signed(Some(-350.5)), "-350.5");
        assert_eq!(format_signed(Some(0.0)), "0");
        assert_eq!(format_signed_percent(Some(2.346), 2), "+2.35%");
        assert_eq!(format_signed_percent(Some(-1.0), 1), "-1.0%");
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_usd(Some(2650.5)), "$2,650.50");
        assert_eq!(format_usd(Some(-3.0)), "-$3.00");
        assert_eq!(format_vnd(Some(85_000_000.0)), "85,000,000 VND");
        assert_eq!(format_vnd(None), "N/A");
    }
}
