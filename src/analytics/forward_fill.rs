// ============================================================================
// Forward-fill : report de la dernière valeur connue
// ============================================================================
// Transforme une série creuse en série "reportée" pour les graphiques et la
// valorisation :
// - output[i] = input[i] si c'est un nombre fini
// - sinon output[i] = output[i-1] (None tant qu'aucune valeur n'a été vue)
//
// Propriétés :
// - même longueur en entrée et en sortie
// - idempotent : ff(ff(x)) == ff(x)
// - une fois une valeur vue, plus aucun None ne suit
// ============================================================================

/// Reporte la dernière valeur finie connue sur les trous de la série
///
/// NaN et ±Infinity sont traités comme des valeurs manquantes.
///
/// CONCEPT RUST : scan()
/// - Comme fold(), mais émet l'état à chaque étape
/// - L'état ici est "la dernière valeur finie vue"
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .iter()
        .scan(None, |last: &mut Option<f64>, value| {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *last = Some(v);
            }
            Some(*last)
        })
        .collect()
}

/// Variante qui extrait la colonne d'une slice de lignes avant de la reporter
pub fn forward_fill_by<T, F>(rows: &[T], column: F) -> Vec<Option<f64>>
where
    F: Fn(&T) -> Option<f64>,
{
    let raw: Vec<Option<f64>> = rows.iter().map(column).collect();
    forward_fill(&raw)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_leading_gaps_stay_empty() {
        let filled = forward_fill(&[None, None, Some(3.0), None, Some(5.0), None]);
        assert_eq!(
            filled,
            vec![None, None, Some(3.0), Some(3.0), Some(5.0), Some(5.0)]
        );
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let filled = forward_fill(&[Some(1.0), Some(f64::NAN), Some(f64::INFINITY), Some(f64::NEG_INFINITY)]);
        assert_eq!(filled, vec![Some(1.0); 4]);

        let leading_nan = forward_fill(&[Some(f64::NAN), Some(2.0)]);
        assert_eq!(leading_nan, vec![None, Some(2.0)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(forward_fill(&[]).is_empty());
    }

    #[test]
    fn test_forward_fill_by_column() {
        let rows = [(1, Some(10.0)), (2, None), (3, Some(12.0))];
        let filled = forward_fill_by(&rows, |row| row.1);
        assert_eq!(filled, vec![Some(10.0), Some(10.0), Some(12.0)]);
    }

    // Les propriétés sont vérifiées sur des entrées aléatoires (quickcheck),
    // NaN et infinis compris.

    #[quickcheck]
    fn prop_same_length(values: Vec<Option<f64>>) -> bool {
        forward_fill(&values).len() == values.len()
    }

    #[quickcheck]
    fn prop_each_output_is_input_or_previous(values: Vec<Option<f64>>) -> bool {
        let filled = forward_fill(&values);
        filled.iter().enumerate().all(|(i, out)| match values[i] {
            Some(v) if v.is_finite() => *out == Some(v),
            _ if i == 0 => out.is_none(),
            _ => *out == filled[i - 1],
        })
    }

    #[quickcheck]
    fn prop_idempotent(values: Vec<Option<f64>>) -> bool {
        let once = forward_fill(&values);
        forward_fill(&once) == once
    }

    #[quickcheck]
    fn prop_no_gap_after_first_value(values: Vec<Option<f64>>) -> bool {
        let filled = forward_fill(&values);
        match filled.iter().position(|v| v.is_some()) {
            Some(first) => filled[first..].iter().all(|v| v.is_some()),
            None => values.iter().all(|v| !v.map_or(false, f64::is_finite)),
        }
    }
}
