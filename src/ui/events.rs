// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Polling avec timeout : la boucle reste réactive sans bloquer
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Délai max d'attente d'une touche avant un Tick
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

// ============================================================================
// Enum Event
// ============================================================================
// CONCEPT RUST : Enums avec données
// - Key(KeyEvent) : stocke l'événement clavier complet
// - Tick : variant sans données (unit variant)
// ============================================================================

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (auto-refresh, réception des résultats du worker)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if event::poll(POLL_TIMEOUT)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                // Resize, souris, Release : simple redessin
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : KeyEvent → action
// ============================================================================
// CONCEPT RUST : Pattern matching avec matches!
// - Un helper par action, la boucle principale reste lisible
// - Les touches lettres sont insensibles à la casse sauf mention contraire
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

fn is_letter(event: &Event, letter: char) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if c.eq_ignore_ascii_case(&letter))
}

/// 'q' : quitter (avec confirmation)
pub fn is_quit_event(event: &Event) -> bool {
    is_letter(event, 'q')
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up)) || is_letter(event, 'k')
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down)) || is_letter(event, 'j')
}

/// Flèche gauche ou 'h' : actif précédent / autre classement
pub fn is_left_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Left)) || is_letter(event, 'h')
}

/// Flèche droite ou 'l'
pub fn is_right_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Right)) || is_letter(event, 'l')
}

/// Tab : onglet suivant
pub fn is_next_tab_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Tab))
}

/// Shift+Tab : onglet précédent
pub fn is_previous_tab_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::BackTab))
}

/// '1'..'5' : accès direct à un onglet
pub fn get_tab_digit(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) if ('1'..='5').contains(&c) => Some(c),
        _ => None,
    }
}

/// 'r' : rafraîchir l'onglet courant
pub fn is_refresh_event(event: &Event) -> bool {
    is_letter(event, 'r')
}

/// 'a' : activer / désactiver l'auto-refresh
pub fn is_auto_refresh_event(event: &Event) -> bool {
    is_letter(event, 'a')
}

/// ']' : plage d'historique suivante
pub fn is_next_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(']')))
}

/// '[' : plage d'historique précédente
pub fn is_previous_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('[')))
}

/// 'z' : masquer / afficher les quantités nulles
pub fn is_hide_zero_event(event: &Event) -> bool {
    is_letter(event, 'z')
}

/// 'e' : éditer la quantité sélectionnée
pub fn is_edit_event(event: &Event) -> bool {
    is_letter(event, 'e')
}

/// 's' : produits SJC
pub fn is_sjc_products_event(event: &Event) -> bool {
    is_letter(event, 's')
}

/// 'p' : produits Phú Quý
pub fn is_phuquy_products_event(event: &Event) -> bool {
    is_letter(event, 'p')
}

/// 'x' : résumé de l'or international
pub fn is_intl_gold_event(event: &Event) -> bool {
    is_letter(event, 'x')
}

/// 'v' : résumé de l'argent international
pub fn is_intl_silver_event(event: &Event) -> bool {
    is_letter(event, 'v')
}

/// '/' : recherche dans la modale produits
pub fn is_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('/')))
}

/// 'g' : type de réserve suivant (or, hors or, total)
pub fn is_reserves_kind_event(event: &Event) -> bool {
    is_letter(event, 'g')
}

/// 'o' : tri WGC tonnes / valeur
pub fn is_wgc_sort_event(event: &Event) -> bool {
    is_letter(event, 'o')
}

/// 'u' : rafraîchir les données WGC côté backend
pub fn is_wgc_refresh_event(event: &Event) -> bool {
    is_letter(event, 'u')
}

/// Caractère accepté dans une quantité
pub fn is_number_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if c.is_ascii_digit() || c == '.' || c == ',')
}

/// Caractère imprimable (champ de recherche)
pub fn is_text_char_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(c)) if !c.is_control())
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(is_quit_event(&key(KeyCode::Char('Q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_navigation_keys() {
        assert!(is_up_event(&key(KeyCode::Char('k'))));
        assert!(is_down_event(&key(KeyCode::Down)));
        assert!(is_left_event(&key(KeyCode::Char('h'))));
        assert!(is_right_event(&key(KeyCode::Right)));
        assert!(is_next_tab_event(&key(KeyCode::Tab)));
        assert!(is_previous_tab_event(&key(KeyCode::BackTab)));
    }

    #[test]
    fn test_tab_digits() {
        assert_eq!(get_tab_digit(&key(KeyCode::Char('3'))), Some('3'));
        assert_eq!(get_tab_digit(&key(KeyCode::Char('6'))), None);
        assert_eq!(get_tab_digit(&Event::Tick), None);
    }

    #[test]
    fn test_market_letters() {
        assert!(is_sjc_products_event(&key(KeyCode::Char('s'))));
        assert!(is_intl_gold_event(&key(KeyCode::Char('X'))));
        assert!(is_intl_silver_event(&key(KeyCode::Char('v'))));
        assert!(!is_intl_silver_event(&key(KeyCode::Char('x'))));
    }

    #[test]
    fn test_input_chars() {
        assert!(is_number_char_event(&key(KeyCode::Char(','))));
        assert!(!is_number_char_event(&key(KeyCode::Char('x'))));
        assert!(is_text_char_event(&key(KeyCode::Char('ộ'))));
        assert!(!is_text_char_event(&key(KeyCode::Enter)));
        assert_eq!(get_char_from_event(&key(KeyCode::Char('/'))), Some('/'));
    }
}
