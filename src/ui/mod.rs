// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;     // Graphique ligne générique + états de chargement
pub mod dashboard; // Layout, onglets Today / History / Comparison, footer
pub mod events;    // Gestion des événements clavier
pub mod modal;     // Modales produits et pays
pub mod portfolio; // Onglet Portfolio
pub mod reserves;  // Onglet Reserves

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
