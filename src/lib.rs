// ============================================================================
// GoldWatch - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod analytics; // Forward-fill, valorisation, variations, ratio
pub mod api;       // Client HTTP du backend
pub mod app;       // État de l'application
pub mod config;    // Configuration (confy + variables d'environnement)
pub mod format;    // Formatage des nombres
pub mod models;    // Structures de données
pub mod storage;   // Préférences persistées (sled)
pub mod ui;        // Interface utilisateur
pub mod worker;    // Thread des appels async
