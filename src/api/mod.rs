// ============================================================================
// Module : api
// ============================================================================
// Client HTTP du backend des prix et des réserves
// ============================================================================

pub mod client;  // Requêtes typées + repli sur les origines candidates
pub mod error;   // ApiError (thiserror)

// Re-export des types principaux
pub use client::{candidate_origins, ApiClient, HealthStatus};
pub use error::ApiError;
