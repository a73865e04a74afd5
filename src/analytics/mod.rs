// ============================================================================
// Module : analytics
// ============================================================================
// Calculs purs sur les données du backend, sans I/O :
// - forward-fill des séries creuses
// - valorisation du portefeuille
// - variations de prix d'un produit
// - ratio or / argent
// ============================================================================

pub mod forward_fill;
pub mod item_delta;
pub mod ratio;
pub mod valuation;

pub use forward_fill::{forward_fill, forward_fill_by};
pub use item_delta::{compute_item_deltas, ItemDeltas, PriceDelta, SideDeltas};
pub use ratio::{current_ratio, gold_silver_ratio, ratio_history, RatioPoint};
pub use valuation::{
    latest_change, share_percent, AssetRow, PortfolioHistory, PortfolioValuation,
    SnapshotValuation,
};
