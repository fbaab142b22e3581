use serde::{Deserialize, Serialize};

/// Mixing weights and thresholds of the blend, defaulted to the reference
/// deployment. Read-only for the duration of a batch.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct HybridConfig {
  /// Popularity share of the cold-start blend.
  pub cold_popularity_weight: f32,
  /// Revenue-potential share of the cold-start blend.
  pub cold_revenue_weight: f32,
  /// Cold-start share of the sparse-history blend.
  pub sparse_cold_weight: f32,
  /// Collaborative share of the sparse-history blend.
  pub sparse_collaborative_weight: f32,
  /// Collaborative share of the rich-history blend.
  pub rich_collaborative_weight: f32,
  /// Basket share of the rich-history blend.
  pub rich_basket_weight: f32,
  /// History length at which collaborative signal stands on its own.
  pub rich_history_min: usize,
  /// How deep into the catalog's revenue ranking the cold-start revenue
  /// signal reaches.
  pub revenue_depth: usize,
  /// Distinct-category slots targeted by the diversity pass.
  pub diversity_slots: usize,
}

impl Default for HybridConfig {
  fn default() -> Self {
    Self {
      cold_popularity_weight: 0.5,
      cold_revenue_weight: 0.5,
      sparse_cold_weight: 0.4,
      sparse_collaborative_weight: 0.6,
      rich_collaborative_weight: 0.7,
      rich_basket_weight: 0.3,
      rich_history_min: 5,
      revenue_depth: 50,
      diversity_slots: 5,
    }
  }
}
