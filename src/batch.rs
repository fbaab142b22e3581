use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{Level, info, span, warn};

use super::{
  hybrid::HybridRecommender,
  types::{
    FallbackReason, ItemId, Query, Recommendation, RecommendationFlags, Strategy,
  },
};

/// Per-batch observability counters, logged when a batch completes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchStats {
  pub queries: usize,
  pub cold_start: usize,
  pub sparse_history: usize,
  pub rich_history: usize,
  /// Queries answered by the degraded popularity fallback.
  pub degraded: usize,
  /// Queries that needed any shortfall ladder step.
  pub backfilled: usize,
}

impl BatchStats {
  fn absorb(&mut self, recommendation: &Recommendation) {
    self.queries += 1;
    match recommendation.strategy {
      Some(Strategy::ColdStart) => self.cold_start += 1,
      Some(Strategy::SparseHistory) => self.sparse_history += 1,
      Some(Strategy::RichHistory) => self.rich_history += 1,
      None => self.degraded += 1,
    }
    let flags = &recommendation.flags;
    if flags.repeat_purchases || flags.popularity_backfill || flags.ineligible_backfill {
      self.backfilled += 1;
    }
  }
}

impl HybridRecommender {
  /// Score a whole query batch. One output per input, in input order; a
  /// failing query is logged and answered with the degraded popularity
  /// list instead of aborting the batch. Queries are independent, so under
  /// the `parallel` feature they fan out across the rayon pool against the
  /// shared frozen indices.
  pub fn recommend_batch(&self, queries: &[Query], k: usize) -> Vec<Recommendation> {
    let span = span!(Level::INFO, "batch", queries = queries.len());
    let _guard = span.enter();

    #[cfg(feature = "parallel")]
    let recommendations: Vec<Recommendation> = queries.par_iter()
      .map(|&query| self.recommend_or_fallback(query, k))
      .collect();
    #[cfg(not(feature = "parallel"))]
    let recommendations: Vec<Recommendation> = queries.iter()
      .map(|&query| self.recommend_or_fallback(query, k))
      .collect();

    let mut stats = BatchStats::default();
    for recommendation in &recommendations {
      stats.absorb(recommendation);
    }
    info!(
      queries = stats.queries,
      cold_start = stats.cold_start,
      sparse = stats.sparse_history,
      rich = stats.rich_history,
      degraded = stats.degraded,
      backfilled = stats.backfilled,
      "batch scoring complete"
    );
    recommendations
  }

  /// Single-query wrapper with the batch driver's recovery policy.
  pub fn recommend_or_fallback(&self, query: Query, k: usize) -> Recommendation {
    match self.recommend(query.guest, query.sailing, k) {
      Ok(recommendation) => recommendation,
      Err(err) => {
        warn!(
          guest = query.guest.0,
          sailing = query.sailing.0,
          error = %err,
          "query failed, emitting degraded popularity output"
        );
        self.popularity_fallback(query, k, FallbackReason::from(&err))
      }
    }
  }

  /// The degraded answer for queries that cannot be resolved to a guest or
  /// sailing: global popularity order, revenue ranking to finish, no
  /// personalization at all.
  fn popularity_fallback(&self, query: Query, k: usize, reason: FallbackReason) -> Recommendation {
    let mut items: Vec<ItemId> = Vec::with_capacity(k);
    let mut seen: HashSet<ItemId> = HashSet::new();
    for &(item_id, _) in self.popularity_index.global_top() {
      if items.len() == k {
        break;
      }
      if !self.catalog.contains(item_id) || !seen.insert(item_id) {
        continue;
      }
      items.push(item_id);
    }
    for &(item_id, _) in self.catalog.revenue_ranked() {
      if items.len() == k {
        break;
      }
      if !seen.insert(item_id) {
        continue;
      }
      items.push(item_id);
    }
    Recommendation {
      guest: query.guest,
      sailing: query.sailing,
      strategy: None,
      items,
      flags: RecommendationFlags {
        fallback: Some(reason),
        ..RecommendationFlags::default()
      },
    }
  }
}
