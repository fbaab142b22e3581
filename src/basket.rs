use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{
  CandidateSource,
  QueryProfile,
  SourceKind,
  context::SailingContext,
  error::FitError,
  list::CandidateList,
  similarity::sort_scored,
  types::ItemId,
};

/// Confidence floor below which mined co-purchase entries are treated as
/// noise and dropped at construction.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.01;

/// Frozen market-basket lookups: each item maps to complementary items
/// with an association confidence in [0, 1]. Directional: the confidence
/// of A given B need not match B given A.
#[derive(Debug)]
pub struct BasketIndex {
  complements: HashMap<ItemId, Vec<(ItemId, f32)>>,
}

impl BasketIndex {
  pub fn new<I>(entries: I, min_confidence: f32) -> Result<Self, FitError>
    where I: IntoIterator<Item = (ItemId, Vec<(ItemId, f32)>)> {
    let mut complements: HashMap<ItemId, Vec<(ItemId, f32)>> =
      entries.into_iter().collect();
    if complements.is_empty() {
      return Err(FitError::EmptyBasket);
    }
    for list in complements.values_mut() {
      list.retain(|&(_, confidence)| confidence >= min_confidence);
      sort_scored(list);
    }
    Ok(Self { complements })
  }

  /// Ranked complements of an item; empty slice when the fit job observed
  /// no co-purchases for it.
  pub fn complements(&self, item: ItemId) -> &[(ItemId, f32)] {
    self.complements.get(&item).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.complements.len()
  }

  pub fn is_empty(&self) -> bool {
    self.complements.is_empty()
  }
}

/// Cross-sell signal: complements of every distinct purchased item,
/// confidences summed so repeated co-occurrence reinforces the
/// relationship.
#[derive(Debug)]
pub struct BasketSource {
  index: Arc<BasketIndex>,
}

impl BasketSource {
  pub fn new(index: Arc<BasketIndex>) -> Self {
    Self { index }
  }
}

impl CandidateSource for BasketSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Basket
  }

  fn candidates(&self, profile: &QueryProfile<'_>, _context: &SailingContext) -> CandidateList {
    let mut scores: HashMap<ItemId, f32> = HashMap::new();
    for &purchased in profile.purchased {
      for &(complement, confidence) in self.index.complements(purchased) {
        if profile.purchased.contains(&complement) {
          continue;
        }
        *scores.entry(complement).or_insert(0.0) += confidence;
      }
    }
    trace!(candidates = scores.len(), "basket accumulation complete");
    CandidateList::from_scores(scores)
  }
}
