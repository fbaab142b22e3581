use std::cmp::Ordering;
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
  types::ItemId,
};

/// Frozen item-item similarity lookups: each item maps to its top-N most
/// similar neighbors by interaction pattern, scores in [-1, 1]. Top-N
/// truncation at fit time means the stored lists need not be mirror
/// images of one another.
#[derive(Debug)]
pub struct SimilarityIndex {
  neighbors: HashMap<ItemId, Vec<(ItemId, f32)>>,
}

impl SimilarityIndex {
  /// Entries are re-sorted on construction so lookup order never depends
  /// on the order the fit job emitted them in.
  pub fn new<I>(entries: I) -> Result<Self, FitError>
    where I: IntoIterator<Item = (ItemId, Vec<(ItemId, f32)>)> {
    let mut neighbors: HashMap<ItemId, Vec<(ItemId, f32)>> =
      entries.into_iter().collect();
    if neighbors.is_empty() {
      return Err(FitError::EmptySimilarity);
    }
    for list in neighbors.values_mut() {
      sort_scored(list);
    }
    Ok(Self { neighbors })
  }

  /// Ranked neighbors of an item. Items the fit job saw too rarely have no
  /// entry and yield an empty slice, not an error.
  pub fn neighbors(&self, item: ItemId) -> &[(ItemId, f32)] {
    self.neighbors.get(&item).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.neighbors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.neighbors.is_empty()
  }
}

pub(crate) fn sort_scored(list: &mut [(ItemId, f32)]) {
  list.sort_by(|this, other| {
    other.1.partial_cmp(&this.1)
      .unwrap_or(Ordering::Equal)
      .then(this.0.cmp(&other.0))
  });
}

/// Item-item collaborative filtering: every distinct purchased item votes
/// for its similarity neighbors, and a neighbor's votes accumulate by sum,
/// so an item similar to several past purchases ranks higher than one
/// similar to a single purchase.
#[derive(Debug)]
pub struct CollaborativeSource {
  index: Arc<SimilarityIndex>,
}

impl CollaborativeSource {
  pub fn new(index: Arc<SimilarityIndex>) -> Self {
    Self { index }
  }
}

impl CandidateSource for CollaborativeSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Collaborative
  }

  fn candidates(&self, profile: &QueryProfile<'_>, _context: &SailingContext) -> CandidateList {
    let mut scores: HashMap<ItemId, f32> = HashMap::new();
    for &purchased in profile.purchased {
      for &(neighbor, similarity) in self.index.neighbors(purchased) {
        if profile.purchased.contains(&neighbor) {
          continue;
        }
        *scores.entry(neighbor).or_insert(0.0) += similarity;
      }
    }
    trace!(candidates = scores.len(), "collaborative accumulation complete");
    CandidateList::from_scores(scores)
  }
}
