use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use super::{
  CandidateSource,
  QueryProfile,
  SourceKind,
  catalog::ItemTable,
  context::{ContextKey, SailingContext},
  error::FitError,
  list::CandidateList,
  similarity::sort_scored,
  types::{ItemId, SegmentId},
};

/// Frozen contextual popularity: ranked items per (segment, context key),
/// plus a global ranking precomputed for every backfill and degraded
/// output path. Keys live in a `BTreeMap` so the global accumulation is
/// reproducible run to run.
#[derive(Debug)]
pub struct PopularityIndex {
  by_key: BTreeMap<(SegmentId, ContextKey), Vec<(ItemId, f32)>>,
  global: Vec<(ItemId, f32)>,
}

impl PopularityIndex {
  pub fn new<I>(entries: I, catalog: &ItemTable) -> Result<Self, FitError>
    where I: IntoIterator<Item = ((SegmentId, ContextKey), Vec<(ItemId, f32)>)> {
    let mut by_key: BTreeMap<(SegmentId, ContextKey), Vec<(ItemId, f32)>> =
      entries.into_iter().collect();
    if by_key.is_empty() {
      return Err(FitError::EmptyPopularity);
    }
    for list in by_key.values_mut() {
      sort_scored(list);
    }

    let mut totals: BTreeMap<ItemId, f32> = BTreeMap::new();
    for list in by_key.values() {
      for &(item, popularity) in list {
        *totals.entry(item).or_insert(0.0) += popularity;
      }
    }
    let mut global: Vec<(ItemId, f32)> = totals.into_iter().collect();
    global.sort_by(|this, other| {
      other.1.partial_cmp(&this.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
          catalog.margin_of(other.0).partial_cmp(&catalog.margin_of(this.0))
            .unwrap_or(Ordering::Equal)
        })
        .then(this.0.cmp(&other.0))
    });

    Ok(Self { by_key, global })
  }

  /// Ranked popular items for a segment on a context; empty slice when the
  /// fit run saw no activity for that combination.
  pub fn top(&self, segment: SegmentId, key: ContextKey) -> &[(ItemId, f32)] {
    self.by_key.get(&(segment, key)).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Catalog-wide popularity ranking, summed over every (segment, context)
  /// cell and tie-broken by margin then item id.
  pub fn global_top(&self) -> &[(ItemId, f32)] {
    &self.global
  }

  pub fn len(&self) -> usize {
    self.by_key.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_key.is_empty()
  }
}

/// What guests like this one bought on sailings like this one.
#[derive(Debug)]
pub struct PopularitySource {
  index: Arc<PopularityIndex>,
}

impl PopularitySource {
  pub fn new(index: Arc<PopularityIndex>) -> Self {
    Self { index }
  }
}

impl CandidateSource for PopularitySource {
  fn kind(&self) -> SourceKind {
    SourceKind::Popularity
  }

  fn candidates(&self, profile: &QueryProfile<'_>, context: &SailingContext) -> CandidateList {
    let top = self.index.top(profile.segment, context.key());
    trace!(candidates = top.len(), "popularity lookup complete");
    CandidateList::from_ranked(top.iter().copied())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Item;
  use crate::types::{Category, Region, Season};

  fn catalog() -> ItemTable {
    let items = (1..=4).map(|id| Item {
      id: ItemId(id),
      category: Category::Excursion,
      price: 50.0,
      margin: 0.1 * id as f32,
      min_age: None,
      ships: Vec::new(),
    });
    ItemTable::new(items).unwrap()
  }

  fn key(region: Region) -> ContextKey {
    ContextKey { region, season: Season::Winter }
  }

  #[test]
  fn empty_index_fails_fit() {
    let entries: Vec<((SegmentId, ContextKey), Vec<(ItemId, f32)>)> = Vec::new();
    assert!(matches!(
      PopularityIndex::new(entries, &catalog()),
      Err(FitError::EmptyPopularity)
    ));
  }

  #[test]
  fn per_cell_lists_are_ranked() {
    let index = PopularityIndex::new(
      vec![(
        (SegmentId(2), key(Region::Caribbean)),
        vec![(ItemId(1), 0.2), (ItemId(3), 0.9)],
      )],
      &catalog(),
    ).unwrap();
    let top = index.top(SegmentId(2), key(Region::Caribbean));
    assert_eq!(top[0].0, ItemId(3));
    assert!(index.top(SegmentId(0), key(Region::Alaska)).is_empty());
  }

  #[test]
  fn global_ranking_sums_across_cells() {
    let index = PopularityIndex::new(
      vec![
        ((SegmentId(0), key(Region::Caribbean)), vec![(ItemId(1), 0.5), (ItemId(2), 0.4)]),
        ((SegmentId(1), key(Region::Alaska)), vec![(ItemId(2), 0.4)]),
      ],
      &catalog(),
    ).unwrap();
    // Item 2 totals 0.8 against item 1's 0.5.
    let global: Vec<ItemId> = index.global_top().iter().map(|&(id, _)| id).collect();
    assert_eq!(global, vec![ItemId(2), ItemId(1)]);
  }

  #[test]
  fn global_ties_prefer_higher_margin() {
    let index = PopularityIndex::new(
      vec![(
        (SegmentId(0), key(Region::Baltic)),
        vec![(ItemId(1), 0.5), (ItemId(4), 0.5)],
      )],
      &catalog(),
    ).unwrap();
    // Equal popularity; item 4 carries the higher margin.
    assert_eq!(index.global_top()[0].0, ItemId(4));
  }
}
