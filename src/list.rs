use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tap::Tap;

use super::types::{Candidate, ItemId};

/// A ranked set of scored candidates from one signal source, or the result
/// of blending several of them.
#[derive(Debug, Default, Serialize)]
pub struct CandidateList(pub Vec<Candidate>);

impl CandidateList {
  pub fn new_with_sort(recs: Vec<Candidate>) -> Self {
    Self(recs.tap_mut(|recs| recs.sort_by(Self::score_order)))
  }

  /// Collect accumulated per-item scores into a ranked list.
  pub fn from_scores(scores: HashMap<ItemId, f32>) -> Self {
    Self::new_with_sort(scores.into_iter().map(Candidate::from).collect())
  }

  /// Wrap rows that are already in rank order.
  pub fn from_ranked<I>(value: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Candidate> {
    Self(value.into_iter()
      .map(|item| item.into())
      .collect::<Vec<Candidate>>())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Min-max normalize scores to [0, 1] over this list's own rows, so no
  /// source's native scale dominates a blend. A list whose rows all carry
  /// the same score maps to 1.0.
  pub fn normalized(mut self) -> Self {
    if let Some((min, max)) = self.score_bounds() {
      let range = max - min;
      for candidate in &mut self.0 {
        candidate.score = if range > 0.0 {
          (candidate.score - min) / range
        } else {
          1.0
        };
      }
    }
    self
  }

  /// Weighted union-merge. Each part is normalized over its own rows, then
  /// every item accumulates `weight * normalized score`: one entry per
  /// item, with contributions from every part it appears in.
  pub fn blend(parts: Vec<(CandidateList, f32)>) -> Self {
    let mut combined: HashMap<ItemId, f32> = HashMap::new();
    for (part, weight) in parts {
      for candidate in part.normalized().0 {
        *combined.entry(candidate.item_id).or_insert(0.0) += weight * candidate.score;
      }
    }
    Self::from_scores(combined)
  }

  fn score_bounds(&self) -> Option<(f32, f32)> {
    self.0.iter().fold(None, |bounds, candidate| match bounds {
      None => Some((candidate.score, candidate.score)),
      Some((lo, hi)) => Some((lo.min(candidate.score), hi.max(candidate.score))),
    })
  }

  fn score_order(this: &Candidate, other: &Candidate) -> Ordering {
    other.score.partial_cmp(&this.score)
      .unwrap_or(Ordering::Equal)
      .then(this.item_id.cmp(&other.item_id))
  }
}

impl From<CandidateList> for Vec<Candidate> {
  fn from(value: CandidateList) -> Self {
    value.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn list(rows: &[(u32, f32)]) -> CandidateList {
    CandidateList::new_with_sort(
      rows.iter().map(|&(id, score)| Candidate::new(ItemId(id), score)).collect()
    )
  }

  #[test]
  fn sorts_by_score_then_lower_id() {
    let sorted = list(&[(3, 0.2), (9, 0.8), (5, 0.8)]);
    let ids: Vec<u32> = sorted.0.iter().map(|c| c.item_id.0).collect();
    assert_eq!(ids, vec![5, 9, 3]);
  }

  #[test]
  fn normalizes_to_unit_range() {
    let normalized = list(&[(1, 0.5), (2, 0.9), (3, 0.1)]).normalized();
    let scores: Vec<f32> = normalized.0.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![1.0, 0.5, 0.0]);
  }

  #[test]
  fn degenerate_normalization_maps_to_one() {
    let normalized = list(&[(1, 0.3), (2, 0.3)]).normalized();
    assert!(normalized.0.iter().all(|c| c.score == 1.0));
  }

  #[test]
  fn blend_accumulates_shared_items() {
    // Item 17 appears in both parts and must outrank each part's
    // exclusive leader.
    let popularity = list(&[(17, 0.9), (4, 0.7), (55, 0.5)]);
    let revenue = list(&[(90, 0.95), (17, 0.8), (22, 0.6)]);
    let blended = CandidateList::blend(vec![(popularity, 0.5), (revenue, 0.5)]);
    assert_eq!(blended.0[0].item_id, ItemId(17));
    let runner_up = &blended.0[1];
    assert_eq!(runner_up.item_id, ItemId(90));
    assert!(blended.0[0].score > runner_up.score);
  }

  #[test]
  fn blend_of_empty_parts_is_empty() {
    let blended = CandidateList::blend(vec![
      (CandidateList::default(), 0.5),
      (CandidateList::default(), 0.5),
    ]);
    assert!(blended.is_empty());
  }
}
