use thiserror::Error;

use crate::types::{FallbackReason, GuestId, SailingId};

#[derive(Debug, Error)]
pub enum RecommendError {
  #[error("unknown guest {0}")]
  UnknownGuest(GuestId),
  #[error("unknown sailing {0}")]
  UnknownSailing(SailingId),
  #[error(transparent)]
  Fit(#[from] FitError),
}

impl From<&RecommendError> for FallbackReason {
  fn from(err: &RecommendError) -> Self {
    match err {
      RecommendError::UnknownGuest(_) => FallbackReason::UnknownGuest,
      RecommendError::UnknownSailing(_) => FallbackReason::UnknownSailing,
      RecommendError::Fit(_) => FallbackReason::SegmentFailure,
    }
  }
}

/// Fatal fit-phase failures. None of these may survive into serving: the
/// builder and index constructors surface them before any query is scored.
#[derive(Debug, Error)]
pub enum FitError {
  #[error("segment model has no centroids")]
  NoCentroids,
  #[error("feature vector has {got} dimensions, centroids have {expected}")]
  DimensionMismatch { expected: usize, got: usize },
  #[error("similarity index is empty")]
  EmptySimilarity,
  #[error("basket index is empty")]
  EmptyBasket,
  #[error("popularity index is empty")]
  EmptyPopularity,
  #[error("item catalog is empty")]
  EmptyCatalog,
  #[error("recommender field `{0}` was not set")]
  Uninitialized(&'static str),
}
