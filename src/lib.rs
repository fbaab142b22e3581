//! Hybrid recommendation engine for cruise catalog items: per-guest blend
//! of contextual popularity, revenue potential, item-item collaborative
//! filtering, and market-basket cross-sell signals over frozen fitted
//! indices.

pub mod basket;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod context;
pub mod eligibility;
pub mod error;
pub mod guest;
pub mod hybrid;
pub mod list;
pub mod popularity;
pub mod segment;
pub mod similarity;
pub mod types;

#[macro_use]
extern crate derive_builder;

use std::collections::BTreeSet;

use serde::Serialize;

pub use basket::{BasketIndex, BasketSource, DEFAULT_MIN_CONFIDENCE};
pub use batch::BatchStats;
pub use catalog::{Item, ItemTable, RevenueSource};
pub use config::{HybridConfig, HybridConfigBuilder};
pub use context::{ContextKey, ContextTable, SailingContext};
pub use eligibility::EligibilityFilter;
pub use error::{FitError, RecommendError};
pub use guest::{Guest, GuestTable, Purchase};
pub use hybrid::{HybridRecommender, HybridRecommenderBuilder};
pub use list::CandidateList;
pub use popularity::{PopularityIndex, PopularitySource};
pub use segment::SegmentModel;
pub use similarity::{CollaborativeSource, SimilarityIndex};
pub use types::{
  Candidate, Category, FallbackReason, GuestId, ItemId, Query, Recommendation,
  RecommendationFlags, Region, SailingId, Season, SegmentId, ShipClass, Strategy,
};

/// Which signal a candidate list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  Popularity,
  Revenue,
  Collaborative,
  Basket,
}

/// The guest view every source scores against: the resolved segment and
/// the distinct set of items the guest already bought. `BTreeSet` keeps
/// accumulation order reproducible.
pub struct QueryProfile<'a> {
  pub guest: &'a Guest,
  pub segment: SegmentId,
  pub purchased: &'a BTreeSet<ItemId>,
}

/// One recall signal feeding the hybrid blend. Implementations read only
/// frozen indices and must stay pure: same profile and context, same list.
pub trait CandidateSource {
  fn kind(&self) -> SourceKind;
  fn candidates(&self, profile: &QueryProfile<'_>, context: &SailingContext) -> CandidateList;
}
