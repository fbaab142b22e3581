use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SailingId(pub u32);

/// Behavioral cluster label in `[0, C)`, assigned at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u16);

impl fmt::Display for GuestId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Display for SailingId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Excursion,
  Beverage,
  Dining,
  Spa,
  Retail,
  Internet,
  Entertainment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipClass {
  Ocean,
  River,
  Expedition,
  Yacht,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
  Winter,
  Spring,
  Summer,
  Autumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
  Caribbean,
  Mediterranean,
  Baltic,
  Alaska,
  Asia,
  Transatlantic,
}

/// One (guest, upcoming sailing) scoring request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
  pub guest: GuestId,
  pub sailing: SailingId,
}

impl Query {
  pub fn new(guest: GuestId, sailing: SailingId) -> Self {
    Self { guest, sailing }
  }
}

/// A scored item under consideration before final ranking.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
  pub item_id: ItemId,
  pub score: f32,
}

impl Candidate {
  pub fn new(item_id: ItemId, score: f32) -> Self {
    Self { item_id, score }
  }
}

impl From<(ItemId, f32)> for Candidate {
  fn from(value: (ItemId, f32)) -> Self {
    Candidate::new(value.0, value.1)
  }
}

/// Which blend branch scored a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  ColdStart,
  SparseHistory,
  RichHistory,
}

impl Strategy {
  /// Branch on the number of history entries that still resolve to an
  /// eligible catalog item.
  pub fn for_history(eligible_purchases: usize, rich_min: usize) -> Self {
    match eligible_purchases {
      0 => Strategy::ColdStart,
      n if n < rich_min => Strategy::SparseHistory,
      _ => Strategy::RichHistory,
    }
  }
}

/// Why a query was answered with the degraded popularity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
  UnknownGuest,
  UnknownSailing,
  SegmentFailure,
}

/// Which documented fallbacks fired while answering a query.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RecommendationFlags {
  /// Previously purchased items were readmitted as low-priority fillers.
  pub repeat_purchases: bool,
  /// The global popularity ranking topped up a short candidate set.
  pub popularity_backfill: bool,
  /// Items failing the eligibility filter were emitted as a last resort.
  pub ineligible_backfill: bool,
  pub fallback: Option<FallbackReason>,
}

/// Exactly K ranked, deduplicated item ids for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
  pub guest: GuestId,
  pub sailing: SailingId,
  /// `None` when the query failed and the degraded fallback answered it.
  pub strategy: Option<Strategy>,
  pub items: Vec<ItemId>,
  pub flags: RecommendationFlags,
}
