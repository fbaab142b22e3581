use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
  CandidateSource,
  QueryProfile,
  SourceKind,
  context::SailingContext,
  error::FitError,
  list::CandidateList,
  types::{Category, ItemId, ShipClass},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub id: ItemId,
  pub category: Category,
  pub price: f32,
  /// Revenue-potential score used for ranking and tie-breaking.
  pub margin: f32,
  #[serde(default)]
  pub min_age: Option<u8>,
  /// Ship classes the item can be fulfilled on. Empty means unrestricted.
  #[serde(default)]
  pub ships: Vec<ShipClass>,
}

impl Item {
  pub fn sails_on(&self, ship: ShipClass) -> bool {
    self.ships.is_empty() || self.ships.contains(&ship)
  }
}

/// The frozen item catalog, with the global revenue ranking precomputed at
/// construction.
#[derive(Debug)]
pub struct ItemTable {
  items: HashMap<ItemId, Item>,
  revenue_ranked: Vec<(ItemId, f32)>,
}

impl ItemTable {
  pub fn new<I>(items: I) -> Result<Self, FitError>
    where I: IntoIterator<Item = Item> {
    let items: HashMap<ItemId, Item> =
      items.into_iter().map(|item| (item.id, item)).collect();
    if items.is_empty() {
      return Err(FitError::EmptyCatalog);
    }
    let mut revenue_ranked: Vec<(ItemId, f32)> =
      items.values().map(|item| (item.id, item.margin)).collect();
    revenue_ranked.sort_by(|this, other| {
      other.1.partial_cmp(&this.1)
        .unwrap_or(Ordering::Equal)
        .then(this.0.cmp(&other.0))
    });
    Ok(Self { items, revenue_ranked })
  }

  pub fn get(&self, id: ItemId) -> Option<&Item> {
    self.items.get(&id)
  }

  pub fn contains(&self, id: ItemId) -> bool {
    self.items.contains_key(&id)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Revenue-potential of an item, zero for ids outside the catalog.
  pub fn margin_of(&self, id: ItemId) -> f32 {
    self.get(id).map_or(0.0, |item| item.margin)
  }

  pub fn category_of(&self, id: ItemId) -> Option<Category> {
    self.get(id).map(|item| item.category)
  }

  /// All catalog items ranked by margin descending, item id ascending.
  pub fn revenue_ranked(&self) -> &[(ItemId, f32)] {
    &self.revenue_ranked
  }
}

/// Global revenue-potential signal: the top of the catalog's margin
/// ranking, independent of the guest.
#[derive(Debug)]
pub struct RevenueSource {
  catalog: Arc<ItemTable>,
  depth: usize,
}

impl RevenueSource {
  pub fn new(catalog: Arc<ItemTable>, depth: usize) -> Self {
    Self { catalog, depth }
  }
}

impl CandidateSource for RevenueSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Revenue
  }

  fn candidates(&self, _profile: &QueryProfile<'_>, _context: &SailingContext) -> CandidateList {
    CandidateList::from_ranked(
      self.catalog.revenue_ranked().iter().copied().take(self.depth)
    )
  }
}
