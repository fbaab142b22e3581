use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Region, SailingId, Season, ShipClass};

/// Attributes of one sailing. Read-only during scoring; the engine only
/// ever derives a popularity lookup key from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SailingContext {
  pub id: SailingId,
  pub ship: ShipClass,
  pub season: Season,
  pub region: Region,
  #[serde(default)]
  pub occasions: Vec<String>,
}

impl SailingContext {
  pub fn key(&self) -> ContextKey {
    ContextKey { region: self.region, season: self.season }
  }
}

/// Popularity lookup key derived from a sailing's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextKey {
  pub region: Region,
  pub season: Season,
}

#[derive(Debug, Default)]
pub struct ContextTable {
  sailings: HashMap<SailingId, SailingContext>,
}

impl ContextTable {
  pub fn new<I>(sailings: I) -> Self
    where I: IntoIterator<Item = SailingContext> {
    Self {
      sailings: sailings.into_iter().map(|context| (context.id, context)).collect(),
    }
  }

  pub fn get(&self, id: SailingId) -> Option<&SailingContext> {
    self.sailings.get(&id)
  }

  pub fn len(&self) -> usize {
    self.sailings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sailings.is_empty()
  }
}

impl FromIterator<SailingContext> for ContextTable {
  fn from_iter<I: IntoIterator<Item = SailingContext>>(iter: I) -> Self {
    Self::new(iter)
  }
}
