use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Category, GuestId, ItemId, SailingId, SegmentId};

/// One line of a guest's purchase history, ordered by time of purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
  pub item: ItemId,
  pub sailing: SailingId,
  pub amount: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
  pub id: GuestId,
  pub age: u8,
  /// Engineered feature vector, fixed dimension across the guest table.
  pub features: Vec<f32>,
  /// Precomputed segment label; resolved through the segment model when
  /// the fit run did not store one.
  #[serde(default)]
  pub segment: Option<SegmentId>,
  #[serde(default)]
  pub history: Vec<Purchase>,
  /// Booking-level category restrictions, e.g. from an occasion package.
  #[serde(default)]
  pub excluded_categories: Vec<Category>,
}

#[derive(Debug, Default)]
pub struct GuestTable {
  guests: HashMap<GuestId, Guest>,
}

impl GuestTable {
  pub fn new<I>(guests: I) -> Self
    where I: IntoIterator<Item = Guest> {
    Self {
      guests: guests.into_iter().map(|guest| (guest.id, guest)).collect(),
    }
  }

  pub fn get(&self, id: GuestId) -> Option<&Guest> {
    self.guests.get(&id)
  }

  pub fn len(&self) -> usize {
    self.guests.len()
  }

  pub fn is_empty(&self) -> bool {
    self.guests.is_empty()
  }
}

impl FromIterator<Guest> for GuestTable {
  fn from_iter<I: IntoIterator<Item = Guest>>(iter: I) -> Self {
    Self::new(iter)
  }
}
