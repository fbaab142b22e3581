use super::{catalog::Item, context::SailingContext, guest::Guest};

/// Business rules deciding whether an item may be shown to a guest on a
/// given sailing. Pure predicate: no index is touched, nothing is mutated.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter;

impl EligibilityFilter {
  pub fn eligible(&self, guest: &Guest, item: &Item, context: &SailingContext) -> bool {
    if item.min_age.map_or(false, |min_age| guest.age < min_age) {
      return false;
    }
    if !item.sails_on(context.ship) {
      return false;
    }
    if guest.excluded_categories.contains(&item.category) {
      return false;
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Category, GuestId, ItemId, Region, SailingId, Season, ShipClass};

  fn guest(age: u8) -> Guest {
    Guest {
      id: GuestId(1),
      age,
      features: vec![0.0; 4],
      segment: None,
      history: Vec::new(),
      excluded_categories: Vec::new(),
    }
  }

  fn item() -> Item {
    Item {
      id: ItemId(10),
      category: Category::Beverage,
      price: 60.0,
      margin: 0.4,
      min_age: None,
      ships: Vec::new(),
    }
  }

  fn context(ship: ShipClass) -> SailingContext {
    SailingContext {
      id: SailingId(1),
      ship,
      season: Season::Winter,
      region: Region::Caribbean,
      occasions: Vec::new(),
    }
  }

  #[test]
  fn age_floor_excludes_minors() {
    let filter = EligibilityFilter;
    let mut restricted = item();
    restricted.min_age = Some(21);
    assert!(!filter.eligible(&guest(12), &restricted, &context(ShipClass::Ocean)));
    assert!(filter.eligible(&guest(30), &restricted, &context(ShipClass::Ocean)));
  }

  #[test]
  fn ship_compatibility_is_enforced() {
    let filter = EligibilityFilter;
    let mut ocean_only = item();
    ocean_only.ships = vec![ShipClass::Ocean];
    assert!(!filter.eligible(&guest(30), &ocean_only, &context(ShipClass::River)));
    assert!(filter.eligible(&guest(30), &ocean_only, &context(ShipClass::Ocean)));
  }

  #[test]
  fn booking_exclusions_remove_whole_categories() {
    let filter = EligibilityFilter;
    let mut teetotal = guest(30);
    teetotal.excluded_categories = vec![Category::Beverage];
    assert!(!filter.eligible(&teetotal, &item(), &context(ShipClass::Ocean)));
  }
}
