use std::collections::HashSet;
use std::sync::Arc;

use ndarray::array;

use sailrec::{
  BasketIndex, Category, ContextKey, ContextTable, FallbackReason, Guest, GuestId,
  GuestTable, HybridConfigBuilder, HybridRecommender, Item, ItemId, ItemTable,
  PopularityIndex, Purchase, Query, Region, SailingContext, SailingId, Season,
  SegmentId, SegmentModel, ShipClass, SimilarityIndex, Strategy,
  DEFAULT_MIN_CONFIDENCE,
};

fn item(id: u32, category: Category, margin: f32) -> Item {
  Item {
    id: ItemId(id),
    category,
    price: 100.0,
    margin,
    min_age: None,
    ships: Vec::new(),
  }
}

fn buy(item: u32) -> Purchase {
  Purchase { item: ItemId(item), sailing: SailingId(1), amount: 80.0 }
}

fn guest(id: u32, age: u8, history: Vec<Purchase>) -> Guest {
  Guest {
    id: GuestId(id),
    age,
    features: vec![0.0, 0.0],
    segment: Some(SegmentId(2)),
    history,
    excluded_categories: Vec::new(),
  }
}

fn world_items() -> Vec<Item> {
  let mut age_restricted = item(17, Category::Excursion, 0.8);
  age_restricted.min_age = Some(21);
  vec![
    age_restricted,
    item(4, Category::Spa, 0.2),
    item(55, Category::Retail, 0.1),
    item(90, Category::Beverage, 0.95),
    item(22, Category::Dining, 0.6),
    item(1, Category::Excursion, 0.5),
    item(2, Category::Beverage, 0.45),
    item(9, Category::Internet, 0.4),
    item(5, Category::Entertainment, 0.35),
    item(11, Category::Dining, 0.05),
    item(12, Category::Spa, 0.04),
    item(13, Category::Retail, 0.03),
    item(14, Category::Internet, 0.02),
    item(99, Category::Entertainment, 0.0),
  ]
}

/// A catalog of fourteen items across all seven categories, one
/// Caribbean winter sailing, and the segment-2 popularity cell from the
/// reference scenarios.
fn world() -> HybridRecommender {
  let catalog = ItemTable::new(world_items()).unwrap();

  let mut unsegmented = guest(104, 40, Vec::new());
  unsegmented.segment = None;
  unsegmented.features = vec![9.0, 9.5];
  let mut misfit = guest(105, 40, Vec::new());
  misfit.segment = None;
  misfit.features = vec![1.0];
  let guests = GuestTable::new(vec![
    guest(100, 40, Vec::new()),
    guest(101, 12, Vec::new()),
    guest(102, 40, vec![buy(1), buy(2), buy(11), buy(12), buy(13), buy(14)]),
    guest(103, 40, vec![buy(17), buy(4)]),
    unsegmented,
    misfit,
  ]);

  let contexts = ContextTable::new(vec![SailingContext {
    id: SailingId(7),
    ship: ShipClass::Ocean,
    season: Season::Winter,
    region: Region::Caribbean,
    occasions: Vec::new(),
  }]);

  let key = ContextKey { region: Region::Caribbean, season: Season::Winter };
  let popularity = PopularityIndex::new(
    vec![(
      (SegmentId(2), key),
      vec![(ItemId(17), 0.9), (ItemId(4), 0.7), (ItemId(55), 0.5)],
    )],
    &catalog,
  ).unwrap();

  let similarity = SimilarityIndex::new(vec![
    (ItemId(1), vec![(ItemId(9), 0.8), (ItemId(5), 0.6)]),
    (ItemId(2), vec![(ItemId(9), 0.5)]),
    (ItemId(4), vec![(ItemId(99), 0.9)]),
  ]).unwrap();

  let basket = BasketIndex::new(
    vec![
      (ItemId(11), vec![(ItemId(22), 0.3)]),
      (ItemId(99), vec![(ItemId(9), 0.5)]),
    ],
    DEFAULT_MIN_CONFIDENCE,
  ).unwrap();

  let segments = SegmentModel::new(array![
    [0.0, 0.0],
    [5.0, 5.0],
    [10.0, 10.0],
  ]).unwrap();

  HybridRecommender::builder()
    .guests(Arc::new(guests))
    .catalog(Arc::new(catalog))
    .contexts(Arc::new(contexts))
    .segments(Arc::new(segments))
    .similarity(Arc::new(similarity))
    .basket(Arc::new(basket))
    .popularity(Arc::new(popularity))
    .config(HybridConfigBuilder::default().revenue_depth(5usize).build().unwrap())
    .build()
    .unwrap()
}

fn assert_distinct(items: &[ItemId]) {
  let unique: HashSet<ItemId> = items.iter().copied().collect();
  assert_eq!(unique.len(), items.len(), "duplicate item ids in {items:?}");
}

#[test]
fn item_in_both_cold_sources_ranks_first() {
  // Popularity carries item 17 at 0.9 and revenue carries it at margin
  // 0.8; the accumulated blend must put it ahead of every item that
  // appears in only one source.
  let engine = world();
  let rec = engine.recommend(GuestId(100), SailingId(7), 5).unwrap();
  assert_eq!(rec.strategy, Some(Strategy::ColdStart));
  assert_eq!(rec.items[0], ItemId(17));
  for id in [90, 4, 22, 55] {
    assert!(rec.items.iter().position(|&i| i == ItemId(id)) > Some(0));
  }
}

#[test]
fn reinforced_neighbor_outranks_single_source_neighbor() {
  // Items 1 and 2 both neighbor item 9 (accumulated 1.3) while item 5 is
  // similar only to item 1 (0.6).
  let engine = world();
  let rec = engine.recommend(GuestId(102), SailingId(7), 3).unwrap();
  assert_eq!(rec.strategy, Some(Strategy::RichHistory));
  let rank_of = |id: u32| rec.items.iter().position(|&i| i == ItemId(id));
  assert!(rank_of(9).unwrap() < rank_of(5).unwrap());
}

#[test]
fn rich_history_never_repeats_purchases() {
  let engine = world();
  let rec = engine.recommend(GuestId(102), SailingId(7), 3).unwrap();
  for bought in [1, 2, 11, 12, 13, 14] {
    assert!(!rec.items.contains(&ItemId(bought)));
  }
}

#[test]
fn age_restricted_top_item_gives_up_its_slot() {
  // Item 17 tops the blend for segment 2, but a twelve-year-old cannot
  // receive it; the next eligible item takes the first slot.
  let engine = world();
  let rec = engine.recommend(GuestId(101), SailingId(7), 5).unwrap();
  assert!(!rec.items.contains(&ItemId(17)));
  assert_eq!(rec.items[0], ItemId(90));
  assert!(!rec.flags.ineligible_backfill);
}

#[test]
fn unknown_guest_still_gets_k_items() {
  let engine = world();
  let results = engine.recommend_batch(
    &[Query::new(GuestId(999), SailingId(7)), Query::new(GuestId(100), SailingId(7))],
    10,
  );
  assert_eq!(results.len(), 2);
  assert_eq!(results[0].items.len(), 10);
  assert_eq!(results[0].flags.fallback, Some(FallbackReason::UnknownGuest));
  assert_distinct(&results[0].items);
  assert_eq!(results[1].flags.fallback, None);
}

#[test]
fn repeated_calls_are_deterministic() {
  let engine = world();
  for guest_id in [100, 101, 102, 103] {
    let first = engine.recommend(GuestId(guest_id), SailingId(7), 10).unwrap();
    let second = engine.recommend(GuestId(guest_id), SailingId(7), 10).unwrap();
    assert_eq!(first.items, second.items);
  }
}

#[test]
fn exactly_k_distinct_items_for_every_guest() {
  let engine = world();
  for guest_id in [100, 101, 102, 103] {
    let rec = engine.recommend(GuestId(guest_id), SailingId(7), 10).unwrap();
    assert_eq!(rec.items.len(), 10);
    assert_distinct(&rec.items);
  }
}

#[test]
fn cold_start_carries_no_collaborative_signal() {
  // Item 99 is reachable only through the similarity index (margin 0.0,
  // absent from popularity and from the revenue depth window), so a guest
  // with no history must never see it.
  let engine = world();
  let rec = engine.recommend(GuestId(100), SailingId(7), 5).unwrap();
  assert_eq!(rec.strategy, Some(Strategy::ColdStart));
  assert!(!rec.items.contains(&ItemId(99)));
  assert!(!rec.flags.popularity_backfill);
}

#[test]
fn first_window_spans_five_categories() {
  let engine = world();
  let rec = engine.recommend(GuestId(100), SailingId(7), 5).unwrap();
  let catalog = world_items();
  let categories: HashSet<Category> = rec.items.iter()
    .map(|&id| catalog.iter().find(|item| item.id == id).unwrap().category)
    .collect();
  assert!(categories.len() >= 5, "only {} categories in {:?}", categories.len(), rec.items);
}

#[test]
fn purchased_items_return_as_low_priority_fillers() {
  // Guest 103 already bought the two strongest popularity items; asking
  // for the whole catalog forces the relaxation and the popularity
  // backfill, in that order.
  let engine = world();
  let rec = engine.recommend(GuestId(103), SailingId(7), 14).unwrap();
  assert_eq!(rec.strategy, Some(Strategy::SparseHistory));
  assert_eq!(rec.items.len(), 14);
  assert_distinct(&rec.items);
  assert!(rec.flags.repeat_purchases);
  assert!(rec.flags.popularity_backfill);
  // The readmitted purchases rank behind every fresh candidate.
  let rank_of = |id: u32| rec.items.iter().position(|&i| i == ItemId(id)).unwrap();
  assert_eq!(rank_of(17), 6);
  assert_eq!(rank_of(4), 7);
}

#[test]
fn missing_segment_resolves_through_the_model() {
  // Guest 104 stores no segment label; features [9.0, 9.5] sit nearest
  // the third centroid, so the segment-2 popularity cell applies and the
  // output matches the pre-segmented cold-start guest.
  let engine = world();
  let stored = engine.recommend(GuestId(100), SailingId(7), 5).unwrap();
  let derived = engine.recommend(GuestId(104), SailingId(7), 5).unwrap();
  assert_eq!(stored.items, derived.items);
}

#[test]
fn bad_feature_vector_degrades_instead_of_aborting() {
  let engine = world();
  let rec = engine.recommend_or_fallback(Query::new(GuestId(105), SailingId(7)), 5);
  assert_eq!(rec.flags.fallback, Some(FallbackReason::SegmentFailure));
  assert_eq!(rec.items.len(), 5);
}

#[test]
fn ineligible_backfill_is_flagged() {
  // Two of three items carry an age floor this guest fails, yet the batch
  // contract still owes three rows.
  let mut lounge = item(2, Category::Beverage, 0.5);
  lounge.min_age = Some(21);
  let mut casino = item(3, Category::Entertainment, 0.4);
  casino.min_age = Some(18);
  let catalog = ItemTable::new(vec![item(1, Category::Excursion, 0.6), lounge, casino]).unwrap();
  let guests = GuestTable::new(vec![guest(50, 10, Vec::new())]);
  let contexts = ContextTable::new(vec![SailingContext {
    id: SailingId(3),
    ship: ShipClass::River,
    season: Season::Summer,
    region: Region::Baltic,
    occasions: Vec::new(),
  }]);
  let key = ContextKey { region: Region::Baltic, season: Season::Summer };
  let popularity = PopularityIndex::new(
    vec![((SegmentId(2), key), vec![(ItemId(1), 0.9), (ItemId(2), 0.8)])],
    &catalog,
  ).unwrap();
  let engine = HybridRecommender::builder()
    .guests(Arc::new(guests))
    .catalog(Arc::new(catalog))
    .contexts(Arc::new(contexts))
    .segments(Arc::new(SegmentModel::new(array![[0.0, 0.0], [5.0, 5.0], [9.0, 9.0]]).unwrap()))
    .similarity(Arc::new(SimilarityIndex::new(vec![
      (ItemId(1), vec![(ItemId(2), 0.4)]),
    ]).unwrap()))
    .basket(Arc::new(BasketIndex::new(
      vec![(ItemId(1), vec![(ItemId(3), 0.2)])],
      DEFAULT_MIN_CONFIDENCE,
    ).unwrap()))
    .popularity(Arc::new(popularity))
    .build()
    .unwrap();

  let rec = engine.recommend(GuestId(50), SailingId(3), 3).unwrap();
  assert_eq!(rec.items.len(), 3);
  assert_distinct(&rec.items);
  assert_eq!(rec.items[0], ItemId(1));
  assert!(rec.flags.ineligible_backfill);
}
