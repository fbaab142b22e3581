use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{Level, debug, span, trace, warn};

use super::{
  CandidateSource,
  QueryProfile,
  basket::{BasketIndex, BasketSource},
  catalog::{ItemTable, RevenueSource},
  config::HybridConfig,
  context::{ContextTable, SailingContext},
  eligibility::EligibilityFilter,
  error::{FitError, RecommendError},
  guest::{Guest, GuestTable},
  list::CandidateList,
  popularity::{PopularityIndex, PopularitySource},
  segment::SegmentModel,
  similarity::{CollaborativeSource, SimilarityIndex},
  types::{
    Candidate, Category, GuestId, ItemId, Recommendation, RecommendationFlags,
    SailingId, Strategy,
  },
};

/// Multi-signal fusion engine. Selects a blend branch per guest by history
/// richness, merges the branch's sources into one ranked candidate set,
/// and emits exactly K eligible, deduplicated items per query.
///
/// All lookup structures are frozen before the first query; `recommend` is
/// a pure function of its inputs and may run from any number of threads.
#[derive(Debug)]
pub struct HybridRecommender {
  pub(crate) guests: Arc<GuestTable>,
  pub(crate) catalog: Arc<ItemTable>,
  pub(crate) contexts: Arc<ContextTable>,
  pub(crate) segments: Arc<SegmentModel>,
  pub(crate) popularity_index: Arc<PopularityIndex>,
  pub(crate) filter: EligibilityFilter,
  pub(crate) config: HybridConfig,
  popularity: PopularitySource,
  revenue: RevenueSource,
  collaborative: CollaborativeSource,
  basket: BasketSource,
}

#[derive(Builder)]
#[builder(name = "HybridRecommenderBuilder", pattern = "owned", public, build_fn(skip))]
#[allow(dead_code)]
pub struct HybridRecommenderArguments {
  guests: Arc<GuestTable>,
  catalog: Arc<ItemTable>,
  contexts: Arc<ContextTable>,
  segments: Arc<SegmentModel>,
  similarity: Arc<SimilarityIndex>,
  basket: Arc<BasketIndex>,
  popularity: Arc<PopularityIndex>,
  config: HybridConfig,
}

impl HybridRecommenderBuilder {
  /// Fit-then-serve boundary: every component must be present and
  /// non-degenerate before the first query is scored.
  pub fn build(self) -> Result<HybridRecommender, FitError> {
    let span = span!(Level::DEBUG, "hybrid-init");
    let _guard = span.enter();
    let guests = Self::unwrap_field(self.guests, "guests")?;
    let catalog = Self::unwrap_field(self.catalog, "catalog")?;
    let contexts = Self::unwrap_field(self.contexts, "contexts")?;
    let segments = Self::unwrap_field(self.segments, "segments")?;
    let similarity = Self::unwrap_field(self.similarity, "similarity")?;
    let basket = Self::unwrap_field(self.basket, "basket")?;
    let popularity = Self::unwrap_field(self.popularity, "popularity")?;
    let config = self.config.unwrap_or_default();
    debug!(
      guests = guests.len(),
      items = catalog.len(),
      segments = segments.segments(),
      "assembling hybrid recommender"
    );
    Ok(HybridRecommender {
      popularity: PopularitySource::new(Arc::clone(&popularity)),
      revenue: RevenueSource::new(Arc::clone(&catalog), config.revenue_depth),
      collaborative: CollaborativeSource::new(similarity),
      basket: BasketSource::new(basket),
      popularity_index: popularity,
      guests,
      catalog,
      contexts,
      segments,
      filter: EligibilityFilter,
      config,
    })
  }

  fn unwrap_field<T>(val: Option<T>, name: &'static str) -> Result<T, FitError> {
    val.ok_or(FitError::Uninitialized(name))
  }
}

impl HybridRecommender {
  pub fn builder() -> HybridRecommenderBuilder {
    HybridRecommenderBuilder::default()
  }

  pub fn config(&self) -> &HybridConfig {
    &self.config
  }

  /// Score one (guest, sailing) query into exactly `k` ranked item ids,
  /// provided the catalog holds that many items at all.
  pub fn recommend(
    &self,
    guest_id: GuestId,
    sailing_id: SailingId,
    k: usize,
  ) -> Result<Recommendation, RecommendError> {
    let span = span!(Level::DEBUG, "recommend", guest = guest_id.0, sailing = sailing_id.0);
    let _guard = span.enter();

    let guest = self.guests.get(guest_id)
      .ok_or(RecommendError::UnknownGuest(guest_id))?;
    let context = self.contexts.get(sailing_id)
      .ok_or(RecommendError::UnknownSailing(sailing_id))?;
    let segment = match guest.segment {
      Some(segment) => segment,
      None => self.segments.assign(&guest.features)?,
    };
    let purchased: BTreeSet<ItemId> =
      guest.history.iter().map(|purchase| purchase.item).collect();
    let profile = QueryProfile { guest, segment, purchased: &purchased };

    let eligible_history = guest.history.iter()
      .filter(|purchase| {
        self.catalog.get(purchase.item)
          .map_or(false, |item| self.filter.eligible(guest, item, context))
      })
      .count();
    let strategy = Strategy::for_history(eligible_history, self.config.rich_history_min);
    debug!(?strategy, history = eligible_history, "selected blend branch");

    let merged = self.blend_for(strategy, &profile, context);
    trace!(candidates = merged.len(), "merged candidate set");

    let mut flags = RecommendationFlags::default();
    let items = self.rank(merged, guest, context, &purchased, k, &mut flags);

    Ok(Recommendation {
      guest: guest_id,
      sailing: sailing_id,
      strategy: Some(strategy),
      items,
      flags,
    })
  }

  fn blend_for(
    &self,
    strategy: Strategy,
    profile: &QueryProfile<'_>,
    context: &SailingContext,
  ) -> CandidateList {
    match strategy {
      Strategy::ColdStart => self.cold_start(profile, context),
      Strategy::SparseHistory => CandidateList::blend(vec![
        (self.cold_start(profile, context), self.config.sparse_cold_weight),
        (self.source_candidates(&self.collaborative, profile, context),
         self.config.sparse_collaborative_weight),
      ]),
      Strategy::RichHistory => CandidateList::blend(vec![
        (self.source_candidates(&self.collaborative, profile, context),
         self.config.rich_collaborative_weight),
        (self.source_candidates(&self.basket, profile, context),
         self.config.rich_basket_weight),
      ]),
    }
  }

  fn cold_start(&self, profile: &QueryProfile<'_>, context: &SailingContext) -> CandidateList {
    CandidateList::blend(vec![
      (self.source_candidates(&self.popularity, profile, context),
       self.config.cold_popularity_weight),
      (self.source_candidates(&self.revenue, profile, context),
       self.config.cold_revenue_weight),
    ])
  }

  fn source_candidates(
    &self,
    source: &dyn CandidateSource,
    profile: &QueryProfile<'_>,
    context: &SailingContext,
  ) -> CandidateList {
    let list = source.candidates(profile, context);
    trace!(source = ?source.kind(), candidates = list.len(), "pulled source candidates");
    list
  }

  /// Eligibility-filter before truncation, diversify, then walk the
  /// shortfall ladder until `k` items stand or the catalog is exhausted.
  fn rank(
    &self,
    merged: CandidateList,
    guest: &Guest,
    context: &SailingContext,
    purchased: &BTreeSet<ItemId>,
    k: usize,
    flags: &mut RecommendationFlags,
  ) -> Vec<ItemId> {
    let mut fresh: Vec<Candidate> = Vec::new();
    let mut repeats: Vec<Candidate> = Vec::new();
    for candidate in merged.0 {
      let Some(item) = self.catalog.get(candidate.item_id) else {
        continue;
      };
      if !self.filter.eligible(guest, item, context) {
        continue;
      }
      if purchased.contains(&candidate.item_id) {
        repeats.push(candidate);
      } else {
        fresh.push(candidate);
      }
    }
    self.sort_ranked(&mut fresh);
    let mut picked = self.diversify(fresh, k);

    if picked.len() < k && !repeats.is_empty() {
      // Relax the no-repeat rule before giving up on K: previously bought
      // items come back as low-priority fillers behind every fresh pick.
      self.sort_ranked(&mut repeats);
      let before = picked.len();
      for candidate in repeats {
        if picked.len() == k {
          break;
        }
        picked.push(candidate);
      }
      if picked.len() > before {
        flags.repeat_purchases = true;
        warn!(
          guest = guest.id.0,
          readmitted = picked.len() - before,
          "readmitted previously purchased items to reach K"
        );
      }
    }

    let mut chosen: Vec<ItemId> = picked.into_iter().map(|c| c.item_id).collect();
    if chosen.len() < k {
      self.backfill(&mut chosen, guest, context, k, flags);
    }
    chosen
  }

  /// Global-popularity backfill, eligible items first, then the flagged
  /// last resort that ignores eligibility so the batch still emits K rows.
  fn backfill(
    &self,
    chosen: &mut Vec<ItemId>,
    guest: &Guest,
    context: &SailingContext,
    k: usize,
    flags: &mut RecommendationFlags,
  ) {
    let mut seen: HashSet<ItemId> = chosen.iter().copied().collect();
    let before = chosen.len();
    for &(item_id, _) in self.popularity_index.global_top() {
      if chosen.len() == k {
        break;
      }
      if seen.contains(&item_id) {
        continue;
      }
      let Some(item) = self.catalog.get(item_id) else {
        continue;
      };
      if !self.filter.eligible(guest, item, context) {
        continue;
      }
      seen.insert(item_id);
      chosen.push(item_id);
    }
    // The popularity fit may not cover the whole catalog; finish the
    // eligible sweep over the revenue ranking.
    for &(item_id, _) in self.catalog.revenue_ranked() {
      if chosen.len() == k {
        break;
      }
      if seen.contains(&item_id) {
        continue;
      }
      let Some(item) = self.catalog.get(item_id) else {
        continue;
      };
      if !self.filter.eligible(guest, item, context) {
        continue;
      }
      seen.insert(item_id);
      chosen.push(item_id);
    }
    if chosen.len() > before {
      flags.popularity_backfill = true;
      warn!(
        guest = guest.id.0,
        backfilled = chosen.len() - before,
        "backfilled short candidate set from global popularity"
      );
    }
    if chosen.len() < k {
      let ineligible_before = chosen.len();
      for &(item_id, _) in self.catalog.revenue_ranked() {
        if chosen.len() == k {
          break;
        }
        if seen.contains(&item_id) {
          continue;
        }
        seen.insert(item_id);
        chosen.push(item_id);
      }
      if chosen.len() > ineligible_before {
        flags.ineligible_backfill = true;
        warn!(
          guest = guest.id.0,
          emitted = chosen.len() - ineligible_before,
          "catalog has too few eligible items, emitting ineligible backfill"
        );
      }
    }
  }

  /// Combined score descending, then revenue potential, then lower item
  /// id, so rankings are stable across runs.
  fn sort_ranked(&self, candidates: &mut [Candidate]) {
    candidates.sort_by(|this, other| {
      other.score.partial_cmp(&this.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
          let this_margin = self.catalog.margin_of(this.item_id);
          let other_margin = self.catalog.margin_of(other.item_id);
          other_margin.partial_cmp(&this_margin).unwrap_or(Ordering::Equal)
        })
        .then(this.item_id.cmp(&other.item_id))
    });
  }

  /// Greedy category pass: the top slot keeps the best item overall, later
  /// slots inside the window prefer the best item from a category not yet
  /// represented, and once every remaining category is covered the walk
  /// reverts to pure score order.
  fn diversify(&self, ranked: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    let window = self.config.diversity_slots.min(k);
    let mut remaining = ranked;
    let mut picked: Vec<Candidate> = Vec::with_capacity(k.min(remaining.len()));
    let mut represented: HashSet<Category> = HashSet::new();
    while picked.len() < k && !remaining.is_empty() {
      let slot = picked.len();
      let index = if slot == 0 || slot >= window {
        0
      } else {
        remaining.iter()
          .position(|candidate| {
            self.catalog.category_of(candidate.item_id)
              .map_or(false, |category| !represented.contains(&category))
          })
          .unwrap_or(0)
      };
      let candidate = remaining.remove(index);
      if let Some(category) = self.catalog.category_of(candidate.item_id) {
        represented.insert(category);
      }
      picked.push(candidate);
    }
    picked
  }
}
