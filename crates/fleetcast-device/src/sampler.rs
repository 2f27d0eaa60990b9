//! Randomized bounded selection over a paginated item source.
//!
//! Two modes:
//! - **small collection** (known total ≤ [`SMALL_COLLECTION_MAX`]): the whole
//!   collection fits on one page, so we shuffle the visible indices and mark
//!   until the target is reached. No scrolling.
//! - **large collection** (size unknown or above threshold): mark at most one
//!   item per visible page, then scroll forward a random number of steps
//!   bounded by the collection's scroll budget. One-per-page spreads the
//!   selection across the collection instead of clustering at the start.
//!
//! Termination is guaranteed by the empty-page budget: after
//! [`MAX_EMPTY_LOOPS`] pages with nothing markable the run ends in a
//! shortfall, which callers treat as a distinct non-fatal outcome.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{DeviceError, Result};
use crate::source::ItemSource;

/// Collections at or below this known size are selected on a single page.
pub const SMALL_COLLECTION_MAX: u32 = 32;

/// Consecutive pages with nothing markable before giving up.
pub const MAX_EMPTY_LOOPS: u32 = 10;

/// Approximate items revealed per scroll step; the scroll budget is the
/// collection size divided by this, clamped to [1, 10].
const ITEMS_PER_SCROLL: u32 = 250;

/// Scroll budget used when the collection size is unknown.
const DEFAULT_SCROLL_BUDGET: u32 = 3;

/// Upper bound on the randomized scroll count between pages.
///
/// `ceil(size / 250)` clamped to [1, 10]; 3 when the size is unknown.
pub fn scroll_budget(total_size: Option<u32>) -> u32 {
    match total_size {
        Some(n) if n > 0 => n.div_ceil(ITEMS_PER_SCROLL).clamp(1, 10),
        _ => DEFAULT_SCROLL_BUDGET,
    }
}

/// Selects a fixed number of items from an [`ItemSource`].
///
/// The RNG is injected so tests can drive the shuffle deterministically.
pub struct SelectionSampler<R: Rng> {
    rng: R,
}

impl SelectionSampler<StdRng> {
    /// Sampler seeded from OS entropy — the production constructor.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SelectionSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Select and mark exactly `count` items. Returns the number marked on
    /// success; [`DeviceError::Shortfall`] when the empty-page budget runs
    /// out first.
    pub async fn select<S: ItemSource>(&mut self, source: &mut S, count: u32) -> Result<u32> {
        match source.total_size() {
            Some(total) if total > 0 && total <= SMALL_COLLECTION_MAX => {
                self.select_small(source, count).await
            }
            total => self.select_large(source, count, scroll_budget(total)).await,
        }
    }

    /// Small-collection fast path: one page, shuffled order, no scrolling.
    async fn select_small<S: ItemSource>(&mut self, source: &mut S, count: u32) -> Result<u32> {
        let visible = source.visible_items().await?;
        debug!(visible, count, "small-collection selection");

        let mut indices: Vec<usize> = (0..visible).collect();
        indices.shuffle(&mut self.rng);

        let mut selected = 0u32;
        for index in indices {
            if selected >= count {
                break;
            }
            if source.mark(index).await? {
                selected += 1;
            }
        }

        if selected < count {
            warn!(selected, count, "small-collection shortfall");
            return Err(DeviceError::Shortfall {
                selected,
                requested: count,
            });
        }
        Ok(selected)
    }

    /// Large-collection path: one mark per page, randomized bounded scroll.
    async fn select_large<S: ItemSource>(
        &mut self,
        source: &mut S,
        count: u32,
        budget: u32,
    ) -> Result<u32> {
        let mut selected = 0u32;
        let mut empty_loops = 0u32;

        while selected < count && empty_loops < MAX_EMPTY_LOOPS {
            let visible = source.visible_items().await?;

            if visible == 0 {
                empty_loops += 1;
                debug!(empty_loops, "no items visible, scrolling on");
            } else {
                let mut indices: Vec<usize> = (0..visible).collect();
                indices.shuffle(&mut self.rng);

                let mut marked_this_page = false;
                for index in indices {
                    if selected >= count {
                        break;
                    }
                    if source.mark(index).await? {
                        selected += 1;
                        marked_this_page = true;
                        debug!(selected, count, "item marked");
                        break;
                    }
                }

                if !marked_this_page {
                    empty_loops += 1;
                }
            }

            let steps = self.rng.gen_range(1..=budget);
            for _ in 0..steps {
                source.scroll_next().await?;
            }
        }

        if selected < count {
            warn!(selected, count, "selection shortfall after empty-page budget");
            return Err(DeviceError::Shortfall {
                selected,
                requested: count,
            });
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// In-memory source: a sequence of pages, each a list of selectable
    /// flags. Scrolling past the end shows empty pages.
    struct FakeSource {
        total_size: Option<u32>,
        pages: Vec<Vec<bool>>,
        page: usize,
        marked: HashSet<(usize, usize)>,
        scrolls: usize,
    }

    impl FakeSource {
        fn new(total_size: Option<u32>, pages: Vec<Vec<bool>>) -> Self {
            Self {
                total_size,
                pages,
                page: 0,
                marked: HashSet::new(),
                scrolls: 0,
            }
        }
    }

    #[async_trait]
    impl ItemSource for FakeSource {
        fn total_size(&self) -> Option<u32> {
            self.total_size
        }

        async fn visible_items(&mut self) -> Result<usize> {
            Ok(self.pages.get(self.page).map_or(0, |p| p.len()))
        }

        async fn mark(&mut self, index: usize) -> Result<bool> {
            let selectable = self
                .pages
                .get(self.page)
                .and_then(|p| p.get(index))
                .copied()
                .unwrap_or(false);
            if selectable && self.marked.insert((self.page, index)) {
                return Ok(true);
            }
            Ok(false)
        }

        async fn scroll_next(&mut self) -> Result<()> {
            self.scrolls += 1;
            self.page += 1;
            Ok(())
        }
    }

    fn sampler() -> SelectionSampler<StdRng> {
        SelectionSampler::new(StdRng::seed_from_u64(0xF1EE7))
    }

    #[tokio::test]
    async fn small_collection_marks_exact_count_without_scrolling() {
        let mut source = FakeSource::new(Some(20), vec![vec![true; 20]]);
        let selected = sampler().select(&mut source, 5).await.unwrap();
        assert_eq!(selected, 5);
        assert_eq!(source.marked.len(), 5);
        assert_eq!(source.scrolls, 0);
    }

    #[tokio::test]
    async fn small_collection_shortfall_when_too_few_selectable() {
        // 10 items but only 3 selectable.
        let mut page = vec![false; 10];
        page[1] = true;
        page[4] = true;
        page[7] = true;
        let mut source = FakeSource::new(Some(10), vec![page]);
        let err = sampler().select(&mut source, 5).await.unwrap_err();
        match err {
            DeviceError::Shortfall { selected, requested } => {
                assert_eq!(selected, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected shortfall, got {other:?}"),
        }
        assert_eq!(source.scrolls, 0);
    }

    #[tokio::test]
    async fn large_collection_unknown_size_reaches_target() {
        // Every page has selectable items, so one mark lands per page visit.
        let pages = vec![vec![true; 10]; 100];
        let mut source = FakeSource::new(None, pages);
        let selected = sampler().select(&mut source, 11).await.unwrap();
        assert_eq!(selected, 11);
        assert_eq!(source.marked.len(), 11);
        // One selection per page: at least one scroll between marks.
        assert!(source.scrolls >= 10);
    }

    #[tokio::test]
    async fn large_collection_marks_at_most_one_per_page() {
        let pages = vec![vec![true; 10]; 100];
        let mut source = FakeSource::new(Some(1000), pages);
        sampler().select(&mut source, 7).await.unwrap();
        let mut per_page = std::collections::HashMap::new();
        for (page, _) in &source.marked {
            *per_page.entry(*page).or_insert(0u32) += 1;
        }
        assert!(per_page.values().all(|&n| n <= 1));
    }

    #[tokio::test]
    async fn empty_source_exhausts_budget_and_reports_shortfall() {
        let mut source = FakeSource::new(None, Vec::new());
        let err = sampler().select(&mut source, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Shortfall { selected: 0, requested: 3 }
        ));
        // Ten empty loops, 1..=3 scrolls after each.
        assert!(source.scrolls >= MAX_EMPTY_LOOPS as usize);
    }

    #[test]
    fn scroll_budget_scales_and_clamps() {
        assert_eq!(scroll_budget(None), 3);
        assert_eq!(scroll_budget(Some(0)), 3);
        assert_eq!(scroll_budget(Some(100)), 1);
        assert_eq!(scroll_budget(Some(600)), 3);
        assert_eq!(scroll_budget(Some(10_000)), 10);
    }

    #[test]
    fn shortfall_maps_to_its_own_exit_code() {
        let err = DeviceError::Shortfall { selected: 2, requested: 5 };
        assert_eq!(err.exit_code(), fleetcast_core::ExitCode::SelectionShortfall);
    }
}
