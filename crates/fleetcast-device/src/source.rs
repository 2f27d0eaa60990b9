use async_trait::async_trait;

use crate::error::Result;

/// A paginated, scroll-revealed collection of selectable items, as exposed
/// by a device-automation driver (e.g. a gallery album in multi-select
/// mode).
///
/// Implementations must be `Send` so the sampler can run inside a worker
/// task. The driver link is flaky by nature; every operation may fail.
#[async_trait]
pub trait ItemSource: Send {
    /// Total collection size when the driver knows it (album metadata),
    /// `None` otherwise. Drives the small-collection fast path and the
    /// scroll budget.
    fn total_size(&self) -> Option<u32>;

    /// Number of items currently visible on screen.
    async fn visible_items(&mut self) -> Result<usize>;

    /// Attempt to mark the item at `index` on the current page. Returns
    /// `false` when the tap landed on a stale/unselectable element — the
    /// caller should try another index rather than abort.
    async fn mark(&mut self, index: usize) -> Result<bool>;

    /// Scroll one step forward through the collection.
    async fn scroll_next(&mut self) -> Result<()>;
}
