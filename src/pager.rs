use crate::cancel::CancellationState;
use crate::{Page, Result};
use std::future::Future;
use std::marker::PhantomData;

/// Offset-based pagination over a remote collection.
///
/// The pager calls `fetch(offset, limit)` repeatedly, advancing the offset by
/// the number of entries the server returned for each page (see
/// [`Page::returned`]). A page with zero entries ends the collection
/// regardless of the reported total, because the total may be stale while the
/// collection is being modified. Fetch errors are returned
/// verbatim; retrying is the client's business.
///
/// # Examples
///
/// ```rust
/// use liked_sorter::{CancellationState, OffsetPager, Page};
///
/// # tokio_test::block_on(async {
/// let data: Vec<u32> = (0..7).collect();
/// let cancel = CancellationState::new();
/// let mut pager = OffsetPager::new(3, |offset, limit| {
///     let start = (offset as usize).min(data.len());
///     let end = (start + limit as usize).min(data.len());
///     let page = Page::new(data[start..end].to_vec(), data.len() as u32);
///     async move { Ok(page) }
/// });
/// assert_eq!(pager.collect_all(&cancel).await?, data);
/// # Ok::<(), liked_sorter::SorterError>(())
/// # });
/// ```
pub struct OffsetPager<T, F> {
    fetch: F,
    limit: u32,
    offset: u32,
    finished: bool,
    pages_fetched: u32,
    first_total: Option<u32>,
    last_total: Option<u32>,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, Fut> OffsetPager<T, F>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(limit: u32, fetch: F) -> Self {
        Self {
            fetch,
            limit: limit.max(1),
            offset: 0,
            finished: false,
            pages_fetched: 0,
            first_total: None,
            last_total: None,
            _item: PhantomData,
        }
    }

    /// Fetch the next page. Returns `None` once the collection is exhausted.
    pub async fn next_page(&mut self, cancel: &CancellationState) -> Result<Option<Vec<T>>> {
        if self.finished {
            return Ok(None);
        }
        cancel.check()?;

        let page = (self.fetch)(self.offset, self.limit).await?;
        self.pages_fetched += 1;
        self.first_total.get_or_insert(page.total);
        self.last_total = Some(page.total);

        let consumed = page.returned.max(page.items.len() as u32);
        if consumed == 0 {
            self.finished = true;
            return Ok(None);
        }

        // May be empty when every entry on the page was discarded.
        self.offset = self.offset.saturating_add(consumed);
        Ok(Some(page.items))
    }

    /// Fetch every remaining page and concatenate them in order.
    pub async fn collect_all(&mut self, cancel: &CancellationState) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page(cancel).await? {
            items.extend(page);
            log::debug!(
                "Fetched {}/{} items",
                items.len(),
                self.last_total.unwrap_or_default()
            );
        }
        Ok(items)
    }

    /// Move the offset back by `count` items.
    ///
    /// Used after deleting items that precede the current offset, so the
    /// items that shifted into their place are not skipped.
    pub fn rewind(&mut self, count: u32) {
        self.offset = self.offset.saturating_sub(count);
    }

    /// Advance the offset to the end of the current stride, as if every page
    /// had been full. Used for fixed-stride paging.
    pub fn align_to_stride(&mut self) {
        let remainder = self.offset % self.limit;
        if remainder != 0 {
            self.offset += self.limit - remainder;
        }
    }

    /// Mark the collection as exhausted.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Total reported by the first page, if any page was fetched.
    pub fn first_total(&self) -> Option<u32> {
        self.first_total
    }

    /// Total reported by the most recent page.
    pub fn last_total(&self) -> Option<u32> {
        self.last_total
    }
}
