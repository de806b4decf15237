//! Record chains
//!
//! A serialized value split into fixed-capacity chunks, one chunk per
//! [`RecordPage`], linked head to tail.

mod error;

pub use error::{RecordError, RecordResult};

use ahash::AHashSet;

use crate::page::{Owner, PageHeader, RecordPage, split_chunks};
use crate::store::{MessageId, MessageStore, StoreError};

/// What a [`RecordChain::write`] did to the chain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Pages posted to extend the chain
    pub created: usize,
    /// Trailing pages deleted
    pub deleted: usize,
    /// Existing pages whose text was replaced (link patches excluded)
    pub rewritten: usize,
    /// Chain length after the write
    pub pages: usize,
}

/// A page together with the text the store currently holds for it
struct LoadedPage {
    id: MessageId,
    page: RecordPage,
    stored: String,
}

pub struct RecordChain<'a, S> {
    store: &'a S,
    capacity: usize,
}

impl<'a, S: MessageStore> RecordChain<'a, S> {
    pub fn new(store: &'a S, capacity: usize) -> Self {
        Self { store, capacity }
    }

    async fn load(&self, head: MessageId) -> RecordResult<Vec<LoadedPage>> {
        let mut pages = Vec::new();
        let mut seen = AHashSet::new();
        let mut cursor = Some(head);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(RecordError::Cycle(id));
            }
            let message = self.store.fetch(id).await?;
            let page = RecordPage::decode(&message.text)?;
            cursor = page.header.next;
            pages.push(LoadedPage {
                id,
                page,
                stored: message.text,
            });
        }

        Ok(pages)
    }

    /// Every page of the chain in order
    pub async fn pages(&self, head: MessageId) -> RecordResult<Vec<(MessageId, RecordPage)>> {
        Ok(self
            .load(head)
            .await?
            .into_iter()
            .map(|loaded| (loaded.id, loaded.page))
            .collect())
    }

    /// Concatenate the value chunks in chain order
    pub async fn read(&self, head: MessageId) -> RecordResult<String> {
        let mut value = String::new();
        for loaded in self.load(head).await? {
            value.push_str(&loaded.page.value);
        }
        Ok(value)
    }

    /// Post a new chain for `value` and return its head id
    pub async fn create(&self, label: &str, owner: &Owner, value: &str) -> RecordResult<MessageId> {
        let mut chunks = split_chunks(value, self.capacity).into_iter();
        let first = chunks.next().unwrap_or_default();

        let head = RecordPage::head(label, owner.clone(), first);
        let message = self.store.post(head.encode()).await?;
        let head_id = message.id;

        let mut tail = LoadedPage {
            id: message.id,
            page: head,
            stored: message.text,
        };
        for chunk in chunks {
            tail = self.link_after(&mut tail, chunk).await?;
        }

        Ok(head_id)
    }

    /// Post a page after `tail` and point `tail` at it
    async fn link_after(&self, tail: &mut LoadedPage, chunk: String) -> RecordResult<LoadedPage> {
        let header = PageHeader::following(
            tail.page.header.label.clone(),
            tail.page.header.page_index + 1,
            tail.id,
        );
        let page = RecordPage::continuation(header, chunk);
        let message = self.store.post(page.encode()).await?;

        tail.page.header.next = Some(message.id);
        let text = tail.page.encode();
        self.store.replace(tail.id, text.clone()).await?;
        tail.stored = text;

        Ok(LoadedPage {
            id: message.id,
            page,
            stored: message.text,
        })
    }

    /// Store `value` in the existing chain at `head`, reshaping it
    ///
    /// Pages are appended or deleted only when the page count changes.
    /// Surviving pages are replaced only when their text differs. The head
    /// page's owner line is regenerated from `owner`.
    pub async fn write(
        &self,
        head: MessageId,
        value: &str,
        owner: &Owner,
    ) -> RecordResult<WriteSummary> {
        let chunks = split_chunks(value, self.capacity);
        let mut pages = self.load(head).await?;
        let old_count = pages.len();
        let new_count = chunks.len();
        let mut summary = WriteSummary::default();

        if new_count > old_count {
            for chunk in &chunks[old_count..] {
                let next = {
                    let tail = pages.last_mut().ok_or(StoreError::NotFound(head))?;
                    self.link_after(tail, chunk.clone()).await?
                };
                pages.push(next);
                summary.created += 1;
            }
        } else if new_count < old_count {
            for loaded in pages.drain(new_count..) {
                self.store.remove(loaded.id).await?;
                summary.deleted += 1;
            }
            if let Some(last) = pages.last_mut() {
                last.page.header.next = None;
            }
        }

        for (position, (loaded, chunk)) in pages
            .iter_mut()
            .take(old_count)
            .zip(chunks)
            .enumerate()
        {
            loaded.page.value = chunk;
            if position == 0 {
                loaded.page.owner = Some(owner.clone());
            }
            let text = loaded.page.encode();
            if text != loaded.stored {
                self.store.replace(loaded.id, text.clone()).await?;
                loaded.stored = text;
                summary.rewritten += 1;
            }
        }

        summary.pages = pages.len();
        Ok(summary)
    }

    /// Delete every page, head to tail, returning how many were removed
    pub async fn delete_chain(&self, head: MessageId) -> RecordResult<usize> {
        let pages = self.load(head).await?;
        for loaded in &pages {
            self.store.remove(loaded.id).await?;
        }
        Ok(pages.len())
    }
}
