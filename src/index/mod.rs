//! Index chains
//!
//! A name -> message id mapping spread over a singly-linked list of
//! [`IndexPage`]s. The catalog uses one chain for database names, and every
//! database uses one for its keys.

mod error;
#[cfg(test)]
mod tests;

pub use error::{IndexError, IndexResult};

use ahash::AHashSet;
use std::collections::BTreeMap;

use crate::page::{IndexPage, PageHeader};
use crate::store::{MessageId, MessageStore, StoreError};

/// Reads and rewrites one kind of index chain against a store
pub struct IndexChain<'a, S> {
    store: &'a S,
    /// Payload characters allowed per page
    capacity: usize,
}

impl<'a, S: MessageStore> IndexChain<'a, S> {
    pub fn new(store: &'a S, capacity: usize) -> Self {
        Self { store, capacity }
    }

    /// Post an empty head page and return its id
    pub async fn create(&self, label: &str) -> IndexResult<MessageId> {
        let message = self.store.post(IndexPage::empty(label).encode()).await?;
        Ok(message.id)
    }

    /// Every page of the chain in order, starting at `head`
    pub async fn pages(&self, head: MessageId) -> IndexResult<Vec<(MessageId, IndexPage)>> {
        let mut pages = Vec::new();
        let mut seen = AHashSet::new();
        let mut cursor = Some(head);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(IndexError::Cycle(id));
            }
            let message = self.store.fetch(id).await?;
            let page = IndexPage::decode(&message.text)?;
            cursor = page.header.next;
            pages.push((id, page));
        }

        Ok(pages)
    }

    /// Merge all pages into one mapping
    ///
    /// Names are unique across a chain; if a duplicate shows up anyway the
    /// entry found later in the chain wins.
    pub async fn resolve(&self, head: MessageId) -> IndexResult<BTreeMap<String, MessageId>> {
        let mut mapping = BTreeMap::new();
        for (_, page) in self.pages(head).await? {
            mapping.extend(page.entries);
        }
        Ok(mapping)
    }

    /// Add `name -> target` to the tail page, growing the chain when the
    /// tail is full
    ///
    /// Earlier pages with room left are never refilled. An empty tail takes
    /// the entry even when it exceeds the capacity on its own.
    pub async fn append(&self, head: MessageId, name: &str, target: MessageId) -> IndexResult<()> {
        let mut pages = self.pages(head).await?;
        let (tail_id, mut tail) = pages.pop().ok_or(StoreError::NotFound(head))?;

        if tail.entries.is_empty() || tail.fits(name, target, self.capacity) {
            tail.entries.push((name.to_string(), target));
            self.store.replace(tail_id, tail.encode()).await?;
            return Ok(());
        }

        let mut page = IndexPage::new(PageHeader::following(
            tail.header.label.clone(),
            tail.header.page_index + 1,
            tail_id,
        ));
        page.entries.push((name.to_string(), target));
        let message = self.store.post(page.encode()).await?;

        tail.header.next = Some(message.id);
        self.store.replace(tail_id, tail.encode()).await?;
        Ok(())
    }

    /// Drop `name` from the first page that holds it
    ///
    /// Returns whether an entry was removed. Emptied pages stay in the chain.
    pub async fn remove(&self, head: MessageId, name: &str) -> IndexResult<bool> {
        for (id, mut page) in self.pages(head).await? {
            if page.remove(name).is_some() {
                self.store.replace(id, page.encode()).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Empty the head page, unlink it and delete every overflow page
    ///
    /// Returns the number of overflow pages deleted.
    pub async fn truncate(&self, head: MessageId) -> IndexResult<usize> {
        let mut pages = self.pages(head).await?.into_iter();
        let (head_id, mut head_page) = pages.next().ok_or(StoreError::NotFound(head))?;

        let before = head_page.encode();
        head_page.entries.clear();
        head_page.header.next = None;
        let after = head_page.encode();
        if after != before {
            self.store.replace(head_id, after).await?;
        }

        let mut deleted = 0;
        for (id, _) in pages {
            self.store.remove(id).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Delete every page of the chain, head first
    pub async fn delete_chain(&self, head: MessageId) -> IndexResult<usize> {
        let pages = self.pages(head).await?;
        for (id, _) in &pages {
            self.store.remove(*id).await?;
        }
        Ok(pages.len())
    }
}
