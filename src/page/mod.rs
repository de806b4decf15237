//! Text page codec
//!
//! Every page is one message: a header line followed by payload lines.
//! Nothing here touches the store.

mod error;
mod header;
mod index_page;
mod record_page;

pub use error::{PageError, PageResult};
pub use header::PageHeader;
pub use index_page::IndexPage;
pub use record_page::{Owner, RecordPage};

/// Payload characters a producer may place on one page, header excluded
pub const PAGE_CAPACITY: usize = 3072;

/// Label carried by every page of the catalog chain
pub const CATALOG_LABEL: &str = "catalog";

/// Text of a root entry point that has not been initialized yet
pub const ENTRY_SENTINEL: &str = "pagechain:entry";

/// Literal used on the wire for a missing neighbour
pub(crate) const NULL_LINK: &str = "null";

/// Split text into chunks of at most `capacity` characters.
///
/// Always yields at least one chunk, so an empty value still owns a page.
pub fn split_chunks(text: &str, capacity: usize) -> Vec<String> {
    let capacity = capacity.max(1);
    let mut chunks = Vec::with_capacity(text.len() / capacity + 1);
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if count == capacity {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    chunks.push(current);
    chunks
}
