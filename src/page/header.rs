use super::NULL_LINK;
use super::error::{PageError, PageResult};
use crate::store::MessageId;

/// Header line shared by every page kind
///
/// Encoded as `<label> <page_index> <prev|null> <next|null>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub label: String,
    pub page_index: usize,
    pub prev: Option<MessageId>,
    pub next: Option<MessageId>,
}

impl PageHeader {
    pub fn new(label: impl Into<String>, page_index: usize) -> Self {
        Self {
            label: label.into(),
            page_index,
            prev: None,
            next: None,
        }
    }

    /// Header for the page that follows `prev` in a chain
    pub fn following(label: impl Into<String>, page_index: usize, prev: MessageId) -> Self {
        Self {
            label: label.into(),
            page_index,
            prev: Some(prev),
            next: None,
        }
    }

    pub fn is_head(&self) -> bool {
        self.prev.is_none()
    }

    pub fn is_tail(&self) -> bool {
        self.next.is_none()
    }

    pub fn encode(&self) -> String {
        format!(
            "{} {} {} {}",
            self.label,
            self.page_index,
            encode_link(self.prev),
            encode_link(self.next)
        )
    }

    pub fn decode(line: &str) -> PageResult<Self> {
        let mut fields = line.split(' ');
        let (Some(label), Some(index), Some(prev), Some(next)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(PageError::MalformedHeader(line.to_string()));
        };

        if label.is_empty() {
            return Err(PageError::MalformedHeader(line.to_string()));
        }

        let page_index = index
            .parse::<usize>()
            .map_err(|_| PageError::MalformedHeader(line.to_string()))?;

        Ok(Self {
            label: label.to_string(),
            page_index,
            prev: decode_link(prev),
            next: decode_link(next),
        })
    }
}

fn encode_link(link: Option<MessageId>) -> String {
    match link {
        Some(id) => id.to_string(),
        None => NULL_LINK.to_string(),
    }
}

// Anything that is not a message id terminates the chain
fn decode_link(field: &str) -> Option<MessageId> {
    field.parse::<MessageId>().ok()
}
