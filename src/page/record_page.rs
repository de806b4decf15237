use super::error::{PageError, PageResult};
use super::header::PageHeader;
use crate::store::MessageId;

/// Database that owns a record, stored on the record's head page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub database: String,
    pub entry: MessageId,
}

impl Owner {
    pub fn new(database: impl Into<String>, entry: MessageId) -> Self {
        Self {
            database: database.into(),
            entry,
        }
    }

    fn encode(&self) -> String {
        format!("{} {}", self.database, self.entry)
    }

    fn decode(line: &str) -> Option<Self> {
        let (database, entry) = line.split_once(' ')?;
        if database.is_empty() {
            return None;
        }
        let entry = entry.trim().parse::<MessageId>().ok()?;
        Some(Self::new(database, entry))
    }
}

/// One chunk of a serialized value
///
/// Only the head page (`page_index == 0`) carries the owner line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPage {
    pub header: PageHeader,
    pub owner: Option<Owner>,
    pub value: String,
}

impl RecordPage {
    pub fn head(label: impl Into<String>, owner: Owner, value: impl Into<String>) -> Self {
        Self {
            header: PageHeader::new(label, 0),
            owner: Some(owner),
            value: value.into(),
        }
    }

    pub fn continuation(header: PageHeader, value: impl Into<String>) -> Self {
        Self {
            header,
            owner: None,
            value: value.into(),
        }
    }

    pub fn encode(&self) -> String {
        let mut text = self.header.encode();
        if let Some(owner) = &self.owner {
            text.push('\n');
            text.push_str(&owner.encode());
        }
        text.push('\n');
        text.push_str(&self.value);
        text
    }

    pub fn decode(text: &str) -> PageResult<Self> {
        let mut lines = text.split('\n');
        let header = match lines.next() {
            Some(line) if !line.trim().is_empty() => PageHeader::decode(line)?,
            _ => return Err(PageError::MissingHeader),
        };

        let owner = if header.page_index == 0 {
            let line = lines.next().unwrap_or_default();
            let owner = Owner::decode(line)
                .ok_or_else(|| PageError::MissingOwner(header.encode()))?;
            Some(owner)
        } else {
            None
        };

        let value = lines.collect::<Vec<_>>().join("\n");
        Ok(Self {
            header,
            owner,
            value,
        })
    }
}
