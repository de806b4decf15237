use super::error::{PageError, PageResult};
use super::header::PageHeader;
use crate::store::MessageId;

/// A fragment of a name -> message id mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    pub header: PageHeader,
    pub entries: Vec<(String, MessageId)>,
}

impl IndexPage {
    pub fn new(header: PageHeader) -> Self {
        Self {
            header,
            entries: Vec::new(),
        }
    }

    /// Head page of a new, empty chain
    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(PageHeader::new(label, 0))
    }

    pub fn get(&self, name: &str) -> Option<MessageId> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, id)| *id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Drop the entry for `name`, returning its target
    pub fn remove(&mut self, name: &str) -> Option<MessageId> {
        let pos = self.entries.iter().position(|(entry, _)| entry == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Characters after the header line
    pub fn payload_len(&self) -> usize {
        self.entries
            .iter()
            .map(|(name, id)| entry_len(name, *id) + 1)
            .sum()
    }

    /// Whether one more entry keeps the payload within `capacity`
    pub fn fits(&self, name: &str, id: MessageId, capacity: usize) -> bool {
        self.payload_len() + entry_len(name, id) + 1 <= capacity
    }

    pub fn encode(&self) -> String {
        let mut text = self.header.encode();
        for (name, id) in &self.entries {
            text.push('\n');
            text.push_str(name);
            text.push(' ');
            text.push_str(&id.to_string());
        }
        text
    }

    pub fn decode(text: &str) -> PageResult<Self> {
        let mut lines = text.split('\n');
        let header = match lines.next() {
            Some(line) if !line.trim().is_empty() => PageHeader::decode(line)?,
            _ => return Err(PageError::MissingHeader),
        };

        let mut entries = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let (name, id) = line
                .split_once(' ')
                .ok_or_else(|| PageError::MalformedEntry(line.to_string()))?;
            let id = id
                .trim()
                .parse::<MessageId>()
                .map_err(|_| PageError::MalformedEntry(line.to_string()))?;
            if name.is_empty() {
                return Err(PageError::MalformedEntry(line.to_string()));
            }
            entries.push((name.to_string(), id));
        }

        Ok(Self { header, entries })
    }
}

fn entry_len(name: &str, id: MessageId) -> usize {
    name.chars().count() + 1 + id.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_page_encoding() {
        let mut page = IndexPage::empty("users");
        page.entries.push(("alice".to_string(), 10));
        page.entries.push(("bob".to_string(), 11));

        let text = page.encode();
        assert_eq!(text, "users 0 null null\nalice 10\nbob 11");
        assert_eq!(IndexPage::decode(&text).unwrap(), page);
        assert_eq!(page.payload_len(), "\nalice 10\nbob 11".len());
    }

    #[test]
    fn test_index_page_tolerates_blank_lines() {
        let page = IndexPage::decode("db 1 5 null\n\nkey 7\n").unwrap();
        assert_eq!(page.header.prev, Some(5));
        assert_eq!(page.entries, vec![("key".to_string(), 7)]);

        let empty = IndexPage::decode("db 0 null null").unwrap();
        assert!(empty.entries.is_empty());
        assert_eq!(empty.payload_len(), 0);
    }

    #[test]
    fn test_index_page_rejects_garbage() {
        assert_eq!(IndexPage::decode(""), Err(PageError::MissingHeader));
        assert!(matches!(
            IndexPage::decode("db 0 null null\nkey"),
            Err(PageError::MalformedEntry(_))
        ));
        assert!(matches!(
            IndexPage::decode("db 0 null null\nkey abc"),
            Err(PageError::MalformedEntry(_))
        ));
        assert!(matches!(
            IndexPage::decode("pagechain:entry"),
            Err(PageError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_fits_and_remove() {
        let mut page = IndexPage::empty("db");
        assert!(page.fits("abc", 12, 7));
        assert!(!page.fits("abcd", 12, 7));

        page.entries.push(("abc".to_string(), 12));
        assert!(page.contains("abc"));
        assert_eq!(page.remove("abc"), Some(12));
        assert_eq!(page.remove("abc"), None);
    }
}
