use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::error::{StoreError, StoreResult};
use super::{Message, MessageId, MessageStore};

const MESSAGE_EXTENSION: &str = "msg";
const NEXT_ID_FILE: &str = "next_id";

/// Message store backed by a directory, one file per message
///
/// Files are named `<id>.msg`. The next id to hand out is persisted in a
/// `next_id` file before each post, so ids of removed messages are never
/// handed out again, even across reopens.
pub struct FileStore {
    dir: PathBuf,
    next_id: Mutex<MessageId>,
}

impl FileStore {
    /// Open a store directory, creating it if it does not exist
    pub async fn open<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let mut max_id: MessageId = 0;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(MESSAGE_EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<MessageId>().ok())
            {
                max_id = max_id.max(id);
            }
        }

        let recorded = match fs::read_to_string(dir.join(NEXT_ID_FILE)).await {
            Ok(text) => text.trim().parse::<MessageId>().map_err(|e| {
                StoreError::Backend(format!("corrupted {} file: {}", NEXT_ID_FILE, e))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 1,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            dir,
            next_id: Mutex::new(recorded.max(max_id + 1)),
        })
    }

    /// Record `next` as the lowest id still free
    async fn persist_next_id(&self, next: MessageId) -> StoreResult<()> {
        let path = self.dir.join(NEXT_ID_FILE);
        let staging = path.with_extension("tmp");
        fs::write(&staging, next.to_string()).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn message_path(&self, id: MessageId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, MESSAGE_EXTENSION))
    }

    fn map_not_found(id: MessageId, err: io::Error) -> StoreError {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(id)
        } else {
            StoreError::Io(err)
        }
    }
}

impl MessageStore for FileStore {
    async fn fetch(&self, id: MessageId) -> StoreResult<Message> {
        tracing::trace!(id, "fetch");
        let text = fs::read_to_string(self.message_path(id))
            .await
            .map_err(|e| Self::map_not_found(id, e))?;
        Ok(Message::new(id, text))
    }

    async fn post(&self, text: String) -> StoreResult<Message> {
        let id = {
            let mut next_id = self.next_id.lock().await;
            let id = *next_id;
            // The high-water mark is on disk before the id is used
            self.persist_next_id(id + 1).await?;
            *next_id = id + 1;
            id
        };
        tracing::trace!(id, len = text.len(), "post");

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.message_path(id))
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;

        Ok(Message::new(id, text))
    }

    async fn replace(&self, id: MessageId, text: String) -> StoreResult<Message> {
        tracing::trace!(id, len = text.len(), "replace");
        let path = self.message_path(id);
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(id));
        }

        // Readers must never observe a partially written page
        let staging = path.with_extension("tmp");
        fs::write(&staging, text.as_bytes()).await?;
        fs::rename(&staging, &path).await?;

        Ok(Message::new(id, text))
    }

    async fn remove(&self, id: MessageId) -> StoreResult<()> {
        tracing::trace!(id, "remove");
        fs::remove_file(self.message_path(id))
            .await
            .map_err(|e| Self::map_not_found(id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();

        let msg = store.post("page one".to_string()).await.unwrap();
        assert_eq!(msg.id, 1);
        assert_eq!(store.fetch(msg.id).await.unwrap().text, "page one");

        store.replace(msg.id, "page two".to_string()).await.unwrap();
        assert_eq!(store.fetch(msg.id).await.unwrap().text, "page two");

        store.remove(msg.id).await.unwrap();
        assert!(matches!(
            store.fetch(msg.id).await,
            Err(StoreError::NotFound(1))
        ));
        assert!(matches!(
            store.replace(msg.id, "late".to_string()).await,
            Err(StoreError::NotFound(1))
        ));
    }

    #[tokio::test]
    async fn test_file_store_ids_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(temp_dir.path()).await.unwrap();
            for i in 0..3 {
                store.post(format!("message {}", i)).await.unwrap();
            }
        }

        let store = FileStore::open(temp_dir.path()).await.unwrap();
        let msg = store.post("after reopen".to_string()).await.unwrap();
        assert_eq!(msg.id, 4);
        assert_eq!(store.fetch(2).await.unwrap().text, "message 1");
    }

    #[tokio::test]
    async fn test_removed_ids_are_not_reused_after_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let removed = {
            let store = FileStore::open(temp_dir.path()).await.unwrap();
            store.post("a".to_string()).await.unwrap();
            store.post("b".to_string()).await.unwrap();
            let last = store.post("c".to_string()).await.unwrap();
            store.remove(last.id).await.unwrap();
            last.id
        };

        let store = FileStore::open(temp_dir.path()).await.unwrap();
        let fresh = store.post("d".to_string()).await.unwrap();
        assert_ne!(fresh.id, removed);
        assert_eq!(fresh.id, removed + 1);
        assert!(matches!(
            store.fetch(removed).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_every_message_removed_before_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(temp_dir.path()).await.unwrap();
            let msg = store.post("only".to_string()).await.unwrap();
            store.remove(msg.id).await.unwrap();
        }

        let store = FileStore::open(temp_dir.path()).await.unwrap();
        assert_eq!(store.post("next".to_string()).await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_corrupted_next_id_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(NEXT_ID_FILE), "many").unwrap();

        assert!(matches!(
            FileStore::open(temp_dir.path()).await,
            Err(StoreError::Backend(_))
        ));
    }
}
