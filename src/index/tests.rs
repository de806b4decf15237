//! Scenario tests for index chains

#[cfg(test)]
mod tests {
    use crate::index::{IndexChain, IndexError};
    use crate::page::{IndexPage, PAGE_CAPACITY};
    use crate::store::{MemoryStore, MessageStore};

    fn chain(store: &MemoryStore) -> IndexChain<'_, MemoryStore> {
        IndexChain::new(store, PAGE_CAPACITY)
    }

    #[tokio::test]
    async fn test_append_and_resolve() {
        let store = MemoryStore::new();
        let index = chain(&store);
        let head = index.create("users").await.unwrap();

        index.append(head, "alice", 100).await.unwrap();
        index.append(head, "bob", 101).await.unwrap();

        let mapping = index.resolve(head).await.unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["alice"], 100);
        assert_eq!(mapping["bob"], 101);
        assert_eq!(
            store.text(head).unwrap(),
            "users 0 null null\nalice 100\nbob 101"
        );
    }

    #[tokio::test]
    async fn test_append_overflows_into_new_page() {
        let store = MemoryStore::new();
        // Room for exactly two "kN 10N" lines per page
        let index = IndexChain::new(&store, 16);
        let head = index.create("db").await.unwrap();

        for i in 0..5 {
            index
                .append(head, &format!("k{}", i), 100 + i)
                .await
                .unwrap();
        }

        let pages = index.pages(head).await.unwrap();
        assert_eq!(pages.len(), 3);
        for (position, (_, page)) in pages.iter().enumerate() {
            assert_eq!(page.header.page_index, position);
            assert_eq!(page.header.label, "db");
            assert!(page.payload_len() <= 16);
        }

        // Links are consistent in both directions
        assert_eq!(pages[0].1.header.prev, None);
        for pair in pages.windows(2) {
            assert_eq!(pair[0].1.header.next, Some(pair[1].0));
            assert_eq!(pair[1].1.header.prev, Some(pair[0].0));
        }
        assert_eq!(pages[2].1.header.next, None);

        let mapping = index.resolve(head).await.unwrap();
        assert_eq!(mapping.len(), 5);
        assert_eq!(mapping["k4"], 104);
    }

    #[tokio::test]
    async fn test_appends_target_tail_only() {
        let store = MemoryStore::new();
        let index = IndexChain::new(&store, 16);
        let head = index.create("db").await.unwrap();

        for i in 0..3 {
            index
                .append(head, &format!("k{}", i), 100 + i)
                .await
                .unwrap();
        }
        // Free a slot on the head page; the next append still goes to the tail
        assert!(index.remove(head, "k0").await.unwrap());
        index.append(head, "k9", 109).await.unwrap();

        let pages = index.pages(head).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].1.entries, vec![("k1".to_string(), 101)]);
        assert!(pages[1].1.contains("k9"));
    }

    #[tokio::test]
    async fn test_remove_rewrites_single_page() {
        let store = MemoryStore::new();
        let index = IndexChain::new(&store, 16);
        let head = index.create("db").await.unwrap();
        for i in 0..4 {
            index
                .append(head, &format!("k{}", i), 100 + i)
                .await
                .unwrap();
        }

        store.reset_stats();
        assert!(index.remove(head, "k3").await.unwrap());
        assert_eq!(store.stats().replaces, 1);

        assert!(!index.remove(head, "missing").await.unwrap());
        let mapping = index.resolve(head).await.unwrap();
        assert!(!mapping.contains_key("k3"));
        assert_eq!(mapping.len(), 3);

        // The emptied page is kept in the chain
        assert!(index.remove(head, "k2").await.unwrap());
        assert_eq!(index.pages(head).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_truncate_drops_overflow_pages() {
        let store = MemoryStore::new();
        let index = IndexChain::new(&store, 16);
        let head = index.create("db").await.unwrap();
        for i in 0..6 {
            index
                .append(head, &format!("k{}", i), 100 + i)
                .await
                .unwrap();
        }
        let overflow: Vec<_> = index.pages(head).await.unwrap()[1..]
            .iter()
            .map(|(id, _)| *id)
            .collect();

        let deleted = index.truncate(head).await.unwrap();
        assert_eq!(deleted, overflow.len());
        for id in overflow {
            assert!(!store.contains(id));
        }
        assert_eq!(store.text(head).unwrap(), "db 0 null null");
        assert!(index.resolve(head).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_later_duplicate_wins() {
        let store = MemoryStore::new();
        let index = IndexChain::new(&store, 16);
        let head = index.create("db").await.unwrap();
        index.append(head, "k0", 1).await.unwrap();
        index.append(head, "k1", 2).await.unwrap();
        index.append(head, "k0", 3).await.unwrap();

        assert_eq!(index.resolve(head).await.unwrap()["k0"], 3);
    }

    #[tokio::test]
    async fn test_cycle_is_reported() {
        let store = MemoryStore::new();
        let first = store.post("db 0 null 2".to_string()).await.unwrap();
        let second = store.post("db 1 1 1".to_string()).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let result = chain(&store).resolve(first.id).await;
        assert!(matches!(result, Err(IndexError::Cycle(1))));
    }

    #[tokio::test]
    async fn test_corrupted_page_is_a_parse_error() {
        let store = MemoryStore::new();
        let head = store.post("db 0 null null\nbroken".to_string()).await.unwrap();
        assert!(matches!(
            chain(&store).resolve(head.id).await,
            Err(IndexError::PageError(_))
        ));

        let empty = IndexPage::empty("db").encode();
        let ok = store.post(empty).await.unwrap();
        assert!(chain(&store).resolve(ok.id).await.unwrap().is_empty());
    }
}
