use pastewatch_core::{AppError, DedupCache, Paste, PasteStore};
use pastewatch_db::{AnyStore, MongoPasteStore};

use crate::integration::common::setup_test_mongo;

fn paste(key: &str, content: &str) -> Paste {
    Paste {
        key: key.into(),
        date: "1700000000".into(),
        expire: "0".into(),
        title: "leak".into(),
        syntax: "text".into(),
        user: "anon".into(),
        content: content.into(),
    }
}

#[tokio::test]
async fn save_and_retrieve_paste() {
    let (config, _container) = setup_test_mongo().await;
    let store = MongoPasteStore::connect(&config, DedupCache::default())
        .await
        .unwrap();
    store.initialize().await.unwrap();

    let original = paste("AbCd1234", "secret=hunter2");
    store.save(&original).await.unwrap();

    let stored = store
        .get("AbCd1234")
        .await
        .unwrap()
        .expect("Should find the paste");
    assert_eq!(stored.paste, original);
    assert_eq!(stored.content_hash, original.content_hash());
    assert!(stored.published_at.is_some());

    assert!(store.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn is_saved_falls_back_to_collection_when_cache_is_cold() {
    let (config, _container) = setup_test_mongo().await;
    let store = MongoPasteStore::connect(&config, DedupCache::default())
        .await
        .unwrap();
    store.initialize().await.unwrap();

    assert!(!store.is_saved("k1").await.unwrap());
    store.save(&paste("k1", "x")).await.unwrap();
    assert!(store.cache().contains("k1"));

    let fresh = MongoPasteStore::connect(&config, DedupCache::new(10))
        .await
        .unwrap();
    fresh.initialize().await.unwrap();
    assert!(fresh.is_saved("k1").await.unwrap());
    assert!(!fresh.cache().contains("k1"));
}

#[tokio::test]
async fn duplicate_save_is_rejected_and_cache_untouched() {
    let (config, _container) = setup_test_mongo().await;
    let first = MongoPasteStore::connect(&config, DedupCache::default())
        .await
        .unwrap();
    first.initialize().await.unwrap();
    first.save(&paste("k1", "first")).await.unwrap();

    let second = MongoPasteStore::connect(&config, DedupCache::default())
        .await
        .unwrap();
    second.initialize().await.unwrap();
    let err = second.save(&paste("k1", "second")).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicatePaste(key) if key == "k1"));
    assert!(second.cache().is_empty());
    let stored = second.get("k1").await.unwrap().unwrap();
    assert_eq!(stored.paste.content, "first");
}

#[tokio::test]
async fn any_store_dispatches_to_mongo() {
    let (config, _container) = setup_test_mongo().await;
    let store = AnyStore::from(
        MongoPasteStore::connect(&config, DedupCache::default())
            .await
            .unwrap(),
    );
    assert_eq!(store.backend(), "mongo");

    store.initialize().await.unwrap();
    store.save(&paste("k1", "x")).await.unwrap();
    assert!(store.is_saved("k1").await.unwrap());
}
