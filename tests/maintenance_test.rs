mod helpers;

use helpers::{record_all, test_store};

#[tokio::test]
async fn trim_all_keeps_newest_per_tenant() {
    let (_dir, store) = test_store(100).await;
    record_all(&store, "1", &["1a", "1b", "1c", "1d", "1e"]).await;
    record_all(&store, "2", &["2a", "2b"]).await;
    record_all(&store, "3", &["3a", "3b", "3c", "3d"]).await;

    // warm the cache so trimming has something to invalidate
    assert_eq!(store.get_tenant("1").await.unwrap().corpus.len(), 5);

    let report = store.trim_all(3).await.unwrap();
    assert_eq!(report.tenants_trimmed, 2);
    assert_eq!(report.fragments_deleted, 3);

    assert_eq!(store.get_tenant("1").await.unwrap().corpus, vec!["1c", "1d", "1e"]);
    assert_eq!(store.get_tenant("2").await.unwrap().corpus, vec!["2a", "2b"]);
    assert_eq!(store.get_tenant("3").await.unwrap().corpus, vec!["3b", "3c", "3d"]);
}

#[tokio::test]
async fn trim_all_on_small_corpora_is_a_noop() {
    let (_dir, store) = test_store(100).await;
    record_all(&store, "1", &["a"]).await;
    let report = store.trim_all(10).await.unwrap();
    assert_eq!(report.tenants_trimmed, 0);
    assert_eq!(report.fragments_deleted, 0);
    assert_eq!(store.fragment_count("1").await.unwrap(), 1);
}

#[tokio::test]
async fn list_tenants_in_numeric_order() {
    let (_dir, store) = test_store(100).await;
    for id in ["300", "20", "1000", "5"] {
        store.ensure_tenant(id).await.unwrap();
    }
    let ids: Vec<String> = store
        .list_tenants()
        .await
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(ids, vec!["5", "20", "300", "1000"]);
}

#[tokio::test]
async fn stats_reflect_store_contents() {
    let (_dir, store) = test_store(100).await;
    record_all(&store, "1", &["a", "b", "c"]).await;
    record_all(&store, "2", &["d"]).await;
    store.change_setting("2", "talk", "off").await.unwrap();
    store.change_setting("2", "lang", "tr").await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.tenants, 2);
    assert_eq!(stats.talking_tenants, 1);
    assert_eq!(stats.fragments, 4);
    assert_eq!(stats.by_lang["en"], 1);
    assert_eq!(stats.by_lang["tr"], 1);
    let largest = stats.largest.unwrap();
    assert_eq!(largest.tenant, "1");
    assert_eq!(largest.fragments, 3);
}

#[tokio::test]
async fn cache_sweeper_runs_until_aborted() {
    let (_dir, store) = test_store(100).await;
    record_all(&store, "1", &["a"]).await;
    let sweeper = store.spawn_cache_sweeper(std::time::Duration::from_millis(10));
    tokio::time::sleep(std::time::Duration::from_millis(40)).await;
    assert!(!sweeper.is_finished());
    sweeper.abort();
    assert!(sweeper.await.unwrap_err().is_cancelled());
    assert_eq!(store.get_tenant("1").await.unwrap().corpus, vec!["a"]);
}
