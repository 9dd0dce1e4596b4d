//! Snapshot file tests.

use newsroom_core::integrity::audit;
use newsroom_core::{ArticleId, CommentId, Database, NewArticle, NewComment};
use newsroom_node::persistence::{open_store, SnapshotGateway, YamlSnapshotFile};

fn sample_database() -> Database {
    let mut db = Database::new();
    db.create_or_get_user(Some("alice".into())).unwrap();
    let article = db
        .create_article(NewArticle {
            title: Some("Hello".into()),
            url: Some("https://example.com".into()),
            username: Some("alice".into()),
        })
        .unwrap();
    db.create_comment(NewComment {
        body: Some("First".into()),
        username: Some("alice".into()),
        article_id: Some(article.id),
    })
    .unwrap();
    db
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = YamlSnapshotFile::new(dir.path().join("database.yml"));
    let db = sample_database();

    gateway.save(&db).await.unwrap();
    let loaded = gateway.load().await.unwrap().unwrap();

    assert_eq!(loaded, db);
    assert!(!dir.path().join("database.yml.tmp").exists());
}

#[tokio::test]
async fn test_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = YamlSnapshotFile::new(dir.path().join("database.yml"));

    assert!(gateway.load().await.unwrap().is_none());
    assert!(open_store(&gateway).await.snapshot() == Database::new());
}

#[tokio::test]
async fn test_unreadable_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.yml");
    std::fs::write(&path, "users: [this is: not, a map").unwrap();
    let gateway = YamlSnapshotFile::new(&path);

    assert!(gateway.load().await.is_err());
    assert!(open_store(&gateway).await.snapshot() == Database::new());
}

#[tokio::test]
async fn test_legacy_snapshot_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.yml");
    std::fs::write(
        &path,
        r#"
users:
  alice:
    username: alice
    articleIds: [1, 2]
    commentIds: [1, 2]
articles:
  '1':
    id: 1
    title: Kept
    url: https://example.com
    username: alice
    commentIds: [1]
    upvotedBy: [alice]
    downvotedBy: [alice]
  '2': null
comments:
  '1':
    id: 1
    body: Still here
    username: alice
    articleId: 1
    upvotedBy: []
    downvotedBy: []
  '2':
    id: 2
    body: Orphaned
    username: alice
    articleId: 2
nextArticleId: 1
"#,
    )
    .unwrap();

    let store = open_store(&YamlSnapshotFile::new(&path)).await;

    store.read(|db| {
        assert!(audit(db).is_empty());

        let alice = db.user("alice").unwrap();
        assert_eq!(alice.article_ids, vec![ArticleId::new(1)]);
        assert_eq!(alice.comment_ids, vec![CommentId::new(1)]);

        assert!(db.comment(CommentId::new(2)).is_none());
        assert!(db.next_article_id() > ArticleId::new(1));
        assert!(db.next_comment_id() > CommentId::new(2));

        let article = db.article(ArticleId::new(1)).unwrap();
        assert_eq!(article.votes.upvoted_by, vec!["alice".to_string()]);
        assert!(article.votes.downvoted_by.is_empty());
    });
}

#[tokio::test]
async fn test_snapshot_at_id_limit_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.yml");
    std::fs::write(
        &path,
        r#"
users:
  alice:
    username: alice
    articleIds: [18446744073709551615]
articles: {}
comments: {}
nextArticleId: 18446744073709551615
nextCommentId: 1
"#,
    )
    .unwrap();

    let store = open_store(&YamlSnapshotFile::new(&path)).await;

    store.read(|db| {
        assert!(audit(db).is_empty());
        assert_eq!(db.next_article_id(), ArticleId::LAST);
    });
    let created = store.write(|db| {
        db.create_article(NewArticle {
            title: Some("Hello".into()),
            url: Some("https://example.com".into()),
            username: Some("alice".into()),
        })
    });
    assert!(created.is_err());
}
