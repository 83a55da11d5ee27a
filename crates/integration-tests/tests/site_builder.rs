//! Integration tests for site-builder ownership and block sync.
//!
//! These tests require a scratch `PostgreSQL` database in
//! `HOSTDECK_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p hostdeck-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use serde_json::json;
use sqlx::PgPool;

use hostdeck_api::db::{
    AccessError, BlockRepository, PageRepository, ProjectRepository, RepositoryError, ensure_owned,
};
use hostdeck_api::models::builder::{NewPage, NewProject};
use hostdeck_api::models::{Account, Page, Project};
use hostdeck_core::builder::{BlockDescriptor, SyncMode, normalize_blocks};
use hostdeck_core::{PageId, SectionKey};
use hostdeck_integration_tests::{new_account, test_pool};

async fn project_with_page(pool: &PgPool, account: &Account) -> (Project, Page) {
    let project: NewProject =
        serde_json::from_value(json!({"name": "Landing", "settings": {"theme": "dark"}})).unwrap();
    let project = ProjectRepository::new(pool)
        .create(account.id, &project.validate().unwrap())
        .await
        .expect("Failed to create project");

    let page: NewPage = serde_json::from_value(json!({
        "project": project.id,
        "name": "Home",
        "slug": "home",
    }))
    .unwrap();
    let page = PageRepository::new(pool)
        .create(&page.validate().unwrap())
        .await
        .expect("Failed to create page");

    (project, page)
}

fn descriptors(value: serde_json::Value) -> Vec<BlockDescriptor> {
    serde_json::from_value(value).unwrap()
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_ownership_distinguishes_missing_and_foreign() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "owner").await.unwrap();
    let stranger = new_account(&pool, "stranger").await.unwrap();
    let (project, page) = project_with_page(&pool, &owner).await;

    ensure_owned::<Project, _>(&pool, project.id, owner.id)
        .await
        .expect("owner should pass");

    let err = ensure_owned::<Page, _>(&pool, page.id, stranger.id).await.unwrap_err();
    assert!(matches!(err, AccessError::Forbidden("Page")), "{err:?}");
    assert_eq!(err.to_string(), "You do not own this page.");

    let err = ensure_owned::<Page, _>(&pool, PageId::new(i32::MAX), owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::NotFound("Page")), "{err:?}");
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_listings_are_scoped_to_account() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "lister").await.unwrap();
    let stranger = new_account(&pool, "peeker").await.unwrap();
    let (project, page) = project_with_page(&pool, &owner).await;

    let projects = ProjectRepository::new(&pool).list_for(owner.id).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, project.id);
    assert_eq!(projects[0].pages_count, 1);

    assert!(ProjectRepository::new(&pool).list_for(stranger.id).await.unwrap().is_empty());
    assert!(
        PageRepository::new(&pool)
            .list_for(stranger.id, Some(project.id))
            .await
            .unwrap()
            .is_empty()
    );

    let pages = PageRepository::new(&pool).list_for(owner.id, None).await.unwrap();
    assert_eq!(pages.iter().map(|p| p.id).collect::<Vec<_>>(), vec![page.id]);
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_duplicate_page_slug_is_a_conflict() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "slugs").await.unwrap();
    let (project, _) = project_with_page(&pool, &owner).await;

    let again: NewPage = serde_json::from_value(json!({
        "project": project.id,
        "name": "Home again",
        "slug": "home",
    }))
    .unwrap();
    let err = PageRepository::new(&pool)
        .create(&again.validate().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "{err:?}");
}

// ============================================================================
// Block sync
// ============================================================================

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_replace_sync_is_idempotent() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "sync").await.unwrap();
    let (_, page) = project_with_page(&pool, &owner).await;
    let repo = BlockRepository::new(&pool);

    let blocks = normalize_blocks(&descriptors(json!([
        {"key": "hero", "props": {"title": "Hi"}},
        {"key": "pricing", "enabled": false},
        {"key": "cta", "position": 9},
    ])))
    .unwrap();

    for _ in 0..2 {
        let count = repo
            .sync(owner.id, page.id, SyncMode::Replace, &blocks)
            .await
            .expect("sync should succeed");
        assert_eq!(count, 3);
    }

    let stored = repo.list_for(owner.id, Some(page.id)).await.unwrap();
    let shape: Vec<_> = stored.iter().map(|b| (b.key, b.position, b.enabled)).collect();
    assert_eq!(
        shape,
        vec![
            (SectionKey::Hero, 0, true),
            (SectionKey::Pricing, 1, false),
            (SectionKey::Cta, 9, true),
        ]
    );
    assert_eq!(stored[0].props, Some(json!({"title": "Hi"})));
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_append_sync_keeps_existing_blocks() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "append").await.unwrap();
    let (_, page) = project_with_page(&pool, &owner).await;
    let repo = BlockRepository::new(&pool);

    let first = normalize_blocks(&descriptors(json!([{"key": "hero"}]))).unwrap();
    repo.sync(owner.id, page.id, SyncMode::Replace, &first).await.unwrap();

    let more = normalize_blocks(&descriptors(json!([{"key": "faq", "position": 5}]))).unwrap();
    repo.sync(owner.id, page.id, SyncMode::Append, &more).await.unwrap();

    let stored = repo.list_for(owner.id, Some(page.id)).await.unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_failed_sync_leaves_page_untouched() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "atomic").await.unwrap();
    let (_, page) = project_with_page(&pool, &owner).await;
    let repo = BlockRepository::new(&pool);

    let original = normalize_blocks(&descriptors(json!([{"key": "gallery"}]))).unwrap();
    repo.sync(owner.id, page.id, SyncMode::Replace, &original).await.unwrap();

    let clashing = normalize_blocks(&descriptors(json!([
        {"key": "hero", "position": 0},
        {"key": "hero", "position": 0},
    ])))
    .unwrap();
    let err = repo
        .sync(owner.id, page.id, SyncMode::Replace, &clashing)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AccessError::Repository(RepositoryError::Conflict(_))),
        "{err:?}"
    );

    let stored = repo.list_for(owner.id, Some(page.id)).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key, SectionKey::Gallery);
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_sync_on_foreign_page_is_forbidden() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "victim").await.unwrap();
    let stranger = new_account(&pool, "intruder").await.unwrap();
    let (_, page) = project_with_page(&pool, &owner).await;

    let blocks = normalize_blocks(&descriptors(json!([{"key": "hero"}]))).unwrap();
    let err = BlockRepository::new(&pool)
        .sync(stranger.id, page.id, SyncMode::Replace, &blocks)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Forbidden("Page")), "{err:?}");
}

#[tokio::test]
#[ignore = "Requires HOSTDECK_TEST_DATABASE_URL"]
async fn test_deleting_project_removes_pages_and_blocks() {
    let pool = test_pool().await.expect("Failed to prepare database");
    let owner = new_account(&pool, "cleanup").await.unwrap();
    let (project, page) = project_with_page(&pool, &owner).await;

    let blocks = normalize_blocks(&descriptors(json!([{"key": "hero"}]))).unwrap();
    BlockRepository::new(&pool)
        .sync(owner.id, page.id, SyncMode::Replace, &blocks)
        .await
        .unwrap();

    ProjectRepository::new(&pool).delete(project.id).await.unwrap();

    let err = PageRepository::new(&pool).get(page.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    assert!(
        BlockRepository::new(&pool)
            .list_for(owner.id, Some(page.id))
            .await
            .unwrap()
            .is_empty()
    );
}
