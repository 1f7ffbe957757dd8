//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `signalhub_test`)
//!   `TEST_DB_PASSWORD` (default: `signalhub_test`)
//!   `TEST_DB_NAME` (default: `signalhub_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use signalhub_db::{
    entities::{
        follow::{self, BlockedPair, FollowStatus},
        mute,
        user::{self, UserRole},
    },
    repositories::{FollowRepository, MuteRepository, UserRepository},
    test_utils::{TestDatabase, TestDbConfig},
};

fn new_user(id: &str, role: UserRole) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(id.to_string()),
        email: Set(format!("{id}@example.com")),
        name: Set(None),
        avatar_url: Set(None),
        role: Set(role),
        is_active: Set(true),
        is_subscribed: Set(false),
        is_verified: Set(false),
        token: Set(None),
        password_hash: Set("hash".to_string()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
}

fn pending(id: &str, follower_id: &str, followed_id: &str) -> follow::ActiveModel {
    follow::ActiveModel {
        id: Set(id.to_string()),
        follower_id: Set(follower_id.to_string()),
        followed_id: Set(followed_id.to_string()),
        status: Set(FollowStatus::Pending),
        is_active: Set(false),
        requested_at: Set(Some(Utc::now().into())),
        accepted_at: Set(None),
        rejected_at: Set(None),
        unfollowed_at: Set(None),
    }
}

async fn seeded() -> (TestDatabase, Arc<sea_orm::DatabaseConnection>) {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.expect("Cleanup failed");

    // `DatabaseConnection` is not `Clone` with sea-orm's `mock` feature
    // (enabled for unit tests), so open an owned connection to the same database.
    let conn = Arc::new(
        sea_orm::Database::connect(&db.config.database_url())
            .await
            .expect("Failed to connect"),
    );
    let users = UserRepository::new(Arc::clone(&conn));
    users.create(new_user("alice", UserRole::Trader)).await.unwrap();
    users.create(new_user("bob", UserRole::Analyst)).await.unwrap();

    (db, conn)
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_pair_insert_is_unique() {
    let (_db, conn) = seeded().await;
    let follows = FollowRepository::new(conn);

    assert!(follows.insert_if_absent(pending("f1", "alice", "bob")).await.unwrap());
    assert!(!follows.insert_if_absent(pending("f2", "alice", "bob")).await.unwrap());

    let row = follows.find_by_pair("alice", "bob").await.unwrap().unwrap();
    assert_eq!(row.id, "f1");
    assert!(follows.find_by_id("f2").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_compare_and_set_only_once() {
    let (_db, conn) = seeded().await;
    let follows = FollowRepository::new(conn);
    follows.insert_if_absent(pending("f1", "alice", "bob")).await.unwrap();

    let accept = follow::ActiveModel {
        status: Set(FollowStatus::Accepted),
        is_active: Set(true),
        accepted_at: Set(Some(Utc::now().into())),
        ..Default::default()
    };

    assert!(
        follows
            .compare_and_set("f1", FollowStatus::Pending, false, accept.clone())
            .await
            .unwrap()
    );
    assert!(
        !follows
            .compare_and_set("f1", FollowStatus::Pending, false, accept)
            .await
            .unwrap()
    );

    assert_eq!(follows.count_followers("bob").await.unwrap(), 1);
    assert_eq!(follows.count_following("alice").await.unwrap(), 1);

    let counts = follows
        .count_followers_by_users(&["bob".to_string(), "alice".to_string()])
        .await
        .unwrap();
    assert_eq!(counts.get("bob"), Some(&1));
    assert_eq!(counts.get("alice"), None);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_block_row_lives_in_reverse_slot() {
    let (_db, conn) = seeded().await;
    let follows = FollowRepository::new(conn);

    // bob blocks alice
    let pair = BlockedPair::new("bob", "alice");
    let mut row = pending("f1", pair.follower_id(), pair.followed_id());
    row.status = Set(FollowStatus::Blocked);
    follows.insert_if_absent(row).await.unwrap();

    let stored = follows.find_by_pair("alice", "bob").await.unwrap();
    assert!(stored.is_some_and(|f| f.is_blocked()));

    // alice never blocked bob, so the reverse pair deletes nothing
    assert!(!follows.delete_block(BlockedPair::new("alice", "bob")).await.unwrap());

    assert!(follows.delete_block(pair).await.unwrap());
    assert!(!follows.delete_block(pair).await.unwrap());
    assert!(follows.find_by_pair("alice", "bob").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_mute_roundtrip() {
    let (_db, conn) = seeded().await;
    let mutes = MuteRepository::new(Arc::clone(&conn));
    let follows = FollowRepository::new(conn);

    let model = mute::ActiveModel {
        id: Set("m1".to_string()),
        muter_id: Set("alice".to_string()),
        muted_id: Set("bob".to_string()),
        muted_at: Set(Utc::now().into()),
    };
    assert!(mutes.insert_if_absent(model).await.unwrap());
    assert_eq!(mutes.count_by_muter("alice").await.unwrap(), 1);

    assert!(mutes.delete_by_pair("alice", "bob").await.unwrap());
    assert!(!mutes.is_muted("alice", "bob").await.unwrap());
    assert!(follows.find_by_pair("alice", "bob").await.unwrap().is_none());
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
