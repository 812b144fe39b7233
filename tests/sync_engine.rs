//! Integration tests for the two-store sync engine.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;

use common::fields;
use credsync::prelude::*;

fn engine(
    store_a: &Arc<MemoryStore>,
    store_b: &Arc<MemoryStore>,
    audit: &Arc<AuditLog>,
) -> SyncEngine {
    SyncEngine::new(store_a.clone(), store_b.clone(), audit.clone())
}

#[tokio::test]
async fn directional_sync_creates_a_missing_destination() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("username", "admin"), ("password", "pw")]));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new("db-admin", SyncDirection::AToB, ConflictPolicy::Skip);
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Success);
    assert!(result.source_version.is_some());
    assert!(result.dest_version.is_some());

    let copied = store_b.read("db-admin").await.unwrap();
    assert_eq!(copied.field("password"), Some("pw"));

    assert_eq!(audit.len(), 1);
    let entry = &audit.entries()[0];
    assert_eq!(entry.operation, "sync");
    assert_eq!(entry.direction.as_deref(), Some("a_to_b"));
    assert_eq!(entry.status, "success");
}

#[tokio::test]
async fn directional_sync_updates_an_existing_destination() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "new")]));
    store_b.seed("db-admin", fields(&[("password", "stale")]));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "db-admin",
        SyncDirection::AToB,
        ConflictPolicy::OverwriteDestination,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(
        store_b.read("db-admin").await.unwrap().field("password"),
        Some("new")
    );
}

#[tokio::test]
async fn missing_source_fails_without_an_audit_entry() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new("ghost", SyncDirection::AToB, ConflictPolicy::Skip);
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Failed);
    assert!(result.message.contains("not found"));
    assert!(audit.is_empty());
    assert_eq!(store_b.write_count(), 0);
}

#[rstest]
#[case(SyncDirection::AToB, ConflictPolicy::OverwriteDestination)]
#[case(SyncDirection::AToB, ConflictPolicy::Skip)]
#[case(SyncDirection::AToB, ConflictPolicy::UseNewest)]
#[case(SyncDirection::AToB, ConflictPolicy::Manual)]
#[case(SyncDirection::BToA, ConflictPolicy::OverwriteDestination)]
#[case(SyncDirection::BToA, ConflictPolicy::Skip)]
#[case(SyncDirection::BToA, ConflictPolicy::UseNewest)]
#[case(SyncDirection::BToA, ConflictPolicy::Manual)]
#[case(SyncDirection::Bidirectional, ConflictPolicy::OverwriteDestination)]
#[case(SyncDirection::Bidirectional, ConflictPolicy::Skip)]
#[case(SyncDirection::Bidirectional, ConflictPolicy::UseNewest)]
#[case(SyncDirection::Bidirectional, ConflictPolicy::Manual)]
#[tokio::test]
async fn dry_run_never_writes_and_never_audits(
    #[case] direction: SyncDirection,
    #[case] policy: ConflictPolicy,
) {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    let now = Utc::now();
    store_a.seed_at("db-admin", fields(&[("password", "a")]), now);
    store_b.seed_at("db-admin", fields(&[("password", "b")]), now - Duration::hours(1));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new("db-admin", direction, policy).dry_run();
    engine.sync_one(&task).await;

    assert_eq!(store_a.write_count(), 0, "{direction:?}/{policy:?} wrote to A");
    assert_eq!(store_b.write_count(), 0, "{direction:?}/{policy:?} wrote to B");
    assert!(audit.is_empty(), "{direction:?}/{policy:?} audited a dry run");
}

#[tokio::test]
async fn skip_policy_leaves_an_existing_destination_alone() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "new")]));
    store_b.seed("db-admin", fields(&[("password", "existing")]));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new("db-admin", SyncDirection::AToB, ConflictPolicy::Skip);
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Skipped);
    assert_eq!(
        store_b.read("db-admin").await.unwrap().field("password"),
        Some("existing")
    );
    // A real (non-dry-run) skip is still audited.
    assert_eq!(audit.len(), 1);
    assert_eq!(audit.entries()[0].status, "skipped");
}

#[tokio::test]
async fn bidirectional_use_newest_writes_from_the_newer_side() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    let now = Utc::now();
    store_a.seed_at("db-admin", fields(&[("password", "older")]), now - Duration::hours(2));
    store_b.seed_at("db-admin", fields(&[("password", "newer")]), now);

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "db-admin",
        SyncDirection::Bidirectional,
        ConflictPolicy::UseNewest,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(result.direction, SyncDirection::Bidirectional);
    assert_eq!(
        store_a.read("db-admin").await.unwrap().field("password"),
        Some("newer")
    );
    // Only the losing side was written.
    assert_eq!(store_a.write_count(), 1);
    assert_eq!(store_b.write_count(), 0);
}

#[tokio::test]
async fn bidirectional_tie_resolves_toward_store_a() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    let now = Utc::now();
    store_a.seed_at("db-admin", fields(&[("password", "from-a")]), now);
    store_b.seed_at("db-admin", fields(&[("password", "from-b")]), now);

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "db-admin",
        SyncDirection::Bidirectional,
        ConflictPolicy::UseNewest,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(
        store_b.read("db-admin").await.unwrap().field("password"),
        Some("from-a")
    );
}

#[tokio::test]
async fn bidirectional_divergence_without_use_newest_is_a_conflict() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "a")]));
    store_b.seed("db-admin", fields(&[("password", "b")]));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "db-admin",
        SyncDirection::Bidirectional,
        ConflictPolicy::Manual,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Conflict);
    assert_eq!(store_a.write_count() + store_b.write_count(), 0);
    assert_eq!(audit.entries()[0].status, "conflict");
}

#[tokio::test]
async fn bidirectional_one_sided_presence_delegates_to_a_directional_sync() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_b.seed("db-admin", fields(&[("password", "only-in-b")]));

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "db-admin",
        SyncDirection::Bidirectional,
        ConflictPolicy::UseNewest,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Success);
    assert_eq!(
        store_a.read("db-admin").await.unwrap().field("password"),
        Some("only-in-b")
    );
}

#[tokio::test]
async fn bidirectional_absent_everywhere_fails_without_audit() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new(
        "ghost",
        SyncDirection::Bidirectional,
        ConflictPolicy::UseNewest,
    );
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Failed);
    assert!(audit.is_empty());
}

#[tokio::test]
async fn adapter_failure_lands_in_the_result_and_is_audited() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "pw")]));
    store_b.fail_next("connection refused");

    let engine = engine(&store_a, &store_b, &audit);
    let task = SyncTask::new("db-admin", SyncDirection::AToB, ConflictPolicy::Skip);
    let result = engine.sync_one(&task).await;

    assert_eq!(result.status, SyncStatus::Failed);
    assert!(result.message.contains("connection refused"));
    assert_eq!(audit.len(), 1);
    assert_eq!(audit.entries()[0].status, "failed");
}

#[tokio::test]
async fn batch_isolates_failures_and_preserves_input_order() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("first", fields(&[("password", "1")]));
    store_a.seed("third", fields(&[("password", "3")]));

    let engine = engine(&store_a, &store_b, &audit);
    let report = engine
        .sync_batch(
            &["first", "missing", "third"],
            SyncDirection::AToB,
            ConflictPolicy::Skip,
            false,
        )
        .await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.count(SyncStatus::Success), 2);
    assert_eq!(report.count(SyncStatus::Failed), 1);
    assert_eq!(report.failed_names(), vec!["missing"]);

    let names: Vec<&str> = report.results.iter().map(|r| r.secret_name.as_str()).collect();
    assert_eq!(names, vec!["first", "missing", "third"]);
    assert!((report.success_rate() - 66.666).abs() < 0.01);
}

#[tokio::test]
async fn status_reports_per_field_conflicts() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed(
        "db-admin",
        fields(&[("password", "a-pw"), ("username", "admin"), ("host", "db01")]),
    );
    store_b.seed(
        "db-admin",
        fields(&[("password", "b-pw"), ("username", "admin"), ("port", "5432")]),
    );

    let engine = engine(&store_a, &store_b, &audit);
    let comparison = engine.status("db-admin").await.unwrap();

    assert!(comparison.in_a && comparison.in_b);
    assert!(!comparison.in_sync);
    assert!(comparison.conflicts.iter().any(|c| c.contains("'password' differs")));
    assert!(comparison.conflicts.iter().any(|c| c.contains("'host' only in store A")));
    assert!(comparison.conflicts.iter().any(|c| c.contains("'port' only in store B")));
}

#[tokio::test]
async fn status_of_identical_secrets_is_in_sync() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "pw")]));
    store_b.seed("db-admin", fields(&[("password", "pw")]));

    let engine = engine(&store_a, &store_b, &audit);
    let comparison = engine.status("db-admin").await.unwrap();
    assert!(comparison.in_sync);
    assert!(comparison.conflicts.is_empty());
}

#[tokio::test]
async fn status_of_a_one_sided_secret_reports_presence() {
    let store_a = Arc::new(MemoryStore::new("vault"));
    let store_b = Arc::new(MemoryStore::new("pam"));
    let audit = Arc::new(AuditLog::new());
    store_a.seed("db-admin", fields(&[("password", "pw")]));

    let engine = engine(&store_a, &store_b, &audit);
    let comparison = engine.status("db-admin").await.unwrap();

    assert!(comparison.in_a);
    assert!(!comparison.in_b);
    assert!(!comparison.in_sync);
    assert_eq!(comparison.conflicts, vec!["present only in store A".to_string()]);
}
