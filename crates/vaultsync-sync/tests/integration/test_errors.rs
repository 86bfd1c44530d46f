//! Error handling: authorization aborts, per-file failures continue

use vaultsync_core::domain::record::AccountContext;
use vaultsync_sync::{SyncError, Syncer};

use crate::common::{Harness, ACCOUNT, RESUME_TOKEN};

#[tokio::test]
async fn test_revoked_authorization_aborts_with_resume_token() {
    let (harness, folder) = Harness::with_folder();
    harness.remote.seed_file(&folder, "work.keyring", b"v1");
    harness.sync().await;
    let committed = harness.cursors.change_id(ACCOUNT);

    harness.remote.advance_clock(60);
    harness.remote.seed_file(&folder, "new.keyring", b"v1");
    harness.remote.revoke_authorization();

    let err = harness
        .engine
        .perform_sync(&AccountContext::new(ACCOUNT))
        .await
        .expect_err("pass should abort without authorization");

    assert!(matches!(
        err,
        SyncError::AuthorizationRequired { ref resume_token } if resume_token == RESUME_TOKEN
    ));
    // The cursor is untouched, so the change is re-observed after consent
    assert_eq!(harness.cursors.change_id(ACCOUNT), committed);

    harness.remote.restore_authorization();
    let report = harness.sync().await;
    assert_eq!(report.downloaded, 1);
}

#[tokio::test]
async fn test_authorization_failure_on_first_pass_leaves_cursor_unsynced() {
    let harness = Harness::new();
    harness.remote.revoke_authorization();

    let err = harness
        .engine
        .perform_sync(&AccountContext::new(ACCOUNT))
        .await
        .expect_err("pass should abort without authorization");

    assert!(matches!(err, SyncError::AuthorizationRequired { .. }));
    assert_eq!(harness.cursors.change_id(ACCOUNT), -1);

    // The next pass after consent is still a full sync
    harness.remote.restore_authorization();
    harness.sync().await;
    assert!(harness.cursors.change_id(ACCOUNT) >= 0);
}

#[tokio::test]
async fn test_per_file_download_failure_does_not_abort_pass() {
    let (harness, folder) = Harness::with_folder();
    let failing = harness.remote.seed_file(&folder, "broken.keyring", b"x");
    harness.remote.seed_file(&folder, "fine.keyring", b"y");
    harness.remote.fail_downloads_for(&failing);

    let report = harness.sync().await;

    // The healthy file imports; the broken one lands in the error list
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("broken.keyring"));
    assert_eq!(harness.records.len(), 1);
    assert!(harness.blobs.contains(ACCOUNT, "fine.keyring"));
    assert!(!harness.blobs.contains(ACCOUNT, "broken.keyring"));

    // The cursor was not committed, so the next pass is still a full sync
    // and picks up the file that failed
    assert_eq!(harness.cursors.change_id(ACCOUNT), -1);
    harness.remote.restore_downloads();
    let report = harness.sync().await;
    assert!(report.errors.is_empty());
    assert_eq!(harness.records.len(), 2);
    assert!(harness.blobs.contains(ACCOUNT, "broken.keyring"));
    assert_eq!(
        harness.cursors.change_id(ACCOUNT),
        harness.remote.largest_change_id()
    );
}

#[tokio::test]
async fn test_failed_download_holds_cursor_until_change_applies() {
    let (harness, folder) = Harness::with_folder();
    let id = harness.remote.seed_file(&folder, "work.keyring", b"v1");
    harness.sync().await;
    let committed = harness.cursors.change_id(ACCOUNT);

    harness.remote.advance_clock(60);
    harness.remote.overwrite_content(&id, b"v2");
    harness.remote.fail_downloads_for(&id);

    let report = harness.sync().await;
    assert_eq!(report.errors.len(), 1);

    // The local blob is still at v1, so the cursor must not cover the
    // failed change
    assert_eq!(
        harness.blobs.get(ACCOUNT, "work.keyring").as_deref(),
        Some(b"v1".as_slice())
    );
    assert_eq!(harness.cursors.change_id(ACCOUNT), committed);

    // Once downloads recover the same change is replayed and applied
    harness.remote.restore_downloads();
    let report = harness.sync().await;
    assert!(report.errors.is_empty());
    assert_eq!(report.downloaded, 1);
    assert_eq!(
        harness.blobs.get(ACCOUNT, "work.keyring").as_deref(),
        Some(b"v2".as_slice())
    );
    assert_eq!(
        harness.cursors.change_id(ACCOUNT),
        harness.remote.largest_change_id()
    );
}
