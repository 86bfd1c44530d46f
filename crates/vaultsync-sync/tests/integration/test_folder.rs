//! Sync folder resolution and cache invalidation

use vaultsync_core::domain::newtypes::RemoteFileId;

use crate::common::{Harness, ACCOUNT};

#[tokio::test]
async fn test_existing_folder_is_found_by_title_and_cached() {
    let (harness, folder) = Harness::with_folder();

    harness.sync().await;

    assert_eq!(
        harness.cursors.folder_id(ACCOUNT).as_deref(),
        Some(folder.as_str())
    );
    // Only the seeded folder exists, no duplicate was created
    assert_eq!(harness.remote.file_count(), 1);
}

#[tokio::test]
async fn test_cached_folder_id_survives_passes() {
    let (harness, folder) = Harness::with_folder();

    harness.sync().await;
    harness.sync().await;
    harness.sync().await;

    assert_eq!(
        harness.cursors.folder_id(ACCOUNT).as_deref(),
        Some(folder.as_str())
    );
    assert_eq!(harness.remote.file_count(), 1);
}

#[tokio::test]
async fn test_stale_cached_folder_id_is_rediscovered() {
    let (harness, folder) = Harness::with_folder();
    // A cached id pointing at a folder that no longer exists
    harness.cursors.set_folder_id(ACCOUNT, "R404");

    harness.sync().await;

    assert_eq!(
        harness.cursors.folder_id(ACCOUNT).as_deref(),
        Some(folder.as_str())
    );
}

#[tokio::test]
async fn test_trashed_cached_folder_triggers_recreation() {
    let (harness, folder) = Harness::with_folder();
    harness.sync().await;

    harness.remote.advance_clock(60);
    harness.remote.trash_file(&folder);

    harness.sync().await;

    let recreated = harness
        .cursors
        .folder_id(ACCOUNT)
        .expect("a fresh folder id should be cached");
    assert_ne!(recreated, folder.as_str());

    let new_folder = harness
        .remote
        .file(&RemoteFileId::new(recreated).unwrap())
        .expect("a replacement folder should exist");
    assert!(!new_folder.trashed);
    assert_eq!(new_folder.mime_type, "application/vnd.google-apps.folder");
}
