//! Tests for the change feed endpoint

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use vaultsync_core::ports::RemoteClient;

use crate::common::{file_json, setup_drive_mock};

#[tokio::test]
async fn test_list_changes_single_page() {
    let (server, client) = setup_drive_mock().await;

    // since = 100 must ask for changes starting at 101
    Mock::given(method("GET"))
        .and(path("/changes"))
        .and(query_param("startChangeId", "101"))
        .and(query_param("includeDeleted", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                { "fileId": "R1", "deleted": true },
                { "fileId": "R2", "file": file_json("R2", "work.keyring") }
            ],
            "largestChangeId": "207"
        })))
        .mount(&server)
        .await;

    let page = client.list_changes(100, None).await.unwrap();

    assert_eq!(page.largest_change_id, 207);
    assert!(page.next_page_token.is_none());
    assert_eq!(page.changes.len(), 2);

    assert_eq!(page.changes[0].file_id.as_str(), "R1");
    assert!(page.changes[0].deleted);
    assert!(page.changes[0].file.is_none());

    assert_eq!(page.changes[1].file_id.as_str(), "R2");
    assert!(!page.changes[1].deleted);
    assert_eq!(page.changes[1].file.as_ref().unwrap().title, "work.keyring");
}

#[tokio::test]
async fn test_list_changes_paginated() {
    let (server, client) = setup_drive_mock().await;

    // Page 1 carries a continuation token
    Mock::given(method("GET"))
        .and(path("/changes"))
        .and(query_param("startChangeId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [ { "fileId": "R1", "file": file_json("R1", "a.keyring") } ],
            "largestChangeId": "300",
            "nextPageToken": "page-2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Page 2 is requested with the token and ends the feed
    Mock::given(method("GET"))
        .and(path("/changes"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [ { "fileId": "R2", "file": file_json("R2", "b.keyring") } ],
            "largestChangeId": "300"
        })))
        .mount(&server)
        .await;

    let first = client.list_changes(0, None).await.unwrap();
    assert_eq!(first.next_page_token.as_deref(), Some("page-2"));
    assert_eq!(first.changes.len(), 1);

    let second = client.list_changes(0, Some("page-2")).await.unwrap();
    assert!(second.next_page_token.is_none());
    assert_eq!(second.changes[0].file_id.as_str(), "R2");
}

#[tokio::test]
async fn test_list_changes_empty_feed() {
    let (server, client) = setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/changes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [],
            "largestChangeId": "100"
        })))
        .mount(&server)
        .await;

    let page = client.list_changes(100, None).await.unwrap();
    assert!(page.changes.is_empty());
    assert_eq!(page.largest_change_id, 100);
}
