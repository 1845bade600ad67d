//! # Chat History Endpoint Tests

mod common;

use anyhow::Result;
use common::TestApp;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_history_round_trip_over_http() -> Result<()> {
    let app = TestApp::spawn().await?;

    // --- Save ---
    let saved: Value = app
        .client
        .post(app.url("/api/chat-history"))
        .json(&json!({
            "title": "Budget sync",
            "messages": [
                { "role": "user", "content": "Summarize the attached sheet.",
                  "attachments": [{ "name": "q3.xlsx", "size": 2048, "type": "spreadsheet", "truncated": false }] },
                { "role": "assistant", "content": "Spend is flat." }
            ],
            "selected_prompt": { "id": 1, "title": "Template 1", "system_prompt": "s", "recommended_attachments": [] }
        }))
        .send()
        .await?
        .json()
        .await?;
    let filename = saved["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("Budget sync_"));
    assert!(app.history_dir.join(&filename).exists());

    // --- List ---
    let list: Value = app
        .client
        .get(app.url("/api/chat-history"))
        .send()
        .await?
        .json()
        .await?;
    let histories = list["histories"].as_array().unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0]["title"], "Budget sync");
    assert_eq!(histories[0]["message_count"], 2);

    // --- Read ---
    let record: Value = app
        .client
        .get(app.url(&format!("/api/chat-history/{filename}")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(record["messages"][0]["attachments"][0]["type"], "spreadsheet");
    assert_eq!(record["selected_prompt"]["id"], 1);
    assert_eq!(record["timestamp"].as_str().unwrap().len(), 15);

    // --- Delete ---
    let deleted = app
        .client
        .delete(app.url(&format!("/api/chat-history/{filename}")))
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);
    let body: Value = deleted.json().await?;
    assert!(body["message"].as_str().is_some());

    let again = app
        .client
        .delete(app.url(&format!("/api/chat-history/{filename}")))
        .send()
        .await?;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_missing_history_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .client
        .get(app.url("/api/chat-history/nothing_here.json"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert!(body["error"].as_str().unwrap().contains("nothing_here.json"));
    Ok(())
}

#[tokio::test]
async fn test_list_skips_corrupt_files() -> Result<()> {
    let app = TestApp::spawn().await?;
    std::fs::write(app.history_dir.join("corrupt.json"), "{")?;
    std::fs::write(
        app.history_dir.join("legacy.json"),
        r#"{"title": "Legacy", "timestamp": "20240101_000000", "messages": [{"role": "user", "content": "hi", "files": []}]}"#,
    )?;

    let list: Value = app
        .client
        .get(app.url("/api/chat-history"))
        .send()
        .await?
        .json()
        .await?;

    let histories = list["histories"].as_array().unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0]["filename"], "legacy.json");
    assert_eq!(histories[0]["message_count"], 1);
    Ok(())
}
