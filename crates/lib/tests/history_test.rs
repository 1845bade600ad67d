//! # Chat History Store Tests

mod common;

use anyhow::Result;
use promptdesk::{
    ChatMessage, ChatSession, HistoryError, HistoryStore, PromptTemplate,
};
use tempfile::tempdir;

fn conversation() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("What changed in Q3?"),
        ChatMessage::assistant("Revenue rose and hiring paused."),
    ]
}

#[test]
fn test_save_list_read_delete() -> Result<()> {
    common::setup_tracing();
    // --- Arrange ---
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path().join("chat_history"))?;
    let prompt = PromptTemplate {
        id: 2,
        title: "Quarterly review".to_string(),
        system_prompt: "Summarize numbers first.".to_string(),
        recommended_attachments: vec![],
    };

    // --- Act ---
    let filename = store.save("Q3 review", conversation(), Some(prompt.clone()))?;

    // --- Assert ---
    assert!(filename.starts_with("Q3 review_"));
    assert!(filename.ends_with(".json"));

    let summaries = store.list()?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].filename, filename);
    assert_eq!(summaries[0].title, "Q3 review");
    assert_eq!(summaries[0].message_count, 2);

    let record = store.read(&filename)?;
    assert_eq!(record.messages, conversation());
    assert_eq!(record.selected_prompt, Some(prompt.clone()));
    assert_eq!(record.timestamp.len(), "20260101_120000".len());

    // A reloaded record restores the session with its prompt.
    let session = ChatSession::from_record(&record);
    assert_eq!(session.system_prompt(), Some("Summarize numbers first."));
    assert_eq!(session.messages().len(), 2);

    store.delete(&filename)?;
    assert!(store.list()?.is_empty());
    assert!(matches!(store.read(&filename), Err(HistoryError::NotFound(_))));
    Ok(())
}

/// Two saves with the same title within one second never overwrite each other.
#[test]
fn test_same_second_saves_get_distinct_names() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path())?;

    let names: Vec<String> = (0..3)
        .map(|_| store.save("standup", conversation(), None))
        .collect::<Result<_, _>>()?;

    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
    assert_eq!(store.list()?.len(), 3);
    Ok(())
}

#[test]
fn test_concurrent_saves_do_not_collide() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || {
                let store = HistoryStore::new(path).unwrap();
                store.save("parallel", conversation(), None).unwrap()
            })
        })
        .collect();
    let mut names: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    names.sort();
    names.dedup();

    assert_eq!(names.len(), 8);
    Ok(())
}

#[test]
fn test_list_skips_unreadable_files_and_defaults_title() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path())?;
    std::fs::write(dir.path().join("zz_broken.json"), "{ not json")?;
    std::fs::write(dir.path().join("notes.txt"), "ignored")?;
    std::fs::write(
        dir.path().join("aa_untitled.json"),
        r#"{"timestamp": "20250101_000000", "messages": []}"#,
    )?;

    let summaries = store.list()?;

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].filename, "aa_untitled.json");
    assert_eq!(summaries[0].title, "Untitled");
    assert_eq!(summaries[0].message_count, 0);
    Ok(())
}

#[test]
fn test_list_is_newest_first() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path())?;
    for name in ["a_20250101_000000.json", "a_20250301_000000.json", "a_20250201_000000.json"] {
        std::fs::write(dir.path().join(name), r#"{"title": "a", "messages": []}"#)?;
    }

    let order: Vec<String> = store.list()?.into_iter().map(|s| s.filename).collect();

    assert_eq!(
        order,
        vec![
            "a_20250301_000000.json",
            "a_20250201_000000.json",
            "a_20250101_000000.json"
        ]
    );
    Ok(())
}

/// Recency comes from the record's timestamp, not from the title in the filename.
#[test]
fn test_list_orders_by_timestamp_across_titles() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path())?;
    for (name, title, timestamp) in [
        ("budget_20240105_090000.json", "budget", "20240105_090000"),
        ("agenda_20250610_120000.json", "agenda", "20250610_120000"),
        ("zebra_20230101_000000.json", "zebra", "20230101_000000"),
        ("memo_20250610_120000.json", "memo", "20250610_120000"),
    ] {
        let body = format!(r#"{{"title": "{title}", "timestamp": "{timestamp}", "messages": []}}"#);
        std::fs::write(dir.path().join(name), body)?;
    }

    let order: Vec<String> = store.list()?.into_iter().map(|s| s.filename).collect();

    assert_eq!(
        order,
        vec![
            "memo_20250610_120000.json",
            "agenda_20250610_120000.json",
            "budget_20240105_090000.json",
            "zebra_20230101_000000.json"
        ]
    );
    Ok(())
}

#[test]
fn test_rejects_unsafe_names_and_missing_files() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path().join("inner"))?;
    std::fs::write(dir.path().join("secret.json"), "{}")?;

    assert!(matches!(
        store.read("../secret.json"),
        Err(HistoryError::InvalidName(_))
    ));
    assert!(matches!(
        store.delete("../secret.json"),
        Err(HistoryError::InvalidName(_))
    ));
    assert!(matches!(store.read("notes.txt"), Err(HistoryError::InvalidName(_))));
    assert!(matches!(
        store.delete("gone.json"),
        Err(HistoryError::NotFound(_))
    ));
    assert!(dir.path().join("secret.json").exists());
    Ok(())
}

/// Titles with path separators are flattened into a single file name.
#[test]
fn test_title_is_sanitized_into_filename() -> Result<()> {
    let dir = tempdir()?;
    let store = HistoryStore::new(dir.path())?;

    let filename = store.save("plans/2025: draft?", vec![], None)?;

    assert!(filename.starts_with("plans_2025_ draft__"));
    assert!(dir.path().join(&filename).exists());
    assert_eq!(store.read(&filename)?.title, "plans/2025: draft?");
    Ok(())
}
