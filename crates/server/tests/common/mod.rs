//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port with temporary prompt and
//! history directories, and points the chat provider at an
//! `httpmock::MockServer` that speaks the OpenAI-compatible streaming format.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::MockServer;
use promptdesk::PromptTemplate;
use promptdesk_server::{
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::json;
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    pub prompts_dir: PathBuf,
    pub history_dir: PathBuf,
    _dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with a working provider.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(Some("test-key"), "").await
    }

    /// Spawns the server with an `openai` provider and no API key.
    pub async fn spawn_without_key() -> Result<Self> {
        // The loader falls back to this variable when the config has no key.
        std::env::remove_var("OPENAI_API_KEY");
        Self::spawn_with(None, "").await
    }

    /// Spawns the server; `extra_yaml` is appended to the generated config.
    pub async fn spawn_with(api_key: Option<&str>, extra_yaml: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start();
        let dir = tempdir()?;
        let prompts_dir = dir.path().join("prompts");
        let history_dir = dir.path().join("chat_history");
        std::fs::create_dir_all(&prompts_dir)?;
        write_category(&prompts_dir, "meeting", 12)?;

        let key_line = match api_key {
            Some(key) => format!("  api_key: \"{key}\""),
            None => "  api_key: null".to_string(),
        };
        let config_content = format!(
            r#"
port: 0
prompts_dir: "{}"
history_dir: "{}"
provider:
  provider: "openai"
  api_url: "{}"
{key_line}
  model_name: "mock-chat-model"
stream_idle_timeout_secs: 5
{extra_yaml}
"#,
            prompts_dir.display(),
            history_dir.display(),
            mock_server.url(CHAT_PATH),
        );
        let config_path = dir.path().join("config.yml");
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config)?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            prompts_dir,
            history_dir,
            _dir: dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Writes `{key}.json` with `count` templates numbered from 1.
pub fn write_category(dir: &std::path::Path, key: &str, count: u32) -> Result<()> {
    let prompts: Vec<PromptTemplate> = (1..=count)
        .map(|id| PromptTemplate {
            id,
            title: format!("Template {id}"),
            system_prompt: format!("You are meeting assistant #{id}."),
            recommended_attachments: vec!["agenda.docx".to_string()],
        })
        .collect();
    let body = json!({ "category": key, "prompts": prompts });
    std::fs::write(
        dir.join(format!("{key}.json")),
        serde_json::to_string_pretty(&body)?,
    )?;
    Ok(())
}

/// An OpenAI-compatible SSE body carrying `deltas`, optionally terminated by `[DONE]`.
pub fn sse_body(deltas: &[&str], done: bool) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = json!({ "choices": [{ "delta": { "content": delta } }] });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

/// Splits a server-sent-event response body into its `data:` payloads.
pub fn sse_data(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter_map(|event| {
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            (!data.is_empty()).then(|| data.join("\n"))
        })
        .collect()
}
