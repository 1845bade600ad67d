//! Shared test doubles and document fixtures for the `promptdesk` crates.

pub mod fixtures;

use async_trait::async_trait;
use futures::StreamExt;
use promptdesk::errors::PromptError;
use promptdesk::providers::ai::{AiProvider, DeltaStream, ProviderMessage};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Mock AI Provider ---

/// How a scripted stream behaves.
#[derive(Clone, Debug, Default)]
struct Script {
    deltas: Vec<String>,
    /// Fail after this many deltas have been yielded.
    fail_after: Option<usize>,
    /// Fail before any stream is opened.
    fail_on_open: bool,
    /// Sleep before each delta.
    delay: Option<Duration>,
}

/// A provider that replays scripted deltas and records every request.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<Vec<ProviderMessage>>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider that streams `deltas` and completes normally.
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        provider.script.lock().unwrap().deltas = deltas.into_iter().map(Into::into).collect();
        provider
    }

    /// Yields the first `count` scripted deltas, then an error item.
    pub fn fail_after(self, count: usize) -> Self {
        self.script.lock().unwrap().fail_after = Some(count);
        self
    }

    /// Fails when the stream is opened.
    pub fn fail_on_open(self) -> Self {
        self.script.lock().unwrap().fail_on_open = true;
        self
    }

    /// Sleeps before every delta.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.script.lock().unwrap().delay = Some(delay);
        self
    }

    /// Retrieves the recorded requests for assertion.
    pub fn get_calls(&self) -> Vec<Vec<ProviderMessage>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn stream_chat(&self, messages: Vec<ProviderMessage>) -> Result<DeltaStream, PromptError> {
        self.calls.lock().unwrap().push(messages);
        let script = self.script.lock().unwrap().clone();

        if script.fail_on_open {
            return Err(PromptError::AiApi(
                "MockAiProvider: scripted failure on open".to_string(),
            ));
        }

        let mut items: Vec<Result<String, PromptError>> = script
            .deltas
            .iter()
            .take(script.fail_after.unwrap_or(usize::MAX))
            .cloned()
            .map(Ok)
            .collect();
        if let Some(count) = script.fail_after {
            items.push(Err(PromptError::Stream(format!(
                "MockAiProvider: scripted failure after {count} deltas"
            ))));
        }

        let delay = script.delay;
        let stream = futures::stream::iter(items).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });
        Ok(Box::pin(stream))
    }
}
