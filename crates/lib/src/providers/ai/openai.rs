use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, DeltaStream, ProviderMessage},
};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info};

// --- OpenAI-compatible request and streaming chunk structures ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ProviderMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize, Debug)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

// --- Provider implementation ---

/// A streaming provider for OpenAI and OpenAI-compatible chat completion APIs.
#[derive(Clone, Debug)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, PromptError> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn stream_chat(&self, messages: Vec<ProviderMessage>) -> Result<DeltaStream, PromptError> {
        let request_body = ChatCompletionRequest {
            messages: &messages,
            model: self.model.as_deref(),
            stream: true,
        };

        info!(
            url = %self.api_url,
            messages = messages.len(),
            "Opening completion stream."
        );

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(format!("{status}: {error_text}")));
        }

        let events = Box::pin(response.bytes_stream().eventsource());
        let deltas = futures::stream::unfold(Some(events), |state| async move {
            let mut events = state?;
            loop {
                match events.next().await {
                    None => {
                        return Some((
                            Err(PromptError::Stream(
                                "stream closed before response completed".to_string(),
                            )),
                            None,
                        ))
                    }
                    Some(Err(e)) => return Some((Err(PromptError::Stream(e.to_string())), None)),
                    Some(Ok(event)) => {
                        if event.data.trim() == "[DONE]" {
                            debug!("Completion stream finished.");
                            return None;
                        }
                        match parse_chunk(&event.data) {
                            Ok(Some(delta)) => return Some((Ok(delta), Some(events))),
                            Ok(None) => continue,
                            Err(e) => return Some((Err(e), None)),
                        }
                    }
                }
            }
        });

        Ok(Box::pin(deltas))
    }
}

/// Returns the text delta carried by one SSE payload, if any.
fn parse_chunk(data: &str) -> Result<Option<String>, PromptError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| PromptError::AiDeserialization(format!("{e}, data: {data}")))?;

    if let Some(error) = chunk.error {
        return Err(PromptError::AiApi(error.message));
    }

    let content = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.and_then(|d| d.content))
        .collect::<String>();
    Ok((!content.is_empty()).then_some(content))
}
