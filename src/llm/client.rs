use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur at the generation-service boundary
///
/// None of these are fatal for a run; the corrector degrades to the
/// rule-corrected result for the affected segment.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No client is configured (rule-only mode)
    #[error("generation service unavailable")]
    Unavailable,

    /// HTTP transport or connection error
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The service returned a non-success status
    #[error("service error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The response body could not be parsed
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The response carried no usable text
    #[error("empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

/// Generation parameters sent with every correction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Randomness setting (low keeps the edit conservative)
    pub temperature: f64,
    /// Nucleus-sampling cutoff
    pub top_p: f64,
    /// Maximum output length in tokens
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 1000,
        }
    }
}

/// One successful generation-service reply
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Narrow capability interface to the external generation service
///
/// The pipeline is fully testable without network access: any implementation
/// returning `LlmError::Unavailable` puts the corrector in rule-only mode.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn correct(
        &self,
        instruction: &str,
        params: &GenerationParams,
    ) -> Result<Completion, LlmError>;
}

/// No-op client used when LLM escalation is disabled
pub struct NullClient;

#[async_trait]
impl CompletionClient for NullClient {
    async fn correct(
        &self,
        _instruction: &str,
        _params: &GenerationParams,
    ) -> Result<Completion, LlmError> {
        Err(LlmError::Unavailable)
    }
}

/// Configuration for the Nova generation client
#[derive(Debug, Clone)]
pub struct NovaConfig {
    /// Bearer token (from AWS_BEARER_TOKEN_BEDROCK env var)
    pub api_key: String,
    /// Service region (e.g. "us-east-1")
    pub region: String,
    /// Model to invoke (e.g. "amazon.nova-micro-v1:0")
    pub model_id: String,
}

impl NovaConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AWS_BEARER_TOKEN_BEDROCK")
            .context("AWS_BEARER_TOKEN_BEDROCK environment variable not set")?;

        Ok(Self {
            api_key,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            model_id: "amazon.nova-micro-v1:0".to_string(),
        })
    }

    /// Create with custom settings
    pub fn new(api_key: String, region: String, model_id: String) -> Self {
        Self {
            api_key,
            region,
            model_id,
        }
    }
}

/// Client for the Nova text-generation service
pub struct NovaClient {
    client: Client,
    config: NovaConfig,
}

impl NovaClient {
    pub fn new(config: NovaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn invoke_url(&self) -> String {
        format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/invoke",
            self.config.region, self.config.model_id
        )
    }
}

#[async_trait]
impl CompletionClient for NovaClient {
    async fn correct(
        &self,
        instruction: &str,
        params: &GenerationParams,
    ) -> Result<Completion, LlmError> {
        let request = InvokeRequest {
            messages: vec![RequestMessage {
                role: "user".to_string(),
                content: vec![ContentBlock {
                    text: instruction.to_string(),
                }],
            }],
            inference_config: InferenceConfig {
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
            },
        };

        let response = self
            .client
            .post(self.invoke_url())
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let response: InvokeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = response
            .output
            .message
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(Completion {
            text,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest {
    messages: Vec<RequestMessage>,
    inference_config: InferenceConfig,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceConfig {
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    output: ResponseOutput,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ResponseOutput {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_client_is_unavailable() {
        let client = NullClient;
        let result = client.correct("テキスト", &GenerationParams::default()).await;
        assert!(matches!(result, Err(LlmError::Unavailable)));
    }

    #[test]
    fn test_clients_are_object_safe() {
        let client: Box<dyn CompletionClient> = Box::new(NullClient);
        drop(client);
    }

    #[test]
    fn test_invoke_request_wire_format() {
        let request = InvokeRequest {
            messages: vec![RequestMessage {
                role: "user".to_string(),
                content: vec![ContentBlock {
                    text: "本文".to_string(),
                }],
            }],
            inference_config: InferenceConfig {
                max_tokens: 1000,
                temperature: 0.1,
                top_p: 0.9,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inferenceConfig"]["maxTokens"], 1000);
        assert_eq!(json["inferenceConfig"]["topP"], 0.9);
        assert_eq!(json["messages"][0]["content"][0]["text"], "本文");
    }

    #[test]
    fn test_invoke_response_parsing() {
        let json = r#"{
            "output": {"message": {"content": [{"text": " 修正済みテキスト "}], "role": "assistant"}},
            "usage": {"inputTokens": 120, "outputTokens": 45}
        }"#;

        let response: InvokeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.output.message.content[0].text, " 修正済みテキスト ");
        assert_eq!(response.usage.input_tokens, 120);
        assert_eq!(response.usage.output_tokens, 45);
    }

    #[test]
    fn test_invoke_url() {
        let client = NovaClient::new(NovaConfig::new(
            "key".to_string(),
            "us-east-1".to_string(),
            "amazon.nova-micro-v1:0".to_string(),
        ));
        assert_eq!(
            client.invoke_url(),
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/amazon.nova-micro-v1:0/invoke"
        );
    }
}
