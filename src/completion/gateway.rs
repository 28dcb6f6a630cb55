use log::debug;

use crate::config::CompletionConfig;
use crate::types::Turn;

use super::{CompletionError, CompletionResult, Provider};

/// Stateless client for the configured completion endpoint.
pub struct CompletionGateway {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    model: String,
    provider: Provider,
}

impl CompletionGateway {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            provider: config.provider,
        }
    }

    /// Send the window upstream and return the generated text.
    ///
    /// Makes exactly one request. Every failure, including transport errors
    /// and non-2xx statuses, comes back as an `Err` value.
    pub async fn complete(&self, window: &[Turn]) -> CompletionResult {
        debug!(
            "Sending {} request to {} with {} turns",
            self.provider,
            self.endpoint,
            window.len()
        );

        let body = self.provider.request_body(&self.model, window)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(CompletionError::Api { status, message });
        }

        let text = response.text().await?;
        let reply = self.provider.extract_text(&text)?;

        debug!("Received {} characters from completion API", reply.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn gateway(provider: Provider, endpoint: String) -> CompletionGateway {
        CompletionGateway::new(&CompletionConfig {
            provider,
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            endpoint,
        })
    }

    #[tokio::test]
    async fn chat_success_returns_content_unchanged() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(serde_json::json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "what is 2+2?"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#)
            .create_async()
            .await;

        let gateway = gateway(
            Provider::Chat,
            format!("{}/v1/chat/completions", server.url()),
        );
        let reply = gateway.complete(&[Turn::user("what is 2+2?")]).await;

        assert_eq!(reply.expect("completion should succeed"), "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn prompt_success_returns_generated_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gpt2")
            .match_body(Matcher::Json(serde_json::json!({"inputs": "latest"})))
            .with_status(200)
            .with_body(r#"[{"generated_text":"latest and greatest"}]"#)
            .create_async()
            .await;

        let gateway = gateway(Provider::Prompt, format!("{}/models/gpt2", server.url()));
        let window = [Turn::user("earlier"), Turn::assistant("sure"), Turn::user("latest")];
        let reply = gateway.complete(&window).await;

        assert_eq!(reply.expect("completion should succeed"), "latest and greatest");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_statuses_become_failures_with_the_code() {
        for status in [429, 500] {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("POST", "/")
                .with_status(status)
                .with_body(r#"{"error":{"message":"slow down"}}"#)
                .create_async()
                .await;

            let gateway = gateway(Provider::Chat, server.url());
            let err = gateway
                .complete(&[Turn::user("hi")])
                .await
                .expect_err("status should fail");

            assert!(matches!(err, CompletionError::Api { .. }));
            let message = err.to_string();
            assert!(message.contains(&status.to_string()), "{message}");
            assert!(message.contains("slow down"), "{message}");
        }
    }

    #[tokio::test]
    async fn connection_refused_is_a_failure() {
        // Bind then drop a listener to get a port nobody is serving.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let gateway = gateway(Provider::Chat, format!("http://{addr}/"));
        let result = gateway.complete(&[Turn::user("hi")]).await;

        assert!(matches!(result, Err(CompletionError::Transport(_))));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let gateway = gateway(Provider::Chat, server.url());
        let result = gateway.complete(&[Turn::user("hi")]).await;

        assert!(matches!(result, Err(CompletionError::Response(_))));
    }
}
