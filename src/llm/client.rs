//! Provider clients: one (vendor, model) pair with a bounded, cancellable call

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::PanelError;
use crate::llm::provider::LlmProvider;

/// Outcome of a single provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    Success(String),
    Failure(String),
}

impl ProviderResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderResult::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ProviderResult::Success(text) => Some(text),
            ProviderResult::Failure(_) => None,
        }
    }
}

/// A named provider with its call policy. Cloning shares the transport.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(provider: Box<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            provider: Arc::from(provider),
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Call the provider once. Never returns an error: timeouts, cancellation
    /// and transport failures all become `ProviderResult::Failure`.
    pub async fn invoke(&self, prompt: &str, cancel: &CancellationToken) -> ProviderResult {
        let started = std::time::Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PanelError::Cancelled),
            res = tokio::time::timeout(self.timeout, self.provider.generate(prompt)) => {
                match res {
                    Ok(inner) => inner,
                    Err(_) => Err(PanelError::Timeout),
                }
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(text) => {
                tracing::debug!(provider = self.name(), elapsed_ms, "provider answered");
                ProviderResult::Success(text)
            }
            Err(e) => {
                let reason = e.reason();
                tracing::warn!(provider = self.name(), elapsed_ms, %reason, "provider failed");
                ProviderResult::Failure(reason)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted providers shared by the orchestration tests.

    use super::*;
    use crate::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub enum Script {
        Answer(&'static str),
        Fail(&'static str),
        Hang,
    }

    pub struct ScriptedProvider {
        pub name: String,
        pub script: Script,
        pub delay: Duration,
        pub calls: Arc<AtomicUsize>,
        pub prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        pub fn new(name: &str, script: Script) -> Self {
            Self {
                name: name.to_string(),
                script,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            tokio::time::sleep(self.delay).await;
            match self.script {
                Script::Answer(text) => Ok(text.to_string()),
                Script::Fail(msg) => Err(PanelError::Provider {
                    provider: self.name.clone(),
                    message: msg.to_string(),
                }),
                Script::Hang => {
                    futures::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    /// Build a client and keep handles on its call counter and seen prompts.
    pub fn scripted(
        provider: ScriptedProvider,
    ) -> (ProviderClient, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let calls = provider.calls.clone();
        let prompts = provider.prompts.clone();
        (
            ProviderClient::new(Box::new(provider), Duration::from_secs(5)),
            calls,
            prompts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_success_passes_through() {
        let (client, calls, _) = scripted(ScriptedProvider::new("a", Script::Answer("42")));
        let result = client.invoke("q", &CancellationToken::new()).await;

        assert_eq!(result, ProviderResult::Success("42".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_becomes_failure() {
        let (client, _, _) = scripted(ScriptedProvider::new("a", Script::Fail("boom")));
        let result = client.invoke("q", &CancellationToken::new()).await;

        match result {
            ProviderResult::Failure(reason) => assert!(reason.contains("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let client = ProviderClient::new(
            Box::new(ScriptedProvider::new("slow", Script::Hang)),
            Duration::from_secs(2),
        );
        let result = client.invoke("q", &CancellationToken::new()).await;

        assert_eq!(result, ProviderResult::Failure("timeout".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_call_fails_fast() {
        let (client, _, _) = scripted(ScriptedProvider::new("a", Script::Hang));
        let token = CancellationToken::new();
        token.cancel();

        let result = client.invoke("q", &token).await;
        assert_eq!(result, ProviderResult::Failure("cancelled".to_string()));
    }

    #[test]
    fn test_text_accessor() {
        assert_eq!(ProviderResult::Success("x".into()).text(), Some("x"));
        assert_eq!(ProviderResult::Failure("y".into()).text(), None);
        assert!(!ProviderResult::Failure("y".into()).is_success());
    }
}
