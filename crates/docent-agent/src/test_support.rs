use crate::backends::{CompletionRequest, LlmBackend};
use crate::llm::LlmClient;
use async_trait::async_trait;
use docent_core::{DocentError, DocentResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A backend that returns a sequence of results and records every request.
pub(crate) struct ScriptedBackend {
    results: tokio::sync::Mutex<Vec<DocentResult<String>>>,
    requests: tokio::sync::Mutex<Vec<CompletionRequest>>,
    call_count: AtomicU32,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub(crate) fn new(results: Vec<DocentResult<String>>) -> Self {
        Self {
            results: tokio::sync::Mutex::new(results),
            requests: tokio::sync::Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
            delay: None,
        }
    }

    pub(crate) fn replies<const N: usize>(texts: [&str; N]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }

    pub(crate) fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub(crate) async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> DocentResult<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut results = self.results.lock().await;
        if results.is_empty() {
            Err(DocentError::Completion("ScriptedBackend: no more results".into()))
        } else {
            results.remove(0)
        }
    }
}

pub(crate) fn client(backend: Arc<ScriptedBackend>) -> Arc<LlmClient> {
    Arc::new(LlmClient::from_backend(backend, Duration::from_secs(5)))
}
