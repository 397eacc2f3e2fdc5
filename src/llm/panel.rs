//! LLM Panel - routes a query to the fast path or the full fan-out + judge pipeline

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, Credentials};
use crate::error::{PanelError, Result};
use crate::llm::client::{ProviderClient, ProviderResult};
use crate::llm::fanout::run_parallel;
use crate::llm::judge::{synthesize, JudgeOutcome};
use crate::llm::provider::create_provider;
use crate::progress::ProgressObserver;
use crate::router::{classify, QueryKind};

/// One panel member's answer, tagged for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledResult {
    pub provider: String,
    pub model: String,
    pub result: ProviderResult,
}

/// Everything the full pipeline produced for one query.
///
/// `results` has exactly one entry per panel member, in panel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub results: Vec<LabeledResult>,
    pub judge_provider: String,
    pub judge_model: String,
    pub judge: JudgeOutcome,
}

/// What one request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelResponse {
    /// A simple query answered by the fast-path provider alone
    FastPath(LabeledResult),
    /// The panel answered and the judge concluded
    Full(PipelineOutcome),
}

/// A fixed set of providers plus the judge and fast-path designations
pub struct Panel {
    members: Vec<ProviderClient>,
    judge: ProviderClient,
    fast_path: ProviderClient,
    judge_instructions: String,
    always_full: bool,
}

impl Panel {
    /// Build every client named by the panel config. Credentials must already
    /// be resolved; a missing one is an error here, not at request time.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self> {
        config.validate()?;

        let build = |name: &str| -> Result<ProviderClient> {
            let provider_config = config
                .providers
                .get(name)
                .ok_or_else(|| PanelError::Config(format!("unknown provider '{}'", name)))?;
            let timeout = Duration::from_secs(provider_config.timeout_secs);
            let provider = create_provider(name, provider_config.clone(), credentials.get(name))?;
            Ok(ProviderClient::new(provider, timeout))
        };

        let members = config
            .panel
            .members
            .iter()
            .map(|name| build(name.as_str()))
            .collect::<Result<Vec<_>>>()?;

        // Reuse member clients where the judge or fast path is also a member
        let find_or_build = |name: &str| -> Result<ProviderClient> {
            match members.iter().find(|m| m.name() == name) {
                Some(client) => Ok(client.clone()),
                None => build(name),
            }
        };
        let judge = find_or_build(config.panel.judge.as_str())?;
        let fast_path = find_or_build(config.panel.fast_path.as_str())?;

        tracing::info!(
            members = ?config.panel.members,
            judge = %config.panel.judge,
            fast_path = %config.panel.fast_path,
            "panel ready"
        );

        Ok(Self::from_clients(
            members,
            judge,
            fast_path,
            config.panel.judge_instructions.clone(),
        ))
    }

    pub fn from_clients(
        members: Vec<ProviderClient>,
        judge: ProviderClient,
        fast_path: ProviderClient,
        judge_instructions: String,
    ) -> Self {
        Self {
            members,
            judge,
            fast_path,
            judge_instructions,
            always_full: false,
        }
    }

    /// Skip the fast path and always consult the whole panel
    pub fn always_full(mut self, always_full: bool) -> Self {
        self.always_full = always_full;
        self
    }

    pub fn members(&self) -> &[ProviderClient] {
        &self.members
    }

    pub fn judge(&self) -> &ProviderClient {
        &self.judge
    }

    /// Answer one query, choosing the route by its classification
    pub async fn process(
        &self,
        query: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> PanelResponse {
        let kind = if self.always_full {
            QueryKind::Complex
        } else {
            classify(query)
        };
        tracing::debug!(?kind, "query classified");

        let response = match kind {
            QueryKind::Simple => PanelResponse::FastPath(self.fast(query, cancel, progress).await),
            QueryKind::Complex => PanelResponse::Full(self.full(query, cancel, progress).await),
        };

        progress.finished();
        response
    }

    async fn fast(
        &self,
        query: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> LabeledResult {
        progress.started(&[self.fast_path.name()]);
        let result = self.fast_path.invoke(query, cancel).await;
        progress.provider_finished(0, self.fast_path.name(), result.is_success());

        LabeledResult {
            provider: self.fast_path.name().to_string(),
            model: self.fast_path.model().to_string(),
            result,
        }
    }

    /// Fan out to every member, then have the judge synthesize
    pub async fn full(
        &self,
        query: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> PipelineOutcome {
        let raw = run_parallel(query, &self.members, cancel, progress).await;

        if raw.iter().any(ProviderResult::is_success) {
            progress.judging(self.judge.name());
        }
        let judge = synthesize(query, &raw, &self.judge, &self.judge_instructions, cancel).await;

        let results = self
            .members
            .iter()
            .zip(raw)
            .map(|(client, result)| LabeledResult {
                provider: client.name().to_string(),
                model: client.model().to_string(),
                result,
            })
            .collect();

        PipelineOutcome {
            results,
            judge_provider: self.judge.name().to_string(),
            judge_model: self.judge.model().to_string(),
            judge,
        }
    }
}
