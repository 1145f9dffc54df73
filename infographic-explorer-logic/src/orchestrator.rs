use crate::{
    chart::ChartTypeOverrides,
    clients::{
        HttpApiClientConfig,
        openfda::{OpenFdaApi, OpenFdaClient},
    },
    error::ExplorerError,
    keys::{Key, KeyAction},
    pipeline::{self, PipelineOutput},
    registry::{ExplorerDefinition, ExplorerRegistry},
    settings::Settings,
    view_state::{PayloadError, ViewState},
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A full query result was installed into the view state.
    Committed,
    /// The dual fetch failed; its details were installed into the payload slot.
    Degraded(PayloadError),
    /// A newer run was dispatched before this one finished; its result was dropped.
    Superseded,
    /// The orchestrator was disposed.
    Cancelled,
}

/// Parameters of a dispatched run, captured under the state lock.
#[derive(Debug)]
struct PendingRun {
    id: u64,
    explorer_id: String,
    search: String,
    count: String,
}

/// Owns the view state of one infographic widget and keeps it in sync with
/// user interactions.
///
/// The state is published through a `tokio` `watch` channel: renderers
/// [`subscribe`](Self::subscribe) and redraw on change. Every fetch is tagged
/// with a run id when dispatched, and only the latest dispatched run may
/// install its result, so overlapping runs can finish in any order.
pub struct QueryOrchestrator<A = OpenFdaClient> {
    registry: ExplorerRegistry,
    chart_types: ChartTypeOverrides,
    api: A,
    state: watch::Sender<ViewState>,
    latest_run: AtomicU64,
    shutdown: CancellationToken,
}

impl QueryOrchestrator<OpenFdaClient> {
    pub fn from_settings(settings: Settings) -> Result<Self, ExplorerError> {
        let registry = ExplorerRegistry::new(settings.explorers)?;
        let config = HttpApiClientConfig {
            http_timeout: settings.api.http_timeout,
            ..Default::default()
        };
        let api = OpenFdaClient::new(settings.api.base_url, settings.api.manifest_path, config)?;
        Ok(Self::new(registry, settings.chart_types, api))
    }
}

impl<A: OpenFdaApi> QueryOrchestrator<A> {
    pub fn new(registry: ExplorerRegistry, chart_types: ChartTypeOverrides, api: A) -> Self {
        let (state, _) = watch::channel(ViewState::initial(registry.first()));
        Self {
            registry,
            chart_types,
            api,
            state,
            latest_run: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &ExplorerRegistry {
        &self.registry
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn active_explorer(&self) -> &ExplorerDefinition {
        let id = self.state.borrow().active_explorer_id.clone();
        self.registry
            .get(&id)
            .unwrap_or_else(|_| self.registry.first())
    }

    /// Initial fetch of the first explorer, without any search.
    pub async fn mount(&self) -> Result<RunOutcome, ExplorerError> {
        let count = self.state.borrow().pending_count_param.clone();
        self.run_query(String::new(), count).await
    }

    pub fn on_search_text_change(&self, text: impl Into<String>) {
        let text = text.into();
        self.state
            .send_modify(|state| state.pending_search_param = text);
    }

    pub fn on_count_field_change(&self, field: impl Into<String>) {
        let field = field.into();
        self.state
            .send_modify(|state| state.pending_count_param = field);
    }

    pub async fn on_count_field_commit(
        &self,
        field: impl Into<String>,
    ) -> Result<RunOutcome, ExplorerError> {
        let field = field.into();
        self.dispatch(|state| state.pending_count_param = field)
            .await
    }

    /// Maps a keystroke of the search or count input. Callers follow a
    /// `commit` action with [`Self::on_enter_key`].
    pub fn on_key_press(&self, key: Key) -> KeyAction {
        KeyAction::from(key)
    }

    /// Commits whatever is currently staged.
    pub async fn on_enter_key(&self) -> Result<RunOutcome, ExplorerError> {
        self.dispatch(|_| {}).await
    }

    /// A preset filter of the active explorer was picked.
    pub async fn on_filter_select(
        &self,
        search_param: impl Into<String>,
    ) -> Result<RunOutcome, ExplorerError> {
        let search_param = search_param.into();
        self.dispatch(|state| state.pending_search_param = search_param)
            .await
    }

    /// Switches to another explorer and fetches its defaults.
    ///
    /// Returns `None` without touching the state when `explorer_id` is empty
    /// or unknown.
    pub async fn on_tab_select(
        &self,
        explorer_id: &str,
    ) -> Option<Result<RunOutcome, ExplorerError>> {
        if explorer_id.is_empty() {
            return None;
        }
        let explorer = match self.registry.get(explorer_id) {
            Ok(explorer) => explorer,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring tab selection");
                return None;
            }
        };
        let outcome = self
            .dispatch(|state| {
                state.active_explorer_id = explorer.id.clone();
                state.pending_search_param = explorer.default_search_param().to_string();
                state.pending_count_param = explorer.default_count_field.clone();
                state.total_records = None;
            })
            .await;
        Some(outcome)
    }

    pub async fn run_query(
        &self,
        search_param: impl Into<String>,
        count_param: impl Into<String>,
    ) -> Result<RunOutcome, ExplorerError> {
        let search_param = search_param.into();
        let count_param = count_param.into();
        self.dispatch(|state| {
            state.pending_search_param = search_param;
            state.pending_count_param = count_param;
        })
        .await
    }

    /// Cancels every in-flight run. Runs dispatched afterwards return
    /// [`RunOutcome::Cancelled`] without touching the state.
    pub fn dispose(&self) {
        self.shutdown.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Applies `prepare` and assigns the next run id in one state update, then
    /// runs the pipeline with the resulting pending parameters.
    async fn dispatch(
        &self,
        prepare: impl FnOnce(&mut ViewState),
    ) -> Result<RunOutcome, ExplorerError> {
        if self.is_disposed() {
            return Ok(RunOutcome::Cancelled);
        }

        let mut run = PendingRun {
            id: 0,
            explorer_id: String::new(),
            search: String::new(),
            count: String::new(),
        };
        self.state.send_modify(|state| {
            prepare(state);
            run.id = self.latest_run.fetch_add(1, Ordering::SeqCst) + 1;
            run.explorer_id = state.active_explorer_id.clone();
            run.search = state.pending_search_param.clone();
            run.count = state.pending_count_param.clone();
        });

        let explorer = self.registry.get(&run.explorer_id)?;
        let output = tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::debug!(run_id = run.id, "run cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            output = pipeline::run(&self.api, &self.chart_types, explorer, &run.search, &run.count) => output?,
        };

        Ok(self.commit(&run, output))
    }

    fn commit(&self, run: &PendingRun, output: PipelineOutput) -> RunOutcome {
        let mut outcome = RunOutcome::Superseded;
        self.state.send_if_modified(|state| {
            if self.latest_run.load(Ordering::SeqCst) != run.id {
                return false;
            }
            match output {
                PipelineOutput::Completed(result) => {
                    *state = ViewState {
                        committed_search_param: run.search.clone(),
                        committed_count_param: run.count.clone(),
                        total_records: state.total_records.or(Some(result.matching_records)),
                        matching_records: result.matching_records,
                        result_payload: Some(Ok(result.payload)),
                        chart_type: result.chart_type,
                        query: result.query,
                        ..state.clone()
                    };
                    outcome = RunOutcome::Committed;
                }
                PipelineOutput::Degraded(payload_error) => {
                    state.result_payload = Some(Err(payload_error.clone()));
                    outcome = RunOutcome::Degraded(payload_error);
                }
            }
            true
        });

        if outcome == RunOutcome::Superseded {
            tracing::debug!(run_id = run.id, "dropping result of a superseded run");
        }
        outcome
    }
}
