use crate::{
    chart::ChartType,
    error::{ExplorerError, TransportError},
    registry::ExplorerDefinition,
};
use serde::Serialize;

/// Details of a failed count/search fetch, kept in the payload slot so the
/// renderer can show a degraded message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadError {
    pub status: Option<u16>,
    /// JSON error body returned by the api, if there was one.
    pub body: Option<serde_json::Value>,
    pub message: String,
}

impl From<&ExplorerError> for PayloadError {
    fn from(err: &ExplorerError) -> Self {
        let (status, body) = match err {
            ExplorerError::Transport(TransportError::UnexpectedStatus { status, body, .. }) => (
                Some(status.as_u16()),
                serde_json::from_str(body).ok(),
            ),
            _ => (None, None),
        };
        Self {
            status,
            body,
            message: err.to_string(),
        }
    }
}

pub type ResultPayload = Result<serde_json::Value, PayloadError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub active_explorer_id: String,
    pub committed_search_param: String,
    pub committed_count_param: String,
    pub pending_search_param: String,
    pub pending_count_param: String,
    /// Captured from the first successful base query after the explorer got
    /// activated. `None` until then.
    pub total_records: Option<u64>,
    pub matching_records: u64,
    pub result_payload: Option<ResultPayload>,
    pub chart_type: ChartType,
    /// Full url of the last committed count query.
    pub query: String,
}

impl ViewState {
    pub fn initial(explorer: &ExplorerDefinition) -> Self {
        Self {
            active_explorer_id: explorer.id.clone(),
            committed_search_param: String::new(),
            committed_count_param: explorer.default_count_field.clone(),
            pending_search_param: String::new(),
            pending_count_param: explorer.default_count_field.clone(),
            total_records: None,
            matching_records: 0,
            result_payload: None,
            chart_type: explorer.default_chart_type,
            query: String::new(),
        }
    }

    /// Sum of `results[].count` of a successful count payload.
    pub fn payload_record_sum(&self) -> Option<u64> {
        let Some(Ok(payload)) = &self.result_payload else {
            return None;
        };
        let results = payload.get("results")?.as_array()?;
        results
            .iter()
            .map(|result| result.get("count").and_then(serde_json::Value::as_u64))
            .sum()
    }

    pub fn is_loaded(&self) -> bool {
        self.result_payload.is_some()
    }
}
