//! The three dependent stages behind every query:
//! manifest fetch, search derivation, then the joined total/count fetch.

use crate::{
    chart::{ChartType, ChartTypeOverrides},
    clients::openfda::{DatasetQuery, OpenFdaApi},
    error::ExplorerError,
    filter,
    registry::ExplorerDefinition,
    view_state::PayloadError,
};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub matching_records: u64,
    pub payload: serde_json::Value,
    pub chart_type: ChartType,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    Completed(QueryResult),
    /// The dual fetch failed. Only the payload slot gets updated with it.
    Degraded(PayloadError),
}

/// Runs all stages for one explorer. Errors returned from here happened
/// before the dual fetch and must not touch the view state.
#[instrument(skip_all, level = "info", fields(explorer = %explorer.id, search = search_text, count = count_param), err)]
pub async fn run<A: OpenFdaApi + ?Sized>(
    api: &A,
    chart_types: &ChartTypeOverrides,
    explorer: &ExplorerDefinition,
    search_text: &str,
    count_param: &str,
) -> Result<PipelineOutput, ExplorerError> {
    let manifest = api.download_manifest().await?;

    let search = match &explorer.date_constraint {
        Some(constraint) => {
            let last_updated = manifest.meta.last_updated.as_deref().ok_or_else(|| {
                ExplorerError::MalformedResponse(
                    "download manifest has no `meta.last_updated`".to_string(),
                )
            })?;
            filter::derive_search(Some(constraint), last_updated, search_text)
        }
        None => filter::search_clause(None, search_text),
    };
    tracing::debug!(%search, "derived search clause");

    let base_query = DatasetQuery::base(&explorer.api_path, &search);
    let count_query = base_query.clone().with_count(count_param);
    let query = api.query_url(&count_query)?.to_string();

    let dual_fetch = futures::future::try_join(
        api.matching_total(&base_query),
        api.count(&count_query),
    )
    .await;

    match dual_fetch {
        Ok((matching_records, payload)) => Ok(PipelineOutput::Completed(QueryResult {
            matching_records,
            payload,
            chart_type: chart_types.resolve(count_param, explorer.default_chart_type),
            query,
        })),
        Err(err) => {
            tracing::warn!(error = %err, %query, "count query failed");
            Ok(PipelineOutput::Degraded(PayloadError::from(&err)))
        }
    }
}
