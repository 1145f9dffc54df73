use super::{Endpoint, HttpApiClient, HttpApiClientConfig};
use crate::error::ExplorerError;
use async_trait::async_trait;
use reqwest::Method;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.fda.gov/";
pub const DEFAULT_MANIFEST_PATH: &str = "download.json";

/// A query against a single openFDA dataset.
///
/// `search` is the output of [`crate::filter::derive_search`]: either empty or
/// a `search=...&` clause, so `count=` is appended directly after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetQuery {
    pub api_path: String,
    pub search: String,
    pub count: Option<String>,
}

impl DatasetQuery {
    pub fn base(api_path: &str, search: &str) -> Self {
        Self {
            api_path: api_path.to_string(),
            search: search.to_string(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: &str) -> Self {
        self.count = Some(count.to_string());
        self
    }
}

/// The three remote calls the fetch pipeline depends on.
#[async_trait]
pub trait OpenFdaApi: Send + Sync {
    async fn download_manifest(&self) -> Result<manifest::DownloadManifest, ExplorerError>;

    /// `meta.results.total` of the query.
    async fn matching_total(&self, query: &DatasetQuery) -> Result<u64, ExplorerError>;

    async fn count(&self, query: &DatasetQuery) -> Result<serde_json::Value, ExplorerError>;

    /// Full url of the query, as shown to the user.
    fn query_url(&self, query: &DatasetQuery) -> Result<Url, ExplorerError>;
}

#[derive(Clone)]
pub struct OpenFdaClient {
    client: HttpApiClient,
    manifest_path: String,
}

impl OpenFdaClient {
    pub fn new(
        api_base: Url,
        manifest_path: impl Into<String>,
        config: HttpApiClientConfig,
    ) -> Result<Self, ExplorerError> {
        Ok(Self {
            client: HttpApiClient::new(api_base, config)?,
            manifest_path: manifest_path.into(),
        })
    }
}

#[async_trait]
impl OpenFdaApi for OpenFdaClient {
    async fn download_manifest(&self) -> Result<manifest::DownloadManifest, ExplorerError> {
        self.client
            .request(&manifest::GetDownloadManifest {
                path: self.manifest_path.clone(),
            })
            .await
    }

    async fn matching_total(&self, query: &DatasetQuery) -> Result<u64, ExplorerError> {
        let response = self
            .client
            .request(&dataset::QueryTotal { query })
            .await?;
        Ok(response.meta.results.total)
    }

    async fn count(&self, query: &DatasetQuery) -> Result<serde_json::Value, ExplorerError> {
        self.client.request(&dataset::QueryPayload { query }).await
    }

    fn query_url(&self, query: &DatasetQuery) -> Result<Url, ExplorerError> {
        self.client.url(&dataset::QueryPayload { query })
    }
}

pub mod manifest {
    use super::*;
    use serde::Deserialize;

    pub struct GetDownloadManifest {
        pub path: String,
    }

    impl Endpoint for GetDownloadManifest {
        type Response = DownloadManifest;

        fn method(&self) -> Method {
            Method::GET
        }

        fn path(&self) -> String {
            self.path.clone()
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DownloadManifest {
        pub meta: ManifestMeta,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ManifestMeta {
        #[serde(default)]
        pub last_updated: Option<String>,
    }
}

pub mod dataset {
    use super::*;
    use serde::Deserialize;

    fn dataset_path(api_path: &str) -> String {
        format!("{}.json", api_path.trim_start_matches('/'))
    }

    fn dataset_query(query: &DatasetQuery) -> String {
        match &query.count {
            Some(count) => format!("{}count={count}", query.search),
            None => query.search.clone(),
        }
    }

    pub struct QueryTotal<'a> {
        pub query: &'a DatasetQuery,
    }

    impl Endpoint for QueryTotal<'_> {
        type Response = TotalResponse;

        fn method(&self) -> Method {
            Method::GET
        }

        fn path(&self) -> String {
            dataset_path(&self.query.api_path)
        }

        fn query(&self) -> Option<String> {
            Some(dataset_query(self.query))
        }
    }

    pub struct QueryPayload<'a> {
        pub query: &'a DatasetQuery,
    }

    impl Endpoint for QueryPayload<'_> {
        type Response = serde_json::Value;

        fn method(&self) -> Method {
            Method::GET
        }

        fn path(&self) -> String {
            dataset_path(&self.query.api_path)
        }

        fn query(&self) -> Option<String> {
            Some(dataset_query(self.query))
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct TotalResponse {
        pub meta: TotalMeta,
    }

    #[derive(Debug, Deserialize)]
    pub struct TotalMeta {
        pub results: TotalResults,
    }

    #[derive(Debug, Deserialize)]
    pub struct TotalResults {
        pub total: u64,
    }
}
