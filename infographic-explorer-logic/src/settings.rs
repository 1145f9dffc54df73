use crate::{
    chart::ChartTypeOverrides,
    clients::openfda::{DEFAULT_API_BASE, DEFAULT_MANIFEST_PATH},
    registry::{ExplorerDefinition, ExplorerRegistry},
    tracing_setup::TracingSettings,
};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{path::Path, time::Duration};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub tracing: TracingSettings,
    #[serde(default)]
    pub api: ApiSettings,
    pub explorers: Vec<ExplorerDefinition>,
    // Count field -> chart type, takes precedence over explorer defaults.
    #[serde(default)]
    pub chart_types: ChartTypeOverrides,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    /// Must end with `/`, dataset paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    #[serde(default)]
    pub http_timeout: Option<Duration>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            manifest_path: default_manifest_path(),
            http_timeout: None,
        }
    }
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::build(File::from(path.as_ref()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Self::build(File::from_str(contents, FileFormat::Toml))
    }

    fn build<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Self = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ExplorerRegistry::new(self.explorers.clone())?;
        if self.api.base_url.cannot_be_a_base() {
            anyhow::bail!("api base url '{}' cannot be a base", self.api.base_url);
        }
        if !self.api.base_url.path().ends_with('/') {
            anyhow::bail!(
                "api base url '{}' must end with '/', otherwise its last path segment is dropped",
                self.api.base_url
            );
        }
        Ok(())
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("default api base is a valid url")
}

fn default_manifest_path() -> String {
    DEFAULT_MANIFEST_PATH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chart::ChartType, registry::DateConstraint};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const EXPLORERS: &str = r#"
        [[explorers]]
        id = "imprint"
        api_path = "drug/imprint"
        default_count_field = "dosage_form.exact"
        default_chart_type = "Bar"

        [[explorers]]
        id = "labels"
        api_path = "drug/label"
        default_count_field = "openfda.route.exact"
        default_chart_type = "Donut"
        date_constraint = { field = "effective_time", start_date = "20190101" }

        [[explorers.filters]]
        search_param = "openfda.route:ORAL"
        label = "Oral"

        [chart_types]
        "effective_time" = "Line"
    "#;

    #[test]
    fn parses_explorers_with_defaults() {
        let settings = Settings::from_toml(EXPLORERS).unwrap();

        assert_eq!(settings.api, ApiSettings::default());
        assert_eq!(settings.api.base_url.as_str(), "https://api.fda.gov/");
        assert_eq!(settings.tracing, TracingSettings::default());
        assert_eq!(settings.explorers.len(), 2);

        let labels = &settings.explorers[1];
        assert_eq!(
            labels.date_constraint,
            Some(DateConstraint {
                field: "effective_time".to_string(),
                start_date: "20190101".to_string(),
            })
        );
        assert_eq!(labels.default_search_param(), "openfda.route:ORAL");
        assert_eq!(labels.default_chart_type, ChartType::Donut);
        assert_eq!(settings.chart_types.get("effective_time"), Some(ChartType::Line));
    }

    #[test]
    fn parses_api_settings() {
        let contents = format!(
            r#"
            [api]
            base_url = "http://localhost:8080/"
            manifest_path = "meta/download.json"
            http_timeout = 5
            {EXPLORERS}
            "#
        );
        let settings = Settings::from_toml(&contents).unwrap();

        assert_eq!(settings.api.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(settings.api.manifest_path, "meta/download.json");
        assert_eq!(settings.api.http_timeout, Some(Duration::from_secs(5)));
    }

    #[rstest]
    #[case("http://localhost:8080/openfda", false)]
    #[case("http://localhost:8080/openfda/", true)]
    #[case("http://localhost:8080", true)]
    fn rejects_base_url_without_trailing_slash(#[case] base_url: &str, #[case] accepted: bool) {
        let contents = format!(
            r#"
            [api]
            base_url = "{base_url}"
            {EXPLORERS}
            "#
        );
        assert_eq!(Settings::from_toml(&contents).is_ok(), accepted);
    }

    #[test]
    fn rejects_settings_without_explorers() {
        assert!(Settings::from_toml("explorers = []").is_err());
        assert!(Settings::from_toml("[api]").is_err());
    }
}
