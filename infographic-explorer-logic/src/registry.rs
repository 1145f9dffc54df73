use crate::{chart::ChartType, error::ExplorerError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterOption {
    pub search_param: String,
    pub label: String,
}

/// Restricts every query of an explorer to records between `start_date`
/// and the dataset's last update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateConstraint {
    pub field: String,
    pub start_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplorerDefinition {
    pub id: String,
    pub api_path: String,
    pub default_count_field: String,
    #[serde(default)]
    pub date_constraint: Option<DateConstraint>,
    #[serde(default)]
    pub filters: Vec<FilterOption>,
    pub default_chart_type: ChartType,
}

impl ExplorerDefinition {
    /// Search param the explorer starts with when it gets selected.
    pub fn default_search_param(&self) -> &str {
        self.filters
            .first()
            .map(|filter| filter.search_param.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ExplorerRegistry {
    explorers: Vec<ExplorerDefinition>,
    positions: HashMap<String, usize>,
}

impl ExplorerRegistry {
    pub fn new(
        definitions: impl IntoIterator<Item = ExplorerDefinition>,
    ) -> Result<Self, ExplorerError> {
        let mut explorers: Vec<ExplorerDefinition> = Vec::new();
        let mut positions = HashMap::new();

        for definition in definitions {
            validate(&definition)?;
            match positions.get(&definition.id) {
                Some(&position) => {
                    tracing::warn!(
                        explorer = %definition.id,
                        "duplicate explorer id, the later definition replaces the earlier one"
                    );
                    explorers[position] = definition;
                }
                None => {
                    positions.insert(definition.id.clone(), explorers.len());
                    explorers.push(definition);
                }
            }
        }

        if explorers.is_empty() {
            return Err(ExplorerError::InvalidConfig(
                "at least one explorer must be configured".to_string(),
            ));
        }

        Ok(Self {
            explorers,
            positions,
        })
    }

    pub fn get(&self, id: &str) -> Result<&ExplorerDefinition, ExplorerError> {
        self.positions
            .get(id)
            .map(|&position| &self.explorers[position])
            .ok_or_else(|| ExplorerError::UnknownExplorer(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn all(&self) -> &[ExplorerDefinition] {
        &self.explorers
    }

    pub fn first(&self) -> &ExplorerDefinition {
        // non-emptiness is checked on construction
        &self.explorers[0]
    }

    pub fn first_id(&self) -> &str {
        &self.first().id
    }
}

fn validate(definition: &ExplorerDefinition) -> Result<(), ExplorerError> {
    if definition.id.is_empty() {
        return Err(ExplorerError::InvalidConfig(
            "explorer id must not be empty".to_string(),
        ));
    }
    if let Some(constraint) = &definition.date_constraint {
        if constraint.field.is_empty() || constraint.start_date.is_empty() {
            return Err(ExplorerError::InvalidConfig(format!(
                "explorer '{}': date constraint requires both a field and a start date",
                definition.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn explorer(id: &str, api_path: &str) -> ExplorerDefinition {
        ExplorerDefinition {
            id: id.to_string(),
            api_path: api_path.to_string(),
            default_count_field: "dosage_form.exact".to_string(),
            date_constraint: None,
            filters: vec![],
            default_chart_type: ChartType::Bar,
        }
    }

    #[test]
    fn keeps_configuration_order() {
        let registry = ExplorerRegistry::new([
            explorer("imprint", "drug/imprint"),
            explorer("labels", "drug/label"),
            explorer("events", "drug/event"),
        ])
        .unwrap();

        let ids: Vec<_> = registry.all().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["imprint", "labels", "events"]);
        assert_eq!(registry.first_id(), "imprint");
        assert_eq!(registry.get("labels").unwrap().api_path, "drug/label");
        assert!(registry.contains("events"));
    }

    #[test]
    fn duplicate_ids_collapse_to_last_definition() {
        let registry = ExplorerRegistry::new([
            explorer("imprint", "drug/imprint"),
            explorer("labels", "drug/label"),
            explorer("imprint", "drug/imprint-v2"),
        ])
        .unwrap();

        assert_eq!(registry.all().len(), 2);
        assert_eq!(registry.first_id(), "imprint");
        assert_eq!(registry.get("imprint").unwrap().api_path, "drug/imprint-v2");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = ExplorerRegistry::new([explorer("imprint", "drug/imprint")]).unwrap();
        let err = registry.get("missing").unwrap_err();
        assert!(matches!(err, ExplorerError::UnknownExplorer(id) if id == "missing"));
        assert!(!registry.contains(""));
    }

    #[test]
    fn rejects_empty_configuration() {
        let err = ExplorerRegistry::new(Vec::<ExplorerDefinition>::new()).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_incomplete_date_constraint() {
        let mut definition = explorer("labels", "drug/label");
        definition.date_constraint = Some(DateConstraint {
            field: "effective_time".to_string(),
            start_date: String::new(),
        });
        let err = ExplorerRegistry::new([definition]).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidConfig(_)));
    }

    #[test]
    fn default_search_param_comes_from_first_filter() {
        let mut definition = explorer("labels", "drug/label");
        assert_eq!(definition.default_search_param(), "");

        definition.filters = vec![
            FilterOption {
                search_param: "openfda.route:ORAL".to_string(),
                label: "Oral".to_string(),
            },
            FilterOption {
                search_param: "openfda.route:TOPICAL".to_string(),
                label: "Topical".to_string(),
            },
        ];
        assert_eq!(definition.default_search_param(), "openfda.route:ORAL");
    }
}
