use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    Line,
    Bar,
    Donut,
    Pie,
}

/// Chart types pinned to specific count fields. Fields missing from the
/// table fall back to the active explorer's default chart type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartTypeOverrides {
    by_field: HashMap<String, ChartType>,
}

impl ChartTypeOverrides {
    pub fn new(by_field: HashMap<String, ChartType>) -> Self {
        Self { by_field }
    }

    pub fn get(&self, count_field: &str) -> Option<ChartType> {
        self.by_field.get(count_field).copied()
    }

    pub fn resolve(&self, count_field: &str, explorer_default: ChartType) -> ChartType {
        self.get(count_field).unwrap_or(explorer_default)
    }
}

impl FromIterator<(String, ChartType)> for ChartTypeOverrides {
    fn from_iter<T: IntoIterator<Item = (String, ChartType)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn overrides() -> ChartTypeOverrides {
        ChartTypeOverrides::from_iter([
            ("effective_time".to_string(), ChartType::Line),
            ("openfda.route.exact".to_string(), ChartType::Pie),
        ])
    }

    #[rstest]
    #[case("effective_time", ChartType::Bar, ChartType::Line)]
    #[case("openfda.route.exact", ChartType::Bar, ChartType::Pie)]
    #[case("dosage_form.exact", ChartType::Bar, ChartType::Bar)]
    #[case("dosage_form.exact", ChartType::Donut, ChartType::Donut)]
    fn field_override_takes_precedence(
        #[case] field: &str,
        #[case] explorer_default: ChartType,
        #[case] expected: ChartType,
    ) {
        assert_eq!(overrides().resolve(field, explorer_default), expected);
    }

    #[test]
    fn deserializes_from_plain_map() {
        let overrides: ChartTypeOverrides =
            serde_json::from_value(serde_json::json!({ "effective_time": "Line" })).unwrap();
        assert_eq!(overrides.get("effective_time"), Some(ChartType::Line));
        assert_eq!(overrides.get("unknown"), None);
    }
}
