//! Dataset descriptors: which properties carry ids, names, population and
//! unit-type codes for one boundary source.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Property mapping for one boundary dataset.
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Property key holding the feature's stable identifier.
    pub id_property: String,

    /// Property key holding the canonical name.
    pub name_property: String,

    /// Ordered preference list for a display name; the first property with a
    /// non-empty value wins.
    #[serde(default)]
    pub applicable_name_properties: Vec<String>,

    /// Property key holding a population count, if the dataset carries one.
    #[serde(default)]
    pub population_property: Option<String>,

    /// Property key holding a unit-type classification code.
    #[serde(default)]
    pub unit_type_property: Option<String>,

    /// Code → human-readable unit type label.
    #[serde(default)]
    pub unit_type_labels: HashMap<String, String>,
}

impl DatasetConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read dataset config file")?;
        let config: DatasetConfig =
            toml::from_str(&content).context("Failed to parse dataset config file")?;
        Ok(config)
    }

    /// Reduced config for callers that only need id/name resolution.
    pub fn minimal(id_property: &str, name_property: &str) -> Self {
        Self {
            id_property: id_property.to_string(),
            name_property: name_property.to_string(),
            applicable_name_properties: vec![name_property.to_string()],
            population_property: None,
            unit_type_property: None,
            unit_type_labels: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            id_property = "GEO_ID"
            name_property = "NAME"
            applicable_name_properties = ["NAMELSAD", "NAME"]
            population_property = "POP"
            unit_type_property = "LSAD"

            [unit_type_labels]
            "06" = "County"
            "25" = "City"
        "#;

        let config: DatasetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.id_property, "GEO_ID");
        assert_eq!(config.applicable_name_properties.len(), 2);
        assert_eq!(config.unit_type_labels.get("06").unwrap(), "County");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
            id_property = "id"
            name_property = "name"
        "#;

        let config: DatasetConfig = toml::from_str(toml_str).unwrap();
        assert!(config.applicable_name_properties.is_empty());
        assert!(config.population_property.is_none());
        assert!(config.unit_type_labels.is_empty());
    }
}
