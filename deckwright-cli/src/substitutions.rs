use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Substitution file values. Numbers and booleans are accepted and written
/// out the way they appear in the file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Parse a flat `name: value` map. `.json` files are read as JSON, anything
/// else as YAML.
pub fn parse_substitutions(content: &str, json: bool) -> Result<HashMap<String, String>> {
    let raw: BTreeMap<String, Scalar> = if json {
        serde_json::from_str(content).map_err(|e| anyhow!("invalid substitution JSON: {}", e))?
    } else {
        serde_yaml::from_str(content).map_err(|e| anyhow!("invalid substitution YAML: {}", e))?
    };
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name.trim().to_string(), value.into_string()))
        .collect())
}

pub fn load_substitutions(path: &str) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read substitutions {}: {}", path, e))?;
    let json = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    parse_substitutions(&content, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_become_strings() {
        let subs = parse_substitutions(
            r#"{"client_name": "Jane Doe", "balance": "$1,000", "year": 2024, "active": true}"#,
            true,
        )
        .unwrap();
        assert_eq!(subs["client_name"], "Jane Doe");
        assert_eq!(subs["balance"], "$1,000");
        assert_eq!(subs["year"], "2024");
        assert_eq!(subs["active"], "true");
    }

    #[test]
    fn yaml_map_is_accepted() {
        let subs = parse_substitutions("client_name: Jane Doe\nrate: 4.5\n", false).unwrap();
        assert_eq!(subs["client_name"], "Jane Doe");
        assert_eq!(subs["rate"], "4.5");
    }

    #[test]
    fn nested_values_are_rejected() {
        assert!(parse_substitutions(r#"{"client": {"name": "x"}}"#, true).is_err());
    }
}
