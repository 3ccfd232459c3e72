use std::path::{Path, PathBuf};

use prodplan_core::ProblemData;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid problem data in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Problem data from a JSON file, or the built-in reference data
pub fn load(path: Option<&Path>) -> Result<ProblemData, ConfigError> {
    let Some(path) = path else {
        debug!("using built-in reference data");
        return Ok(ProblemData::reference());
    };

    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = parse(&source).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        products = data.products.len(),
        resources = data.resources.len(),
        "loaded problem data"
    );
    Ok(data)
}

pub fn parse(source: &str) -> Result<ProblemData, serde_json::Error> {
    serde_json::from_str(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_problem_data() {
        let source = r#"
            {
                "products": [
                    {
                        "id": "widget",
                        "profit_per_unit": 12.5,
                        "consumption": { "labor_hours": 1.5 },
                        "max_demand": 40,
                        "min_production": 5
                    }
                ],
                "resources": [
                    { "name": "labor_hours", "capacity": 100 }
                ]
            }
        "#;

        let data = parse(source).unwrap();

        assert_eq!(data.products[0].id, "widget");
        assert_eq!(data.products[0].rate("labor_hours"), Some(1.5));
        assert_eq!(data.products[0].min_production, 5);
        assert_eq!(data.resources[0].capacity, 100.0);
    }

    #[test]
    fn test_reference_data_round_trips_through_json() {
        let json = serde_json::to_string(&ProblemData::reference()).unwrap();
        assert_eq!(parse(&json).unwrap(), ProblemData::reference());
    }

    #[test]
    fn test_negative_bound_rejected() {
        let source = r#"{ "products": [{ "id": "x", "profit_per_unit": 1, "consumption": {},
            "max_demand": -1, "min_production": 0 }], "resources": [] }"#;
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load(Some(Path::new("/nonexistent/plan.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_default_is_reference() {
        assert_eq!(load(None).unwrap(), ProblemData::reference());
    }
}
