//! Node configuration checks
//!
//! - `params.cache_time` positive and finite
//! - at least one sink
//! - sink names non-empty and unique
//! - sink `queue_capacity` at least 1
//!
//! `params.rate` is not checked here.

use std::collections::HashSet;

use contracts::{ContractError, NodeConfig};

/// Returns the first violation found
pub fn validate(config: &NodeConfig) -> Result<(), ContractError> {
    validate_cache_time(config)?;
    validate_sinks_present(config)?;
    validate_sink_names(config)?;
    validate_queue_capacities(config)?;
    Ok(())
}

fn validate_cache_time(config: &NodeConfig) -> Result<(), ContractError> {
    let cache_time = config.params.cache_time;
    if !cache_time.is_finite() || cache_time <= 0.0 {
        return Err(ContractError::config_validation(
            "params.cache_time",
            format!("cache_time must be > 0, got {cache_time}"),
        ));
    }
    Ok(())
}

fn validate_sinks_present(config: &NodeConfig) -> Result<(), ContractError> {
    if config.sinks.is_empty() {
        return Err(ContractError::config_validation(
            "sinks",
            "at least one sink is required",
        ));
    }
    Ok(())
}

fn validate_sink_names(config: &NodeConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_queue_capacities(config: &NodeConfig) -> Result<(), ContractError> {
    for sink in &config.sinks {
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be >= 1",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkConfig, SinkType};

    fn config_with_sinks(names: &[&str]) -> NodeConfig {
        NodeConfig {
            sinks: names
                .iter()
                .map(|name| SinkConfig {
                    name: name.to_string(),
                    sink_type: SinkType::Log,
                    queue_capacity: 4,
                    params: Default::default(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&NodeConfig::default()).is_ok());
    }

    #[test]
    fn test_rate_is_not_validated() {
        let mut config = NodeConfig::default();
        config.params.rate = -1.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_cache_time() {
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let mut config = NodeConfig::default();
            config.params.cache_time = bad;
            let err = validate(&config).unwrap_err().to_string();
            assert!(err.contains("cache_time must be > 0"), "got: {err}");
        }
    }

    #[test]
    fn test_empty_sink_list() {
        let err = validate(&config_with_sinks(&[])).unwrap_err().to_string();
        assert!(err.contains("at least one sink"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let err = validate(&config_with_sinks(&["ok", " "]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("sinks[1].name"), "got: {err}");
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_duplicate_sink_name() {
        let err = validate(&config_with_sinks(&["out", "log", "out"]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = config_with_sinks(&["out"]);
        config.sinks[0].queue_capacity = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("queue_capacity must be >= 1"), "got: {err}");
    }
}
