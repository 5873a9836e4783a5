//! Completion provider clients and selection.

mod http;

pub mod autocomplete;
pub mod sweep;
pub mod zeta;

use anyhow::Result;
use tabstage_core::protocol::{Provider, ProviderConfig, ProviderType};

/// Build a provider client for the configured backend.
pub fn new_provider(
    provider_type: ProviderType,
    config: &ProviderConfig,
) -> Result<Box<dyn Provider>> {
    match provider_type {
        ProviderType::Zeta => Ok(Box::new(zeta::ZetaProvider::new(config)?)),
        ProviderType::AutoComplete => {
            Ok(Box::new(autocomplete::AutoCompleteProvider::new(config)?))
        }
        ProviderType::Sweep => Ok(Box::new(sweep::SweepProvider::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            endpoint: "http://localhost:9000/v1/complete".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_factory_builds_every_provider_type() {
        for provider_type in [
            ProviderType::Zeta,
            ProviderType::AutoComplete,
            ProviderType::Sweep,
        ] {
            assert!(new_provider(provider_type, &config()).is_ok());
        }
    }

    #[test]
    fn test_unknown_provider_name_is_rejected_at_parse_time() {
        let err = "llamatab".parse::<ProviderType>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported provider type: llamatab");
    }
}
