//! Model Catalog
//!
//! Model descriptors served by the catalog endpoint, including the
//! parameter bounds the client uses to seed and clamp generation options.

use crate::api::chat::GenerateOptions;
use serde::{Deserialize, Serialize};

/// One model descriptor from the catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Stable key used in chat requests
    pub key: String,

    /// Human-readable name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Context window in tokens
    pub context_window: u32,

    pub max_tokens_default: u32,
    pub max_tokens_max: u32,

    pub temperature_min: f32,
    pub temperature_max: f32,
    pub temperature_default: f32,

    pub top_p_min: f32,
    pub top_p_max: f32,
    pub top_p_default: f32,

    pub top_k_min: u32,
    pub top_k_max: u32,
    pub top_k_default: u32,
}

impl ModelDescriptor {
    /// Generation options seeded from this model's defaults
    pub fn default_options(&self) -> GenerateOptions {
        GenerateOptions::new()
            .with_max_tokens(self.max_tokens_default)
            .with_temperature(self.temperature_default)
            .with_top_p(self.top_p_default)
            .with_top_k(self.top_k_default)
    }

    /// Clamp options into this model's bounds
    pub fn clamp(&self, options: &mut GenerateOptions) {
        if let Some(max_tokens) = options.max_tokens {
            options.max_tokens = Some(max_tokens.min(self.max_tokens_max).max(1));
        }
        if let Some(temperature) = options.temperature {
            options.temperature =
                Some(temperature.clamp(self.temperature_min, self.temperature_max));
        }
        if let Some(top_p) = options.top_p {
            options.top_p = Some(top_p.clamp(self.top_p_min, self.top_p_max));
        }
        if let Some(top_k) = options.top_k {
            options.top_k = Some(top_k.clamp(self.top_k_min, self.top_k_max));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ModelDescriptor {
        serde_json::from_str(
            r#"{
                "key": "llama3.2",
                "name": "Llama 3.2",
                "description": "Small general-purpose model",
                "contextWindow": 8192,
                "maxTokensDefault": 512,
                "maxTokensMax": 4096,
                "temperatureMin": 0.0,
                "temperatureMax": 2.0,
                "temperatureDefault": 0.8,
                "topPMin": 0.1,
                "topPMax": 1.0,
                "topPDefault": 0.9,
                "topKMin": 1,
                "topKMax": 100,
                "topKDefault": 40
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_deserialize_camel_case_wire_form() {
        let model = descriptor();
        assert_eq!(model.key, "llama3.2");
        assert_eq!(model.context_window, 8192);
        assert_eq!(model.max_tokens_max, 4096);
        assert_eq!(model.top_k_default, 40);
    }

    #[test]
    fn test_default_options_follow_descriptor() {
        let options = descriptor().default_options();
        assert_eq!(options.max_tokens, Some(512));
        assert_eq!(options.temperature, Some(0.8));
        assert_eq!(options.top_p, Some(0.9));
        assert_eq!(options.top_k, Some(40));
    }

    #[test]
    fn test_clamp_pulls_values_into_bounds() {
        let model = descriptor();
        let mut options = GenerateOptions::new()
            .with_max_tokens(100_000)
            .with_temperature(5.0)
            .with_top_p(0.0)
            .with_top_k(500);

        model.clamp(&mut options);

        assert_eq!(options.max_tokens, Some(4096));
        assert_eq!(options.temperature, Some(2.0));
        assert_eq!(options.top_p, Some(0.1));
        assert_eq!(options.top_k, Some(100));
    }

    #[test]
    fn test_clamp_leaves_unset_options_alone() {
        let mut options = GenerateOptions::new().with_temperature(0.5);
        descriptor().clamp(&mut options);
        assert_eq!(options.temperature, Some(0.5));
        assert_eq!(options.max_tokens, None);
    }
}
