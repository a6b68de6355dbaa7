//! # Configuração via Variáveis de Ambiente
//!
//! | Variável | Padrão |
//! |----------|--------|
//! | `RECALL_BIND_ADDR` | `0.0.0.0:3000` |
//! | `RECALL_DATA_PATH` | `data/recall.json` |
//! | `LLM_API_KEY` | — |
//! | `LLM_API_ENDPOINT` / `LLM_BASE_URL` | `https://api.openai.com/v1` |
//! | `LLM_MODEL` | `gpt-4o-mini` |
//! | `LLM_TIMEOUT` (ms) | `60000` |

use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::llm::{normalize_endpoint, LlmConfig, DEFAULT_API_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_MS};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DATA_PATH: &str = "data/recall.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_path: PathBuf,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Mesma lógica de [`from_env()`](Self::from_env) com uma fonte de
    /// valores arbitrária.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_endpoint = get("LLM_API_ENDPOINT")
            .or_else(|| get("LLM_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        let timeout_ms = get("LLM_TIMEOUT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            bind_addr: get("RECALL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            data_path: get("RECALL_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            llm: LlmConfig {
                api_key: get("LLM_API_KEY"),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_endpoint: normalize_endpoint(&api_endpoint),
                timeout: Duration::from_millis(timeout_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.llm.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RECALL_BIND_ADDR", "127.0.0.1:8080"),
            ("LLM_API_KEY", "  "),
            ("LLM_BASE_URL", "http://localhost:11434"),
            ("LLM_TIMEOUT", "1500"),
        ]);
        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.llm.api_endpoint, "http://localhost:11434/v1");
        assert_eq!(config.llm.timeout, Duration::from_millis(1500));
    }
}
