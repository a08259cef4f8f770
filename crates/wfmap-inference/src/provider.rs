//! Backend selection by name (`ORACLE_BACKEND`).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use wfmap_core::{Error, GenerationBackend, Result};

/// Available generation providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OracleProvider {
    #[default]
    Gemini,
    OpenAI,
}

impl OracleProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
        }
    }

    /// Read `ORACLE_BACKEND`, defaulting to Gemini.
    pub fn from_env() -> Result<Self> {
        match std::env::var("ORACLE_BACKEND") {
            Ok(value) if !value.is_empty() => value.parse(),
            _ => Ok(Self::default()),
        }
    }
}

impl fmt::Display for OracleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Config(format!(
                "Unknown oracle backend '{}', expected gemini or openai",
                other
            ))),
        }
    }
}

/// Build the generation backend for `provider` from its environment
/// configuration. Providers compiled out by feature flags are a config error.
pub fn backend_from_env(provider: OracleProvider) -> Result<Arc<dyn GenerationBackend>> {
    match provider {
        #[cfg(feature = "gemini")]
        OracleProvider::Gemini => Ok(Arc::new(crate::gemini::GeminiBackend::from_env()?)),
        #[cfg(feature = "openai")]
        OracleProvider::OpenAI => Ok(Arc::new(crate::openai::OpenAIBackend::from_env()?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::Config(format!(
            "Oracle backend '{}' is not enabled in this build",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!("gemini".parse::<OracleProvider>().unwrap(), OracleProvider::Gemini);
        assert_eq!("OpenAI".parse::<OracleProvider>().unwrap(), OracleProvider::OpenAI);
        assert!(matches!("claude".parse::<OracleProvider>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_display_round_trips() {
        for provider in [OracleProvider::Gemini, OracleProvider::OpenAI] {
            assert_eq!(provider.to_string().parse::<OracleProvider>().unwrap(), provider);
        }
    }
}
