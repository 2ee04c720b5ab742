//! AI energy advisor: prompt, remote call, and response formatting.
//!
//! The advisor is the only asynchronous collaborator. At most one request is
//! in flight per [`Advisor`]; a missing credential fails before any network
//! traffic; transport and service errors are logged in full and surfaced to
//! the user as a generic message.

pub mod format;
pub mod gemini;
pub mod prompt;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::AdvisorConfig;

pub use format::{AdvisoryLine, format_advisory};
pub use gemini::{GeminiClient, GenerateError, TextGenerator};
pub use prompt::{AdvisoryRequest, build_prompt};

/// Advisor failure.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// The credential environment variable is unset or empty. No call was made.
    #[error("advisor credential {env_var} is not set")]
    MissingCredential { env_var: String },

    /// Another request from this advisor has not finished yet.
    #[error("an advisory request is already in flight")]
    Busy,

    #[error("advisory request failed: {0}")]
    Request(#[from] GenerateError),
}

impl AdvisorError {
    /// Inline text shown in the advisor panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential { env_var } => {
                format!("API key is not configured. Set the {env_var} environment variable.")
            }
            Self::Busy => "An analysis is already in progress.".to_string(),
            Self::Request(_) => {
                "Failed to get analysis from the AI advisor. Please try again.".to_string()
            }
        }
    }
}

/// Advisory text plus its display lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub text: String,
    pub lines: Vec<AdvisoryLine>,
}

impl Advisory {
    pub fn new(text: String) -> Self {
        let lines = format_advisory(&text);
        Self { text, lines }
    }
}

/// Resets the in-flight flag when the request ends, including on cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight advisory requester.
pub struct Advisor {
    generator: Option<Arc<dyn TextGenerator>>,
    api_key_env: String,
    site_name: String,
    in_flight: AtomicBool,
}

impl Advisor {
    /// Builds an advisor from config, reading the credential from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] if the HTTP client cannot be built.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, GenerateError> {
        let key = std::env::var(&config.api_key_env).ok();
        Self::from_key(config, key)
    }

    /// Like [`from_config`](Self::from_config) with an explicit credential.
    /// `None` or an empty key yields an unconfigured advisor.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] if the HTTP client cannot be built.
    pub fn from_key(config: &AdvisorConfig, key: Option<String>) -> Result<Self, GenerateError> {
        let generator: Option<Arc<dyn TextGenerator>> = match key.filter(|k| !k.trim().is_empty())
        {
            Some(key) => Some(Arc::new(GeminiClient::new(
                config.endpoint.clone(),
                config.model.clone(),
                key,
                Duration::from_secs(config.timeout_secs),
            )?)),
            None => {
                info!(env_var = %config.api_key_env, "advisor credential not set; advisory requests will be refused");
                None
            }
        };
        Ok(Self {
            generator,
            api_key_env: config.api_key_env.clone(),
            site_name: config.site_name.clone(),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Advisor backed by an arbitrary generator.
    pub fn with_generator(generator: Arc<dyn TextGenerator>, site_name: impl Into<String>) -> Self {
        Self {
            generator: Some(generator),
            api_key_env: AdvisorConfig::default().api_key_env,
            site_name: site_name.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns `true` when a credential is available.
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Returns `true` while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Requests an advisory for the given snapshot.
    ///
    /// # Errors
    ///
    /// - [`AdvisorError::MissingCredential`] without touching the network.
    /// - [`AdvisorError::Busy`] when another request is in flight.
    /// - [`AdvisorError::Request`] when the service call fails.
    pub async fn analyze(&self, request: &AdvisoryRequest) -> Result<Advisory, AdvisorError> {
        let Some(generator) = &self.generator else {
            warn!(building = %request.building, env_var = %self.api_key_env, "advisory refused: credential missing");
            return Err(AdvisorError::MissingCredential {
                env_var: self.api_key_env.clone(),
            });
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AdvisorError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let prompt = build_prompt(&self.site_name, request);
        info!(building = %request.building, imbalance = request.load_imbalance_pct, "requesting advisory");

        match generator.generate(&prompt).await {
            Ok(text) => Ok(Advisory::new(text.unwrap_or_default())),
            Err(err) => {
                error!(building = %request.building, error = %err, "advisory request failed");
                Err(AdvisorError::Request(err))
            }
        }
    }
}
