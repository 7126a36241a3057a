// Classifier gateway port - the opaque external text-safety service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A successful answer from the classifier. Unsafe content is still a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub safe: bool,
    #[serde(default)]
    pub reason: String,
}

impl ClassifierVerdict {
    pub fn safe(reason: impl Into<String>) -> Self {
        Self {
            safe: true,
            reason: reason.into(),
        }
    }

    pub fn unsafe_content(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: reason.into(),
        }
    }
}

/// Classifier trouble. All of it is transient: it costs one attempt and is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// Network, quota, HTTP status, or unparseable response.
    #[error("classifier request failed: {0}")]
    Transient(String),

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Judge one piece of text. Never errors on unsafe content.
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError>;
}

// Lets the service hold a classifier chosen at runtime.
#[async_trait]
impl ContentClassifier for Box<dyn ContentClassifier> {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        (**self).classify(text).await
    }
}
