// Moderation pipeline - drives one submission to a terminal automated outcome.
//
// Attempts are sequential and capped by `ModerationConfig::attempt_budget`.
// The first successful verdict ends the loop. If every attempt fails the
// outcome is the fail-safe FLAGGED, carrying the last failure message.

use super::classifier::{ClassifierError, ClassifierVerdict, ContentClassifier};
use super::moderation_models::{AutomatedOutcome, ModerationConfig};
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub struct ModerationPipeline<C: ContentClassifier> {
    classifier: C,
    config: ModerationConfig,
}

impl<C: ContentClassifier> ModerationPipeline<C> {
    pub fn new(classifier: C, config: ModerationConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Classify `text`, retrying transient failures.
    ///
    /// Never fails: classifier trouble is absorbed into the outcome.
    pub async fn run(&self, text: &str) -> AutomatedOutcome {
        let budget = self.config.attempt_budget();
        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < budget {
            attempts += 1;

            match self.classify_once(text).await {
                Ok(verdict) => {
                    tracing::debug!(attempt = attempts, safe = verdict.safe, "Classifier verdict");
                    return AutomatedOutcome::classified(
                        attempts,
                        verdict.safe,
                        verdict.reason,
                        last_error,
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        attempt = attempts,
                        max_attempts = budget,
                        error = %err,
                        "Classifier attempt failed"
                    );
                    last_error = err.to_string();

                    if attempts < budget {
                        self.pause_before_retry().await;
                    }
                }
            }
        }

        tracing::warn!(
            attempts,
            error = %last_error,
            "Classifier gave up, routing content to human review"
        );
        AutomatedOutcome::gave_up(attempts, last_error)
    }

    /// One bounded call. A timeout counts as a transient failure.
    async fn classify_once(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        let limit = self.config.classifier_timeout;
        match timeout(limit, self.classifier.classify(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(limit)),
        }
    }

    async fn pause_before_retry(&self) {
        let delay = self.retry_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    fn retry_delay(&self) -> Duration {
        let base = self.config.retry_delay;
        if base.is_zero() || !self.config.retry_jitter {
            return base;
        }
        let factor = rand::thread_rng().gen_range(0.7..1.3);
        base.mul_f64(factor)
    }
}
