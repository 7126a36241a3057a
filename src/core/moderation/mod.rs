// Core moderation module - the content moderation workflow engine.
// Models, ports (storage and classifier), and the services built on them.

pub mod action_ledger;
pub mod classifier;
pub mod content_state;
pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_store;
pub mod pipeline;
pub mod report_coordinator;

pub use action_ledger::ModerationLedger;
pub use classifier::{ClassifierError, ClassifierVerdict, ContentClassifier};
pub use content_state::Transition;
pub use moderation_models::*;
pub use moderation_service::ModerationService;
pub use moderation_store::{ModerationError, ModerationStore};
pub use pipeline::ModerationPipeline;
pub use report_coordinator::ReportCoordinator;
