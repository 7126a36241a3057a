pub mod gemini_classifier;

pub use gemini_classifier::GeminiClassifier;
