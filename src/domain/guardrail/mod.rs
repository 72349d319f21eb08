pub mod cache;
pub mod detector;
pub mod engine;
pub mod policy;
pub mod store;

pub use cache::PolicyCache;
pub use detector::{GuardrailVerdict, PiiDetector, PiiMatch, RedactionOutcome};
pub use engine::GuardrailEngine;
pub use policy::{GuardrailAction, GuardrailPolicy, PiiCategory};
pub use store::PolicyStore;
