pub mod invocation;
pub mod message;
pub mod pricing;
pub mod resolver;

pub use invocation::{ModelConfig, ModelInvocationResult, ModelInvoker};
pub use message::{Message, MessageRole};
pub use pricing::{ModelRates, RateTable};
pub use resolver::ModelResolver;
