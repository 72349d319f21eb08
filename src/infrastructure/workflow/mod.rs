pub mod actions;
pub mod executor_impl;

pub use actions::{ActionHandler, ActionRegistry, RecordOnlyAction};
pub use executor_impl::GraphExecutor;
