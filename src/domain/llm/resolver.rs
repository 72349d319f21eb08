//! Model alias resolution

use std::collections::HashMap;

/// Maps caller-facing model aliases to backend model ids.
///
/// Unknown names pass through unchanged so callers can address backend
/// models directly.
#[derive(Debug, Clone, Default)]
pub struct ModelResolver {
    aliases: HashMap<String, String>,
}

impl ModelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver preloaded with the stock alias table.
    pub fn with_default_aliases() -> Self {
        let mut resolver = Self::new();
        resolver.register("fast", "gpt-4o-mini");
        resolver.register("balanced", "gpt-4o");
        resolver.register("reasoning", "claude-3-5-sonnet-20241022");
        resolver
    }

    pub fn register(&mut self, alias: impl Into<String>, model_id: impl Into<String>) {
        self.aliases.insert(alias.into(), model_id.into());
    }

    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}
