//! Channel registry.

use crate::channel::ChannelKind;
use crate::engine::CodeVerificationEngine;
use std::collections::HashMap;
use std::sync::Arc;
use vouch_core::{Result, VouchError};

/// Maps each configured channel to its engine.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<ChannelKind, Arc<CodeVerificationEngine>>,
}

impl EngineRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine under its own channel, replacing any previous one.
    pub fn register(&mut self, engine: CodeVerificationEngine) -> &mut Self {
        self.engines.insert(engine.channel(), Arc::new(engine));
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: CodeVerificationEngine) -> Self {
        self.register(engine);
        self
    }

    /// Resolve an engine by channel name as it appears in a URL.
    ///
    /// # Errors
    ///
    /// Returns `UnknownChannel` for unrecognized or unconfigured channels.
    pub fn resolve(&self, name: &str) -> Result<Arc<CodeVerificationEngine>> {
        let channel: ChannelKind = name.parse()?;
        self.get(channel)
            .ok_or_else(|| VouchError::UnknownChannel(name.to_string()))
    }

    #[must_use]
    pub fn get(&self, channel: ChannelKind) -> Option<Arc<CodeVerificationEngine>> {
        self.engines.get(&channel).cloned()
    }

    /// Configured channels in a stable order.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|c| self.engines.contains_key(c))
            .collect()
    }
}
