use std::sync::Arc;

use subtle::ConstantTimeEq;
use tokenrelay_scheduler::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    access_key: Arc<str>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, access_key: &str) -> Self {
        Self {
            orchestrator,
            access_key: Arc::from(access_key),
        }
    }

    /// Constant-time comparison against the configured key. An unset key matches
    /// nothing.
    pub fn access_key_matches(&self, candidate: &str) -> bool {
        !self.access_key.is_empty()
            && bool::from(candidate.as_bytes().ct_eq(self.access_key.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenrelay_flow::{FlowSettings, ScriptedFactory};
    use tokenrelay_registry::TaskRegistry;

    fn state(key: &str) -> AppState {
        let orchestrator = Orchestrator::new(
            Arc::new(TaskRegistry::new()),
            Arc::new(ScriptedFactory::token("t")),
            FlowSettings::default(),
        );
        AppState::new(Arc::new(orchestrator), key)
    }

    #[test]
    fn key_must_match_exactly() {
        let state = state("senvas");
        assert!(state.access_key_matches("senvas"));
        assert!(!state.access_key_matches("senva"));
        assert!(!state.access_key_matches("SENVAS"));
        assert!(!state.access_key_matches(""));
    }

    #[test]
    fn empty_configured_key_rejects_everything() {
        assert!(!state("").access_key_matches(""));
    }
}
