//! Plan - Collection of Effects
//!
//! A Plan is an ordered list of Effects to be executed.
//! No side effects occur until the Plan is applied.

use crate::effect::Effect;
use crate::resource::ResourceId;

/// Plan containing Effects to be executed
#[derive(Debug, Clone, Default)]
pub struct Plan {
    effects: Vec<Effect>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Number of mutating Effects
    pub fn mutation_count(&self) -> usize {
        self.effects.iter().filter(|e| e.is_mutating()).count()
    }

    /// Last Effect recorded for a resource
    pub fn find(&self, id: &ResourceId) -> Option<&Effect> {
        self.effects.iter().rev().find(|e| e.id() == id)
    }

    /// Generate a summary of the Plan for display
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for effect in &self.effects {
            match effect {
                Effect::Read(_) => summary.read += 1,
                Effect::Create(_) => summary.create += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub read: usize,
    pub create: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Plan: {} to create, {} to read",
            self.create, self.read
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, Value};

    #[test]
    fn empty_plan() {
        let plan = Plan::new();
        assert!(plan.is_empty());
        assert_eq!(plan.mutation_count(), 0);
    }

    #[test]
    fn plan_summary() {
        let mut plan = Plan::new();
        plan.add(Effect::Create(Resource::new("core.subnet", "a")));
        plan.add(Effect::Create(Resource::new("core.subnet", "b")));
        plan.add(Effect::Read(
            Resource::new("objectstorage.namespace", "ns").with_read_only(true),
        ));

        let summary = plan.summary();
        assert_eq!(summary.create, 2);
        assert_eq!(summary.read, 1);
        assert_eq!(plan.mutation_count(), 2);
        assert_eq!(summary.to_string(), "Plan: 2 to create, 1 to read");
    }

    #[test]
    fn find_returns_latest_effect_for_id() {
        let mut plan = Plan::new();
        plan.add(Effect::Create(
            Resource::new("core.security_list", "web").with_attribute("v", Value::Int(1)),
        ));
        plan.add(Effect::Create(
            Resource::new("core.security_list", "web").with_attribute("v", Value::Int(2)),
        ));

        let id = ResourceId::new("core.security_list", "web");
        let found = plan.find(&id).unwrap();
        assert_eq!(found.resource().get("v"), Some(&Value::Int(2)));
    }
}
