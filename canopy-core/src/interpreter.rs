//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order,
//! collecting the results. This is where side effects actually occur.
//! References between resources are resolved just before each Effect runs,
//! from the states of the Effects that already succeeded.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resource::{Resource, State, Value};

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

/// Result of executing the entire Plan
#[derive(Debug, Default)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
    /// binding -> attributes of every resource known after the apply
    bindings: HashMap<String, HashMap<String, Value>>,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Resolve references in a value against the applied states
    pub fn resolve(&self, value: &Value) -> Value {
        resolve_ref_value(value, &self.bindings)
    }

    /// Resolve stack outputs; outputs whose resources were not created stay unresolved
    pub fn resolve_outputs(&self, outputs: &[(String, Value)]) -> Vec<(String, Value)> {
        outputs
            .iter()
            .map(|(k, v)| (k.clone(), self.resolve(v)))
            .collect()
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan) -> ApplyResult {
        let mut result = ApplyResult::default();
        info!(
            "Applying {} effects with provider '{}'",
            plan.len(),
            self.provider.name()
        );

        for effect in plan.effects() {
            let outcome = self.execute_effect(effect, &result.bindings).await;

            match &outcome {
                Ok(EffectOutcome::Created { state } | EffectOutcome::Read { state }) => {
                    result.success_count += 1;
                    result
                        .bindings
                        .insert(effect.resource().binding(), state.referenceable_attributes());
                }
                Ok(EffectOutcome::Skipped { .. }) => result.success_count += 1,
                Err(e) => {
                    warn!("{} failed: {}", effect, e);
                    result.failure_count += 1;
                    if !self.config.continue_on_error {
                        result.outcomes.push(outcome);
                        break;
                    }
                }
            }

            result.outcomes.push(outcome);
        }

        result
    }

    /// Execute a single Effect
    async fn execute_effect(
        &self,
        effect: &Effect,
        bindings: &HashMap<String, HashMap<String, Value>>,
    ) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        let resource = resolve_resource(effect.resource(), bindings)?;
        debug!("{}", effect);

        match effect {
            Effect::Read(_) => {
                let state = self.provider.read(&resource).await?;
                if !state.exists {
                    return Err(ProviderError::new("data source returned no result")
                        .for_resource(resource.id.clone()));
                }
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(_) => {
                let state = self.provider.create(&resource).await?;
                Ok(EffectOutcome::Created { state })
            }
        }
    }
}

/// Replace every reference in a resource with the referenced value.
/// Fails if a reference points at a resource that has not been applied.
fn resolve_resource(
    resource: &Resource,
    bindings: &HashMap<String, HashMap<String, Value>>,
) -> ProviderResult<Resource> {
    let mut resolved = resource.clone();
    for (key, value) in &resource.attributes {
        let value = resolve_ref_value(value, bindings);
        if value.is_unresolved() {
            return Err(ProviderError::new(format!(
                "attribute '{}' references a resource that was not created: {}",
                key, value
            ))
            .for_resource(resource.id.clone()));
        }
        resolved.attributes.insert(key.clone(), value);
    }
    Ok(resolved)
}

fn resolve_ref_value(value: &Value, bindings: &HashMap<String, HashMap<String, Value>>) -> Value {
    match value {
        Value::ResourceRef(binding, attr) => {
            if let Some(attr_value) = bindings.get(binding).and_then(|attrs| attrs.get(attr)) {
                // Recursively resolve
                return resolve_ref_value(attr_value, bindings);
            }
            // Keep as-is if not found
            value.clone()
        }
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|v| resolve_ref_value(v, bindings))
                .collect(),
        ),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_ref_value(v, bindings)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
