//! Rule registry: which rules apply to which elements

use crate::condition::Condition;
use crate::element::{Capability, ControlType, Element};
use crate::rule::Rule;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate rule id: {0}")]
    DuplicateRuleId(String),
}

/// Selects the elements a rule runs on
#[derive(Clone, Default)]
pub struct Applicability {
    /// Control types the rule applies to (empty = any)
    pub control_types: Vec<ControlType>,
    /// Capabilities the element must expose
    pub capabilities: Vec<Capability>,
    /// Extra condition the element must satisfy
    pub condition: Option<Condition>,
}

impl Applicability {
    /// Applies to every element
    pub fn any() -> Self {
        Self::default()
    }

    /// Applies to the given control types
    pub fn control_types(types: &[ControlType]) -> Self {
        Self {
            control_types: types.to_vec(),
            ..Self::default()
        }
    }

    /// Additionally require a capability
    pub fn requires(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Additionally require a condition
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing & condition,
            None => condition,
        });
        self
    }

    pub fn matches(&self, element: Element<'_>) -> bool {
        if !self.control_types.is_empty() && !self.control_types.contains(&element.control_type())
        {
            return false;
        }

        if !self.capabilities.iter().all(|c| element.supports(*c)) {
            return false;
        }

        match &self.condition {
            Some(condition) => condition.matches_element(element),
            None => true,
        }
    }
}

impl fmt::Debug for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Applicability")
            .field("control_types", &self.control_types)
            .field("capabilities", &self.capabilities)
            .field("condition", &self.condition.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

/// One row of the registry table
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub applicability: Applicability,
    pub rule: Arc<Rule>,
}

/// Immutable table of rules, in registration order
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<RegistryEntry>,
}

static GLOBAL_REGISTRY: Lazy<RuleRegistry> = Lazy::new(|| {
    let mut builder = RuleRegistry::builder();
    for (applicability, rule) in crate::rules::builtin_rules() {
        builder = builder.register(applicability, rule);
    }
    let registry = builder.build().expect("built-in rule ids are unique");
    log::debug!("Built-in rule registry ready with {} rules", registry.len());
    registry
});

impl RuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Process-wide registry holding the built-in rules
    pub fn global() -> &'static RuleRegistry {
        &GLOBAL_REGISTRY
    }

    /// Rules applicable to an element, in registration order
    pub fn rules_for(&self, element: Element<'_>) -> Vec<&Rule> {
        self.rules_for_where(element, |_| true)
    }

    /// Rules applicable to an element that also pass `enabled`, in registration
    /// order. Rules rejected by `enabled` never have their applicability checked.
    pub fn rules_for_where<F>(&self, element: Element<'_>, enabled: F) -> Vec<&Rule>
    where
        F: Fn(&Rule) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| enabled(entry.rule.as_ref()) && entry.applicability.matches(element))
            .map(|entry| entry.rule.as_ref())
            .collect()
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.entries
            .iter()
            .find(|entry| entry.rule.id == id)
            .map(|entry| entry.rule.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects registry rows before freezing them
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistryEntry>,
}

impl RegistryBuilder {
    /// Append a rule
    pub fn register(mut self, applicability: Applicability, rule: Rule) -> Self {
        self.entries.push(RegistryEntry {
            applicability,
            rule: Arc::new(rule),
        });
        self
    }

    /// Freeze the table, rejecting duplicate ids
    pub fn build(self) -> Result<RuleRegistry, RegistryError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.rule.id.as_str()) {
                return Err(RegistryError::DuplicateRuleId(entry.rule.id.clone()));
            }
        }

        Ok(RuleRegistry {
            entries: self.entries,
        })
    }
}
