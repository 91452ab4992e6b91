//! Rule definition and evaluation

use crate::condition::Condition;
use crate::element::{Element, Framework, PropertyId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Verdict of one rule on one element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationCode {
    /// The element conforms
    Pass,
    /// Genuine accessibility defect
    Fail,
    /// Needs manual review
    Note,
    /// Rule does not apply to this element or platform
    Unsupported,
    /// The rule itself malfunctioned
    Error,
}

impl EvaluationCode {
    pub const ALL: [EvaluationCode; 5] = [
        EvaluationCode::Pass,
        EvaluationCode::Fail,
        EvaluationCode::Note,
        EvaluationCode::Unsupported,
        EvaluationCode::Error,
    ];

    /// Reporting priority; the highest code of an element decides its status
    pub fn priority(&self) -> u8 {
        match self {
            EvaluationCode::Unsupported => 0,
            EvaluationCode::Pass => 1,
            EvaluationCode::Note => 2,
            EvaluationCode::Fail => 3,
            EvaluationCode::Error => 4,
        }
    }
}

impl fmt::Display for EvaluationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationCode::Pass => write!(f, "pass"),
            EvaluationCode::Fail => write!(f, "fail"),
            EvaluationCode::Note => write!(f, "note"),
            EvaluationCode::Unsupported => write!(f, "unsupported"),
            EvaluationCode::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for EvaluationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(EvaluationCode::Pass),
            "fail" => Ok(EvaluationCode::Fail),
            "note" | "needsreview" | "needs-review" => Ok(EvaluationCode::Note),
            "unsupported" => Ok(EvaluationCode::Unsupported),
            "error" => Ok(EvaluationCode::Error),
            _ => Err(format!("Unknown evaluation code: {}", s)),
        }
    }
}

/// Accessibility standard a rule enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Standard {
    /// WCAG 1.1.1 Non-text Content
    NonTextContent,
    /// WCAG 1.3.1 Info and Relationships
    InfoAndRelationships,
    /// WCAG 2.1.1 Keyboard
    Keyboard,
    /// WCAG 2.4.7 Focus Visible
    FocusVisible,
    /// WCAG 4.1.2 Name, Role, Value
    NameRoleValue,
}

impl Standard {
    /// Short cross-reference, e.g. "WCAG 1.3.1"
    pub fn reference(&self) -> &'static str {
        match self {
            Standard::NonTextContent => "WCAG 1.1.1",
            Standard::InfoAndRelationships => "WCAG 1.3.1",
            Standard::Keyboard => "WCAG 2.1.1",
            Standard::FocusVisible => "WCAG 2.4.7",
            Standard::NameRoleValue => "WCAG 4.1.2",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Standard::NonTextContent => "Non-text Content",
            Standard::InfoAndRelationships => "Info and Relationships",
            Standard::Keyboard => "Keyboard",
            Standard::FocusVisible => "Focus Visible",
            Standard::NameRoleValue => "Name, Role, Value",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.reference(), self.title())
    }
}

/// Error raised while evaluating a rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Invalid argument: {0}")]
    ArgumentInvalid(String),

    #[error("Rule '{rule_id}' failed: {message}")]
    EvaluationFault { rule_id: String, message: String },
}

type PolicyFn =
    dyn for<'a> Fn(Element<'a>, bool) -> Result<EvaluationCode, RuleError> + Send + Sync;

/// Maps a condition match to a verdict
#[derive(Clone)]
pub enum EvaluationPolicy {
    /// `Pass` on match; `otherwise` (usually `Note` for structure, `Fail` for properties)
    PassOnMatch { otherwise: EvaluationCode },
    /// `Fail` on match, the condition describes the defect
    FailOnMatch { otherwise: EvaluationCode },
    /// Arbitrary mapping from the element and whether the condition matched
    Custom(Arc<PolicyFn>),
}

impl EvaluationPolicy {
    pub fn custom<F>(policy: F) -> Self
    where
        F: Fn(Element<'_>, bool) -> Result<EvaluationCode, RuleError> + Send + Sync + 'static,
    {
        EvaluationPolicy::Custom(Arc::new(policy))
    }

    fn apply(&self, element: Element<'_>, matched: bool) -> Result<EvaluationCode, RuleError> {
        match self {
            EvaluationPolicy::PassOnMatch { otherwise } => Ok(if matched {
                EvaluationCode::Pass
            } else {
                *otherwise
            }),
            EvaluationPolicy::FailOnMatch { otherwise } => Ok(if matched {
                EvaluationCode::Fail
            } else {
                *otherwise
            }),
            EvaluationPolicy::Custom(policy) => policy(element, matched),
        }
    }
}

impl fmt::Debug for EvaluationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationPolicy::PassOnMatch { otherwise } => {
                write!(f, "PassOnMatch {{ otherwise: {:?} }}", otherwise)
            }
            EvaluationPolicy::FailOnMatch { otherwise } => {
                write!(f, "FailOnMatch {{ otherwise: {:?} }}", otherwise)
            }
            EvaluationPolicy::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Serializable rule metadata for reporters and remediation lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub how_to_fix: Option<String>,
    pub standard: Standard,
    #[serde(default)]
    pub property_id: Option<PropertyId>,
    /// Rendered condition expression
    pub condition: String,
}

/// An accessibility check: a condition plus a policy, with metadata
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique rule identifier (e.g., "NameNotWhiteSpace")
    pub id: String,

    /// What the rule checks
    pub description: String,

    /// Remediation text
    pub how_to_fix: Option<String>,

    /// Standard this rule enforces
    pub standard: Standard,

    /// Property the rule inspects, if any
    pub property_id: Option<PropertyId>,

    /// Tags for categorization
    pub tags: Vec<String>,

    /// Frameworks the rule is not meaningful for
    pub excluded_frameworks: Vec<Framework>,

    condition: Condition,
    policy: EvaluationPolicy,
}

impl Rule {
    /// Create a new rule with minimal required fields
    pub fn new(
        id: &str,
        description: &str,
        condition: Condition,
        policy: EvaluationPolicy,
    ) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            how_to_fix: None,
            standard: Standard::NameRoleValue,
            property_id: None,
            tags: Vec::new(),
            excluded_frameworks: Vec::new(),
            condition,
            policy,
        }
    }

    /// Structural rule: `Pass` when the condition holds, `Note` otherwise
    pub fn structural(id: &str, description: &str, condition: Condition) -> Self {
        Self::new(
            id,
            description,
            condition,
            EvaluationPolicy::PassOnMatch {
                otherwise: EvaluationCode::Note,
            },
        )
        .with_standard(Standard::InfoAndRelationships)
    }

    /// Property rule: `Pass` when the condition holds, `Fail` otherwise
    pub fn property(id: &str, description: &str, condition: Condition) -> Self {
        Self::new(
            id,
            description,
            condition,
            EvaluationPolicy::PassOnMatch {
                otherwise: EvaluationCode::Fail,
            },
        )
    }

    /// Set the remediation text
    pub fn with_how_to_fix(mut self, how_to_fix: &str) -> Self {
        self.how_to_fix = Some(how_to_fix.to_string());
        self
    }

    /// Set the standard reference
    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    /// Set the inspected property
    pub fn with_property(mut self, property_id: PropertyId) -> Self {
        self.property_id = Some(property_id);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Report `Unsupported` for elements rendered by `framework`
    pub fn excluding_framework(mut self, framework: Framework) -> Self {
        self.excluded_frameworks.push(framework);
        self
    }

    /// Check if rule carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The condition this rule was built from
    pub fn create_condition(&self) -> Condition {
        self.condition.clone()
    }

    pub fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    /// Evaluate the rule on one element.
    ///
    /// An absent element is a caller error. Panics raised by the condition's
    /// predicates are not caught here; the scanner contains them.
    pub fn evaluate(&self, element: Option<Element<'_>>) -> Result<EvaluationCode, RuleError> {
        let element = element.ok_or_else(|| {
            RuleError::ArgumentInvalid(format!("rule '{}' evaluated without an element", self.id))
        })?;

        if !self.excluded_frameworks.is_empty()
            && self.excluded_frameworks.contains(&element.framework())
        {
            return Ok(EvaluationCode::Unsupported);
        }

        let matched = self.condition.matches_element(element);
        self.policy.apply(element, matched)
    }

    /// Metadata snapshot
    pub fn info(&self) -> RuleInfo {
        RuleInfo {
            id: self.id.clone(),
            description: self.description.clone(),
            how_to_fix: self.how_to_fix.clone(),
            standard: self.standard,
            property_id: self.property_id,
            condition: self.condition.to_string(),
        }
    }
}
