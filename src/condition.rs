//! Condition algebra
//!
//! A [`Condition`] is a named, pure predicate over an [`Element`]. Leaves wrap plain
//! closures; [`And`](std::ops::BitAnd), [`Or`](std::ops::BitOr) and
//! [`Not`](std::ops::Not) compose them. Composition short-circuits from the left:
//! the right operand of `a & b` only runs when `a` matched, and the right operand of
//! `a | b` only runs when `a` did not. Predicates rely on this to guard reads behind
//! existence checks (`HasName & NameIsWhiteSpace`).
//!
//! ```
//! use a11y_rules::{Condition, ControlType, ElementData, ElementTree};
//!
//! let is_button = Condition::leaf("Button", |e| e.control_type() == ControlType::BUTTON);
//! let named = Condition::leaf("HasName", |e| e.name().is_some());
//! let unnamed_button = is_button & !named;
//!
//! let tree = ElementTree::from_root(ElementData::new(ControlType::BUTTON));
//! assert!(unnamed_button.matches(Some(tree.root())));
//! assert!(!unnamed_button.matches(None));
//! assert_eq!(unnamed_button.to_string(), "(Button & !HasName)");
//! ```

use crate::diagnostics::TimingRecorder;
use crate::element::Element;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;
use std::time::Instant;

type Predicate = dyn for<'a> Fn(Element<'a>) -> bool + Send + Sync;

enum ConditionNode {
    Leaf {
        name: String,
        predicate: Box<Predicate>,
    },
    Constant(bool),
    And(Condition, Condition),
    Or(Condition, Condition),
    Not(Condition),
    Diagnostics {
        inner: Condition,
        label: String,
        recorder: Option<Arc<TimingRecorder>>,
    },
}

/// A composable predicate over a single element
#[derive(Clone)]
pub struct Condition {
    node: Arc<ConditionNode>,
}

impl Condition {
    fn from_node(node: ConditionNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Wrap a pure predicate
    pub fn leaf<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Element<'_>) -> bool + Send + Sync + 'static,
    {
        Self::from_node(ConditionNode::Leaf {
            name: name.into(),
            predicate: Box::new(predicate),
        })
    }

    /// Condition that matches every element
    pub fn always() -> Self {
        Self::from_node(ConditionNode::Constant(true))
    }

    /// Condition that matches no element
    pub fn never() -> Self {
        Self::from_node(ConditionNode::Constant(false))
    }

    /// Both conditions, `other` evaluated only when `self` matched
    pub fn and(self, other: Condition) -> Self {
        Self::from_node(ConditionNode::And(self, other))
    }

    /// Either condition, `other` evaluated only when `self` did not match
    pub fn or(self, other: Condition) -> Self {
        Self::from_node(ConditionNode::Or(self, other))
    }

    /// Time every evaluation and log it under `label`
    pub fn with_diagnostics(self, label: impl Into<String>) -> Self {
        Self::from_node(ConditionNode::Diagnostics {
            inner: self,
            label: label.into(),
            recorder: None,
        })
    }

    /// Time every evaluation, log it and accumulate it in `recorder`
    pub fn with_diagnostics_recorder(
        self,
        label: impl Into<String>,
        recorder: Arc<TimingRecorder>,
    ) -> Self {
        Self::from_node(ConditionNode::Diagnostics {
            inner: self,
            label: label.into(),
            recorder: Some(recorder),
        })
    }

    /// Evaluate against a possibly absent element.
    ///
    /// Absent elements never match. A panicking predicate is not caught here.
    pub fn matches(&self, element: Option<Element<'_>>) -> bool {
        match element {
            Some(element) => self.matches_element(element),
            None => false,
        }
    }

    /// Evaluate against a concrete element
    pub fn matches_element(&self, element: Element<'_>) -> bool {
        match self.node.as_ref() {
            ConditionNode::Leaf { predicate, .. } => predicate(element),
            ConditionNode::Constant(value) => *value,
            ConditionNode::And(left, right) => {
                left.matches_element(element) && right.matches_element(element)
            }
            ConditionNode::Or(left, right) => {
                left.matches_element(element) || right.matches_element(element)
            }
            ConditionNode::Not(inner) => !inner.matches_element(element),
            ConditionNode::Diagnostics {
                inner,
                label,
                recorder,
            } => {
                let start = Instant::now();
                let matched = inner.matches_element(element);
                let elapsed = start.elapsed();

                log::trace!(
                    target: "a11y_rules::diagnostics",
                    "condition '{}' on {} -> {} in {:?}",
                    label,
                    element,
                    matched,
                    elapsed
                );
                if let Some(recorder) = recorder {
                    recorder.record(label, elapsed, matched);
                }

                matched
            }
        }
    }
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        self.and(rhs)
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        self.or(rhs)
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Condition::from_node(ConditionNode::Not(self))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            ConditionNode::Leaf { name, .. } => write!(f, "{}", name),
            ConditionNode::Constant(true) => write!(f, "True"),
            ConditionNode::Constant(false) => write!(f, "False"),
            ConditionNode::And(left, right) => write!(f, "({} & {})", left, right),
            ConditionNode::Or(left, right) => write!(f, "({} | {})", left, right),
            ConditionNode::Not(inner) => write!(f, "!{}", inner),
            ConditionNode::Diagnostics { inner, .. } => write!(f, "{}", inner),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self)
    }
}
