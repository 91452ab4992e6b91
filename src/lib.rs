//! a11y-rules - Accessibility rule evaluation engine
//!
//! Checks a snapshot of a UI element hierarchy against structural and
//! property-based accessibility rules, and rolls the per-element verdicts up the
//! tree into status counts.
//!
//! # Architecture
//!
//! ```text
//! ElementTree -> Scanner -> RuleRegistry -> Rule -> Condition -> Element
//! ```
//!
//! Leaf predicates and the navigation helpers feed conditions, conditions feed
//! rules, the registry selects the rules that apply to an element, and the scanner
//! evaluates them over the whole tree in post-order.
//!
//! # Example
//!
//! ```
//! use a11y_rules::{ControlType, ElementData, ElementTree, EvaluationCode, Scanner};
//!
//! let tree = ElementTree::from_root(
//!     ElementData::new(ControlType::SCROLL_BAR)
//!         .with_child(ElementData::new(ControlType::BUTTON))
//!         .with_child(ElementData::new(ControlType::THUMB))
//!         .with_child(ElementData::new(ControlType::BUTTON)),
//! );
//!
//! let report = Scanner::with_builtin_rules().scan(&tree);
//! assert!(report.completed);
//! assert_eq!(
//!     report.results.code(tree.root().id(), "ScrollBarStructure"),
//!     Some(EvaluationCode::Pass)
//! );
//! ```

pub mod condition;
pub mod conditions;
pub mod config;
pub mod diagnostics;
pub mod element;
pub mod geometry;
pub mod navigation;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod scan;

// Re-export main types
pub use condition::Condition;
pub use conditions::ChildCount;
pub use config::{Config, ConfigError};
pub use diagnostics::{Timing, TimingRecorder, TimingTable};
pub use element::{
    Capability, ControlType, Element, ElementData, ElementId, ElementTree, Framework,
    PropertyId, PropertyValue, TreeError,
};
pub use geometry::Rect;
pub use navigation::{
    element_completely_obscures, find_ancestor_of_type, find_container_element,
    find_scrollable_ancestor,
};
pub use registry::{Applicability, RegistryError, RuleRegistry};
pub use rule::{EvaluationCode, EvaluationPolicy, Rule, RuleError, RuleInfo, Standard};
pub use scan::{CancellationToken, RuleResult, ScanReport, ScanResult, Scanner, StatusCounts};
