//! Library of leaf predicates and condition builders
//!
//! Every function returns a named [`Condition`], so composed rule conditions print
//! as readable expressions (`(ScrollBar & ChildCount(Thumb) <= 1)`).

use crate::condition::Condition;
use crate::element::{Capability, ControlType, Element, Framework, PropertyId, PropertyValue};
use crate::geometry::Rect;
use crate::navigation::{find_container_element, find_scrollable_ancestor};
use once_cell::sync::Lazy;
use regex::Regex;

/// Private use areas of the basic multilingual plane and planes 15-16
static PRIVATE_UNICODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{E000}-\x{F8FF}\x{F0000}-\x{FFFFD}\x{100000}-\x{10FFFD}]").unwrap()
});

pub fn control_type(control_type: ControlType) -> Condition {
    Condition::leaf(control_type.to_string(), move |e| {
        e.control_type() == control_type
    })
}

/// Any of the given control types
pub fn control_type_in(types: &[ControlType]) -> Condition {
    let types = types.to_vec();
    let label = types
        .iter()
        .map(ControlType::to_string)
        .collect::<Vec<_>>()
        .join("|");
    Condition::leaf(format!("ControlType({})", label), move |e| {
        types.contains(&e.control_type())
    })
}

pub fn has_property(id: PropertyId) -> Condition {
    Condition::leaf(format!("HasProperty({})", id), move |e| e.has_property(id))
}

pub fn property_equals(id: PropertyId, value: PropertyValue) -> Condition {
    Condition::leaf(format!("Property({}) == {}", id, value), move |e| {
        e.property(id) == Some(&value)
    })
}

/// Boolean property present and equal to `value`
pub fn bool_property(id: PropertyId, value: bool) -> Condition {
    Condition::leaf(format!("Property({}) == {}", id, value), move |e| {
        e.bool_property(id) == Some(value)
    })
}

/// Text property present and matching `pattern`
pub fn string_property_matches(id: PropertyId, pattern: Regex) -> Condition {
    Condition::leaf(format!("Property({}) =~ /{}/", id, pattern), move |e| {
        e.string_property(id).is_some_and(|s| pattern.is_match(s))
    })
}

pub fn supports(capability: Capability) -> Condition {
    Condition::leaf(format!("Supports({})", capability), move |e| {
        e.supports(capability)
    })
}

pub fn framework_is(framework: Framework) -> Condition {
    Condition::leaf(format!("Framework({})", framework), move |e| {
        e.framework() == framework
    })
}

pub fn is_keyboard_focusable() -> Condition {
    Condition::leaf("IsKeyboardFocusable", |e| e.is_keyboard_focusable())
}

pub fn is_offscreen() -> Condition {
    Condition::leaf("IsOffscreen", |e| e.is_offscreen())
}

pub fn is_enabled() -> Condition {
    Condition::leaf("IsEnabled", |e| {
        e.bool_property(PropertyId::IS_ENABLED) != Some(false)
    })
}

/// Name property present (possibly empty)
pub fn has_name() -> Condition {
    Condition::leaf("HasName", |e| e.name().is_some())
}

pub fn name_is_empty() -> Condition {
    Condition::leaf("NameIsEmpty", |e| e.name().is_some_and(str::is_empty))
}

/// Name made of whitespace only (including the empty name)
pub fn name_is_whitespace() -> Condition {
    Condition::leaf("NameIsWhiteSpace", |e| {
        e.name().is_some_and(|name| name.trim().is_empty())
    })
}

pub fn name_has_private_unicode() -> Condition {
    Condition::leaf("NameHasPrivateUnicode", |e| {
        e.name().is_some_and(|name| PRIVATE_UNICODE_REGEX.is_match(name))
    })
}

/// Localized control type present and not blank
pub fn has_localized_control_type() -> Condition {
    Condition::leaf("HasLocalizedControlType", |e| {
        e.localized_control_type()
            .is_some_and(|lct| !lct.trim().is_empty())
    })
}

/// Name repeats the localized control type ("OK button")
pub fn name_contains_localized_control_type() -> Condition {
    Condition::leaf("NameContainsLocalizedControlType", |e| {
        match (e.name(), e.localized_control_type()) {
            (Some(name), Some(lct)) if !lct.trim().is_empty() => name
                .to_lowercase()
                .contains(&lct.trim().to_lowercase()),
            _ => false,
        }
    })
}

pub fn has_bounding_rect() -> Condition {
    Condition::leaf("HasBoundingRectangle", |e| e.bounding_rect().is_some())
}

pub fn bounding_rect_is_empty() -> Condition {
    Condition::leaf("BoundingRectangleIsEmpty", |e| {
        e.bounding_rect().is_some_and(|r| r.is_empty())
    })
}

pub fn bounding_rect_all_zeros() -> Condition {
    Condition::leaf("BoundingRectangleAllZeros", |e| {
        e.bounding_rect().is_some_and(|r| r.is_all_zeros())
    })
}

fn parent_rect(e: Element<'_>) -> Option<Rect> {
    e.parent().and_then(|p| p.bounding_rect())
}

/// Parent exists and has a non-empty bounding rectangle
pub fn parent_has_bounding_rect() -> Condition {
    Condition::leaf("ParentHasBoundingRectangle", |e| {
        parent_rect(e).is_some_and(|r| !r.is_empty())
    })
}

/// Own rectangle lies within the parent's rectangle
pub fn bounding_rect_contained_in_parent() -> Condition {
    Condition::leaf("BoundingRectangleContainedInParent", |e| {
        match (e.bounding_rect(), parent_rect(e)) {
            (Some(own), Some(parent)) => parent.contains(&own),
            _ => false,
        }
    })
}

/// Own rectangle completely hides the logical container's rectangle
pub fn bounding_rect_obscures_container() -> Condition {
    Condition::leaf("BoundingRectangleObscuresContainer", |e| {
        let container = find_container_element(e).and_then(|c| c.bounding_rect());
        match (e.bounding_rect(), container) {
            (Some(own), Some(container)) => own.completely_obscures(&container),
            _ => false,
        }
    })
}

pub fn has_parent() -> Condition {
    Condition::leaf("HasParent", |e| e.parent().is_some())
}

/// Parent exists and matches `condition`
pub fn parent(condition: Condition) -> Condition {
    Condition::leaf(format!("Parent({})", condition), move |e| {
        condition.matches(e.parent())
    })
}

/// Some ancestor matches `condition`
pub fn any_ancestor(condition: Condition) -> Condition {
    Condition::leaf(format!("AnyAncestor({})", condition), move |e| {
        e.ancestors().any(|a| condition.matches_element(a))
    })
}

/// The resolved logical container has the given control type
pub fn container_is(control_type: ControlType) -> Condition {
    Condition::leaf(format!("ContainerIs({})", control_type), move |e| {
        find_container_element(e).is_some_and(|c| c.control_type() == control_type)
    })
}

/// Some strict ancestor supports scrolling
pub fn has_scrollable_container() -> Condition {
    Condition::leaf("HasScrollableContainer", |e| {
        e.parent().and_then(find_scrollable_ancestor).is_some()
    })
}

pub fn no_children() -> Condition {
    Condition::leaf("NoChildren", |e| e.child_count() == 0)
}

/// Every child matches `condition` (vacuously true without children)
pub fn all_children(condition: Condition) -> Condition {
    Condition::leaf(format!("AllChildren({})", condition), move |e| {
        e.children().all(|c| condition.matches_element(c))
    })
}

/// Builder for conditions over the number of matching children
pub struct ChildCount {
    filter: Option<Condition>,
    label: String,
}

impl ChildCount {
    /// Count children of one control type
    pub fn of(control_type: ControlType) -> Self {
        Self {
            label: control_type.to_string(),
            filter: Some(self::control_type(control_type)),
        }
    }

    /// Count children matching an arbitrary condition
    pub fn matching(condition: Condition) -> Self {
        Self {
            label: condition.to_string(),
            filter: Some(condition),
        }
    }

    /// Count all children
    pub fn all() -> Self {
        Self {
            label: "*".to_string(),
            filter: None,
        }
    }

    pub fn equals(self, n: usize) -> Condition {
        self.compare(format!("== {}", n), move |count| count == n)
    }

    pub fn at_most(self, n: usize) -> Condition {
        self.compare(format!("<= {}", n), move |count| count <= n)
    }

    pub fn at_least(self, n: usize) -> Condition {
        self.compare(format!(">= {}", n), move |count| count >= n)
    }

    pub fn between(self, min: usize, max: usize) -> Condition {
        self.compare(format!("in {}..={}", min, max), move |count| {
            (min..=max).contains(&count)
        })
    }

    fn compare<F>(self, op: String, check: F) -> Condition
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        let filter = self.filter;
        Condition::leaf(format!("ChildCount({}) {}", self.label, op), move |e| {
            let count = match &filter {
                Some(filter) => e.children().filter(|c| filter.matches_element(*c)).count(),
                None => e.child_count(),
            };
            check(count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementData, ElementTree};

    fn single(data: ElementData) -> ElementTree {
        ElementTree::from_root(data)
    }

    #[test]
    fn test_control_type() {
        let tree = single(ElementData::new(ControlType::BUTTON));
        assert!(control_type(ControlType::BUTTON).matches(Some(tree.root())));
        assert!(!control_type(ControlType::EDIT).matches(Some(tree.root())));
        assert!(
            control_type_in(&[ControlType::EDIT, ControlType::BUTTON]).matches(Some(tree.root()))
        );
        assert_eq!(control_type(ControlType::BUTTON).to_string(), "Button");
    }

    #[test]
    fn test_name_conditions() {
        let blank = single(ElementData::new(ControlType::BUTTON).with_name("   "));
        let empty = single(ElementData::new(ControlType::BUTTON).with_name(""));
        let named = single(ElementData::new(ControlType::BUTTON).with_name("OK"));
        let unnamed = single(ElementData::new(ControlType::BUTTON));

        assert!(name_is_whitespace().matches(Some(blank.root())));
        assert!(!name_is_empty().matches(Some(blank.root())));
        assert!(name_is_empty().matches(Some(empty.root())));
        assert!(name_is_whitespace().matches(Some(empty.root())));
        assert!(!name_is_whitespace().matches(Some(named.root())));
        assert!(has_name().matches(Some(named.root())));
        assert!(!has_name().matches(Some(unnamed.root())));
        assert!(!name_is_whitespace().matches(Some(unnamed.root())));
    }

    #[test]
    fn test_private_unicode() {
        let private = single(ElementData::new(ControlType::BUTTON).with_name("Save \u{E700}"));
        let plain = single(ElementData::new(ControlType::BUTTON).with_name("Save ✓"));

        assert!(name_has_private_unicode().matches(Some(private.root())));
        assert!(!name_has_private_unicode().matches(Some(plain.root())));
    }

    #[test]
    fn test_name_contains_localized_control_type() {
        let tree = single(
            ElementData::new(ControlType::BUTTON)
                .with_name("OK Button")
                .with_property(PropertyId::LOCALIZED_CONTROL_TYPE, "button"),
        );
        let other = single(
            ElementData::new(ControlType::BUTTON)
                .with_name("OK")
                .with_property(PropertyId::LOCALIZED_CONTROL_TYPE, "button"),
        );

        assert!(name_contains_localized_control_type().matches(Some(tree.root())));
        assert!(!name_contains_localized_control_type().matches(Some(other.root())));
    }

    #[test]
    fn test_property_conditions() {
        let tree = single(
            ElementData::new(ControlType::CHECK_BOX)
                .with_property(PropertyId::IS_KEYBOARD_FOCUSABLE, true)
                .with_property(PropertyId::ORIENTATION, PropertyValue::Enum(1))
                .with_property(PropertyId::AUTOMATION_ID, "agree-checkbox"),
        );
        let root = Some(tree.root());

        assert!(is_keyboard_focusable().matches(root));
        assert!(bool_property(PropertyId::IS_KEYBOARD_FOCUSABLE, true).matches(root));
        assert!(property_equals(PropertyId::ORIENTATION, PropertyValue::Enum(1)).matches(root));
        assert!(has_property(PropertyId::AUTOMATION_ID).matches(root));
        assert!(string_property_matches(
            PropertyId::AUTOMATION_ID,
            Regex::new("checkbox$").unwrap()
        )
        .matches(root));
        assert!(is_enabled().matches(root));
        assert!(!is_offscreen().matches(root));
    }

    #[test]
    fn test_child_count() {
        let tree = single(
            ElementData::new(ControlType::SCROLL_BAR)
                .with_child(ElementData::new(ControlType::BUTTON))
                .with_child(ElementData::new(ControlType::THUMB))
                .with_child(ElementData::new(ControlType::BUTTON)),
        );
        let root = Some(tree.root());

        assert!(ChildCount::of(ControlType::BUTTON).equals(2).matches(root));
        assert!(ChildCount::of(ControlType::THUMB).at_most(1).matches(root));
        assert!(ChildCount::all().at_least(3).matches(root));
        assert!(ChildCount::all().between(1, 3).matches(root));
        assert!(!ChildCount::of(ControlType::EDIT).at_least(1).matches(root));
        assert!(ChildCount::matching(control_type(ControlType::THUMB))
            .equals(1)
            .matches(root));
        assert_eq!(
            ChildCount::of(ControlType::THUMB).at_most(1).to_string(),
            "ChildCount(Thumb) <= 1"
        );
    }

    #[test]
    fn test_parent_and_ancestor() {
        let tree = single(
            ElementData::new(ControlType::WINDOW).with_child(
                ElementData::new(ControlType::PANE)
                    .with_child(ElementData::new(ControlType::BUTTON)),
            ),
        );
        let button = tree.get(2);

        assert!(parent(control_type(ControlType::PANE)).matches(button));
        assert!(!parent(control_type(ControlType::WINDOW)).matches(button));
        assert!(any_ancestor(control_type(ControlType::WINDOW)).matches(button));
        assert!(!parent(Condition::always()).matches(Some(tree.root())));
        assert!(has_parent().matches(button));
    }

    #[test]
    fn test_bounding_rect_conditions() {
        let tree = single(
            ElementData::new(ControlType::PANE)
                .with_rect(Rect::new(0, 0, 100, 100))
                .with_child(
                    ElementData::new(ControlType::BUTTON).with_rect(Rect::new(10, 10, 50, 50)),
                )
                .with_child(
                    ElementData::new(ControlType::BUTTON).with_rect(Rect::new(90, 90, 150, 150)),
                )
                .with_child(ElementData::new(ControlType::IMAGE).with_rect(Rect::default())),
        );

        assert!(bounding_rect_contained_in_parent().matches(tree.get(1)));
        assert!(!bounding_rect_contained_in_parent().matches(tree.get(2)));
        assert!(bounding_rect_all_zeros().matches(tree.get(3)));
        assert!(bounding_rect_is_empty().matches(tree.get(3)));
        assert!(parent_has_bounding_rect().matches(tree.get(1)));
        assert!(!has_bounding_rect().matches(Some(single(ElementData::default()).root())));
    }

    #[test]
    fn test_scrollable_container() {
        let tree = single(
            ElementData::new(ControlType::WINDOW).with_child(
                ElementData::new(ControlType::LIST)
                    .with_capability(Capability::Scroll)
                    .with_child(ElementData::new(ControlType::LIST_ITEM)),
            ),
        );

        assert!(has_scrollable_container().matches(tree.get(2)));
        assert!(!has_scrollable_container().matches(tree.get(1)));
    }

    #[test]
    fn test_all_children() {
        let tree = single(
            ElementData::new(ControlType::SCROLL_BAR)
                .with_child(ElementData::new(ControlType::BUTTON))
                .with_child(ElementData::new(ControlType::TEXT)),
        );
        let buttons_only = all_children(control_type(ControlType::BUTTON));

        assert!(!buttons_only.matches(Some(tree.root())));
        assert!(buttons_only.matches(tree.get(1)));
    }
}
