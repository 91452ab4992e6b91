//! Keyboard reachability and capability rules

use crate::conditions::{
    has_scrollable_container, is_enabled, is_keyboard_focusable, is_offscreen, supports,
};
use crate::element::{Capability, ControlType, Framework, PropertyId};
use crate::registry::Applicability;
use crate::rule::{EvaluationCode, EvaluationPolicy, Rule, Standard};

const FOCUSABLE_CONTROL_TYPES: &[ControlType] = &[
    ControlType::BUTTON,
    ControlType::CHECK_BOX,
    ControlType::COMBO_BOX,
    ControlType::EDIT,
    ControlType::HYPERLINK,
    ControlType::RADIO_BUTTON,
    ControlType::SPLIT_BUTTON,
];

pub(super) fn rules() -> Vec<(Applicability, Rule)> {
    vec![
        (
            Applicability::control_types(FOCUSABLE_CONTROL_TYPES)
                .when(is_enabled() & !is_offscreen()),
            Rule::new(
                "IsKeyboardFocusable",
                "Enabled interactive controls should be reachable with the keyboard",
                is_keyboard_focusable(),
                EvaluationPolicy::PassOnMatch {
                    otherwise: EvaluationCode::Note,
                },
            )
            .with_standard(Standard::Keyboard)
            .with_property(PropertyId::IS_KEYBOARD_FOCUSABLE)
            .with_how_to_fix("Include the control in the tab order")
            .with_tag("keyboard"),
        ),
        (
            Applicability::any().when(is_offscreen() & is_keyboard_focusable()),
            Rule::structural(
                "OffscreenElementHasScrollableContainer",
                "A focusable off-screen element should be scrolled into view by a container",
                has_scrollable_container(),
            )
            .with_standard(Standard::FocusVisible)
            .with_how_to_fix(
                "Place the element in a scrollable container or drop it from the tab order",
            )
            .with_tag("keyboard"),
        ),
        (
            Applicability::control_types(&[ControlType::LIST]),
            Rule::structural(
                "ListSupportsSelection",
                "A list should expose the selection capability",
                supports(Capability::Selection),
            )
            .with_standard(Standard::NameRoleValue)
            .with_property(PropertyId::IS_SELECTION_PATTERN_AVAILABLE)
            .with_how_to_fix("Implement the selection pattern on the list")
            .excluding_framework(Framework::Chrome)
            .excluding_framework(Framework::Edge),
        ),
    ]
}
