//! Built-in accessibility rules
//!
//! Each rule is a [`Rule`] value paired with the [`Applicability`] that selects the
//! elements it runs on. [`builtin_rules`] returns them in registration order; the
//! global registry is built from it.

mod bounding_rect;
mod keyboard;
mod name;
mod structure;

use crate::element::ControlType;
use crate::registry::Applicability;
use crate::rule::Rule;

/// Controls users interact with directly
pub const INTERACTIVE_CONTROL_TYPES: &[ControlType] = &[
    ControlType::BUTTON,
    ControlType::CHECK_BOX,
    ControlType::COMBO_BOX,
    ControlType::DATA_ITEM,
    ControlType::EDIT,
    ControlType::HYPERLINK,
    ControlType::LIST_ITEM,
    ControlType::MENU_ITEM,
    ControlType::RADIO_BUTTON,
    ControlType::SLIDER,
    ControlType::SPINNER,
    ControlType::SPLIT_BUTTON,
    ControlType::TAB_ITEM,
    ControlType::TREE_ITEM,
];

/// Get all built-in rules
pub fn builtin_rules() -> Vec<(Applicability, Rule)> {
    let mut rules = Vec::new();
    rules.extend(name::rules());
    rules.extend(bounding_rect::rules());
    rules.extend(structure::rules());
    rules.extend(keyboard::rules());
    rules
}
