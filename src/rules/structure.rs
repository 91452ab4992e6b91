//! Control view structure rules

use crate::conditions::{all_children, container_is, control_type_in, ChildCount};
use crate::element::ControlType;
use crate::registry::Applicability;
use crate::rule::Rule;

pub(super) fn rules() -> Vec<(Applicability, Rule)> {
    vec![
        (
            Applicability::control_types(&[ControlType::SCROLL_BAR]),
            Rule::structural(
                "ScrollBarStructure",
                "A scroll bar should contain only buttons and at most one thumb",
                all_children(control_type_in(&[ControlType::BUTTON, ControlType::THUMB]))
                    & ChildCount::of(ControlType::THUMB).at_most(1)
                    & ChildCount::of(ControlType::BUTTON).at_most(4),
            )
            .with_how_to_fix(
                "Expose line/page buttons and a single thumb as the scroll bar's only children",
            )
            .with_tag("structure"),
        ),
        (
            Applicability::control_types(&[ControlType::TAB_ITEM]),
            Rule::structural(
                "TabItemInTab",
                "A tab item should be contained in a tab control",
                container_is(ControlType::TAB),
            )
            .with_how_to_fix("Place tab items inside an element with the Tab control type")
            .with_tag("structure"),
        ),
        (
            Applicability::control_types(&[ControlType::TREE_ITEM]),
            Rule::structural(
                "TreeItemInTree",
                "A tree item should be contained in a tree control",
                container_is(ControlType::TREE),
            )
            .with_how_to_fix("Place tree items inside an element with the Tree control type")
            .with_tag("structure"),
        ),
    ]
}
