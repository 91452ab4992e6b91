//! Rules about bounding rectangles

use crate::conditions::{
    bounding_rect_contained_in_parent, bounding_rect_is_empty, bounding_rect_obscures_container,
    has_bounding_rect, has_parent, is_offscreen, parent_has_bounding_rect,
};
use crate::registry::Applicability;
use crate::rule::{EvaluationCode, EvaluationPolicy, Rule, Standard};

pub(super) fn rules() -> Vec<(Applicability, Rule)> {
    vec![
        (
            Applicability::any().when(!is_offscreen()),
            Rule::property(
                "BoundingRectangleNotNull",
                "On-screen elements must expose a bounding rectangle",
                has_bounding_rect(),
            )
            .with_standard(Standard::InfoAndRelationships)
            .with_how_to_fix("Report the element's screen location and size")
            .with_tag("bounding-rect"),
        ),
        (
            Applicability::any().when(!is_offscreen() & has_bounding_rect()),
            Rule::property(
                "BoundingRectangleNotEmpty",
                "On-screen elements must have a bounding rectangle with a positive area",
                !bounding_rect_is_empty(),
            )
            .with_standard(Standard::InfoAndRelationships)
            .with_how_to_fix("Report a non-zero width and height, or mark the element off-screen")
            .with_tag("bounding-rect"),
        ),
        (
            Applicability::any().when(
                !is_offscreen()
                    & has_bounding_rect()
                    & !bounding_rect_is_empty()
                    & parent_has_bounding_rect(),
            ),
            Rule::structural(
                "BoundingRectangleContainedInParent",
                "An element's bounding rectangle should lie within its parent's",
                bounding_rect_contained_in_parent(),
            )
            .with_how_to_fix("Make sure the reported rectangle matches the element's visible area")
            .with_tag("bounding-rect"),
        ),
        (
            Applicability::any().when(!is_offscreen() & has_bounding_rect() & has_parent()),
            Rule::new(
                "BoundingRectangleCompletelyObscuresContainer",
                "An element must not completely cover its container",
                bounding_rect_obscures_container(),
                EvaluationPolicy::FailOnMatch {
                    otherwise: EvaluationCode::Pass,
                },
            )
            .with_standard(Standard::InfoAndRelationships)
            .with_how_to_fix("Report the element's real size; it should not exceed its container")
            .with_tag("bounding-rect"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ControlType, ElementData, ElementTree, PropertyId};
    use crate::geometry::Rect;

    fn rule(id: &str) -> Rule {
        rules()
            .into_iter()
            .map(|(_, r)| r)
            .find(|r| r.id == id)
            .unwrap()
    }

    fn pane_with(child: ElementData) -> ElementTree {
        ElementTree::from_root(
            ElementData::new(ControlType::PANE)
                .with_rect(Rect::new(100, 100, 300, 300))
                .with_child(child),
        )
    }

    #[test]
    fn test_not_null() {
        let tree = pane_with(ElementData::new(ControlType::BUTTON));
        assert_eq!(
            rule("BoundingRectangleNotNull").evaluate(tree.get(1)),
            Ok(EvaluationCode::Fail)
        );
    }

    #[test]
    fn test_not_empty() {
        let tree = pane_with(ElementData::new(ControlType::BUTTON).with_rect(Rect::default()));
        assert_eq!(
            rule("BoundingRectangleNotEmpty").evaluate(tree.get(1)),
            Ok(EvaluationCode::Fail)
        );
    }

    #[test]
    fn test_contained_in_parent() {
        let inside = pane_with(
            ElementData::new(ControlType::BUTTON).with_rect(Rect::new(110, 110, 150, 150)),
        );
        let outside = pane_with(
            ElementData::new(ControlType::BUTTON).with_rect(Rect::new(250, 250, 400, 400)),
        );

        let rule = rule("BoundingRectangleContainedInParent");
        assert_eq!(rule.evaluate(inside.get(1)), Ok(EvaluationCode::Pass));
        assert_eq!(rule.evaluate(outside.get(1)), Ok(EvaluationCode::Note));
    }

    #[test]
    fn test_completely_obscures_container() {
        let covering = pane_with(
            ElementData::new(ControlType::IMAGE).with_rect(Rect::new(0, 0, 1000, 1000)),
        );
        let filling = pane_with(
            ElementData::new(ControlType::IMAGE).with_rect(Rect::new(100, 100, 300, 300)),
        );

        let rule = rule("BoundingRectangleCompletelyObscuresContainer");
        assert_eq!(rule.evaluate(covering.get(1)), Ok(EvaluationCode::Fail));
        assert_eq!(rule.evaluate(filling.get(1)), Ok(EvaluationCode::Pass));
    }

    #[test]
    fn test_offscreen_elements_not_selected() {
        let tree = pane_with(
            ElementData::new(ControlType::BUTTON).with_property(PropertyId::IS_OFFSCREEN, true),
        );
        let offscreen = tree.get(1).unwrap();

        for (applicability, _) in rules() {
            assert!(!applicability.matches(offscreen));
        }
    }
}
