//! Rules about the Name and LocalizedControlType properties

use super::INTERACTIVE_CONTROL_TYPES;
use crate::conditions::{
    bool_property, has_localized_control_type, has_name, name_contains_localized_control_type,
    name_has_private_unicode, name_is_whitespace,
};
use crate::element::PropertyId;
use crate::registry::Applicability;
use crate::rule::{EvaluationCode, EvaluationPolicy, Rule, Standard};

pub(super) fn rules() -> Vec<(Applicability, Rule)> {
    vec![
        (
            Applicability::control_types(INTERACTIVE_CONTROL_TYPES),
            Rule::property(
                "NameNotNull",
                "Interactive elements must expose a Name property",
                has_name(),
            )
            .with_property(PropertyId::NAME)
            .with_how_to_fix("Provide an accessible name, e.g. from a visible label")
            .with_tag("name"),
        ),
        (
            Applicability::any().when(has_name()),
            Rule::property(
                "NameNotWhiteSpace",
                "The Name property must not be empty or whitespace",
                !name_is_whitespace(),
            )
            .with_property(PropertyId::NAME)
            .with_how_to_fix("Set a Name that describes the element's purpose")
            .with_tag("name"),
        ),
        (
            Applicability::any().when(has_name()),
            Rule::new(
                "NameExcludesPrivateUnicodeCharacters",
                "The Name property must not contain private use unicode characters",
                name_has_private_unicode(),
                EvaluationPolicy::FailOnMatch {
                    otherwise: EvaluationCode::Pass,
                },
            )
            .with_property(PropertyId::NAME)
            .with_how_to_fix("Replace icon-font glyphs in the Name with readable text")
            .with_tag("name"),
        ),
        (
            Applicability::any().when(has_name() & has_localized_control_type()),
            Rule::new(
                "NameExcludesLocalizedControlType",
                "The Name property should not repeat the localized control type",
                name_contains_localized_control_type(),
                EvaluationPolicy::custom(|_, matched| {
                    Ok(if matched {
                        EvaluationCode::Note
                    } else {
                        EvaluationCode::Pass
                    })
                }),
            )
            .with_property(PropertyId::NAME)
            .with_how_to_fix("Remove the control type from the Name; screen readers announce it")
            .with_tag("name"),
        ),
        (
            Applicability::any().when(bool_property(PropertyId::IS_CONTROL_ELEMENT, true)),
            Rule::property(
                "LocalizedControlTypeNotEmpty",
                "Control elements must expose a non-empty LocalizedControlType",
                has_localized_control_type(),
            )
            .with_standard(Standard::NameRoleValue)
            .with_property(PropertyId::LOCALIZED_CONTROL_TYPE)
            .with_how_to_fix("Report a localized control type describing the element's role"),
        ),
    ]
}
