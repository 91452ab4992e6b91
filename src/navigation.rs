//! Tree navigation helpers used by conditions and structural rules

use crate::element::{Capability, ControlType, Element, Framework};
use crate::rule::RuleError;

/// The element itself or its nearest ancestor with the given control type
pub fn find_ancestor_of_type(
    element: Element<'_>,
    control_type: ControlType,
) -> Option<Element<'_>> {
    let mut current = Some(element);
    while let Some(candidate) = current {
        if candidate.control_type() == control_type {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}

/// The element itself or its nearest ancestor that supports scrolling.
///
/// The root is never considered a scrollable container.
pub fn find_scrollable_ancestor(element: Element<'_>) -> Option<Element<'_>> {
    let mut current = element;
    loop {
        if current.is_root() {
            return None;
        }
        if current.supports(Capability::Scroll) {
            return Some(current);
        }
        current = current.parent()?;
    }
}

/// Container control type an item is expected to live in
pub fn expected_container_type(control_type: ControlType) -> Option<ControlType> {
    match control_type {
        ControlType::TAB_ITEM => Some(ControlType::TAB),
        ControlType::TREE_ITEM => Some(ControlType::TREE),
        _ => None,
    }
}

/// Tab items rendered by WPF or XAML, whose content may extend past the tab header
fn is_framework_tab_item(element: Element<'_>) -> bool {
    element.control_type() == ControlType::TAB_ITEM
        && matches!(element.framework(), Framework::Wpf | Framework::Xaml)
}

/// Resolve the logical container of an element.
///
/// Returns `None` only for the root. When no better container can be found the
/// immediate parent is returned.
pub fn find_container_element(element: Element<'_>) -> Option<Element<'_>> {
    let parent = element.parent()?;

    let anchor = if is_framework_tab_item(parent) {
        parent
    } else {
        element
    };
    let fallback = anchor.parent().unwrap_or(parent);

    let container = match expected_container_type(anchor.control_type()) {
        None => anchor.parent().and_then(find_scrollable_ancestor),
        Some(expected) => anchor
            .parent()
            .and_then(|start| find_ancestor_of_type(start, expected)),
    };

    Some(container.unwrap_or(fallback))
}

/// Check if the bounding rectangle of `a` completely obscures that of `b`.
///
/// Both elements are required. Elements without a rectangle never obscure or get
/// obscured.
pub fn element_completely_obscures(
    a: Option<Element<'_>>,
    b: Option<Element<'_>>,
) -> Result<bool, RuleError> {
    let a = a.ok_or_else(|| RuleError::ArgumentInvalid("first element is absent".to_string()))?;
    let b = b.ok_or_else(|| RuleError::ArgumentInvalid("second element is absent".to_string()))?;

    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) => Ok(ra.completely_obscures(&rb)),
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementData, ElementTree};
    use crate::geometry::Rect;

    fn by_name<'a>(tree: &'a ElementTree, name: &str) -> Element<'a> {
        tree.iter()
            .find(|e| e.name() == Some(name))
            .unwrap_or_else(|| panic!("no element named {}", name))
    }

    fn tab_tree(framework: Framework) -> ElementTree {
        ElementTree::from_root(
            ElementData::new(ControlType::WINDOW).with_name("window").with_child(
                ElementData::new(ControlType::TAB).with_name("tab").with_child(
                    ElementData::new(ControlType::TAB_ITEM)
                        .with_name("item")
                        .with_framework(framework)
                        .with_child(ElementData::new(ControlType::PANE).with_name("content")),
                ),
            ),
        )
    }

    #[test]
    fn test_find_ancestor_of_type_self() {
        let tree = tab_tree(Framework::Win32);
        let tab = by_name(&tree, "tab");
        assert_eq!(find_ancestor_of_type(tab, ControlType::TAB), Some(tab));
    }

    #[test]
    fn test_find_ancestor_of_type_walks_up() {
        let tree = tab_tree(Framework::Win32);
        let content = by_name(&tree, "content");
        assert_eq!(
            find_ancestor_of_type(content, ControlType::TAB),
            Some(by_name(&tree, "tab"))
        );
    }

    #[test]
    fn test_find_ancestor_of_type_none() {
        let tree = tab_tree(Framework::Win32);
        let content = by_name(&tree, "content");
        assert_eq!(find_ancestor_of_type(content, ControlType::TREE), None);
    }

    #[test]
    fn test_find_scrollable_ancestor() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::WINDOW)
                .with_capability(Capability::Scroll)
                .with_child(
                    ElementData::new(ControlType::LIST)
                        .with_name("list")
                        .with_capability(Capability::Scroll)
                        .with_child(ElementData::new(ControlType::LIST_ITEM).with_name("row")),
                )
                .with_child(ElementData::new(ControlType::BUTTON).with_name("button")),
        );

        let list = by_name(&tree, "list");
        assert_eq!(find_scrollable_ancestor(by_name(&tree, "row")), Some(list));
        assert_eq!(find_scrollable_ancestor(list), Some(list));
        // The scrollable root does not count
        assert_eq!(find_scrollable_ancestor(by_name(&tree, "button")), None);
        assert_eq!(find_scrollable_ancestor(tree.root()), None);
    }

    #[test]
    fn test_container_of_root_is_none() {
        let tree = tab_tree(Framework::Win32);
        assert_eq!(find_container_element(tree.root()), None);
    }

    #[test]
    fn test_container_of_tab_item_is_tab() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::TAB).with_name("tab").with_child(
                ElementData::new(ControlType::GROUP).with_child(
                    ElementData::new(ControlType::TAB_ITEM).with_name("item"),
                ),
            ),
        );

        assert_eq!(
            find_container_element(by_name(&tree, "item")),
            Some(by_name(&tree, "tab"))
        );
    }

    #[test]
    fn test_container_reroots_at_framework_tab_item() {
        for framework in [Framework::Wpf, Framework::Xaml] {
            let tree = tab_tree(framework);
            assert_eq!(
                find_container_element(by_name(&tree, "content")),
                Some(by_name(&tree, "tab"))
            );
        }
    }

    #[test]
    fn test_container_without_reroot_uses_parent() {
        // Win32 tab item content resolves to the tab item itself
        let tree = tab_tree(Framework::Win32);
        assert_eq!(
            find_container_element(by_name(&tree, "content")),
            Some(by_name(&tree, "item"))
        );
    }

    #[test]
    fn test_container_of_tree_item_falls_back_to_parent() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::PANE)
                .with_name("pane")
                .with_child(ElementData::new(ControlType::TREE_ITEM).with_name("orphan")),
        );

        assert_eq!(
            find_container_element(by_name(&tree, "orphan")),
            Some(by_name(&tree, "pane"))
        );
    }

    #[test]
    fn test_container_prefers_scrollable_ancestor() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::WINDOW).with_child(
                ElementData::new(ControlType::LIST)
                    .with_name("list")
                    .with_capability(Capability::Scroll)
                    .with_child(
                        ElementData::new(ControlType::GROUP)
                            .with_name("group")
                            .with_child(ElementData::new(ControlType::TEXT).with_name("label")),
                    ),
            ),
        );

        assert_eq!(
            find_container_element(by_name(&tree, "label")),
            Some(by_name(&tree, "list"))
        );
    }

    #[test]
    fn test_container_never_none_with_parent() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::TAB_ITEM)
                .with_framework(Framework::Wpf)
                .with_child(
                    ElementData::new(ControlType::TREE_ITEM)
                        .with_child(ElementData::new(ControlType::TAB_ITEM))
                        .with_child(ElementData::new(ControlType::BUTTON)),
                ),
        );

        for element in tree.iter().filter(|e| !e.is_root()) {
            assert!(find_container_element(element).is_some(), "{}", element);
        }
    }

    #[test]
    fn test_element_completely_obscures() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::PANE)
                .with_rect(Rect::new(10, 10, 100, 100))
                .with_child(
                    ElementData::new(ControlType::IMAGE).with_rect(Rect::new(0, 0, 200, 200)),
                )
                .with_child(ElementData::new(ControlType::TEXT)),
        );
        let pane = tree.root();
        let image = tree.get(1);
        let text = tree.get(2);

        assert_eq!(element_completely_obscures(image, Some(pane)), Ok(true));
        assert_eq!(element_completely_obscures(Some(pane), image), Ok(false));
        assert_eq!(element_completely_obscures(text, Some(pane)), Ok(false));
        assert!(matches!(
            element_completely_obscures(None, Some(pane)),
            Err(RuleError::ArgumentInvalid(_))
        ));
    }
}
