//! Snapshot model of a UI element tree
//!
//! The acquisition layer hands the engine an owned [`ElementData`] description which
//! is flattened into an arena ([`ElementTree`]). Rules and conditions only ever see
//! [`Element`] handles: cheap, `Copy` references into that arena which expose the
//! parent back-reference, ordered children and the property bag.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Error building a tree from a snapshot
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate element id: {0}")]
    DuplicateId(ElementId),
}

/// Stable identity of an element within one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Semantic role of an element, as the numeric code reported by the platform.
///
/// Codes the engine does not know about are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlType(pub u32);

impl ControlType {
    pub const BUTTON: ControlType = ControlType(50000);
    pub const CALENDAR: ControlType = ControlType(50001);
    pub const CHECK_BOX: ControlType = ControlType(50002);
    pub const COMBO_BOX: ControlType = ControlType(50003);
    pub const EDIT: ControlType = ControlType(50004);
    pub const HYPERLINK: ControlType = ControlType(50005);
    pub const IMAGE: ControlType = ControlType(50006);
    pub const LIST_ITEM: ControlType = ControlType(50007);
    pub const LIST: ControlType = ControlType(50008);
    pub const MENU: ControlType = ControlType(50009);
    pub const MENU_BAR: ControlType = ControlType(50010);
    pub const MENU_ITEM: ControlType = ControlType(50011);
    pub const PROGRESS_BAR: ControlType = ControlType(50012);
    pub const RADIO_BUTTON: ControlType = ControlType(50013);
    pub const SCROLL_BAR: ControlType = ControlType(50014);
    pub const SLIDER: ControlType = ControlType(50015);
    pub const SPINNER: ControlType = ControlType(50016);
    pub const STATUS_BAR: ControlType = ControlType(50017);
    pub const TAB: ControlType = ControlType(50018);
    pub const TAB_ITEM: ControlType = ControlType(50019);
    pub const TEXT: ControlType = ControlType(50020);
    pub const TOOL_BAR: ControlType = ControlType(50021);
    pub const TOOL_TIP: ControlType = ControlType(50022);
    pub const TREE: ControlType = ControlType(50023);
    pub const TREE_ITEM: ControlType = ControlType(50024);
    pub const CUSTOM: ControlType = ControlType(50025);
    pub const GROUP: ControlType = ControlType(50026);
    pub const THUMB: ControlType = ControlType(50027);
    pub const DATA_GRID: ControlType = ControlType(50028);
    pub const DATA_ITEM: ControlType = ControlType(50029);
    pub const DOCUMENT: ControlType = ControlType(50030);
    pub const SPLIT_BUTTON: ControlType = ControlType(50031);
    pub const WINDOW: ControlType = ControlType(50032);
    pub const PANE: ControlType = ControlType(50033);
    pub const HEADER: ControlType = ControlType(50034);
    pub const HEADER_ITEM: ControlType = ControlType(50035);
    pub const TABLE: ControlType = ControlType(50036);
    pub const TITLE_BAR: ControlType = ControlType(50037);
    pub const SEPARATOR: ControlType = ControlType(50038);
    pub const SEMANTIC_ZOOM: ControlType = ControlType(50039);
    pub const APP_BAR: ControlType = ControlType(50040);

    const NAMES: [&'static str; 41] = [
        "Button",
        "Calendar",
        "CheckBox",
        "ComboBox",
        "Edit",
        "Hyperlink",
        "Image",
        "ListItem",
        "List",
        "Menu",
        "MenuBar",
        "MenuItem",
        "ProgressBar",
        "RadioButton",
        "ScrollBar",
        "Slider",
        "Spinner",
        "StatusBar",
        "Tab",
        "TabItem",
        "Text",
        "ToolBar",
        "ToolTip",
        "Tree",
        "TreeItem",
        "Custom",
        "Group",
        "Thumb",
        "DataGrid",
        "DataItem",
        "Document",
        "SplitButton",
        "Window",
        "Pane",
        "Header",
        "HeaderItem",
        "Table",
        "TitleBar",
        "Separator",
        "SemanticZoom",
        "AppBar",
    ];

    /// Programmatic name of a known control type
    pub fn name(&self) -> Option<&'static str> {
        let offset = self.0.checked_sub(Self::BUTTON.0)? as usize;
        Self::NAMES.get(offset).copied()
    }
}

impl Default for ControlType {
    fn default() -> Self {
        ControlType::CUSTOM
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "ControlType({})", self.0),
        }
    }
}

/// Key of the property bag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

impl PropertyId {
    pub const HAS_KEYBOARD_FOCUS: PropertyId = PropertyId(30008);
    pub const LOCALIZED_CONTROL_TYPE: PropertyId = PropertyId(30004);
    pub const NAME: PropertyId = PropertyId(30005);
    pub const IS_KEYBOARD_FOCUSABLE: PropertyId = PropertyId(30009);
    pub const IS_ENABLED: PropertyId = PropertyId(30010);
    pub const AUTOMATION_ID: PropertyId = PropertyId(30011);
    pub const CLASS_NAME: PropertyId = PropertyId(30012);
    pub const HELP_TEXT: PropertyId = PropertyId(30013);
    pub const IS_CONTROL_ELEMENT: PropertyId = PropertyId(30016);
    pub const IS_CONTENT_ELEMENT: PropertyId = PropertyId(30017);
    pub const IS_PASSWORD: PropertyId = PropertyId(30019);
    pub const IS_OFFSCREEN: PropertyId = PropertyId(30022);
    pub const ORIENTATION: PropertyId = PropertyId(30023);
    pub const FRAMEWORK_ID: PropertyId = PropertyId(30024);
    pub const IS_EXPAND_COLLAPSE_PATTERN_AVAILABLE: PropertyId = PropertyId(30028);
    pub const IS_GRID_PATTERN_AVAILABLE: PropertyId = PropertyId(30030);
    pub const IS_INVOKE_PATTERN_AVAILABLE: PropertyId = PropertyId(30031);
    pub const IS_RANGE_VALUE_PATTERN_AVAILABLE: PropertyId = PropertyId(30033);
    pub const IS_SCROLL_PATTERN_AVAILABLE: PropertyId = PropertyId(30034);
    pub const IS_SCROLL_ITEM_PATTERN_AVAILABLE: PropertyId = PropertyId(30035);
    pub const IS_SELECTION_ITEM_PATTERN_AVAILABLE: PropertyId = PropertyId(30036);
    pub const IS_SELECTION_PATTERN_AVAILABLE: PropertyId = PropertyId(30037);
    pub const IS_TABLE_PATTERN_AVAILABLE: PropertyId = PropertyId(30038);
    pub const IS_TEXT_PATTERN_AVAILABLE: PropertyId = PropertyId(30040);
    pub const IS_TOGGLE_PATTERN_AVAILABLE: PropertyId = PropertyId(30041);
    pub const IS_VALUE_PATTERN_AVAILABLE: PropertyId = PropertyId(30043);
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value in the property bag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Bool(bool),
    /// Platform enumeration code (orientation, toggle state, ...)
    Enum(u32),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Enum(e) => Some(i64::from(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{:?}", s),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Enum(e) => write!(f, "enum({})", e),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

/// Capability flags an element may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ExpandCollapse,
    Grid,
    Invoke,
    RangeValue,
    Scroll,
    ScrollItem,
    Selection,
    SelectionItem,
    Table,
    Text,
    Toggle,
    Value,
}

impl Capability {
    /// Property that flags availability of this capability
    pub fn property_id(&self) -> PropertyId {
        match self {
            Capability::ExpandCollapse => PropertyId::IS_EXPAND_COLLAPSE_PATTERN_AVAILABLE,
            Capability::Grid => PropertyId::IS_GRID_PATTERN_AVAILABLE,
            Capability::Invoke => PropertyId::IS_INVOKE_PATTERN_AVAILABLE,
            Capability::RangeValue => PropertyId::IS_RANGE_VALUE_PATTERN_AVAILABLE,
            Capability::Scroll => PropertyId::IS_SCROLL_PATTERN_AVAILABLE,
            Capability::ScrollItem => PropertyId::IS_SCROLL_ITEM_PATTERN_AVAILABLE,
            Capability::Selection => PropertyId::IS_SELECTION_PATTERN_AVAILABLE,
            Capability::SelectionItem => PropertyId::IS_SELECTION_ITEM_PATTERN_AVAILABLE,
            Capability::Table => PropertyId::IS_TABLE_PATTERN_AVAILABLE,
            Capability::Text => PropertyId::IS_TEXT_PATTERN_AVAILABLE,
            Capability::Toggle => PropertyId::IS_TOGGLE_PATTERN_AVAILABLE,
            Capability::Value => PropertyId::IS_VALUE_PATTERN_AVAILABLE,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ExpandCollapse => "expand-collapse",
            Capability::Grid => "grid",
            Capability::Invoke => "invoke",
            Capability::RangeValue => "range-value",
            Capability::Scroll => "scroll",
            Capability::ScrollItem => "scroll-item",
            Capability::Selection => "selection",
            Capability::SelectionItem => "selection-item",
            Capability::Table => "table",
            Capability::Text => "text",
            Capability::Toggle => "toggle",
            Capability::Value => "value",
        };
        write!(f, "{}", name)
    }
}

/// UI framework that rendered an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Framework {
    Win32,
    WinForm,
    Wpf,
    Xaml,
    DirectUi,
    Chrome,
    Edge,
    Other(String),
    #[default]
    Unknown,
}

impl Framework {
    /// Map the framework-id property text to a framework
    pub fn from_id(id: &str) -> Self {
        match id.to_lowercase().as_str() {
            "" => Framework::Unknown,
            "win32" => Framework::Win32,
            "winform" | "winforms" => Framework::WinForm,
            "wpf" => Framework::Wpf,
            "xaml" => Framework::Xaml,
            "directui" => Framework::DirectUi,
            "chrome" => Framework::Chrome,
            "microsoftedge" | "edge" => Framework::Edge,
            _ => Framework::Other(id.to_string()),
        }
    }

    /// Framework-id text as reported by the platform
    pub fn as_id(&self) -> &str {
        match self {
            Framework::Win32 => "Win32",
            Framework::WinForm => "WinForm",
            Framework::Wpf => "WPF",
            Framework::Xaml => "XAML",
            Framework::DirectUi => "DirectUI",
            Framework::Chrome => "Chrome",
            Framework::Edge => "MicrosoftEdge",
            Framework::Other(id) => id,
            Framework::Unknown => "",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framework::Unknown => write!(f, "unknown"),
            other => write!(f, "{}", other.as_id()),
        }
    }
}

/// Owned description of an element and its subtree, as supplied by the
/// acquisition layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementData {
    /// Identity; elements without one are numbered by the tree
    pub id: Option<ElementId>,
    pub control_type: ControlType,
    pub properties: BTreeMap<PropertyId, PropertyValue>,
    pub bounding_rect: Option<Rect>,
    pub children: Vec<ElementData>,
}

impl ElementData {
    pub fn new(control_type: ControlType) -> Self {
        Self {
            control_type,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(ElementId(id));
        self
    }

    pub fn with_name(self, name: &str) -> Self {
        self.with_property(PropertyId::NAME, name)
    }

    pub fn with_property(mut self, id: PropertyId, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(id, value.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.bounding_rect = Some(rect);
        self
    }

    pub fn with_framework(self, framework: Framework) -> Self {
        let id = framework.as_id().to_string();
        self.with_property(PropertyId::FRAMEWORK_ID, id)
    }

    /// Flag a capability as available
    pub fn with_capability(self, capability: Capability) -> Self {
        self.with_property(capability.property_id(), true)
    }

    pub fn with_child(mut self, child: ElementData) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ElementData>) -> Self {
        self.children.extend(children);
        self
    }
}

#[derive(Debug, Clone)]
struct ElementNode {
    id: ElementId,
    control_type: ControlType,
    properties: BTreeMap<PropertyId, PropertyValue>,
    bounding_rect: Option<Rect>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Explicit ids of a description, gathered before flattening
struct IdScan {
    explicit: HashSet<ElementId>,
    duplicate: Option<ElementId>,
    max: Option<i64>,
    count: usize,
}

impl IdScan {
    fn of(root: &ElementData) -> Self {
        let mut scan = IdScan {
            explicit: HashSet::new(),
            duplicate: None,
            max: None,
            count: 0,
        };
        let mut stack = vec![root];
        while let Some(data) = stack.pop() {
            scan.count += 1;
            if let Some(id) = data.id {
                if !scan.explicit.insert(id) && scan.duplicate.is_none() {
                    scan.duplicate = Some(id);
                }
                scan.max = Some(scan.max.map_or(id.0, |max| max.max(id.0)));
            }
            stack.extend(data.children.iter());
        }
        scan
    }

    /// First id above every explicit id and every arena index
    fn first_fresh(&self) -> i64 {
        let above_indices = i64::try_from(self.count).unwrap_or(i64::MAX);
        let above_explicit = self.max.map_or(0, |max| max.saturating_add(1));
        above_indices.max(above_explicit)
    }
}

/// Immutable arena holding one snapshot.
///
/// Nodes are stored in pre-order, so every child index is greater than its
/// parent's index. Element ids are unique within a tree.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<ElementNode>,
}

impl ElementTree {
    /// Flatten an owned description into an arena.
    ///
    /// An element without an id gets its arena index, unless an explicit id
    /// already uses that number; it then gets a fresh id above every other id.
    /// Repeated explicit ids are renumbered the same way after their first use.
    /// Use [`ElementTree::try_from_root`] to reject repeated ids instead.
    pub fn from_root(root: ElementData) -> Self {
        let ids = IdScan::of(&root);
        let mut next_fresh = ids.first_fresh();
        let mut fresh = || {
            let id = ElementId(next_fresh);
            next_fresh = next_fresh.saturating_add(1);
            id
        };
        let mut used: HashSet<ElementId> = HashSet::with_capacity(ids.explicit.len());

        let mut nodes: Vec<ElementNode> = Vec::with_capacity(ids.count);
        let mut stack: Vec<(ElementData, Option<usize>)> = vec![(root, None)];

        while let Some((data, parent)) = stack.pop() {
            let index = nodes.len();
            let id = match data.id {
                Some(id) if used.insert(id) => id,
                Some(id) => {
                    let renumbered = fresh();
                    log::warn!("Duplicate element id {} renumbered to {}", id, renumbered);
                    renumbered
                }
                None => {
                    let by_index = i64::try_from(index).map(ElementId).ok();
                    match by_index {
                        Some(id) if !ids.explicit.contains(&id) => id,
                        _ => fresh(),
                    }
                }
            };
            nodes.push(ElementNode {
                id,
                control_type: data.control_type,
                properties: data.properties,
                bounding_rect: data.bounding_rect,
                parent,
                children: Vec::with_capacity(data.children.len()),
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }

            // Reversed so the first child is popped (and numbered) first
            for child in data.children.into_iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Self { nodes }
    }

    /// Flatten an owned description, rejecting repeated explicit ids
    pub fn try_from_root(root: ElementData) -> Result<Self, TreeError> {
        if let Some(id) = IdScan::of(&root).duplicate {
            return Err(TreeError::DuplicateId(id));
        }
        Ok(Self::from_root(root))
    }

    /// Build a tree from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let root: ElementData = serde_json::from_str(json)?;
        Self::try_from_root(root)
    }

    pub fn root(&self) -> Element<'_> {
        Element {
            tree: self,
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Element at an arena index
    pub fn get(&self, index: usize) -> Option<Element<'_>> {
        (index < self.nodes.len()).then_some(Element { tree: self, index })
    }

    /// Look up an element by identity
    pub fn find(&self, id: ElementId) -> Option<Element<'_>> {
        self.iter().find(|e| e.id() == id)
    }

    /// All elements in pre-order
    pub fn iter(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        (0..self.nodes.len()).map(move |index| Element { tree: self, index })
    }

    /// All elements in post-order (children before their parent)
    pub fn post_order(&self) -> Vec<Element<'_>> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }

        let mut stack: Vec<(usize, bool)> = vec![(0, false)];
        while let Some((index, expanded)) = stack.pop() {
            if expanded {
                order.push(Element { tree: self, index });
                continue;
            }
            stack.push((index, true));
            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, false));
            }
        }

        order
    }
}

/// Handle to one element of an [`ElementTree`]
#[derive(Clone, Copy)]
pub struct Element<'a> {
    tree: &'a ElementTree,
    index: usize,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a ElementNode {
        &self.tree.nodes[self.index]
    }

    /// Position in the arena
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tree(&self) -> &'a ElementTree {
        self.tree
    }

    pub fn id(&self) -> ElementId {
        self.node().id
    }

    pub fn control_type(&self) -> ControlType {
        self.node().control_type
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.node().parent.map(|index| Element {
            tree: self.tree,
            index,
        })
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    /// Direct children, in order
    pub fn children(&self) -> impl ExactSizeIterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&index| Element { tree, index })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Number of edges between this element and the root
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    pub fn property(&self, id: PropertyId) -> Option<&'a PropertyValue> {
        self.node().properties.get(&id)
    }

    pub fn properties(&self) -> &'a BTreeMap<PropertyId, PropertyValue> {
        &self.node().properties
    }

    pub fn has_property(&self, id: PropertyId) -> bool {
        self.node().properties.contains_key(&id)
    }

    pub fn string_property(&self, id: PropertyId) -> Option<&'a str> {
        self.property(id).and_then(PropertyValue::as_str)
    }

    pub fn bool_property(&self, id: PropertyId) -> Option<bool> {
        self.property(id).and_then(PropertyValue::as_bool)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.string_property(PropertyId::NAME)
    }

    pub fn localized_control_type(&self) -> Option<&'a str> {
        self.string_property(PropertyId::LOCALIZED_CONTROL_TYPE)
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.node().bounding_rect
    }

    pub fn framework(&self) -> Framework {
        self.string_property(PropertyId::FRAMEWORK_ID)
            .map(Framework::from_id)
            .unwrap_or_default()
    }

    /// Check if the element flags a capability as available
    pub fn supports(&self, capability: Capability) -> bool {
        self.bool_property(capability.property_id()) == Some(true)
    }

    pub fn is_offscreen(&self) -> bool {
        self.bool_property(PropertyId::IS_OFFSCREEN) == Some(true)
    }

    pub fn is_keyboard_focusable(&self) -> bool {
        self.bool_property(PropertyId::IS_KEYBOARD_FOCUSABLE) == Some(true)
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for Element<'_> {}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id())
            .field("control_type", &self.control_type())
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} {} '{}'", self.control_type(), self.id(), name),
            None => write!(f, "{} {}", self.control_type(), self.id()),
        }
    }
}

/// Iterator over an element's ancestors
pub struct Ancestors<'a> {
    next: Option<Element<'a>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ElementTree {
        ElementTree::from_root(
            ElementData::new(ControlType::WINDOW)
                .with_name("Main")
                .with_child(
                    ElementData::new(ControlType::PANE)
                        .with_child(ElementData::new(ControlType::BUTTON).with_name("OK"))
                        .with_child(ElementData::new(ControlType::BUTTON).with_name("Cancel")),
                )
                .with_child(ElementData::new(ControlType::STATUS_BAR)),
        )
    }

    #[test]
    fn test_from_root_preorder() {
        let tree = sample();
        let types: Vec<ControlType> = tree.iter().map(|e| e.control_type()).collect();

        assert_eq!(
            types,
            vec![
                ControlType::WINDOW,
                ControlType::PANE,
                ControlType::BUTTON,
                ControlType::BUTTON,
                ControlType::STATUS_BAR,
            ]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_children_follow_parent() {
        let tree = sample();
        for element in tree.iter() {
            for child in element.children() {
                assert!(child.index() > element.index());
                assert_eq!(child.parent(), Some(element));
            }
        }
    }

    #[test]
    fn test_post_order() {
        let tree = sample();
        let names: Vec<String> = tree
            .post_order()
            .iter()
            .map(|e| e.name().unwrap_or("-").to_string())
            .collect();

        assert_eq!(names, vec!["OK", "Cancel", "-", "-", "Main"]);
    }

    #[test]
    fn test_default_ids_are_indices() {
        let tree = sample();
        assert_eq!(tree.root().id(), ElementId(0));
        assert!(tree.find(ElementId(3)).is_some_and(|e| e.name() == Some("Cancel")));
    }

    #[test]
    fn test_default_ids_skip_explicit_ids() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::WINDOW)
                .with_child(ElementData::new(ControlType::BUTTON).with_id(0))
                .with_child(ElementData::new(ControlType::BUTTON)),
        );
        let ids: Vec<ElementId> = tree.iter().map(|e| e.id()).collect();

        assert_eq!(ids, vec![ElementId(3), ElementId(0), ElementId(2)]);
        assert_eq!(tree.find(ElementId(0)), tree.get(1));
    }

    #[test]
    fn test_default_ids_above_large_explicit_id() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::PANE)
                .with_child(ElementData::new(ControlType::TEXT).with_id(0))
                .with_child(ElementData::new(ControlType::TEXT).with_id(40)),
        );
        let ids: Vec<ElementId> = tree.iter().map(|e| e.id()).collect();

        assert_eq!(ids, vec![ElementId(41), ElementId(0), ElementId(40)]);
    }

    #[test]
    fn test_repeated_ids() {
        let data = ElementData::new(ControlType::LIST)
            .with_id(5)
            .with_child(ElementData::new(ControlType::LIST_ITEM).with_id(5))
            .with_child(ElementData::new(ControlType::LIST_ITEM).with_id(6));

        let tree = ElementTree::from_root(data.clone());
        let ids: Vec<ElementId> = tree.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![ElementId(5), ElementId(7), ElementId(6)]);

        assert!(matches!(
            ElementTree::try_from_root(data),
            Err(TreeError::DuplicateId(ElementId(5)))
        ));
    }

    #[test]
    fn test_from_json_rejects_repeated_ids() {
        let json = r#"{ "id": 1, "control_type": 50033, "children": [ { "id": 1 } ] }"#;

        let err = ElementTree::from_json(json).unwrap_err();
        assert!(matches!(err, TreeError::DuplicateId(ElementId(1))));
        assert_eq!(err.to_string(), "Duplicate element id: #1");
        assert!(matches!(ElementTree::from_json("{"), Err(TreeError::Json(_))));
    }

    #[test]
    fn test_ancestors_and_depth() {
        let tree = sample();
        let ok = tree.get(2).unwrap();

        assert_eq!(ok.depth(), 2);
        let ancestors: Vec<ControlType> = ok.ancestors().map(|e| e.control_type()).collect();
        assert_eq!(ancestors, vec![ControlType::PANE, ControlType::WINDOW]);
        assert!(tree.root().is_root());
        assert_eq!(tree.root().parent(), None);
    }

    #[test]
    fn test_capabilities_and_framework() {
        let tree = ElementTree::from_root(
            ElementData::new(ControlType::LIST)
                .with_capability(Capability::Scroll)
                .with_framework(Framework::Wpf),
        );
        let list = tree.root();

        assert!(list.supports(Capability::Scroll));
        assert!(!list.supports(Capability::Selection));
        assert_eq!(list.framework(), Framework::Wpf);
    }

    #[test]
    fn test_framework_from_id() {
        assert_eq!(Framework::from_id("XAML"), Framework::Xaml);
        assert_eq!(Framework::from_id("wpf"), Framework::Wpf);
        assert_eq!(Framework::from_id(""), Framework::Unknown);
        assert_eq!(Framework::from_id("Qt"), Framework::Other("Qt".to_string()));
    }

    #[test]
    fn test_control_type_display() {
        assert_eq!(ControlType::SCROLL_BAR.to_string(), "ScrollBar");
        assert_eq!(ControlType::APP_BAR.to_string(), "AppBar");
        assert_eq!(ControlType(42).to_string(), "ControlType(42)");
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": 7,
            "control_type": 50032,
            "properties": { "30005": { "Text": "Main" } },
            "bounding_rect": { "left": 0, "top": 0, "right": 800, "bottom": 600 },
            "children": [ { "control_type": 50000 } ]
        }"#;

        let tree = ElementTree::from_json(json).unwrap();
        let root = tree.root();
        assert_eq!(root.id(), ElementId(7));
        assert_eq!(root.name(), Some("Main"));
        assert_eq!(root.bounding_rect(), Some(Rect::new(0, 0, 800, 600)));
        assert_eq!(root.child_count(), 1);
        assert_eq!(tree.get(1).unwrap().control_type(), ControlType::BUTTON);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut data = ElementData::new(ControlType::TEXT);
        for _ in 0..10_000 {
            data = ElementData::new(ControlType::GROUP).with_child(data);
        }
        let tree = ElementTree::from_root(data);

        assert_eq!(tree.len(), 10_001);
        assert_eq!(tree.post_order().len(), 10_001);
        assert_eq!(tree.get(10_000).unwrap().depth(), 10_000);
    }
}
