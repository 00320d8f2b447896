//! Serializable layout description.
//!
//! [`LayoutConfig`] is both the input accepted by
//! [`LayoutManager::new`](crate::manager::LayoutManager::new) and the output
//! of [`LayoutManager::to_config`](crate::manager::LayoutManager::to_config).
//! Keys are camelCase so layouts saved by browser-based docking libraries
//! load unchanged.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::geometry::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Root,
    Row,
    Column,
    Stack,
    Component,
}

impl ItemType {
    /// Types that may appear in a config. Root is created by the manager.
    pub const CONFIGURABLE: &'static [&'static str] = &["row", "column", "stack", "component"];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Root => "root",
            ItemType::Row => "row",
            ItemType::Column => "column",
            ItemType::Stack => "stack",
            ItemType::Component => "component",
        }
    }

    /// Resolves the `type` key of an item config.
    pub fn parse_configurable(raw: Option<&str>) -> Result<Self, ConfigurationError> {
        match raw {
            None => Err(ConfigurationError::MissingType),
            Some("row") => Ok(ItemType::Row),
            Some("column") => Ok(ItemType::Column),
            Some("stack") => Ok(ItemType::Stack),
            Some("component") => Ok(ItemType::Component),
            Some(other) => Err(ConfigurationError::UnknownType {
                found: other.to_string(),
                valid: Self::CONFIGURABLE,
            }),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item id: a single string until a second id is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Single(String),
    Many(Vec<String>),
}

impl ItemId {
    pub fn contains(&self, id: &str) -> bool {
        match self {
            ItemId::Single(s) => s == id,
            ItemId::Many(ids) => ids.iter().any(|s| s == id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderShow {
    Enabled(bool),
    Position(Side),
}

/// A header control label, or `false` to hide the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderLabel {
    Visible(bool),
    Text(String),
}

impl HeaderLabel {
    pub fn is_hidden(&self) -> bool {
        matches!(self, HeaderLabel::Visible(false))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<HeaderShow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popout: Option<HeaderLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximise: Option<HeaderLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimise: Option<HeaderLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<HeaderLabel>,
}

impl HeaderConfig {
    /// Overlays the keys set in `other` on top of `self`.
    pub fn merged(&self, other: &HeaderConfig) -> HeaderConfig {
        HeaderConfig {
            show: other.show.or(self.show),
            popout: other.popout.clone().or_else(|| self.popout.clone()),
            maximise: other.maximise.clone().or_else(|| self.maximise.clone()),
            minimise: other.minimise.clone().or_else(|| self.minimise.clone()),
            close: other.close.clone().or_else(|| self.close.clone()),
        }
    }
}

/// Persisted shape of a single content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ItemConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_closable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_item_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderConfig>,
    /// Keys this crate does not interpret; carried through `to_config`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemConfig {
    fn typed(kind: ItemType, content: Vec<ItemConfig>) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            content,
            ..Self::default()
        }
    }

    pub fn row(content: Vec<ItemConfig>) -> Self {
        Self::typed(ItemType::Row, content)
    }

    pub fn column(content: Vec<ItemConfig>) -> Self {
        Self::typed(ItemType::Column, content)
    }

    pub fn stack(content: Vec<ItemConfig>) -> Self {
        Self::typed(ItemType::Stack, content)
    }

    pub fn component(name: impl Into<String>) -> Self {
        Self {
            component_name: Some(name.into()),
            ..Self::typed(ItemType::Component, Vec::new())
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(ItemId::Single(id.into()));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_closable(mut self, closable: bool) -> Self {
        self.is_closable = Some(closable);
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.component_state = Some(state);
        self
    }

    pub fn item_type(&self) -> Result<ItemType, ConfigurationError> {
        ItemType::parse_configurable(self.kind.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsiveMode {
    None,
    #[default]
    Onload,
    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub has_headers: bool,
    pub constrain_drag_to_container: bool,
    pub reorder_enabled: bool,
    pub selection_enabled: bool,
    pub popout_whole_stack: bool,
    pub blocked_popouts_throw_error: bool,
    pub close_popouts_on_unload: bool,
    pub show_popout_icon: bool,
    pub show_maximise_icon: bool,
    pub show_close_icon: bool,
    pub responsive_mode: ResponsiveMode,
    pub tab_overlap_allowance: f64,
    pub reorder_on_tab_menu_click: bool,
    pub tab_control_offset: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            has_headers: true,
            constrain_drag_to_container: true,
            reorder_enabled: true,
            selection_enabled: false,
            popout_whole_stack: false,
            blocked_popouts_throw_error: true,
            close_popouts_on_unload: true,
            show_popout_icon: true,
            show_maximise_icon: true,
            show_close_icon: true,
            responsive_mode: ResponsiveMode::Onload,
            tab_overlap_allowance: 0.0,
            reorder_on_tab_menu_click: true,
            tab_control_offset: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dimensions {
    pub border_width: f64,
    pub border_grab_width: f64,
    pub min_item_height: f64,
    pub min_item_width: f64,
    pub header_height: f64,
    pub drag_proxy_width: f64,
    pub drag_proxy_height: f64,
    /// Width of a single tab in a header.
    pub tab_width: f64,
    /// Thickness of the bands along the root's edges that split the whole
    /// layout when an item is dropped inside them.
    pub root_drop_area_size: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            border_width: 5.0,
            border_grab_width: 10.0,
            min_item_height: 10.0,
            min_item_width: 10.0,
            header_height: 20.0,
            drag_proxy_width: 300.0,
            drag_proxy_height: 200.0,
            tab_width: 100.0,
            root_drop_area_size: 50.0,
        }
    }
}

impl Dimensions {
    /// Dimensions sized for a character grid: one-cell borders and headers.
    pub fn terminal() -> Self {
        Self {
            border_width: 1.0,
            border_grab_width: 1.0,
            min_item_height: 3.0,
            min_item_width: 8.0,
            header_height: 1.0,
            drag_proxy_width: 30.0,
            drag_proxy_height: 8.0,
            tab_width: 14.0,
            root_drop_area_size: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Labels {
    pub close: String,
    pub maximise: String,
    pub minimise: String,
    pub popout: String,
    pub popin: String,
    pub tab_dropdown: String,
    pub tab_next_label: String,
    pub tab_previous_label: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            close: "Close".into(),
            maximise: "Maximize".into(),
            minimise: "Minimize".into(),
            popout: "Open in new window".into(),
            popin: "Pop in".into(),
            tab_dropdown: "Additional tabs".into(),
            tab_next_label: "Next".into(),
            tab_previous_label: "Previous".into(),
        }
    }
}

/// Position and size of a popout window in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PopoutDimensions {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopoutConfig {
    #[serde(default)]
    pub dimensions: PopoutDimensions,
    pub content: Vec<ItemConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_in_parent: Option<usize>,
}

/// Top-level layout description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderConfig>,
    pub content: Vec<ItemConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_popouts: Vec<PopoutConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximised_item_id: Option<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LayoutConfig {
    pub fn new(content: Vec<ItemConfig>) -> Self {
        Self {
            settings: Settings::default(),
            dimensions: Dimensions::default(),
            labels: Labels::default(),
            header: None,
            content,
            open_popouts: Vec::new(),
            maximised_item_id: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Parses a layout, reporting a missing or non-array `content` key as a
    /// configuration error rather than a generic parse failure.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        match value.get("content") {
            None => return Err(ConfigurationError::MissingContent),
            Some(Value::Array(_)) => {}
            Some(_) => return Err(ConfigurationError::ContentNotArray),
        }
        let config: LayoutConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigurationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.content.len() > 1 {
            return Err(ConfigurationError::TooManyTopLevelItems);
        }
        Ok(())
    }
}
