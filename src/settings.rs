//! Widget display settings
//!
//! Numeric/color knobs injected by the hosting widget. The engine only
//! reads the link palette (link colors are derived from the relation
//! type at record time); everything else passes through to the render
//! adapter untouched.

use serde::{Deserialize, Serialize};

use crate::model::{EntityKind, RelationType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphSettings {
    pub background_color: String,
    pub asset_node_color: String,
    pub device_node_color: String,
    pub collapsed_node_color: String,
    pub node_size: u32,
    pub link_distance: u32,
    pub link_width: u32,
    pub link_arrow_length: u32,
    pub link_color: String,
    pub link_managed_devices_color: String,
    pub root_node_special_settings: bool,
    pub root_node_size: u32,
    pub root_node_color: String,
    pub fix_position_after_drag: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            background_color: "#a7c1dE".to_string(),
            asset_node_color: "#ffffaa".to_string(),
            device_node_color: "#ffffff".to_string(),
            collapsed_node_color: "#008000".to_string(),
            node_size: 100,
            link_distance: 100,
            link_width: 5,
            link_arrow_length: 15,
            link_color: "#f0f0f0".to_string(),
            link_managed_devices_color: "#f9a19b".to_string(),
            root_node_special_settings: true,
            root_node_size: 500,
            root_node_color: "#f9a19b".to_string(),
            fix_position_after_drag: true,
        }
    }
}

impl GraphSettings {
    /// Display color for a link of the given relation type.
    pub fn link_color_for(&self, relation_type: RelationType) -> &str {
        match relation_type {
            RelationType::Contains => &self.link_color,
            RelationType::Manages => &self.link_managed_devices_color,
        }
    }

    /// Display color for a node, applying root and collapsed overrides.
    pub fn node_color_for(&self, kind: EntityKind, is_root: bool, collapsed: bool) -> &str {
        if collapsed {
            return &self.collapsed_node_color;
        }
        if is_root && self.root_node_special_settings {
            return &self.root_node_color;
        }
        match kind {
            EntityKind::Asset => &self.asset_node_color,
            EntityKind::Device => &self.device_node_color,
        }
    }

    /// Node size, applying the root override.
    pub fn node_size_for(&self, is_root: bool) -> u32 {
        if is_root && self.root_node_special_settings {
            self.root_node_size
        } else {
            self.node_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_partial_json() {
        let settings: GraphSettings =
            serde_json::from_str(r##"{"nodeSize": 42, "linkColor": "#123456"}"##).unwrap();
        assert_eq!(settings.node_size, 42);
        assert_eq!(settings.link_color, "#123456");
        assert_eq!(settings.link_distance, 100);
        assert_eq!(settings.link_color_for(RelationType::Contains), "#123456");
        assert_eq!(
            settings.link_color_for(RelationType::Manages),
            "#f9a19b"
        );
    }

    #[test]
    fn collapsed_color_wins_over_root_color() {
        let settings = GraphSettings::default();
        assert_eq!(
            settings.node_color_for(EntityKind::Asset, true, true),
            "#008000"
        );
        assert_eq!(
            settings.node_color_for(EntityKind::Asset, true, false),
            "#f9a19b"
        );
        assert_eq!(settings.node_size_for(true), 500);
    }
}
