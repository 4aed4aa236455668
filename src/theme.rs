use serde::{Deserialize, Serialize};

use crate::draw::Class;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: String,
    pub line_color: String,
    pub line_width: f32,
    pub box_fill: String,
    pub text_color: String,
    pub literal_color: String,
    pub identifier_color: String,
    pub other_color: String,
    pub background: String,
}

impl Theme {
    /// Monospace labels on black rails.
    pub fn classic() -> Self {
        Self {
            font_family: "Courier, monospace".to_string(),
            font_size: 20.0,
            font_weight: "bold".to_string(),
            line_color: "black".to_string(),
            line_width: 2.0,
            box_fill: "none".to_string(),
            text_color: "black".to_string(),
            literal_color: "green".to_string(),
            identifier_color: "black".to_string(),
            other_color: "blue".to_string(),
            background: "none".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "\"JetBrains Mono\", Menlo, Consolas, monospace".to_string(),
            font_size: 18.0,
            font_weight: "600".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.6,
            box_fill: "#F8FAFF".to_string(),
            text_color: "#1C2430".to_string(),
            literal_color: "#2F7D4A".to_string(),
            identifier_color: "#1C2430".to_string(),
            other_color: "#3B5BDB".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn text_fill(&self, class: Class) -> &str {
        match class {
            Class::Literal => &self.literal_color,
            Class::Identifier => &self.identifier_color,
            Class::Other => &self.other_color,
            _ => &self.text_color,
        }
    }

    pub fn has_background(&self) -> bool {
        !self.background.is_empty() && self.background != "none"
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
