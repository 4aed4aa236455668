use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Deepest grammar nesting either pass will follow.
    pub max_depth: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub split_productions: bool,
    pub link_identifiers: bool,
    pub stylesheet: Option<String>,
    pub scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            split_productions: false,
            link_identifiers: true,
            stylesheet: None,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    font_weight: Option<String>,
    line_color: Option<String>,
    line_width: Option<f32>,
    box_fill: Option<String>,
    text_color: Option<String>,
    literal_color: Option<String>,
    identifier_color: Option<String>,
    other_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    split_productions: Option<bool>,
    link_identifiers: Option<bool>,
    stylesheet: Option<String>,
    scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme, keeping classic"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.font_weight {
            config.theme.font_weight = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.box_fill {
            config.theme.box_fill = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.literal_color {
            config.theme.literal_color = v;
        }
        if let Some(v) = vars.identifier_color {
            config.theme.identifier_color = v;
        }
        if let Some(v) = vars.other_color {
            config.theme.other_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.max_depth {
            if v == 0 {
                tracing::warn!("layout.maxDepth must be positive, keeping {}", config.layout.max_depth);
            } else {
                config.layout.max_depth = v;
            }
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.split_productions {
            config.render.split_productions = v;
        }
        if let Some(v) = render.link_identifiers {
            config.render.link_identifiers = v;
        }
        if render.stylesheet.is_some() {
            config.render.stylesheet = render.stylesheet;
        }
        if let Some(v) = render.scale {
            if v > 0.0 && v.is_finite() {
                config.render.scale = v;
            } else {
                tracing::warn!(scale = v, "ignoring non-positive render.scale");
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.layout.max_depth, 512);
        assert!(config.render.link_identifiers);
        assert!(!config.render.split_productions);
        assert_eq!(config.theme.font_family, Theme::classic().font_family);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse_config(
            r##"{
                "theme": "modern",
                "themeVariables": { "lineColor": "#ff0000", "fontSize": 14 },
                "layout": { "maxDepth": 64 },
                "render": { "splitProductions": true, "stylesheet": "rail.css", "scale": 2 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.theme.background, Theme::modern().background);
        assert_eq!(config.layout.max_depth, 64);
        assert!(config.render.split_productions);
        assert_eq!(config.render.stylesheet.as_deref(), Some("rail.css"));
        assert_eq!(config.render.scale, 2.0);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let config = parse_config(r#"{ "layout": { "maxDepth": 0 }, "render": { "scale": -1 } }"#)
            .unwrap();
        assert_eq!(config.layout.max_depth, 512);
        assert_eq!(config.render.scale, 1.0);
        assert!(parse_config("not json").is_err());
    }
}
