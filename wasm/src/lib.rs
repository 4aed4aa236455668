use railroad_rs_renderer::config::Config;
use railroad_rs_renderer::render_with_config;
use railroad_rs_renderer::theme::Theme;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RailroadRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    link_identifiers: Option<bool>,
}

fn build_config(options: RailroadRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(link) = options.link_identifiers {
        config.render.link_identifiers = link;
    }
    config
}

#[wasm_bindgen]
pub fn render_railroad_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<RailroadRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        RailroadRenderOptions::default()
    };

    let config = build_config(options);
    render_with_config(code, &config).map_err(|error| JsValue::from_str(&error.to_string()))
}
