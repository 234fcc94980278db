use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CAPTION: &str = "Concept map generator by Rajat";
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro-latest:generateContent";

/// Tunables of the force simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceConfig {
    pub repulsion: f32,
    pub attraction: f32,
    pub ideal_link_length: f32,
    /// Velocity multiplier applied every step; must stay below 1.
    pub friction: f32,
    pub max_speed: f32,
    pub velocity_threshold: f32,
    pub max_iterations: usize,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion: 50_000.0,
            attraction: 0.01,
            ideal_link_length: 200.0,
            friction: 0.9,
            max_speed: 15.0,
            velocity_threshold: 0.1,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub base_radius: f32,
    pub radius_step: f32,
    pub root_min_width: f32,
    pub topic_min_width: f32,
    pub root_min_height: f32,
    pub topic_min_height: f32,
    pub max_node_width: f32,
    pub label_padding: f32,
    pub root_font_size: f32,
    pub topic_font_size: f32,
    pub root_line_height: f32,
    pub topic_line_height: f32,
    pub fast_text_metrics: bool,
    pub force: ForceConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_radius: 200.0,
            radius_step: 150.0,
            root_min_width: 150.0,
            topic_min_width: 120.0,
            root_min_height: 80.0,
            topic_min_height: 60.0,
            max_node_width: 260.0,
            label_padding: 20.0,
            root_font_size: 16.0,
            topic_font_size: 14.0,
            root_line_height: 20.0,
            topic_line_height: 18.0,
            fast_text_metrics: false,
            force: ForceConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn font_size(&self, level: usize) -> f32 {
        if level == 0 {
            self.root_font_size
        } else {
            self.topic_font_size
        }
    }

    pub fn line_height(&self, level: usize) -> f32 {
        if level == 0 {
            self.root_line_height
        } else {
            self.topic_line_height
        }
    }

    pub fn min_size(&self, level: usize) -> (f32, f32) {
        if level == 0 {
            (self.root_min_width, self.root_min_height)
        } else {
            (self.topic_min_width, self.topic_min_height)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub caption: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#ECF0F1".to_string(),
            caption: DEFAULT_CAPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.4,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
            service: ServiceConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    force: Option<ForceConfigFile>,
    render: Option<RenderConfigFile>,
    service: Option<ServiceConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    label_color: Option<String>,
    background: Option<String>,
    caption_color: Option<String>,
    caption_font_size: Option<f32>,
    link_width: Option<f32>,
    corner_radius: Option<f32>,
    palette: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    base_radius: Option<f32>,
    radius_step: Option<f32>,
    root_min_width: Option<f32>,
    topic_min_width: Option<f32>,
    root_min_height: Option<f32>,
    topic_min_height: Option<f32>,
    max_node_width: Option<f32>,
    label_padding: Option<f32>,
    root_font_size: Option<f32>,
    topic_font_size: Option<f32>,
    root_line_height: Option<f32>,
    topic_line_height: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForceConfigFile {
    repulsion: Option<f32>,
    attraction: Option<f32>,
    ideal_link_length: Option<f32>,
    friction: Option<f32>,
    max_speed: Option<f32>,
    velocity_threshold: Option<f32>,
    max_iterations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    caption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceConfigFile {
    endpoint: Option<String>,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overlays a JSON (or JSON5) config document on the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme `{theme_name}`"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.caption_color {
            config.theme.caption_color = v;
        }
        if let Some(v) = vars.caption_font_size {
            config.theme.caption_font_size = v;
        }
        if let Some(v) = vars.link_width {
            config.theme.link_width = v;
        }
        if let Some(v) = vars.corner_radius {
            config.theme.corner_radius = v;
        }
        if let Some(v) = vars.palette {
            config.theme.palette = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.base_radius {
            target.base_radius = v;
        }
        if let Some(v) = layout.radius_step {
            target.radius_step = v;
        }
        if let Some(v) = layout.root_min_width {
            target.root_min_width = v;
        }
        if let Some(v) = layout.topic_min_width {
            target.topic_min_width = v;
        }
        if let Some(v) = layout.root_min_height {
            target.root_min_height = v;
        }
        if let Some(v) = layout.topic_min_height {
            target.topic_min_height = v;
        }
        if let Some(v) = layout.max_node_width {
            target.max_node_width = v;
        }
        if let Some(v) = layout.label_padding {
            target.label_padding = v;
        }
        if let Some(v) = layout.root_font_size {
            target.root_font_size = v;
        }
        if let Some(v) = layout.topic_font_size {
            target.topic_font_size = v;
        }
        if let Some(v) = layout.root_line_height {
            target.root_line_height = v;
        }
        if let Some(v) = layout.topic_line_height {
            target.topic_line_height = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            target.fast_text_metrics = v;
        }
    }

    if let Some(force) = parsed.force {
        let target = &mut config.layout.force;
        if let Some(v) = force.repulsion {
            target.repulsion = v;
        }
        if let Some(v) = force.attraction {
            target.attraction = v;
        }
        if let Some(v) = force.ideal_link_length {
            target.ideal_link_length = v;
        }
        if let Some(v) = force.friction {
            if !(0.0..1.0).contains(&v) {
                return Err(anyhow::anyhow!("force.friction must be in [0, 1), got {v}"));
            }
            target.friction = v;
        }
        if let Some(v) = force.max_speed {
            target.max_speed = v.abs();
        }
        if let Some(v) = force.velocity_threshold {
            target.velocity_threshold = v;
        }
        if let Some(v) = force.max_iterations {
            target.max_iterations = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.caption {
            config.render.caption = v;
        }
    }

    if let Some(service) = parsed.service {
        if let Some(v) = service.endpoint {
            config.service.endpoint = v;
        }
        if let Some(v) = service.temperature {
            config.service.temperature = v;
        }
        if let Some(v) = service.max_output_tokens {
            config.service.max_output_tokens = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
