use concept_map_renderer::generate::HttpResponse;
use concept_map_renderer::text_metrics::ApproximateMeasurer;
use concept_map_renderer::{
    Config, GenerationRequest, RenderOptions, RunToken, Session, TickOutcome, Theme,
    render_with_options,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    caption: Option<String>,
}

#[derive(Debug, Serialize)]
struct RequestParts {
    url: String,
    body: String,
}

fn build_config(options: SessionOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme.as_deref() {
        config.theme = Theme::from_name(name).ok_or_else(|| format!("unknown theme `{name}`"))?;
        config.render.background = config.theme.background.clone();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(caption) = options.caption {
        config.render.caption = caption;
    }
    config.layout.fast_text_metrics = true;
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<SessionOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(SessionOptions::default()),
    }
}

/// One interactive canvas. The page calls `tick(run)` once per animation
/// frame with the run id `load_response` returned; ids from superseded runs
/// are ignored.
#[wasm_bindgen]
pub struct ConceptMapSession {
    session: Session,
    token: Option<RunToken>,
}

impl ConceptMapSession {
    fn create(options_json: Option<String>) -> Result<Self, String> {
        let config = build_config(parse_options(options_json)?)?;
        Ok(Self {
            session: Session::with_measurer(config, Box::new(ApproximateMeasurer)),
            token: None,
        })
    }

    fn request_parts(&mut self, text: &str, api_key: &str) -> Result<String, String> {
        match GenerationRequest::new(text, api_key, &self.session.config().service) {
            Ok(request) => serde_json::to_string(&RequestParts {
                url: request.url,
                body: request.body.to_string(),
            })
            .map_err(|error| error.to_string()),
            Err(error) => {
                self.session.fail(&error);
                self.token = None;
                Err(error.to_string())
            }
        }
    }

    fn load(&mut self, status: u16, body: &str) -> Result<f64, String> {
        let response = HttpResponse {
            status,
            body: body.to_string(),
        };
        let loaded = self.session.load_response(&response);
        self.token = loaded.as_ref().ok().copied();
        loaded
            .map(|token| token.epoch() as f64)
            .map_err(|error| error.to_string())
    }

    fn step(&mut self, run: f64) -> &'static str {
        let Some(token) = self.token.filter(|token| token.epoch() as f64 == run) else {
            return "stale";
        };
        match self.session.tick(token) {
            TickOutcome::Stale => "stale",
            TickOutcome::Advanced(_) => "running",
            TickOutcome::Finished(_) => "finished",
            TickOutcome::Idle => "idle",
        }
    }
}

#[wasm_bindgen]
impl ConceptMapSession {
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<ConceptMapSession, JsValue> {
        Self::create(options_json).map_err(|error| JsValue::from_str(&error))
    }

    /// `{url, body}` for the page to POST; missing text or key surfaces as
    /// an error on the canvas as well.
    pub fn build_request(&mut self, text: &str, api_key: &str) -> Result<String, JsValue> {
        self.request_parts(text, api_key)
            .map_err(|error| JsValue::from_str(&error))
    }

    /// Starts a new run from the service reply and returns its run id.
    pub fn load_response(&mut self, status: u16, body: &str) -> Result<f64, JsValue> {
        self.load(status, body).map_err(|error| JsValue::from_str(&error))
    }

    /// `"running"`, `"finished"`, `"idle"` or `"stale"`.
    pub fn tick(&mut self, run: f64) -> String {
        self.step(run).to_string()
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.token = None;
    }

    pub fn drag_start(&mut self, x: f32, y: f32) -> bool {
        self.session.drag_start(x, y).is_some()
    }

    pub fn drag_move(&mut self, x: f32, y: f32) -> bool {
        self.session.drag_move(x, y)
    }

    pub fn drag_end(&mut self) {
        self.session.drag_end();
    }

    pub fn node_at(&self, x: f32, y: f32) -> Option<u32> {
        self.session.node_at(x, y).map(|index| index as u32)
    }

    /// Hover card for the node under the point, as JSON.
    pub fn node_details(&self, x: f32, y: f32) -> Option<String> {
        let details = self.session.details_at(x, y)?;
        serde_json::to_string(&details).ok()
    }

    pub fn error(&self) -> Option<String> {
        self.session.error().map(str::to_string)
    }

    pub fn render_svg(&self) -> String {
        self.session.render_svg()
    }
}

/// One-shot render of model text straight to SVG.
#[wasm_bindgen]
pub fn render_concept_map_svg(text: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = parse_options(options_json)
        .and_then(build_config)
        .map_err(|error| JsValue::from_str(&error))?;
    render_with_options(text, RenderOptions { config }).map_err(|error| JsValue::from_str(&error.to_string()))
}
