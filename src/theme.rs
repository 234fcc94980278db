use serde::{Deserialize, Serialize};

const CLASSIC_PALETTE: [&str; 10] = [
    "#2980b9", "#e74c3c", "#f1c40f", "#27ae60", "#8e44ad", "#d35400", "#16a085", "#c0392b",
    "#7f8c8d", "#3498db",
];

const MODERN_PALETTE: [&str; 8] = [
    "#4C6EF5", "#F76707", "#2B8A3E", "#AE3EC9", "#1098AD", "#E8590C", "#5C7CFA", "#C2255C",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub label_color: String,
    pub background: String,
    pub caption_color: String,
    pub caption_font_size: f32,
    pub link_width: f32,
    pub corner_radius: f32,
    /// Node fills, handed out in creation order and wrapped around.
    pub palette: Vec<String>,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Segoe UI, Inter, system-ui, sans-serif".to_string(),
            label_color: "#FFFFFF".to_string(),
            background: "#ECF0F1".to_string(),
            caption_color: "#7F8C8D".to_string(),
            caption_font_size: 12.0,
            link_width: 2.0,
            corner_radius: 15.0,
            palette: CLASSIC_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            label_color: "#FFFFFF".to_string(),
            background: "#F8FAFF".to_string(),
            caption_color: "#7A8AA6".to_string(),
            caption_font_size: 11.0,
            link_width: 1.6,
            corner_radius: 12.0,
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }

    pub fn palette_color(&self, index: usize) -> String {
        if self.palette.is_empty() {
            return "#2980B9".to_string();
        }
        self.palette[index % self.palette.len()].clone()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
