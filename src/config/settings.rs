use std::path::Path;

use serde::Deserialize;

/// Points per inch in PDF user space; render scale = dpi / 72.
pub const BASE_DPI: f32 = 72.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_stamps: usize,
    pub allowed_stamp_type: String,
    pub thumbnail_timeout_ms: u64,
    pub render_dpi: u32,
    pub canvas_margin_px: u32,
    pub canvas_height_ratio: f32,
    pub container_width_px: u32,
    pub container_height_px: u32,
    pub stamp_width_px: u32,
    pub delete_affordance_px: u32,
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub debug_log: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_stamps: 5,
            allowed_stamp_type: "image/png".to_string(),
            thumbnail_timeout_ms: 10_000,
            render_dpi: 300,
            canvas_margin_px: 20,
            canvas_height_ratio: 1.4,
            container_width_px: 800,
            container_height_px: 1000,
            stamp_width_px: 100,
            delete_affordance_px: 30,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            debug_log: false,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::StampError::config(format!("Failed to parse settings YAML: {e}"))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// 値の範囲を検証する。
    ///
    /// サーフェス幅はマージンより大きく、高さ比は1以上でなければならない。
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.max_stamps == 0 {
            return Err(crate::error::StampError::config("max_stamps must be > 0"));
        }
        if self.thumbnail_timeout_ms == 0 {
            return Err(crate::error::StampError::config(
                "thumbnail_timeout_ms must be > 0",
            ));
        }
        if self.render_dpi == 0 {
            return Err(crate::error::StampError::config("render_dpi must be > 0"));
        }
        if self.container_width_px <= self.canvas_margin_px {
            return Err(crate::error::StampError::config(format!(
                "container_width_px ({}) must exceed canvas_margin_px ({})",
                self.container_width_px, self.canvas_margin_px
            )));
        }
        if !(self.canvas_height_ratio >= 1.0) {
            return Err(crate::error::StampError::config(format!(
                "canvas_height_ratio must be >= 1.0, got {}",
                self.canvas_height_ratio
            )));
        }
        if self.stamp_width_px == 0 {
            return Err(crate::error::StampError::config("stamp_width_px must be > 0"));
        }
        validate_page_size(self.page_width_mm, self.page_height_mm)
    }

    /// Render scale derived from the configured DPI.
    pub fn render_scale(&self) -> f32 {
        self.render_dpi as f32 / BASE_DPI
    }
}

pub(crate) fn validate_page_size(width_mm: f64, height_mm: f64) -> crate::error::Result<()> {
    if !(width_mm > 0.0 && height_mm > 0.0) || !width_mm.is_finite() || !height_mm.is_finite() {
        return Err(crate::error::StampError::config(format!(
            "page size must be positive, got {width_mm}x{height_mm} mm"
        )));
    }
    Ok(())
}
