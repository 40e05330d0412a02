use std::time::Duration;

use super::job::Job;
use super::settings::{BASE_DPI, Settings};
use crate::surface::SurfaceConfig;

#[derive(Debug, Clone)]
pub struct MergedConfig {
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
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            max_stamps: settings.max_stamps,
            allowed_stamp_type: settings.allowed_stamp_type.clone(),
            thumbnail_timeout_ms: job
                .thumbnail_timeout_ms
                .unwrap_or(settings.thumbnail_timeout_ms),
            render_dpi: job.render_dpi.unwrap_or(settings.render_dpi),
            canvas_margin_px: settings.canvas_margin_px,
            canvas_height_ratio: job
                .canvas_height_ratio
                .unwrap_or(settings.canvas_height_ratio),
            container_width_px: settings.container_width_px,
            container_height_px: settings.container_height_px,
            stamp_width_px: settings.stamp_width_px,
            delete_affordance_px: settings.delete_affordance_px,
            page_width_mm: job.page_width_mm.unwrap_or(settings.page_width_mm),
            page_height_mm: job.page_height_mm.unwrap_or(settings.page_height_mm),
        }
    }

    /// ジョブ上書きなしのSettingsそのままの設定。
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings, &Job::default())
    }

    /// マージ後の値を検証する（ジョブ側の上書きで範囲外になり得るため）。
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.render_dpi == 0 {
            return Err(crate::error::StampError::config("render_dpi must be > 0"));
        }
        if self.thumbnail_timeout_ms == 0 {
            return Err(crate::error::StampError::config(
                "thumbnail_timeout_ms must be > 0",
            ));
        }
        if !(self.canvas_height_ratio >= 1.0) {
            return Err(crate::error::StampError::config(format!(
                "canvas_height_ratio must be >= 1.0, got {}",
                self.canvas_height_ratio
            )));
        }
        super::settings::validate_page_size(self.page_width_mm, self.page_height_mm)
    }

    pub fn render_scale(&self) -> f32 {
        self.render_dpi as f32 / BASE_DPI
    }

    pub fn thumbnail_timeout(&self) -> Duration {
        Duration::from_millis(self.thumbnail_timeout_ms)
    }

    pub fn surface_config(&self) -> SurfaceConfig {
        SurfaceConfig {
            container_width: self.container_width_px,
            container_height: self.container_height_px,
            margin: self.canvas_margin_px,
            height_ratio: self.canvas_height_ratio,
            ..SurfaceConfig::default()
        }
    }
}
