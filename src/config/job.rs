use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    pub input: String,
    /// 1-based page number whose image becomes the surface background.
    pub page: u32,
    #[serde(default)]
    pub stamps: Vec<String>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    pub output_png: Option<String>,
    pub output_pdf: Option<String>,
    pub render_dpi: Option<u32>,
    pub thumbnail_timeout_ms: Option<u64>,
    pub canvas_height_ratio: Option<f32>,
    pub page_width_mm: Option<f64>,
    pub page_height_mm: Option<f64>,
}

/// スタンプ配置指定。位置を省略するとファクトリの既定位置に置かれる。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Placement {
    /// 0-based index into the job's `stamps` list.
    pub stamp: usize,
    pub left: Option<f32>,
    pub top: Option<f32>,
}

impl Placement {
    /// 明示位置（left/top両方指定時のみ）を返す。
    pub fn position(&self) -> Option<(f32, f32)> {
        match (self.left, self.top) {
            (Some(left), Some(top)) => Some((left, top)),
            _ => None,
        }
    }
}

impl Job {
    /// ジョブ単体で判定できる制約を検証する。
    ///
    /// - ページ番号は1以上
    /// - 出力（PNGまたはPDF）が少なくとも1つ指定されている
    /// - 配置のスタンプ番号が `stamps` の範囲内
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.page == 0 {
            return Err(crate::error::StampError::config(
                "page must be >= 1 (pages are 1-based)",
            ));
        }
        if self.output_png.is_none() && self.output_pdf.is_none() {
            return Err(crate::error::StampError::config(format!(
                "job for '{}' has neither output_png nor output_pdf",
                self.input
            )));
        }
        for placement in &self.placements {
            if placement.stamp >= self.stamps.len() {
                return Err(crate::error::StampError::config(format!(
                    "placement refers to stamp {} but only {} stamp(s) listed",
                    placement.stamp,
                    self.stamps.len()
                )));
            }
            if placement.left.is_some() != placement.top.is_some() {
                return Err(crate::error::StampError::config(
                    "placement must give both left and top, or neither",
                ));
            }
        }
        Ok(())
    }
}
