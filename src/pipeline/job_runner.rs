// ジョブ単位: PDF読込 -> サムネイル生成 -> ページ選択 -> スタンプ配置 -> 出力

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::job::{Job, Placement};
use crate::config::merged::MergedConfig;
use crate::config::settings::Settings;
use crate::document::Document;
use crate::error::StampError;
use crate::render::DocumentRenderer;
use crate::session::DocumentSession;
use crate::stamp::registry::StampUpload;
use crate::thumbnail::generator::ThumbnailGenerator;

/// Configuration for a single job, with paths resolved.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    /// 1-based page whose raster becomes the surface background.
    pub page: u32,
    pub stamp_paths: Vec<PathBuf>,
    pub placements: Vec<Placement>,
    pub output_png: Option<PathBuf>,
    pub output_pdf: Option<PathBuf>,
    pub merged: MergedConfig,
}

impl JobConfig {
    /// Validate `job`, merge it over `settings` and resolve its paths
    /// against `job_dir`.
    pub fn from_job(job: &Job, settings: &Settings, job_dir: &Path) -> crate::error::Result<Self> {
        job.validate()?;
        let merged = MergedConfig::new(settings, job);
        merged.validate()?;
        Ok(Self {
            input_path: resolve_path(job_dir, &job.input),
            page: job.page,
            stamp_paths: job.stamps.iter().map(|s| resolve_path(job_dir, s)).collect(),
            placements: job.placements.clone(),
            output_png: job.output_png.as_deref().map(|p| resolve_path(job_dir, p)),
            output_pdf: job.output_pdf.as_deref().map(|p| resolve_path(job_dir, p)),
            merged,
        })
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.output_png.iter().chain(self.output_pdf.iter()).map(PathBuf::as_path)
    }
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub pages_rendered: usize,
    pub stamps_placed: usize,
    /// Page count of the paginated output, when one was written.
    pub pdf_pages: Option<usize>,
    pub outputs: Vec<PathBuf>,
    /// User-facing messages, e.g. stamps dropped at the registry cap.
    pub warnings: Vec<String>,
}

/// Run a single stamping job.
pub fn run_job(
    config: &JobConfig,
    renderer: Arc<dyn DocumentRenderer>,
) -> crate::error::Result<JobResult> {
    let document = Document::open(&config.input_path)?;
    let Some((width_pts, height_pts)) = document.page_size_pts(config.page) else {
        return Err(StampError::PageNotAvailable(config.page));
    };
    debug!(
        input = %config.input_path.display(),
        page = config.page,
        width_pts,
        height_pts,
        "selected page"
    );

    let merged = &config.merged;
    let mut session = DocumentSession::new(merged)?;
    session.upload_document(document);

    let generator =
        ThumbnailGenerator::new(renderer, merged.render_scale(), merged.thumbnail_timeout())?;
    let pages_rendered = session.load_thumbnails(&generator)?;
    session.select_page(config.page)?;

    let uploads = config
        .stamp_paths
        .iter()
        .map(|p| StampUpload::from_path(p))
        .collect::<crate::error::Result<Vec<_>>>()?;
    let first_slot = session.stamps().len();
    let candidate_slots = candidate_slots(&uploads, session.stamps().allowed_type(), first_slot);
    let report = session.register_stamps(uploads);
    let mut warnings = Vec::new();
    if let Some(message) = report.warning {
        warn!(input = %config.input_path.display(), "{message}");
        warnings.push(message);
    }

    // ジョブのスタンプ番号 -> 登録済みスタンプ番号。落とされたスタンプへの配置はエラー
    for placement in &config.placements {
        let index = candidate_slots
            .get(placement.stamp)
            .copied()
            .flatten()
            .filter(|&slot| slot < first_slot + report.accepted)
            .ok_or_else(|| {
                let path = config
                    .stamp_paths
                    .get(placement.stamp)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                StampError::stamp_upload(format!(
                    "placement refers to stamp {} ({path}) which was not registered",
                    placement.stamp
                ))
            })?;
        session.place_stamp_at(index, placement.position())?;
    }

    let mut outputs = Vec::new();
    if let Some(path) = &config.output_png {
        let raster = session.export_raster()?;
        write_output(path, raster.as_bytes())?;
        outputs.push(path.clone());
    }
    let mut pdf_pages = None;
    if let Some(path) = &config.output_pdf {
        let bytes = session.export_paginated(merged.page_width_mm, merged.page_height_mm)?;
        pdf_pages = Some(crate::pdf::reader::PdfReader::from_bytes(&bytes)?.page_count() as usize);
        write_output(path, &bytes)?;
        outputs.push(path.clone());
    }

    info!(
        input = %config.input_path.display(),
        pages_rendered,
        stamps = config.placements.len(),
        "job complete"
    );

    Ok(JobResult {
        input_path: config.input_path.clone(),
        pages_rendered,
        stamps_placed: session.surface().overlay_count(),
        pdf_pages,
        outputs,
        warnings,
    })
}

/// Registry index each upload lands at if the cap lets it through, or `None`
/// when its type is filtered out. Mirrors the order [`StampRegistry::register`]
/// keeps.
///
/// [`StampRegistry::register`]: crate::stamp::registry::StampRegistry::register
fn candidate_slots(
    uploads: &[StampUpload],
    allowed_type: &str,
    first_slot: usize,
) -> Vec<Option<usize>> {
    let mut next = first_slot;
    uploads
        .iter()
        .map(|u| {
            (u.mime_type == allowed_type).then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

fn write_output(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
