use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use pdf_stamper::config::job::JobFile;
use pdf_stamper::config::settings::Settings;
use pdf_stamper::config::{self};
use pdf_stamper::logging;
use pdf_stamper::pipeline::job_runner::JobConfig;
use pdf_stamper::pipeline::orchestrator::run_all_jobs;
use pdf_stamper::render::DocumentRenderer;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: pdf_stamper <jobs.yaml>...");
        eprintln!("  Place stamp images on a PDF page and export PNG/PDF per job.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_stamper {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    // Load settings and parse every job file before anything runs.
    let mut loaded: Vec<(PathBuf, Settings, JobFile)> = Vec::new();
    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        loaded.push((job_dir, settings, job_file));
    }

    logging::init(loaded.iter().any(|(_, settings, _)| settings.debug_log));

    let mut job_configs: Vec<JobConfig> = Vec::new();
    for (job_dir, settings, job_file) in &loaded {
        for job in &job_file.jobs {
            match JobConfig::from_job(job, settings, job_dir) {
                Ok(c) => job_configs.push(c),
                Err(e) => {
                    eprintln!("ERROR: {}: {e}", job.input);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    let Some(renderer) = default_renderer() else {
        eprintln!("ERROR: pdf_stamper was built without a rendering backend (feature `pdfium`)");
        return ExitCode::FAILURE;
    };

    let results = run_all_jobs(&job_configs, renderer);

    let mut has_error = false;
    for (job, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => {
                for warning in &job_result.warnings {
                    eprintln!("WARN: {}: {warning}", job_result.input_path.display());
                }
                let outputs: Vec<String> = job_result
                    .outputs
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                eprintln!(
                    "OK: {} -> {} ({} pages rendered, {} stamps)",
                    job_result.input_path.display(),
                    outputs.join(", "),
                    job_result.pages_rendered,
                    job_result.stamps_placed
                );
            }
            Err(e) => {
                let outputs: Vec<String> =
                    job.outputs().map(|p| p.display().to_string()).collect();
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job.input_path.display(),
                    outputs.join(", ")
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(feature = "pdfium")]
fn default_renderer() -> Option<Arc<dyn DocumentRenderer>> {
    Some(Arc::new(pdf_stamper::render::pdfium::PdfiumRenderer::new()))
}

#[cfg(not(feature = "pdfium"))]
fn default_renderer() -> Option<Arc<dyn DocumentRenderer>> {
    None
}
