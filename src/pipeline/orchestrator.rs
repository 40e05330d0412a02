// 全ジョブ実行

use std::sync::Arc;

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};
use crate::render::DocumentRenderer;

/// Run multiple jobs, collecting results.
/// One job failure does NOT prevent other jobs from running.
pub fn run_all_jobs(
    jobs: &[JobConfig],
    renderer: Arc<dyn DocumentRenderer>,
) -> Vec<crate::error::Result<JobResult>> {
    jobs.iter()
        .map(|job| run_job(job, Arc::clone(&renderer)))
        .collect()
}
