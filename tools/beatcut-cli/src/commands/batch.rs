//! Render a list of jobs on the worker pool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use beatcut_common::AppConfig;
use beatcut_project_model::JobRequest;
use beatcut_render_engine::{RenderPool, StatusRegistry};

pub fn run(config: &AppConfig, jobs: PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&jobs)
        .with_context(|| format!("Failed to read {}", jobs.display()))?;
    let requests: Vec<JobRequest> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid job list in {}", jobs.display()))?;
    println!("Batch: {} jobs from {}", requests.len(), jobs.display());

    let registry = Arc::new(StatusRegistry::new());
    let renderer = Arc::new(super::renderer(config)?.with_status(registry.clone()));
    let pool = RenderPool::new(renderer.clone(), &config.workers)?;

    let mut handles = Vec::with_capacity(requests.len());
    for request in requests {
        let kind = request.kind_name();
        let handle = pool.submit(renderer.job(request))?;
        println!("  queued {} ({kind})", handle.id);
        handles.push(handle);
    }

    let mut failed = 0usize;
    for handle in handles {
        let id = handle.id;
        match handle.wait() {
            Ok(output) => println!(
                "  [OK]   {id} -> {}{}",
                output.path.display(),
                if output.has_audio { "" } else { " (silent)" }
            ),
            Err(err) => {
                failed += 1;
                println!("  [FAIL] {id}: {err}");
            }
        }
    }
    pool.shutdown();

    for status in registry.snapshot() {
        tracing::debug!(job_id = %status.job_id, state = %status.state, progress = status.progress, "Final status");
    }
    if failed > 0 {
        anyhow::bail!("{failed} job(s) failed");
    }
    println!("All jobs completed.");
    Ok(())
}
