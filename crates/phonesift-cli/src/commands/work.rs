use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use phonesift_config::validate_queue_names;
use phonesift_core::time::now_utc;
use phonesift_jobs::{JobResult, Worker, WorkerOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Args)]
pub struct WorkArgs {
    /// Queue to consume, in priority order; defaults to the configured list
    #[arg(long = "queue")]
    pub queues: Vec<String>,
    /// Process everything ready now, then exit
    #[arg(long)]
    pub once: bool,
}

pub fn work(ctx: &Context<'_>, args: WorkArgs) -> Result<()> {
    let queue_config = &ctx.config.queue;
    let queues = if args.queues.is_empty() {
        queue_config.queues.clone()
    } else {
        validate_queue_names(args.queues)?
    };
    let worker = Worker::new(
        ctx.store,
        WorkerOptions {
            queues,
            max_attempts: queue_config.max_attempts,
            retry_after_secs: queue_config.retry_after_secs,
            reserve_timeout_secs: queue_config.reserve_timeout_secs,
            poll_interval: Duration::from_millis(queue_config.poll_interval_ms),
        },
    );

    if !args.once {
        let stop = stop_on_ctrl_c()?;
        return Ok(worker.run(&stop)?);
    }

    let processed = worker.drain(now_utc)?;
    if ctx.json {
        print_json(&processed)?;
        return Ok(());
    }

    if processed.is_empty() {
        println!("no jobs ready");
        return Ok(());
    }
    for job in &processed {
        match &job.result {
            JobResult::Completed => println!("{} {} completed", job.queue, job.id),
            JobResult::Released { available_at } => {
                println!("{} {} released until {}", job.queue, job.id, available_at)
            }
            JobResult::Failed { error } => {
                println!("{} {} failed: {}", job.queue, job.id, error)
            }
        }
    }
    Ok(())
}

/// Flag set on the first Ctrl-C; the worker finishes its current job and exits.
fn stop_on_ctrl_c() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let flag = Arc::clone(&stop);
    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                info!("stop requested, finishing current job");
                flag.store(true, Ordering::Relaxed);
            }
        })?;
    Ok(stop)
}
