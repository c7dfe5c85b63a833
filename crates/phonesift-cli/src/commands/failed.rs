use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use phonesift_core::time::format_timestamp;
use phonesift_core::JobId;
use serde::Serialize;

#[derive(Debug, Args)]
pub struct FailedArgs {}

#[derive(Debug, Serialize)]
struct FailedJobDto {
    id: JobId,
    queue: String,
    payload: String,
    attempts: i64,
    failed_at: Option<i64>,
    last_error: Option<String>,
}

pub fn list_failed(ctx: &Context<'_>, _args: FailedArgs) -> Result<()> {
    let items: Vec<FailedJobDto> = ctx
        .store
        .jobs()
        .list_failed()?
        .into_iter()
        .map(|job| FailedJobDto {
            id: job.id,
            queue: job.queue,
            payload: job.payload,
            attempts: job.attempts,
            failed_at: job.failed_at,
            last_error: job.last_error,
        })
        .collect();

    if ctx.json {
        print_json(&items)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("no failed jobs");
        return Ok(());
    }
    for item in items {
        let failed_at = item
            .failed_at
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} [{}] attempts={} failed={} {}",
            item.id,
            item.queue,
            item.attempts,
            failed_at,
            item.last_error.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
