use crate::commands::{print_json, Context};
use crate::util::resolve_offer;
use anyhow::Result;
use clap::Args;
use phonesift_core::rules::queues::DETECT_PHONES_QUEUE;
use phonesift_core::time::now_utc;
use phonesift_jobs::detect::DetectPhones;
use phonesift_jobs::{JobContext, StoreQueue, Task, TaskQueue};

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Internal offer id or OLX id
    pub offer: String,
    /// Run detection now instead of queueing a job
    #[arg(long)]
    pub inline: bool,
}

pub fn detect(ctx: &Context<'_>, args: DetectArgs) -> Result<()> {
    let offer = resolve_offer(ctx.store, &args.offer)?;
    let queue = StoreQueue::new(ctx.store);
    let now = now_utc();

    if !args.inline {
        queue.dispatch(
            now,
            DETECT_PHONES_QUEUE,
            &Task::DetectPhones { offer_id: offer.id },
        )?;
        if ctx.json {
            print_json(&serde_json::json!({ "offer_id": offer.id, "queued": true }))?;
        } else {
            println!("phone detection queued for {}", offer.olx_id);
        }
        return Ok(());
    }

    let job_ctx = JobContext {
        store: ctx.store,
        queue: &queue,
        now_utc: now,
    };
    let report = DetectPhones::new(offer.id).handle(&job_ctx)?;

    if ctx.json {
        print_json(&report)?;
        return Ok(());
    }

    for phone in &report.linked {
        println!("linked {phone}");
    }
    for phone in &report.already_linked {
        println!("already linked {phone}");
    }
    for phone in &report.invalid {
        println!("invalid {phone:?}");
    }
    if report.release {
        println!("offer has invalid phones; a queued run would be retried");
    }
    Ok(())
}
