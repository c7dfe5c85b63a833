use crate::commands::{print_json, Context};
use crate::util::resolve_offer;
use anyhow::Result;
use clap::{Args, Subcommand};
use phonesift_core::time::{format_timestamp, now_utc};
use phonesift_core::{normalize_olx_id, InvalidPhone, Offer, PhoneRecord};
use phonesift_jobs::events::{offer_parsed, OfferParsedReport};
use phonesift_jobs::StoreQueue;
use phonesift_store::repo::OfferNew;
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum OfferCommand {
    /// Store a scraped offer and queue its follow-up jobs
    Add(OfferAddArgs),
    Show(OfferShowArgs),
}

#[derive(Debug, Args)]
pub struct OfferAddArgs {
    #[arg(long)]
    pub olx_id: String,
    /// Raw phone string as scraped; repeat for several
    #[arg(long = "phone")]
    pub phones: Vec<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, requires = "location")]
    pub region: Option<String>,
}

#[derive(Debug, Args)]
pub struct OfferShowArgs {
    /// Internal offer id or OLX id
    pub id: String,
}

#[derive(Debug, Serialize)]
struct OfferAddedDto {
    offer: Offer,
    #[serde(flatten)]
    report: OfferParsedReport,
}

#[derive(Debug, Serialize)]
struct OfferDetailDto {
    #[serde(flatten)]
    offer: Offer,
    region: Option<String>,
    linked_phones: Vec<PhoneRecord>,
    invalid_phones: Vec<InvalidPhone>,
}

pub fn add_offer(ctx: &Context<'_>, args: OfferAddArgs) -> Result<()> {
    let now = now_utc();
    let olx_id = normalize_olx_id(&args.olx_id)?;
    let location_id = match args.location.as_deref() {
        Some(name) => Some(
            ctx.store
                .locations()
                .upsert(name, args.region.as_deref())?
                .id,
        ),
        None => None,
    };
    let offer = ctx.store.offers().create(
        now,
        OfferNew {
            olx_id,
            phones: args.phones,
            location_id,
        },
    )?;
    let queue = StoreQueue::new(ctx.store);
    let report = offer_parsed(ctx.store, &queue, now, &offer)?;

    if ctx.json {
        print_json(&OfferAddedDto { offer, report })?;
    } else {
        println!("offer {} stored as {}", offer.olx_id, offer.id);
        if report.detect_dispatched {
            println!("phone detection queued");
        }
    }
    Ok(())
}

pub fn show_offer(ctx: &Context<'_>, args: OfferShowArgs) -> Result<()> {
    let offer = resolve_offer(ctx.store, &args.id)?;
    let region = ctx.store.offers().region(offer.id)?;
    let linked_phones = ctx.store.offer_phones().list_for_offer(offer.id)?;
    let invalid_phones = ctx.store.invalid_phones().list_for_offer(offer.id)?;

    if ctx.json {
        print_json(&OfferDetailDto {
            offer,
            region,
            linked_phones,
            invalid_phones,
        })?;
        return Ok(());
    }

    println!("{} ({})", offer.olx_id, offer.id);
    println!("region: {}", region.as_deref().unwrap_or("-"));
    println!("updated: {}", format_timestamp(offer.updated_at));
    if offer.phones.is_empty() {
        println!("raw phones: none");
    } else {
        println!("raw phones:");
        for raw in &offer.phones {
            println!("  {raw}");
        }
    }
    if !linked_phones.is_empty() {
        println!("linked phones:");
        for phone in &linked_phones {
            println!("  {} ({} offers)", phone.phone, phone.offer_count);
        }
    }
    if !invalid_phones.is_empty() {
        println!("invalid phones:");
        for invalid in &invalid_phones {
            println!("  {:?}", invalid.phone);
        }
    }
    Ok(())
}
