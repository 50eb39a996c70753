//! `reelgen generate` - submit a job, watch it, settle it.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;

use crate::cli::AppContext;
use crate::cli::args::GenerateArgs;
use crate::core::models::{GenerationParams, JobStatus};
use crate::core::poller::{GenerationPoller, PollerConfig};
use crate::core::pricing::estimate_credits;
use crate::core::settlement::{CreditSettlement, SettleOutcome};
use crate::error::{ReelgenError, Result};
use crate::storage::gallery::GalleryStore;
use crate::storage::registry::ProcessedJobRegistry;
use crate::util::format::{format_credits, format_duration_secs};

/// Run the generate command.
///
/// # Errors
///
/// Returns error when the balance gate rejects the job, submission fails,
/// or the job ends in an error state.
pub async fn run(args: GenerateArgs) -> Result<()> {
    let ctx = AppContext::build()?;

    let params = GenerationParams {
        topic: args.topic.clone(),
        voice_tier: args.params.voice.into(),
        frame_interval: args.params.frame_interval(),
        duration_hint_secs: args.params.duration,
        script_model: args.script_model.clone(),
    };

    let estimate = estimate_credits(
        f64::from(params.duration_hint_secs),
        params.voice_tier,
        params.frame_interval,
    );
    println!(
        "Estimated cost: {} ({}s at {} voice, {}s frames)",
        format_credits(estimate).bold(),
        params.duration_hint_secs,
        params.voice_tier,
        params.frame_interval.as_secs()
    );

    if !args.no_gate {
        let balance = ctx.ledger.check_balance(false).await;
        if balance < estimate {
            return Err(ReelgenError::InsufficientCredits {
                needed: estimate,
                available: balance,
            });
        }
    }

    let mut poller = GenerationPoller::new(Arc::clone(&ctx.generation), PollerConfig::default());
    poller.start(params);

    let mut rx = poller.subscribe();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        match snapshot.status {
            JobStatus::Completed | JobStatus::Error => break,
            JobStatus::Polling => {
                print!(
                    "\r{} {:>3}%",
                    "generating".cyan(),
                    snapshot.progress_percent
                );
                std::io::stdout().flush().ok();
            }
            JobStatus::Idle | JobStatus::Generating => {}
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    println!();

    let snapshot = poller.wait_terminal().await;
    if snapshot.status == JobStatus::Error {
        if snapshot.timed_out {
            return Err(ReelgenError::JobTimeout {
                ceiling: PollerConfig::default().max_wait,
            });
        }
        return Err(ReelgenError::JobFailed(
            snapshot
                .error_message
                .unwrap_or_else(|| "unknown failure".to_string()),
        ));
    }

    let result = snapshot
        .result
        .ok_or_else(|| ReelgenError::ParseResponse("completed job carried no result".to_string()))?;

    println!(
        "{} {} ({})",
        "completed:".green().bold(),
        result.topic,
        format_duration_secs(result.audio_duration_secs)
    );
    if let Some(url) = &result.video_url {
        println!("  video:      {url}");
    }
    if let Some(url) = &result.audio_url {
        println!("  audio:      {url}");
    }
    if let Some(url) = &result.transcript_url {
        println!("  transcript: {url}");
    }
    if let Some(url) = &result.images_zip_url {
        println!("  images:     {url}");
    }

    // Settle and record, but never discard a finished job over either step.
    let registry = ProcessedJobRegistry::open(ctx.paths.registry_file());
    let settlement = CreditSettlement::new(Arc::clone(&ctx.ledger), registry);
    match settlement.settle(&result).await {
        SettleOutcome::Settled { charged } => {
            println!("Charged {}.", format_credits(charged));
        }
        SettleOutcome::Partial { charged, shortfall } => {
            println!(
                "{} balance only covered {}; {} short.",
                "warning:".yellow().bold(),
                format_credits(charged),
                format_credits(shortfall)
            );
        }
        SettleOutcome::Deferred { cost } => {
            println!(
                "{} no credits available; {} will be charged on a later attempt.",
                "warning:".yellow().bold(),
                format_credits(cost)
            );
        }
        SettleOutcome::Failed { cost } => {
            println!(
                "{} could not charge {}; the ledger rejected the deduction.",
                "warning:".yellow().bold(),
                format_credits(cost)
            );
        }
        SettleOutcome::AlreadySettled => {}
    }

    let store = GalleryStore::open(&ctx.paths.gallery_db_file())?;
    store.insert_video(&result)?;

    Ok(())
}
