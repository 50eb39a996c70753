//! `reelgen balance` and `reelgen estimate` - credit accounting commands.

use colored::Colorize;

use crate::cli::AppContext;
use crate::cli::args::{BalanceArgs, EstimateArgs};
use crate::core::pricing::{actual_credits, estimate_credits};
use crate::error::Result;
use crate::util::format::format_credits;

/// Run the balance command.
///
/// # Errors
///
/// Returns error when configuration cannot be loaded.
pub async fn balance(args: BalanceArgs) -> Result<()> {
    let ctx = AppContext::build()?;
    if !ctx.ledger.is_authenticated() {
        println!("Not signed in; no credits available.");
        return Ok(());
    }
    let balance = ctx.ledger.check_balance(args.refresh).await;
    println!("Remaining: {}", format_credits(balance).bold());
    Ok(())
}

/// Run the estimate command. Purely local; no network.
///
/// # Errors
///
/// Infallible in practice; kept fallible for dispatch symmetry.
pub fn estimate(args: &EstimateArgs) -> Result<()> {
    let tier = args.params.voice.into();
    let interval = args.params.frame_interval();
    let duration = f64::from(args.params.duration);

    let padded = estimate_credits(duration, tier, interval);
    let exact = actual_credits(duration, tier, interval);
    println!(
        "Estimate: {} (charged on completion for the measured length; {} at exactly {}s)",
        format_credits(padded).bold(),
        format_credits(exact),
        args.params.duration
    );
    Ok(())
}
