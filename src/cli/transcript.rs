//! `reelgen transcript` - generate a transcript for a prompt.

use crate::cli::AppContext;
use crate::cli::args::TranscriptArgs;
use crate::error::Result;

/// Run the transcript command.
///
/// # Errors
///
/// Returns error when the request or the follow-up transcript fetch fails.
pub async fn run(args: TranscriptArgs) -> Result<()> {
    let ctx = AppContext::build()?;
    let transcript = ctx
        .generation
        .generate_transcript(&args.prompt, args.model.as_deref())
        .await?;
    println!("{transcript}");
    Ok(())
}
