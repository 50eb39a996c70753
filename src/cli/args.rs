//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::models::{FrameInterval, VoiceTier};

/// AI media generation client - submit jobs, track credits, browse results.
#[derive(Parser, Debug)]
#[command(name = "reelgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a video and wait for completion
    Generate(GenerateArgs),

    /// Generate a transcript for a prompt
    Transcript(TranscriptArgs),

    /// Show the credit estimate for a parameter set
    Estimate(EstimateArgs),

    /// Show the remaining credit balance
    Balance(BalanceArgs),

    /// Browse or clean up stored results
    #[command(subcommand)]
    Gallery(GalleryCommand),
}

/// Narration voice tier flag.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum VoiceArg {
    #[default]
    Standard,
    Premium,
}

impl From<VoiceArg> for VoiceTier {
    fn from(arg: VoiceArg) -> Self {
        match arg {
            VoiceArg::Standard => Self::Standard,
            VoiceArg::Premium => Self::Premium,
        }
    }
}

/// Shared generation parameter flags.
#[derive(Parser, Debug)]
pub struct ParamArgs {
    /// Narration voice tier
    #[arg(long, value_enum, default_value = "standard")]
    pub voice: VoiceArg,

    /// Seconds per generated frame (3-6; others fall back to 5)
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub interval: u32,

    /// Requested video duration in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub duration: u32,
}

impl ParamArgs {
    /// The frame interval, with out-of-range values normalized.
    #[must_use]
    pub const fn frame_interval(&self) -> FrameInterval {
        FrameInterval::from_secs(self.interval)
    }
}

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Topic the video should cover
    pub topic: String,

    #[command(flatten)]
    pub params: ParamArgs,

    /// Model to use for script generation
    #[arg(long, value_name = "MODEL")]
    pub script_model: Option<String>,

    /// Skip the pre-submission balance gate
    #[arg(long)]
    pub no_gate: bool,
}

/// Arguments for the `transcript` command.
#[derive(Parser, Debug)]
pub struct TranscriptArgs {
    /// Prompt to generate a transcript for
    pub prompt: String,

    /// Model to use for script generation
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
}

/// Arguments for the `estimate` command.
#[derive(Parser, Debug)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub params: ParamArgs,
}

/// Arguments for the `balance` command.
#[derive(Parser, Debug)]
pub struct BalanceArgs {
    /// Bypass the balance cache
    #[arg(long)]
    pub refresh: bool,
}

/// Gallery subcommands.
#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// List unexpired stored results
    List,
    /// Delete rows past their expiry time
    Cleanup,
}
