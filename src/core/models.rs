//! Core data models for generation jobs.
//!
//! Wire payloads exchanged with the generation API plus the client-side job
//! state types published by the poller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Generation Parameters
// =============================================================================

/// Voice tier used for narration. Premium voices are billed at a higher
/// per-second rate (see [`crate::core::pricing`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTier {
    #[default]
    Standard,
    Premium,
}

impl VoiceTier {
    /// Returns the tier as the API's wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

}

impl std::fmt::Display for VoiceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seconds of video covered by each generated frame. Lower intervals mean
/// more frames per second of output and a higher credit rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FrameInterval {
    Three,
    Four,
    #[default]
    Five,
    Six,
}

impl FrameInterval {
    /// The interval in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
        }
    }

    /// Map seconds to an interval. Unrecognized values fall back to the
    /// 5-second default, matching the pricing table's behavior.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        match secs {
            3 => Self::Three,
            4 => Self::Four,
            6 => Self::Six,
            _ => Self::Five,
        }
    }
}

impl From<FrameInterval> for u32 {
    fn from(interval: FrameInterval) -> Self {
        interval.as_secs()
    }
}

impl TryFrom<u32> for FrameInterval {
    type Error = std::convert::Infallible;

    fn try_from(secs: u32) -> std::result::Result<Self, Self::Error> {
        Ok(Self::from_secs(secs))
    }
}

/// Parameters for a video-generation job, serialized as the submission body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Topic the video should cover.
    pub topic: String,
    /// Narration voice tier.
    #[serde(rename = "voice")]
    pub voice_tier: VoiceTier,
    /// Seconds per generated frame.
    #[serde(rename = "frame_interval")]
    pub frame_interval: FrameInterval,
    /// Requested video duration in seconds. The final media duration is
    /// measured server-side and may differ.
    #[serde(rename = "duration")]
    pub duration_hint_secs: u32,
    /// Model used for script generation, if the caller overrides the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_model: Option<String>,
}

impl GenerationParams {
    /// Create parameters with defaults for everything but the topic.
    #[must_use]
    pub fn new(topic: impl Into<String>, duration_hint_secs: u32) -> Self {
        Self {
            topic: topic.into(),
            voice_tier: VoiceTier::default(),
            frame_interval: FrameInterval::default(),
            duration_hint_secs,
            script_model: None,
        }
    }
}

// =============================================================================
// Wire Payloads
// =============================================================================

/// Response to `POST /generate_video`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    /// Submission acknowledgement status string.
    #[serde(default)]
    pub status: String,
    /// Identifier used for subsequent status checks.
    pub task_id: String,
}

/// Status string reported as terminal-success by the API.
pub const STATUS_COMPLETED: &str = "Completed";
/// Status string reported as terminal-failure by the API.
pub const STATUS_ERROR: &str = "Error";

/// Response to `GET /check_status`.
///
/// `status` is an open enumeration: `"Completed"` and `"Error"` are
/// terminal, anything else means the job is still running. Media fields are
/// populated only on completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub transcript_url: Option<String>,
    #[serde(default)]
    pub images_zip_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Measured narration length in seconds; billing input for settlement.
    #[serde(default)]
    pub audio_duration: Option<f64>,
    /// Error detail when `status == "Error"`.
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusPayload {
    /// Whether the job finished successfully.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Whether the job failed remotely.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == STATUS_ERROR
    }

    /// Whether the status is terminal (completed or error).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_error()
    }
}

/// Response to `POST /generate_transcript`: either the transcript inline or
/// a URL that must be fetched separately.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_url: Option<String>,
}

// =============================================================================
// Job State
// =============================================================================

/// Terminal payload for a completed job. Immutable once constructed; the
/// `topic` is backfilled from the submitted parameters when the remote
/// payload omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub job_id: String,
    pub topic: String,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub transcript_url: Option<String>,
    pub images_zip_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Measured media duration in seconds.
    pub audio_duration_secs: f64,
    /// Echo of the billed voice tier.
    pub voice_tier: VoiceTier,
    /// Echo of the billed frame interval.
    pub frame_interval: FrameInterval,
}

impl GenerationResult {
    /// Build a result from a terminal status payload, backfilling the topic
    /// from the submitted parameters when the payload omits it.
    #[must_use]
    pub fn from_payload(job_id: &str, payload: &StatusPayload, params: &GenerationParams) -> Self {
        Self {
            job_id: job_id.to_string(),
            topic: payload
                .topic
                .clone()
                .unwrap_or_else(|| params.topic.clone()),
            video_url: payload.video_url.clone(),
            audio_url: payload.audio_url.clone(),
            transcript_url: payload.transcript_url.clone(),
            images_zip_url: payload.images_zip_url.clone(),
            thumbnail_url: payload.thumbnail_url.clone(),
            audio_duration_secs: payload.audio_duration.unwrap_or(0.0),
            voice_tier: params.voice_tier,
            frame_interval: params.frame_interval,
        }
    }
}

/// Lifecycle state of the client-side job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// No job active.
    #[default]
    Idle,
    /// Submission request in flight.
    Generating,
    /// Job accepted, status polling underway.
    Polling,
    /// Terminal success.
    Completed,
    /// Terminal failure (remote error, submission failure, or timeout).
    Error,
}

impl JobStatus {
    /// Whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Point-in-time view of the active job, published by the poller through a
/// watch channel. Mutated only by the poller task.
#[derive(Debug, Clone, Default)]
pub struct JobSnapshot {
    pub job_id: Option<String>,
    pub status: JobStatus,
    /// Synthetic progress, 0..=100. Time-based estimate capped at 99 until a
    /// terminal status is observed.
    pub progress_percent: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub result: Option<GenerationResult>,
    pub error_message: Option<String>,
    /// Set when the error state was forced by the hard ceiling rather than
    /// a remote-reported failure.
    pub timed_out: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_interval_falls_back_to_five_seconds() {
        assert_eq!(FrameInterval::from_secs(3), FrameInterval::Three);
        assert_eq!(FrameInterval::from_secs(7), FrameInterval::Five);
        assert_eq!(FrameInterval::from_secs(0), FrameInterval::Five);
    }

    #[test]
    fn params_serialize_with_wire_names() {
        let params = GenerationParams {
            topic: "volcanoes".into(),
            voice_tier: VoiceTier::Premium,
            frame_interval: FrameInterval::Three,
            duration_hint_secs: 30,
            script_model: None,
        };
        let json = serde_json::to_value(&params).expect("serialize");
        assert_eq!(json["voice"], "premium");
        assert_eq!(json["frame_interval"], 3);
        assert_eq!(json["duration"], 30);
        assert!(json.get("script_model").is_none());
    }

    #[test]
    fn status_payload_terminal_detection() {
        let running = StatusPayload {
            status: "Processing".into(),
            ..StatusPayload::default()
        };
        assert!(!running.is_terminal());

        let done = StatusPayload {
            status: STATUS_COMPLETED.into(),
            ..StatusPayload::default()
        };
        assert!(done.is_completed() && done.is_terminal());

        let failed = StatusPayload {
            status: STATUS_ERROR.into(),
            ..StatusPayload::default()
        };
        assert!(failed.is_error() && failed.is_terminal());
    }

    #[test]
    fn result_backfills_topic_from_params() {
        let params = GenerationParams::new("deep sea creatures", 25);
        let payload = StatusPayload {
            status: STATUS_COMPLETED.into(),
            video_url: Some("https://cdn.example/v.mp4".into()),
            audio_duration: Some(25.0),
            ..StatusPayload::default()
        };
        let result = GenerationResult::from_payload("task-1", &payload, &params);
        assert_eq!(result.topic, "deep sea creatures");

        let payload_with_topic = StatusPayload {
            topic: Some("server topic".into()),
            ..payload
        };
        let result = GenerationResult::from_payload("task-1", &payload_with_topic, &params);
        assert_eq!(result.topic, "server topic");
    }
}
