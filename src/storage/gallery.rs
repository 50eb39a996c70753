//! Local gallery store.
//!
//! Completed jobs are recorded in a small sqlite database so past media
//! stays browsable. Remote media links expire server-side, so every row
//! carries an `expiry_time` seven days out and `cleanup_expired` sweeps
//! rows past it (the CLI runs the sweep; a scheduler could call it too).

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, Row, params};

use crate::core::models::GenerationResult;
use crate::error::Result;

/// Days before a gallery row expires.
pub const GALLERY_EXPIRY_DAYS: i64 = 7;

/// A stored video row.
#[derive(Debug, Clone)]
pub struct GalleryVideo {
    pub job_id: String,
    pub topic: String,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub transcript_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub audio_duration_secs: f64,
    pub created_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

/// A stored image row.
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub prompt: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

/// Rows removed by an expiry sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupResult {
    pub videos_deleted: usize,
    pub images_deleted: usize,
}

/// Gallery database access layer.
pub struct GalleryStore {
    conn: Connection,
}

impl GalleryStore {
    /// Open (and migrate) the gallery database at `path`.
    ///
    /// # Errors
    ///
    /// Returns error when the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store. Intended for tests.
    ///
    /// # Errors
    ///
    /// Returns error when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS generated_videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL UNIQUE,
                topic TEXT NOT NULL,
                video_url TEXT,
                audio_url TEXT,
                transcript_url TEXT,
                thumbnail_url TEXT,
                audio_duration REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                expiry_time TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS generated_images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                prompt TEXT NOT NULL,
                image_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expiry_time TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_videos_expiry ON generated_videos(expiry_time);
            CREATE INDEX IF NOT EXISTS idx_images_expiry ON generated_images(expiry_time);",
        )?;
        Ok(())
    }

    /// Insert a completed job's result, expiring seven days out. A repeat
    /// insert for the same job id is ignored.
    ///
    /// # Errors
    ///
    /// Returns error on database failure.
    pub fn insert_video(&self, result: &GenerationResult) -> Result<()> {
        let now = Utc::now();
        let expiry = now + Duration::days(GALLERY_EXPIRY_DAYS);
        self.conn.execute(
            "INSERT OR IGNORE INTO generated_videos
                (job_id, topic, video_url, audio_url, transcript_url, thumbnail_url,
                 audio_duration, created_at, expiry_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                result.job_id,
                result.topic,
                result.video_url,
                result.audio_url,
                result.transcript_url,
                result.thumbnail_url,
                result.audio_duration_secs,
                now.to_rfc3339(),
                expiry.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert a generated image, expiring seven days out.
    ///
    /// No command produces images yet; the store keeps both halves of the
    /// schema so videos and images share one listing and one expiry sweep.
    ///
    /// # Errors
    ///
    /// Returns error on database failure.
    pub fn insert_image(&self, prompt: &str, image_url: &str) -> Result<()> {
        let now = Utc::now();
        let expiry = now + Duration::days(GALLERY_EXPIRY_DAYS);
        self.conn.execute(
            "INSERT INTO generated_images (prompt, image_url, created_at, expiry_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![prompt, image_url, now.to_rfc3339(), expiry.to_rfc3339()],
        )?;
        Ok(())
    }

    /// List unexpired videos, newest first.
    ///
    /// # Errors
    ///
    /// Returns error on database failure.
    pub fn list_videos(&self) -> Result<Vec<GalleryVideo>> {
        let mut stmt = self.conn.prepare(
            "SELECT job_id, topic, video_url, audio_url, transcript_url, thumbnail_url,
                    audio_duration, created_at, expiry_time
             FROM generated_videos
             WHERE expiry_time > ?1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![Utc::now().to_rfc3339()], video_from_row)?;
        let mut videos = Vec::new();
        for row in rows {
            videos.push(row?);
        }
        Ok(videos)
    }

    /// List unexpired images, newest first.
    ///
    /// # Errors
    ///
    /// Returns error on database failure.
    pub fn list_images(&self) -> Result<Vec<GalleryImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT prompt, image_url, created_at, expiry_time
             FROM generated_images
             WHERE expiry_time > ?1
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![Utc::now().to_rfc3339()], |row| {
            Ok(GalleryImage {
                prompt: row.get(0)?,
                image_url: row.get(1)?,
                created_at: parse_timestamp(row, 2)?,
                expiry_time: parse_timestamp(row, 3)?,
            })
        })?;
        let mut images = Vec::new();
        for row in rows {
            images.push(row?);
        }
        Ok(images)
    }

    /// Delete rows whose expiry time has passed.
    ///
    /// # Errors
    ///
    /// Returns error on database failure.
    pub fn cleanup_expired(&self) -> Result<CleanupResult> {
        let now = Utc::now().to_rfc3339();
        let videos_deleted = self.conn.execute(
            "DELETE FROM generated_videos WHERE expiry_time <= ?1",
            params![now],
        )?;
        let images_deleted = self.conn.execute(
            "DELETE FROM generated_images WHERE expiry_time <= ?1",
            params![now],
        )?;
        Ok(CleanupResult {
            videos_deleted,
            images_deleted,
        })
    }
}

fn video_from_row(row: &Row<'_>) -> rusqlite::Result<GalleryVideo> {
    Ok(GalleryVideo {
        job_id: row.get(0)?,
        topic: row.get(1)?,
        video_url: row.get(2)?,
        audio_url: row.get(3)?,
        transcript_url: row.get(4)?,
        thumbnail_url: row.get(5)?,
        audio_duration_secs: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
        expiry_time: parse_timestamp(row, 8)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{FrameInterval, VoiceTier};

    fn sample_result(job_id: &str) -> GenerationResult {
        GenerationResult {
            job_id: job_id.to_string(),
            topic: "ocean currents".to_string(),
            video_url: Some("https://cdn.example/v.mp4".to_string()),
            audio_url: Some("https://cdn.example/a.mp3".to_string()),
            transcript_url: None,
            images_zip_url: None,
            thumbnail_url: None,
            audio_duration_secs: 25.0,
            voice_tier: VoiceTier::Standard,
            frame_interval: FrameInterval::Five,
        }
    }

    #[test]
    fn insert_and_list_videos() {
        let store = GalleryStore::open_in_memory().expect("open");
        store.insert_video(&sample_result("task-1")).expect("insert");
        store.insert_video(&sample_result("task-2")).expect("insert");

        let videos = store.list_videos().expect("list");
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v.expiry_time > Utc::now()));
    }

    #[test]
    fn duplicate_job_id_is_ignored() {
        let store = GalleryStore::open_in_memory().expect("open");
        store.insert_video(&sample_result("task-1")).expect("insert");
        store.insert_video(&sample_result("task-1")).expect("insert");
        assert_eq!(store.list_videos().expect("list").len(), 1);
    }

    #[test]
    fn cleanup_removes_only_expired_rows() {
        let store = GalleryStore::open_in_memory().expect("open");
        store.insert_video(&sample_result("fresh")).expect("insert");
        store
            .insert_image("a red fox", "https://cdn.example/fox.png")
            .expect("insert");

        // Backdate one video and one image past expiry.
        let past = (Utc::now() - Duration::days(1)).to_rfc3339();
        store
            .conn
            .execute(
                "INSERT INTO generated_videos
                    (job_id, topic, audio_duration, created_at, expiry_time)
                 VALUES ('old', 'stale topic', 10.0, ?1, ?1)",
                params![past],
            )
            .expect("insert old video");
        store
            .conn
            .execute(
                "INSERT INTO generated_images (prompt, image_url, created_at, expiry_time)
                 VALUES ('old prompt', 'https://cdn.example/old.png', ?1, ?1)",
                params![past],
            )
            .expect("insert old image");

        let result = store.cleanup_expired().expect("cleanup");
        assert_eq!(result.videos_deleted, 1);
        assert_eq!(result.images_deleted, 1);
        assert_eq!(store.list_videos().expect("list").len(), 1);
        assert_eq!(store.list_images().expect("list").len(), 1);
    }
}
