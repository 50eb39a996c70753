//! `reelgen gallery` - browse and clean up stored results.

use colored::Colorize;

use crate::cli::AppContext;
use crate::cli::args::GalleryCommand;
use crate::error::Result;
use crate::storage::gallery::GalleryStore;
use crate::util::format::format_duration_secs;

/// Run a gallery subcommand.
///
/// # Errors
///
/// Returns error on database failure.
pub fn run(command: &GalleryCommand) -> Result<()> {
    let ctx = AppContext::build()?;
    let store = GalleryStore::open(&ctx.paths.gallery_db_file())?;

    match command {
        GalleryCommand::List => {
            let videos = store.list_videos()?;
            if videos.is_empty() {
                println!("No stored videos.");
            }
            for video in videos {
                println!(
                    "{} ({}) - expires {}",
                    video.topic.bold(),
                    format_duration_secs(video.audio_duration_secs),
                    video.expiry_time.format("%Y-%m-%d")
                );
                if let Some(url) = &video.video_url {
                    println!("  {url}");
                }
            }
            let images = store.list_images()?;
            for image in images {
                println!(
                    "{} - expires {}",
                    image.prompt.bold(),
                    image.expiry_time.format("%Y-%m-%d")
                );
                println!("  {}", image.image_url);
            }
        }
        GalleryCommand::Cleanup => {
            let result = store.cleanup_expired()?;
            println!(
                "Removed {} expired videos and {} expired images.",
                result.videos_deleted, result.images_deleted
            );
        }
    }
    Ok(())
}
