//! Persistence for thread archives

use std::fmt::Write as _;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

use crate::archive::error::ArchiveError;
use crate::archive::{Post, ThreadArchive};

const SEPARATOR_WIDTH: usize = 80;

/// Write both the JSON archive and its plain-text mirror.
///
/// Either write failing aborts the call. No attempt is made to clean up or
/// roll back whatever was already written.
#[instrument(skip(archive), fields(posts = archive.posts.len()))]
pub async fn write_archive(
    archive: &ThreadArchive,
    json_path: &Path,
    text_path: &Path,
) -> Result<(), ArchiveError> {
    write_json(archive, json_path).await?;
    write_text(&archive.posts, text_path).await?;
    info!(
        "Saved {} posts to {} and {}",
        archive.posts.len(),
        json_path.display(),
        text_path.display()
    );
    Ok(())
}

/// Write the archive as indented JSON
pub async fn write_json(archive: &ThreadArchive, path: &Path) -> Result<(), ArchiveError> {
    // serde_json leaves non-ASCII characters unescaped
    let json = serde_json::to_string_pretty(archive)?;
    fs::write(path, json)
        .await
        .map_err(|source| ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the plain-text mirror of the posts
pub async fn write_text(posts: &[Post], path: &Path) -> Result<(), ArchiveError> {
    fs::write(path, render_text(posts))
        .await
        .map_err(|source| ArchiveError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Load an archive previously written by [`write_json`]
pub async fn read_archive(path: &Path) -> Result<ThreadArchive, ArchiveError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&content)?)
}

/// Render posts as a header line, the content and a separator line each
pub fn render_text(posts: &[Post]) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();
    for post in posts {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "Post #{} by {} on {}",
            post.post_number.as_deref().unwrap_or("unknown"),
            post.username.as_deref().unwrap_or("unknown"),
            post.date.as_deref().unwrap_or("unknown"),
        );
        let _ = writeln!(out, "{}", post.content);
        let _ = writeln!(out, "{}\n", separator);
    }
    out
}
