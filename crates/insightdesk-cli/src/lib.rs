use std::path::Path;

use anyhow::Context;
use insightdesk_api_client::guess_content_type;
use insightdesk_core::composer::PendingFile;
use insightdesk_core::error::{AppError, ErrorMetadata};
use insightdesk_core::markup::Selection;
use insightdesk_core::media::{
    embed_url, fallback_preview_reference, lenient_video_id, preview_reference, watch_url,
};
use insightdesk_core::models::{Insight, TeamMember};
use serde::Serialize;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays parseable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Read a local file into memory for upload.
pub fn read_pending_file(path: &Path) -> anyhow::Result<PendingFile> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let content_type = guess_content_type(&file_name);
    Ok(PendingFile::new(file_name, data).with_content_type(content_type))
}

/// Operator hint for a failed command, e.g. "Choose a smaller file (PAYLOAD_TOO_LARGE)".
pub fn error_hint(err: &anyhow::Error) -> Option<String> {
    let app_err = err.downcast_ref::<AppError>()?;
    let action = app_err.suggested_action()?;
    Some(format!("{} ({})", action, app_err.error_code()))
}

/// Parse a `start..end` character range (or a single caret position).
pub fn parse_selection(raw: &str) -> anyhow::Result<Selection> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid offset '{}' in selection '{}'", s, raw))
    };
    match raw.split_once("..") {
        Some((start, end)) => Ok(Selection::new(parse(start)?, parse(end)?)),
        None => Ok(Selection::caret(parse(raw)?)),
    }
}

/// Links derived from an external video URL.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VideoLinks {
    pub video_id: String,
    pub watch_url: String,
    pub embed_url: String,
    pub thumbnail: Option<String>,
    pub fallback_thumbnail: Option<String>,
}

pub fn video_links(url: &str) -> Option<VideoLinks> {
    let video_id = lenient_video_id(url)?;
    Some(VideoLinks {
        watch_url: watch_url(&video_id),
        embed_url: embed_url(&video_id),
        thumbnail: preview_reference(url),
        fallback_thumbnail: fallback_preview_reference(url),
        video_id,
    })
}

pub fn print_insight_table(insights: &[Insight], total: Option<u64>) {
    if insights.is_empty() {
        println!("\nNo insights found.");
        return;
    }
    println!(
        "\n{:<8} {:<12} {:<16} {:<50} {:<20}",
        "ID", "Category", "Type", "Title", "Created"
    );
    println!("{}", "-".repeat(110));
    for insight in insights {
        println!(
            "{:<8} {:<12} {:<16} {:<50} {:<20}",
            insight
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            insight.category,
            insight.kind_label(),
            truncate_string(insight.display_title(), 50),
            insight
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        );
    }
    if let Some(total) = total {
        println!("\nShowing {} of {}", insights.len(), total);
    }
}

pub fn print_team_table(members: &[TeamMember]) {
    if members.is_empty() {
        println!("\nNo team members found.");
        return;
    }
    println!("\n{:<6} {:<28} {:<28} {:<40}", "ID", "Name", "Position", "Image");
    println!("{}", "-".repeat(104));
    for member in members {
        println!(
            "{:<6} {:<28} {:<28} {:<40}",
            member.id.map(|id| id.to_string()).unwrap_or_default(),
            truncate_string(&member.name, 28),
            truncate_string(&member.position, 28),
            truncate_string(&member.image_path, 40)
        );
    }
}
