//! insightdesk CLI: command-line host for the insightdesk admin backend.
//!
//! Set INSIGHTDESK_API_URL (or API_URL) and INSIGHTDESK_TOKEN (from `login`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use insightdesk_api_client::ApiClient;
use insightdesk_cli::{
    error_hint, init_tracing, parse_selection, print_insight_table, print_json, print_team_table,
    read_pending_file, video_links,
};
use insightdesk_core::composer::{
    Composer, ComposerDraft, ComposerMode, SubmitOutcome, TeamMemberForm, UploadProgress,
    VideoSource,
};
use insightdesk_core::config::ClientConfig;
use insightdesk_core::error::{AppError, ErrorMetadata, LogLevel};
use insightdesk_core::gateway::{RecordRepository, TeamMemberRepository};
use insightdesk_core::markup::{MarkupBuffer, MarkupTag};
use insightdesk_core::media::{MediaPreview, MediaUrlResolver};
use insightdesk_core::models::{
    Credentials, InsightCategory, PageAccumulator, RecordId, Registration,
};

#[derive(Parser)]
#[command(name = "insightdesk", about = "insightdesk admin CLI")]
struct Cli {
    /// Bearer token; overrides INSIGHTDESK_TOKEN
    #[arg(long, global = true, hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "INSIGHTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a new admin account (the email must be whitelisted)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Manage the login whitelist
    Whitelist {
        #[command(subcommand)]
        sub: WhitelistCommands,
    },
    /// Manage insights
    Insights {
        #[command(subcommand)]
        sub: InsightCommands,
    },
    /// Manage team members
    Team {
        #[command(subcommand)]
        sub: TeamCommands,
    },
    /// Manage uploaded files
    Files {
        #[command(subcommand)]
        sub: FileCommands,
    },
    /// Show the links derived from an external video URL
    Preview {
        url: String,
    },
    /// Apply editor toolbar actions to article content
    Content {
        #[command(subcommand)]
        sub: ContentCommands,
    },
}

#[derive(Subcommand)]
enum WhitelistCommands {
    List,
    Add { email: String },
    Remove { email: String },
}

#[derive(Subcommand)]
enum InsightCommands {
    /// List insights, one page at a time or all of them
    List {
        /// 1-based page number
        #[arg(long, default_value = "1")]
        page: u32,
        /// Keep loading pages until the listing is exhausted
        #[arg(long)]
        all: bool,
        /// Only show insights of this category (AI, Technology, Mobile, Cloud)
        #[arg(long)]
        category: Option<InsightCategory>,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print a single insight as JSON
    Get { id: String },
    /// Show an insight read-only, with resolved media URLs
    View { id: String },
    /// Create an insight
    Add {
        #[command(flatten)]
        fields: AuthoringArgs,
    },
    /// Edit an insight; omitted fields keep their stored values
    Edit {
        id: String,
        #[command(flatten)]
        fields: AuthoringArgs,
    },
    Delete { id: String },
}

#[derive(Args, Debug, Default)]
struct AuthoringArgs {
    /// AI, Technology, Mobile or Cloud
    #[arg(long)]
    category: Option<InsightCategory>,
    #[arg(long)]
    video_title: Option<String>,
    /// External video link; switches the video to external mode
    #[arg(long, conflicts_with = "video_file")]
    video_url: Option<String>,
    /// Video file to upload; switches the video to uploaded mode
    #[arg(long)]
    video_file: Option<PathBuf>,
    #[arg(long)]
    video_thumbnail: Option<PathBuf>,
    /// Switch an external video back to uploaded files
    #[arg(long, conflicts_with = "video_url")]
    uploaded: bool,
    #[arg(long)]
    article_title: Option<String>,
    #[arg(long)]
    article_description: Option<String>,
    /// Reading time in minutes
    #[arg(long)]
    article_time: Option<String>,
    #[arg(long)]
    article_thumbnail: Option<PathBuf>,
    /// Article HTML
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,
    /// File holding the article HTML
    #[arg(long)]
    content_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum TeamCommands {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        bio: Option<String>,
        /// Portrait to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum FileCommands {
    List,
    Delete { id: String },
}

#[derive(Subcommand)]
enum ContentCommands {
    /// Wrap a character range in a tag (p, h2, strong, em, a)
    Wrap {
        #[command(flatten)]
        input: ContentInput,
        #[arg(long)]
        tag: MarkupTag,
        /// `start..end` in characters, or a caret position
        #[arg(long)]
        select: String,
    },
    /// Replace a character range with a list skeleton
    List {
        #[command(flatten)]
        input: ContentInput,
        #[arg(long)]
        select: String,
    },
}

#[derive(Args)]
struct ContentInput {
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ContentInput {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display())),
            (None, None) => Ok(String::new()),
        }
    }
}

impl AuthoringArgs {
    /// Read every referenced file up front, then apply the overrides.
    fn apply_to(self, composer: &Composer) -> anyhow::Result<()> {
        let video_file = self.video_file.as_deref().map(read_pending_file).transpose()?;
        let video_thumbnail = self
            .video_thumbnail
            .as_deref()
            .map(read_pending_file)
            .transpose()?;
        let article_thumbnail = self
            .article_thumbnail
            .as_deref()
            .map(read_pending_file)
            .transpose()?;
        let content = match (self.content, self.content_file) {
            (Some(text), _) => Some(text),
            (None, Some(path)) => Some(
                std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read file: {}", path.display()))?,
            ),
            (None, None) => None,
        };

        composer.edit(|draft: &mut ComposerDraft| {
            if let Some(category) = self.category {
                draft.category = category;
            }
            if let Some(title) = self.video_title {
                draft.video_title = title;
            }
            if let Some(url) = self.video_url {
                draft.video_source = VideoSource::External;
                draft.video_url = url;
            }
            if self.uploaded || video_file.is_some() {
                draft.video_source = VideoSource::Uploaded;
            }
            if video_file.is_some() {
                draft.video_file = video_file;
            }
            if video_thumbnail.is_some() {
                draft.video_thumbnail_file = video_thumbnail;
            }
            if let Some(title) = self.article_title {
                draft.article_title = title;
            }
            if let Some(description) = self.article_description {
                draft.article_description = description;
            }
            if let Some(time) = self.article_time {
                draft.article_time = time;
            }
            if article_thumbnail.is_some() {
                draft.article_thumbnail_file = article_thumbnail;
            }
            if let Some(content) = content {
                draft.article_content = MarkupBuffer::new(content);
            }
        })?;
        Ok(())
    }
}

fn log_app_error(err: &AppError) {
    let code = err.error_code();
    let status = err.http_status_code();
    let recoverable = err.is_recoverable();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(code, status, recoverable, error = %err, "Command failed")
        }
        LogLevel::Warn => {
            tracing::warn!(code, status, recoverable, error = %err, "Command failed")
        }
        LogLevel::Error => {
            tracing::error!(code, status, recoverable, error = %err, "Command failed")
        }
    }
}

fn report_progress(progress: UploadProgress) {
    eprint!(
        "\rUploading {} ({}/{}) {:>3}%",
        progress.slot.label(),
        progress.current,
        progress.total,
        progress.percent
    );
    if progress.percent == 100 {
        eprintln!();
    }
}

fn preview_json(preview: Option<MediaPreview>) -> serde_json::Value {
    preview.map_or(serde_json::Value::Null, |p| {
        serde_json::json!({ "kind": p.kind, "url": p.reference })
    })
}

async fn submit_insight(composer: Composer) -> anyhow::Result<()> {
    let composer = composer
        .on_progress(report_progress)
        .on_success(|| tracing::debug!("Listing should be refreshed"));

    match composer.submit().await? {
        SubmitOutcome::Created(insight) => {
            eprintln!("Insight created");
            print_json(&insight)?;
        }
        SubmitOutcome::Updated(insight) => {
            eprintln!("Insight updated");
            print_json(&insight)?;
        }
        SubmitOutcome::Ignored => eprintln!("A submission is already in progress"),
    }
    Ok(())
}

async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    let client = Arc::new(ApiClient::from_config(&config).context(
        "Failed to create API client. Set INSIGHTDESK_API_URL (or API_URL) and INSIGHTDESK_TOKEN",
    )?);
    let resolver = MediaUrlResolver::new(config.media_base_url.clone());

    match cli.command {
        Commands::Login { email, password } => {
            let response = client.login(&Credentials::new(email, password)).await?;
            print_json(&response)?;
            if let Some(token) = response.token {
                eprintln!("\nexport INSIGHTDESK_TOKEN={}", token);
            }
        }
        Commands::Register {
            email,
            password,
            confirm_password,
        } => {
            let credentials = Registration {
                email,
                password,
                confirm_password,
            }
            .into_credentials()
            .map_err(anyhow::Error::msg)?;
            client.register(&credentials).await?;
            print_json(&serde_json::json!({
                "success": true,
                "message": "Registration successful. You can now log in."
            }))?;
        }
        Commands::Whitelist { sub } => match sub {
            WhitelistCommands::List => {
                print_json(&client.list_whitelist().await?)?;
            }
            WhitelistCommands::Add { email } => {
                let added = client.add_to_whitelist(&email).await?;
                print_json(&serde_json::json!({ "success": added }))?;
            }
            WhitelistCommands::Remove { email } => {
                client.remove_from_whitelist(&email).await?;
                print_json(&serde_json::json!({
                    "success": true,
                    "message": format!("{} removed from whitelist", email.trim())
                }))?;
            }
        },
        Commands::Insights { sub } => match sub {
            InsightCommands::List {
                page,
                all,
                category,
                format,
            } => {
                let mut pages = PageAccumulator::new(config.page_size);
                if all {
                    while pages.has_more() {
                        let next = client
                            .list_insights(pages.next_page(), pages.page_size())
                            .await?;
                        pages.push(next);
                    }
                } else {
                    pages.push(client.list_insights(page.max(1), config.page_size).await?);
                }

                if let Some(category) = category {
                    pages.retain(|insight| insight.category == category);
                }

                // A filtered single page cannot tell how many matches the server holds.
                let total = match category {
                    Some(_) if !all => None,
                    _ => pages.total_count(),
                };
                let insights = pages.into_items();
                match format.as_str() {
                    "json" => print_json(&insights)?,
                    _ => print_insight_table(&insights, total),
                }
            }
            InsightCommands::Get { id } => {
                print_json(&client.get_insight(&RecordId::from(id)).await?)?;
            }
            InsightCommands::View { id } => {
                let insight = client.get_insight(&RecordId::from(id)).await?;
                let composer =
                    Composer::for_insight(client.clone(), client.clone(), insight, ComposerMode::View);
                print_json(&serde_json::json!({
                    "insight": composer.original(),
                    "video": preview_json(composer.video_preview(&resolver)),
                    "videoThumbnail": preview_json(composer.video_thumbnail_preview(&resolver)),
                    "articleThumbnail": preview_json(composer.article_thumbnail_preview(&resolver)),
                }))?;
            }
            InsightCommands::Add { fields } => {
                let composer = Composer::new(client.clone(), client.clone());
                fields.apply_to(&composer)?;
                submit_insight(composer).await?;
            }
            InsightCommands::Edit { id, fields } => {
                let insight = client.get_insight(&RecordId::from(id)).await?;
                let composer =
                    Composer::for_insight(client.clone(), client.clone(), insight, ComposerMode::Edit);
                fields.apply_to(&composer)?;
                submit_insight(composer).await?;
            }
            InsightCommands::Delete { id } => {
                client.delete_insight(&RecordId::from(id.clone())).await?;
                print_json(
                    &serde_json::json!({ "success": true, "message": format!("Insight {} deleted", id) }),
                )?;
            }
        },
        Commands::Team { sub } => match sub {
            TeamCommands::List => {
                print_team_table(&client.list_team_members().await?);
            }
            TeamCommands::Add {
                name,
                position,
                bio,
                image,
            } => {
                let mut form = TeamMemberForm::new();
                form.name = name;
                form.position = position;
                form.bio = bio.unwrap_or_default();
                form.image_file = image.as_deref().map(read_pending_file).transpose()?;
                let saved = form.submit(client.as_ref(), client.as_ref()).await?;
                print_json(&saved)?;
            }
            TeamCommands::Edit {
                id,
                name,
                position,
                bio,
                image,
            } => {
                let member = client
                    .list_team_members()
                    .await?
                    .into_iter()
                    .find(|m| m.id == Some(id))
                    .ok_or_else(|| AppError::NotFound(format!("Team member {} not found", id)))?;
                let mut form = TeamMemberForm::for_member(member);
                if let Some(name) = name {
                    form.name = name;
                }
                if let Some(position) = position {
                    form.position = position;
                }
                if let Some(bio) = bio {
                    form.bio = bio;
                }
                form.image_file = image.as_deref().map(read_pending_file).transpose()?;
                let saved = form.submit(client.as_ref(), client.as_ref()).await?;
                print_json(&saved)?;
            }
            TeamCommands::Delete { id } => {
                client.delete_team_member(id).await?;
                print_json(
                    &serde_json::json!({ "success": true, "message": format!("Team member {} deleted", id) }),
                )?;
            }
        },
        Commands::Files { sub } => match sub {
            FileCommands::List => {
                let files = client.list_files().await?;
                let listed: Vec<_> = files
                    .iter()
                    .map(|f| {
                        serde_json::json!({
                            "id": f.id,
                            "path": f.path,
                            "url": resolver.resolve(&f.path),
                            "originalName": f.original_name,
                            "size": f.size,
                        })
                    })
                    .collect();
                print_json(&listed)?;
            }
            FileCommands::Delete { id } => {
                client.delete_file(&RecordId::from(id.clone())).await?;
                print_json(
                    &serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }),
                )?;
            }
        },
        Commands::Preview { url } => match video_links(&url) {
            Some(links) => print_json(&links)?,
            None => anyhow::bail!("Not a recognized video URL: {}", url),
        },
        Commands::Content { sub } => {
            let mut buffer = match &sub {
                ContentCommands::Wrap { input, .. } | ContentCommands::List { input, .. } => {
                    MarkupBuffer::new(input.read()?)
                }
            };
            match sub {
                ContentCommands::Wrap { tag, select, .. } => {
                    buffer.select(parse_selection(&select)?);
                    buffer.apply(tag);
                }
                ContentCommands::List { select, .. } => {
                    buffer.select(parse_selection(&select)?);
                    buffer.insert_list();
                }
            }
            print_json(&serde_json::json!({
                "content": buffer.content(),
                "selection": buffer.selection(),
            }))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Some(token) = cli.token.clone() {
        config = config.with_token(token);
    }

    if let Err(err) = run(cli, config).await {
        if let Some(app_err) = err.downcast_ref::<AppError>() {
            log_app_error(app_err);
        }
        if let Some(hint) = error_hint(&err) {
            eprintln!("{}", hint);
        }
        return Err(err);
    }
    Ok(())
}
