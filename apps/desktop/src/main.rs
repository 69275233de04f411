use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{AttachedFile, ChatClient, Composer, FixtureLoader, LoadState};
use shared::{
    domain::{Message, MessageKind, ParticipantId},
    format::{format_file_size, format_time},
};
use url::Url;

#[derive(Parser, Debug)]
#[command(about = "Render a chat transcript fixture in the terminal")]
struct Args {
    /// Path to a local chat fixture JSON file.
    #[arg(long, conflicts_with = "fixture_url")]
    fixture: Option<PathBuf>,
    /// Url of a served chat fixture to fetch instead.
    #[arg(long)]
    fixture_url: Option<Url>,
    /// Participant id to act as.
    #[arg(long, default_value = "customer@mail.com")]
    user: String,
    /// Compose and append one message after rendering the transcript.
    #[arg(long)]
    send: Option<String>,
    /// Attach this file to the composed message.
    #[arg(long)]
    attach: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let current_user = ParticipantId::new(args.user.clone());

    let loader = match (&args.fixture, &args.fixture_url) {
        (Some(path), None) => FixtureLoader::from_path(path.clone()),
        (None, Some(url)) => FixtureLoader::from_url(url.clone()),
        _ => bail!("pass exactly one of --fixture <path> or --fixture-url <url>"),
    };

    let client = ChatClient::new(loader, current_user.clone());
    client.load().await;

    match client.load_state().await {
        LoadState::Ready(_) => {}
        LoadState::Failed(message) => bail!("failed to load transcript: {message}"),
        LoadState::Loading => bail!("fixture load did not complete"),
    }

    let Some(room) = client.room().await else {
        println!("No chat data available");
        return Ok(());
    };
    println!("=== {} ({} participants) ===", room.name, room.participant.len());

    for message in client.messages().await {
        println!("{}", render_message(&client, &message).await);
    }

    if args.send.is_some() || args.attach.is_some() {
        let composer = Composer::new(current_user);
        if let Some(text) = &args.send {
            composer.set_draft(text.clone()).await;
        }
        if let Some(path) = &args.attach {
            composer.attach(attached_file(path)?).await?;
        }

        let message = composer.submit().await?;
        client.append_message(message.clone()).await;
        println!("--- sent ---");
        println!("{}", render_message(&client, &message).await);
    }

    Ok(())
}

async fn render_message(client: &ChatClient, message: &Message) -> String {
    let sender = client.resolve_participant(&message.sender).await;
    let marker = if client.is_own_message(message).await {
        " (you)"
    } else {
        ""
    };

    let mut line = format!(
        "[{}] {}{}: {}",
        format_time(&message.timestamp),
        sender.name,
        marker,
        message.text
    );

    if let Some(media) = &message.media {
        let caption = match message.kind {
            MessageKind::Image => {
                format!("[image {} - {}]", media.filename, format_file_size(media.size))
            }
            MessageKind::Video => format!(
                "[video {} - {}s - {}]",
                media.filename,
                media.duration.unwrap_or(0),
                format_file_size(media.size)
            ),
            MessageKind::Pdf => format!(
                "[pdf {} - {} page(s) - {}]",
                media.filename,
                media.pages.unwrap_or(1),
                format_file_size(media.size)
            ),
            MessageKind::Text => String::new(),
        };
        if !caption.is_empty() {
            line.push(' ');
            line.push_str(&caption);
        }
    }

    line
}

fn attached_file(path: &Path) -> Result<AttachedFile> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to stat attachment '{}'", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("attachment")
        .to_string();

    Ok(AttachedFile {
        content_type: content_type_for(path).to_string(),
        name,
        size: metadata.len(),
        path: Some(path.to_path_buf()),
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
