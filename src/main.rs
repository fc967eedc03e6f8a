//! pagefeed - Cached Facebook Page feed
//!
//! Main entry point for the pagefeed CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagefeed::config::PageFeedConfig;
use pagefeed::feed::{clamp_page_size, FeedService, FeedSession, DEFAULT_PAGE_SIZE};
use pagefeed::server::PageFeedServer;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

/// pagefeed - Facebook Page feed served from a TTL cache
#[derive(Parser, Debug)]
#[command(name = "pagefeed")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/pagefeed/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Show the page profile
    Page,

    /// Show one page of posts
    Posts {
        /// Posts per page (1-100)
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,

        /// Cursor from a previous page
        #[arg(short, long)]
        after: Option<String>,

        /// Keep loading pages until this many posts have been read
        #[arg(long)]
        total: Option<usize>,
    },

    /// Show engagement counts for a post
    Engagement {
        /// Post ID (e.g., 396720486865677_123456789)
        post_id: String,
    },

    /// Show page profile and first page of posts together
    Initial,

    /// Show cache configuration
    CacheInfo,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    if let Err(e) = pagefeed::logging::init_with_default(default_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = PageFeedConfig::resolve(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let server = PageFeedServer::from_config(&config)?;
            server.run(&bind).await?;
        }

        Commands::Page => {
            let service = FeedService::from_config(&config)?;
            print_json(&service.page_info().await?)?;
        }

        Commands::Posts {
            limit,
            after,
            total,
        } => {
            let service = FeedService::from_config(&config)?;
            let limit = clamp_page_size(limit);
            match total {
                Some(total) if after.is_none() => {
                    let mut session = FeedSession::new(limit);
                    session.load_posts(&service).await?;
                    while session.posts().len() < total && session.has_more() {
                        if session.load_more(&service).await? == 0 {
                            break;
                        }
                    }
                    let posts = session.posts();
                    print_json(&posts[..total.min(posts.len())])?;
                    if let Some(cursor) = session.next_cursor() {
                        eprintln!("More posts available: --after {}", cursor);
                    }
                }
                _ => {
                    let page = service.posts(limit, after.as_deref()).await?;
                    print_json(&page)?;
                }
            }
        }

        Commands::Engagement { post_id } => {
            let service = FeedService::from_config(&config)?;
            print_json(&service.post_engagement(&post_id).await?)?;
        }

        Commands::Initial => {
            let service = FeedService::from_config(&config)?;
            print_json(&service.initial_data().await?)?;
        }

        Commands::CacheInfo => {
            let service = FeedService::from_config(&config)?;
            print_json(&service.cache_info().await)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
