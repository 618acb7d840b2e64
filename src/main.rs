use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use anisrc::config::Settings;
use anisrc::filters::SelectFilter;
use anisrc::player::{choose_stream, launch_player};
use anisrc::providers::AnimeSource;
use anisrc::providers::allmanga::AllMangaSource;
use anisrc::providers::anizone::AniZoneProvider;

#[derive(Debug, Parser)]
#[command(
    name = "anisrc",
    about = "Browse AllManga and AniZone sources from the terminal.",
    version
)]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the AllManga base URL for this run.
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Popular listing page.
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Latest updates page.
    Latest {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Search {
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Type filter: sub or dub.
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
        /// Country filter: Japan, China or Korea.
        #[arg(long)]
        country: Option<String>,
    },
    /// Detail page of a show.
    Detail { url: String },
    /// Stream candidates of an episode page.
    Videos { url: String },
    /// Pick a stream of an episode page and play it.
    Play {
        url: String,
        #[arg(long)]
        title: Option<String>,
    },
    Filters,
    Prefs,
    /// Print the effective settings as TOML.
    Config,
    /// AniZone metadata and stream lookups.
    Jikan {
        #[command(subcommand)]
        command: JikanCommand,
    },
    /// Quality variants of an HLS master playlist.
    Variants { url: String },
}

#[derive(Debug, Subcommand)]
enum JikanCommand {
    Search {
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
    },
    Detail { id: u64 },
    Episodes { id: u64 },
    Stream { title: String, episode: u32 },
    Episode { query: String, episode: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run().await;
    if let Err(err) = &result {
        eprintln!("error: {err:?}");
    }
    result
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.allmanga.base_url = base_url;
    }

    let allmanga = || AllMangaSource::new(settings.allmanga.clone());
    match cli.command {
        Command::Popular { page } => print_json(&allmanga()?.popular(page).await?),
        Command::Latest { page } => print_json(&allmanga()?.latest_updates(page).await?),
        Command::Search {
            query,
            page,
            kind,
            country,
        } => {
            let source = allmanga()?;
            let mut filters = source.filter_list();
            apply_filter(&mut filters, 0, kind.as_deref())?;
            apply_filter(&mut filters, 1, country.as_deref())?;
            let result = source.search(&query.join(" "), page, &filters).await?;
            print_json(&result)
        }
        Command::Detail { url } => print_json(&allmanga()?.detail(&url).await?),
        Command::Videos { url } => print_json(&allmanga()?.video_list(&url).await?),
        Command::Play { url, title } => {
            let streams = allmanga()?.video_list(&url).await?;
            let stream = choose_stream(streams)?;
            let title = title.unwrap_or_else(|| url.clone());
            println!("Launching {} ({})", title, stream.label());
            launch_player(&stream, &title).await
        }
        Command::Filters => print_json(&allmanga()?.filter_list()),
        Command::Prefs => print_json(&allmanga()?.source_preferences()),
        Command::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Command::Jikan { command } => run_jikan(command, &settings).await,
        Command::Variants { url } => {
            let provider = AniZoneProvider::new(settings.anizone.clone())?;
            print_json(&provider.variants(&url).await)
        }
    }
}

async fn run_jikan(command: JikanCommand, settings: &Settings) -> Result<()> {
    let provider = AniZoneProvider::new(settings.anizone.clone())?;
    match command {
        JikanCommand::Search { query } => print_json(&provider.search(&query.join(" ")).await),
        JikanCommand::Detail { id } => print_json(&provider.details(id).await),
        JikanCommand::Episodes { id } => print_json(&provider.episodes(id).await),
        JikanCommand::Stream { title, episode } => {
            print_json(&provider.video_source(&title, episode).await)
        }
        JikanCommand::Episode { query, episode } => {
            print_json(&provider.episode_data(&query, episode).await)
        }
    }
}

fn apply_filter(filters: &mut [SelectFilter], idx: usize, wanted: Option<&str>) -> Result<()> {
    let Some(wanted) = wanted else {
        return Ok(());
    };
    let Some(filter) = filters.get_mut(idx) else {
        return Ok(());
    };
    if !filter.select(wanted) {
        let known: Vec<&str> = filter.values.iter().map(|o| o.name.as_str()).collect();
        bail!(
            "Unknown {} '{}'. Expected one of: {}",
            filter.name.to_lowercase(),
            wanted,
            known.join(", ")
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
