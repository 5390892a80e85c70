mod cli;

use streamflix::{
    anime::AnimeClient,
    cache::RequestCache,
    catalog::CatalogRegistry,
    config::{self, Config},
    http,
    playback::ProgressStore,
    storage::{FileStorage, MemoryStorage, Storage},
    subtitles::SubtitleFetcher,
    tmdb::TmdbClient,
    watchlist::{CatalogItem, SortKey, SortOrder, Watchlist},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommands, SubtitleCommands, WatchlistCommands};
use std::path::Path;
use std::sync::Arc;
use streamflix_common::BrowseCategory;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamflix=debug,streamflix_subtitle=debug".to_string()
        } else {
            "streamflix=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Config {
            command: ConfigCommands::Init { path, force },
        } => init_config(&path, force),
        Commands::Version => {
            println!("streamflix {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Subtitle {
            command: SubtitleCommands::Convert { file, output },
        } => convert_subtitle(&file, output.as_deref()),
        command => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            http::set_retry_config(config.retry.clone());

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run(command, config, cli.no_persist))
        }
    }
}

async fn run(command: Commands, config: Config, no_persist: bool) -> Result<()> {
    let cache = RequestCache::new(config.cache.ttl());
    let _sweeper = cache.spawn_sweeper(config.cache.sweep_interval());

    let anime = Arc::new(AnimeClient::from_config(&config.api, cache.clone()));
    let tmdb = Arc::new(TmdbClient::from_config(&config.api, cache.clone()));

    let storage: Arc<dyn Storage> = if no_persist {
        Arc::new(MemoryStorage::new())
    } else {
        let path = config.storage.resolved_path();
        tracing::debug!("Using storage file {}", path.display());
        Arc::new(FileStorage::open(path))
    };

    match command {
        Commands::Browse {
            category,
            genre,
            letter,
            page,
        } => {
            let results = if let Some(genre) = genre {
                anime.browse_genre(&genre, page).await?
            } else if let Some(letter) = letter {
                anime.browse_letter(&letter, page).await?
            } else {
                let category: BrowseCategory = category.parse()?;
                anime.browse(category, page).await?
            };
            print_listing(&results);
        }
        Commands::Search {
            query,
            page,
            provider,
        } => {
            let mut registry = CatalogRegistry::new();
            match provider.as_deref() {
                None => {
                    registry.register(tmdb);
                    registry.register(anime);
                }
                Some("anime") => registry.register(anime),
                Some("tmdb") => registry.register(tmdb),
                Some(other) => anyhow::bail!("Unknown provider: {}", other),
            }
            let items = registry.search(&query, page).await?;
            print_items(&items);
        }
        Commands::Episodes { anime_id } => {
            let episodes = anime.episodes(&anime_id).await?;
            if episodes.is_empty() {
                println!("No episodes found for {}", anime_id);
            }
            for episode in episodes {
                let filler = if episode.is_filler { " [filler]" } else { "" };
                println!(
                    "{:>4}. {}{}  ({})",
                    episode.number,
                    episode.title,
                    filler,
                    episode.id
                );
            }
        }
        Commands::Trending => {
            let mut registry = CatalogRegistry::new();
            registry.register(tmdb);
            registry.register(anime);
            let items = registry.trending().await?;
            print_items(&items);
        }
        Commands::Subtitle {
            command: SubtitleCommands::Fetch { url, output },
        } => {
            let fetcher = SubtitleFetcher::new(config.proxy.clone());
            let fetched = fetcher.fetch_text(&url).await?;
            let document = streamflix_subtitle::parse(&fetched.text);
            tracing::info!(
                "Fetched {} cues via {} strategy",
                document.len(),
                fetched.source
            );
            write_output(output.as_deref(), &document.to_webvtt())?;
        }
        Commands::Subtitle {
            command: SubtitleCommands::Convert { file, output },
        } => convert_subtitle(&file, output.as_deref())?,
        Commands::Progress {
            content,
            episode,
            clear,
        } => {
            let store = ProgressStore::with_policy(storage, config.player.resume_policy());
            show_progress(&store, content.as_deref(), episode, clear)?;
        }
        Commands::Watchlist { command } => {
            let watchlist = Watchlist::load(storage);
            manage_watchlist(&watchlist, command)?;
        }
        Commands::Validate { .. } | Commands::Config { .. } | Commands::Version => {}
    }

    Ok(())
}

fn print_listing(results: &[serde_json::Value]) {
    let items: Vec<CatalogItem> = results
        .iter()
        .filter_map(|v| streamflix::catalog::item_from_listing(v, None))
        .collect();
    print_items(&items);
}

fn print_items(items: &[CatalogItem]) {
    if items.is_empty() {
        println!("No results");
        return;
    }
    for item in items {
        let kind = item.media_type.map(|m| m.as_str()).unwrap_or("-");
        println!(
            "{:<8} {:<32} {}",
            kind,
            item.id,
            item.title.as_deref().unwrap_or("Untitled")
        );
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, text)
            .with_context(|| format!("Failed to write {:?}", p)),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn convert_subtitle(file: &Path, output: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read subtitle file: {:?}", file))?;
    let document = streamflix_subtitle::parse(&text);
    if document.is_empty() {
        anyhow::bail!("No subtitle cues found in {:?}", file);
    }
    tracing::info!("Converted {} cues", document.len());
    write_output(output, &document.to_webvtt())
}

fn show_progress(
    store: &ProgressStore,
    content: Option<&str>,
    episode: Option<u32>,
    clear: bool,
) -> Result<()> {
    match (content, episode) {
        (Some(content), Some(episode)) if clear => {
            store.clear(content, episode)?;
            println!("Cleared progress for {} episode {}", content, episode);
        }
        (Some(content), Some(episode)) => match store.load(content, episode) {
            Some(record) => {
                println!(
                    "{} episode {}: {:.0}s (saved {})",
                    content,
                    episode,
                    record.position_seconds,
                    record.saved_at.to_rfc3339()
                );
                match store.resume_position(content, episode) {
                    Some(position) => println!("Resumes at {:.0}s", position),
                    None => println!("Starts from the beginning"),
                }
            }
            None => println!("No saved progress for {} episode {}", content, episode),
        },
        (content, _) => {
            let entries = store.entries();
            let entries = entries
                .iter()
                .filter(|(name, _)| content.map_or(true, |c| name.starts_with(c)));
            for (name, record) in entries {
                let percent = record
                    .fraction()
                    .map(|f| format!("{:.0}%", f * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<40} {:>8.0}s {:>5}", name, record.position_seconds, percent);
            }
        }
    }
    Ok(())
}

fn manage_watchlist(watchlist: &Watchlist, command: WatchlistCommands) -> Result<()> {
    match command {
        WatchlistCommands::List { sort, asc } => {
            let key: SortKey = sort.parse()?;
            let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
            watchlist.sort(&key, order);
            for item in watchlist.items() {
                println!(
                    "{:<32} {:<40} {}",
                    item.id(),
                    item.display_title().unwrap_or("Untitled"),
                    item.added_at.format("%Y-%m-%d")
                );
            }
        }
        WatchlistCommands::Remove { id } => {
            if watchlist.remove(&id) {
                println!("Removed {}", id);
            } else {
                println!("{} is not in the watchlist", id);
            }
        }
        WatchlistCommands::Export { output } => {
            let json = watchlist.export_json()?;
            write_output(output.as_deref(), &json)?;
        }
        WatchlistCommands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let added = watchlist.import_json(&json)?;
            println!("Imported {} items", added);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Anime API: {}", config.api.anime_base_url);
            println!("  TMDB API: {}", config.api.tmdb_base_url);
            println!(
                "  TMDB key: {}",
                if config.api.tmdb_api_key.is_empty() { "missing" } else { "set" }
            );
            println!("  Proxy: {}", config.proxy.base_url);
            println!("  Retries: {}", config.retry.max_retries);
            println!("  Cache TTL: {}s", config.cache.ttl_secs);
            println!("  Storage: {}", config.storage.resolved_path().display());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Anime API: {}", config.api.anime_base_url);
            println!("  Proxy: {}", config.proxy.base_url);
        }
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists, use --force to overwrite", path);
    }
    config::save_config(path, &Config::default())?;
    println!("Wrote default config to {:?}", path);
    Ok(())
}
