use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streamflix")]
#[command(author, version, about = "Movie, TV and anime catalog client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep watchlist and progress in memory only
    #[arg(long, global = true)]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse an anime category, genre or A-Z letter
    Browse {
        /// Category such as "top-airing" or "most-popular"
        #[arg(default_value = "top-airing")]
        category: String,

        /// Browse a genre instead of a category
        #[arg(long, conflicts_with = "letter")]
        genre: Option<String>,

        /// Browse an A-Z list letter ("all", "other", "0-9", "a".."z")
        #[arg(long)]
        letter: Option<String>,

        /// Result page
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Search every configured catalog
    Search {
        /// Search text
        #[arg(required = true)]
        query: String,

        /// Result page
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Only search this catalog ("anime" or "tmdb")
        #[arg(long)]
        provider: Option<String>,
    },

    /// List the episodes of an anime
    Episodes {
        /// Anime id, e.g. "one-piece-100"
        #[arg(required = true)]
        anime_id: String,
    },

    /// Show what is trending in every configured catalog
    Trending,

    /// Subtitle conversion and download
    Subtitle {
        #[command(subcommand)]
        command: SubtitleCommands,
    },

    /// Show or clear saved watch progress
    Progress {
        /// Content id; lists every saved position when omitted
        content: Option<String>,

        /// Episode number
        #[arg(requires = "content")]
        episode: Option<u32>,

        /// Forget the saved position
        #[arg(long, requires = "episode")]
        clear: bool,
    },

    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        command: WatchlistCommands,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum SubtitleCommands {
    /// Convert an SRT file to WebVTT
    Convert {
        /// Subtitle file to convert
        #[arg(required = true)]
        file: PathBuf,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download a subtitle file, through the relay if needed, as WebVTT
    Fetch {
        /// Subtitle URL
        #[arg(required = true)]
        url: String,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List saved titles
    List {
        /// Sort key: "addedAt", "title" or any item field
        #[arg(long, default_value = "addedAt")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },

    /// Remove a title by id
    Remove {
        #[arg(required = true)]
        id: String,
    },

    /// Export the watchlist as JSON
    Export {
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import titles from a JSON export
    Import {
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a config file holding the defaults
    Init {
        /// Where to write it
        #[arg(default_value = "streamflix.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
