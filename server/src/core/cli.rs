use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_CURSOR_TTL, ENV_DATABASE, ENV_HOST, ENV_PORT};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(version, about = "Storefront catalog and feed API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,

    /// Lifetime of pagination cursors in seconds
    #[arg(long, global = true, env = ENV_CURSOR_TTL)]
    pub cursor_ttl: Option<u64>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Load demo products and posts into the database
    Seed {
        /// Number of products to insert
        #[arg(long, default_value_t = 200)]
        products: usize,

        /// Number of posts to insert
        #[arg(long, default_value_t = 500)]
        posts: usize,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub cursor_ttl: Option<u64>,
}

impl From<Cli> for (CliConfig, Option<Commands>) {
    fn from(cli: Cli) -> Self {
        let config = CliConfig {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            database: cli.database,
            cursor_ttl: cli.cursor_ttl,
        };
        (config, cli.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into()
}
