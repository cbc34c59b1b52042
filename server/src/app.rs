//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{ApiServer, Resources};
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, DEFAULT_LOG_FILTER, ENV_LOG, ENV_LOG_FORMAT};
use crate::core::shutdown::ShutdownService;
use crate::data::sqlite::catalog;
use crate::data::{SqliteService, SqliteStore};
use crate::query::QueryExecutor;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<SqliteService>,
    pub executor: QueryExecutor,
    pub resources: Arc<Resources>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Seed { products, posts }) => {
                Self::seed(&cli_config, products, posts).await
            }
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        // Endpoint definitions are validated before touching the database
        let resources = Resources::new(&config.query, config.cursor_secret.key())
            .context("Invalid list endpoint configuration")?;

        let database = Arc::new(
            SqliteService::init(&config.database.path)
                .await
                .with_context(|| {
                    format!("Failed to open database {}", config.database.path.display())
                })?,
        );
        let store = SqliteStore::new(database.pool().clone(), config.query.timeout_secs);
        let executor = QueryExecutor::new(Arc::new(store));
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            database,
            executor,
            resources: Arc::new(resources),
        })
    }

    async fn seed(cli: &CliConfig, products: usize, posts: usize) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let database = SqliteService::init(&config.database.path)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;

        let (products, posts) = catalog::seed_demo(database.pool(), products, posts)
            .await
            .context("Failed to seed demo data")?;
        database.close().await;

        println!(
            "Seeded {} products and {} posts into {}",
            products,
            posts,
            config.database.path.display()
        );
        Ok(())
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        // JSON lines for log shippers, compact text otherwise
        let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|f| f.eq_ignore_ascii_case("json"));
        let builder = tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_env_filter(filter);
        if json {
            builder.json().with_current_span(false).init();
        } else {
            builder.with_ansi(true).compact().init();
        }
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.shutdown
            .register(
                app.database
                    .start_checkpoint_task(app.shutdown.subscribe()),
            )
            .await;

        tracing::info!(
            "{} v{} on http://{} (database: {})",
            APP_NAME,
            env!("CARGO_PKG_VERSION"),
            app.config.bind_address(),
            app.config.database.path.display()
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
