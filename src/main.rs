use clap::{Parser, Subcommand};
use ocm_importer::app::import_use_case::ImportUseCase;
use ocm_importer::app::ports::{CachePort, CatalogApiPort};
use ocm_importer::config::ImportConfig;
use ocm_importer::infra::http_client::ReqwestCatalogApi;
use ocm_importer::infra::memory_cache::InMemoryCache;
use ocm_importer::logging;
use ocm_importer::pipeline::coordinator::ImportCoordinator;
use ocm_importer::pipeline::ingestion::cache::CachedCatalog;
use ocm_importer::pipeline::ingestion::fetcher::Fetcher;
use ocm_importer::pipeline::ingestion::rate_limiter::RateLimiter;
use ocm_importer::pipeline::processing::normalize::Normalizer;
use ocm_importer::storage::{InMemoryStorage, Storage};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Parser)]
#[command(name = "ocm_importer")]
#[command(about = "OpenChargeMap charging station importer")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the concurrent import (fetch, normalize, upsert across workers)
    Import {
        /// Override CONCURRENCY from the environment
        #[arg(long)]
        concurrency: Option<u32>,
        /// Override BATCH_SIZE from the environment
        #[arg(long)]
        batch_size: Option<u32>,
    },
    /// Fetch and import a single batch without worker fan-out
    FetchOnce {
        /// Override BATCH_SIZE from the environment
        #[arg(long)]
        batch_size: Option<u32>,
    },
}

async fn build_storage() -> Arc<dyn Storage> {
    #[cfg(feature = "db")]
    if let Ok(uri) = std::env::var("MONGODB_URI") {
        let database =
            std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "openchargemap".into());
        match ocm_importer::storage::MongoStorage::connect(&uri, &database).await {
            Ok(storage) => return Arc::new(storage),
            Err(e) => {
                error!("mongodb connection failed, falling back to in-memory storage: {e}");
            }
        }
    }
    warn!("using in-memory storage; imported data will not persist");
    Arc::new(InMemoryStorage::new())
}

async fn build_cache() -> Arc<dyn CachePort> {
    #[cfg(feature = "redis-cache")]
    if let Ok(url) = std::env::var("REDIS_URL") {
        match ocm_importer::infra::redis_cache::RedisCache::connect(&url).await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => {
                error!("redis connection failed, falling back to in-memory cache: {e}");
            }
        }
    }
    Arc::new(InMemoryCache::new())
}

fn build_use_case(
    config: &ImportConfig,
    cache: Arc<dyn CachePort>,
    storage: Arc<dyn Storage>,
) -> ImportUseCase {
    let api: Arc<dyn CatalogApiPort> = Arc::new(ReqwestCatalogApi::new(
        config.endpoint.clone(),
        config.api_key.clone(),
    ));
    // One limiter for the whole process; every worker schedules through it.
    let limiter = RateLimiter::new(config.rate_limit_min_interval);
    let fetcher = Fetcher::new(api, limiter, config.max_retries);
    let catalog = CachedCatalog::new(cache, fetcher, config.cache_ttl_secs);
    let normalizer = Normalizer::new(Arc::clone(&storage));
    ImportUseCase::new(catalog, normalizer, storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = ImportConfig::from_env()?;

    let storage = build_storage().await;
    let cache = build_cache().await;

    match cli.command {
        Commands::Import {
            concurrency,
            batch_size,
        } => {
            if let Some(c) = concurrency {
                config.concurrency = c;
            }
            if let Some(b) = batch_size {
                config.batch_size = b;
            }
            let use_case = Arc::new(build_use_case(&config, cache, storage));
            let coordinator =
                ImportCoordinator::new(use_case, config.concurrency, config.batch_size);

            match coordinator.run().await {
                Ok(summary) => {
                    println!("\n📊 Import results:");
                    println!("   Workers: {}", summary.workers);
                    println!("   Stations: {}", summary.stations);
                    println!("   Addresses: {}", summary.addresses);
                    println!("   Connections: {}", summary.connections);
                }
                Err(e) => {
                    error!("import failed: {e}");
                    println!("❌ Import failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::FetchOnce { batch_size } => {
            if let Some(b) = batch_size {
                config.batch_size = b;
            }
            let use_case = build_use_case(&config, cache, storage);
            match use_case.run_batch(config.batch_size).await {
                Ok(summary) => {
                    println!(
                        "✅ Imported {} stations ({} addresses, {} connections)",
                        summary.stations, summary.addresses, summary.connections
                    );
                }
                Err(e) => {
                    error!("batch import failed: {e}");
                    println!("❌ Batch import failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
