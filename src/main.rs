use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mobility_catalogs::cli::{Cli, Commands, Search};
use mobility_catalogs::config::Config;
use mobility_catalogs::domain::{DataType, DataTypeFilter};
use mobility_catalogs::errors::{CatalogError, CatalogResult};
use mobility_catalogs::http::ReqwestHttpClient;
use mobility_catalogs::services::{
    CatalogService, DatasetService, RefreshService, UpdateOutcome,
};
use mobility_catalogs::sources::{CatalogEntity, CatalogRegistry};
use mobility_catalogs::storage::{JsonCatalogStorage, JsonSourceRepository};

type Catalog = CatalogService<JsonSourceRepository, DatasetService<ReqwestHttpClient>>;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> CatalogResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Load both catalogs from disk
    let storage = JsonCatalogStorage::new(&config.catalog_root)?;
    let registry = CatalogRegistry::open(
        JsonSourceRepository::new(storage.clone(), DataType::Gtfs)?,
        JsonSourceRepository::new(storage, DataType::GtfsRt)?,
    )?;

    let client = ReqwestHttpClient::new(config.http_timeout)?;
    let inspector = DatasetService::new(client, config.download_dir.clone());
    let mut catalog = CatalogService::new(registry, inspector);

    match cli.command {
        Commands::AddSchedule(args) => {
            let source = catalog.add_gtfs_schedule_source(args.into_draft())?;
            print_json(&source.as_json()?)
        }
        Commands::UpdateSchedule(args) => {
            let (mdb_source_id, changes) = args.into_changes();
            let outcome = catalog.update_gtfs_schedule_source(mdb_source_id, changes)?;
            print_outcome(mdb_source_id, outcome);
            Ok(())
        }
        Commands::AddRealtime(args) => {
            let source = catalog.add_gtfs_realtime_source(args.into_draft())?;
            print_json(&source.as_json()?)
        }
        Commands::UpdateRealtime(args) => {
            let (mdb_source_id, changes) = args.into_changes();
            let outcome = catalog.update_gtfs_realtime_source(mdb_source_id, changes)?;
            print_outcome(mdb_source_id, outcome);
            Ok(())
        }
        Commands::List { data_type } => print_json(&catalog.get_sources(data_type)?),
        Commands::Search {
            criteria,
            data_type,
        } => {
            let search = criteria
                .into_search()
                .ok_or_else(|| CatalogError::InvalidInput("No search criterion".to_string()))?;
            cmd_search(&catalog, search, data_type)
        }
        Commands::Latest { data_type } => print_json(&catalog.get_latest_datasets(data_type)),
        Commands::Refresh { dry_run } => {
            let report = RefreshService::new(&mut catalog).refresh_all(dry_run)?;
            print_json(&report)
        }
    }
}

fn cmd_search(catalog: &Catalog, search: Search, data_type: DataTypeFilter) -> CatalogResult<()> {
    let sources = match search {
        Search::BoundingBox(filter) => catalog.get_sources_by_bounding_box(&filter, data_type)?,
        Search::SubdivisionName(name) => {
            catalog.get_sources_by_subdivision_name(&name, data_type)?
        }
        Search::CountryCode(code) => catalog.get_sources_by_country_code(&code, data_type)?,
        Search::Feature(feature) => catalog.get_sources_by_feature(&feature, data_type)?,
        Search::Status(status) => catalog.get_sources_by_status(status, data_type)?,
    };
    print_json(&sources)
}

fn print_outcome(mdb_source_id: u64, outcome: UpdateOutcome) {
    match outcome {
        UpdateOutcome::Updated => println!("Updated source {}", mdb_source_id),
        UpdateOutcome::NotFound => println!("No source with id {}", mdb_source_id),
    }
}

fn print_json<T: Serialize>(value: &T) -> CatalogResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
