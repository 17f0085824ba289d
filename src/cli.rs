/*!
popdash Command Line Interface

Renders dashboard views from a population database and prepares database
files.
*/

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use popdash::reader::DuckDBStore;
use popdash::transform::map::DEFAULT_REFERENCE_YEAR;
use popdash::writer::html::{render_page, NavLink};
use popdash::{dispatch, schema, GeoSource, MapPolicy, PopdashError, ViewContext, VERSION};

#[derive(Parser)]
#[command(name = "popdash")]
#[command(about = "World population dashboard")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one view
    View {
        /// Query: world, region, top10, europe, about
        #[arg(long)]
        query: Option<String>,

        /// View: table, graph, map, dens_map
        #[arg(long)]
        view: Option<String>,

        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        map: MapArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Show verbose output (view details)
        #[arg(short, long)]
        verbose: bool,
    },

    /// Create a DuckDB file with the population schema
    Init {
        /// Database file to create or extend
        path: PathBuf,

        /// Load the demo dataset
        #[arg(long)]
        sample_data: bool,

        /// Load table files (CSV, Parquet, JSON named after their table)
        #[arg(long = "load-data")]
        load_data_files: Vec<String>,
    },

    /// Print the schema DDL
    Schema,
}

/// Where the population data comes from
#[derive(Args)]
pub struct StoreArgs {
    /// Population database (duckdb://memory or duckdb://path/to/file.db)
    #[arg(long, default_value = "duckdb://memory")]
    database: String,

    /// Load the demo dataset into an in-memory database
    #[arg(long)]
    sample_data: bool,

    /// Load table files into an in-memory database
    #[arg(long = "load-data")]
    load_data_files: Vec<String>,
}

/// Density map settings
#[derive(Args)]
pub struct MapArgs {
    /// GeoJSON FeatureCollection of country borders (NAME_ENGL property)
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Year shown by the density map
    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    reference_year: i32,

    /// Countries left out of the density map; replaces the default list
    #[arg(long = "exclude")]
    excluded: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full response: title, table, chart
    Json,
    /// The Vega-Lite document only
    Vegalite,
    /// Standalone HTML page
    Html,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so rendered output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popdash=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::View {
            query,
            view,
            store,
            map,
            format,
            output,
            verbose,
        } => {
            if verbose {
                eprintln!(
                    "Rendering query={} view={}",
                    query.as_deref().unwrap_or("(default)"),
                    view.as_deref().unwrap_or("(default)")
                );
            }
            cmd_view(query, view, store, map, format, output, verbose)
        }

        Commands::Init {
            path,
            sample_data,
            load_data_files,
        } => cmd_init(&path, sample_data, &load_data_files),

        Commands::Schema => {
            println!("{}", schema::SCHEMA_SQL.trim());
            Ok(())
        }
    }
}

fn open_store(args: &StoreArgs) -> Result<DuckDBStore, PopdashError> {
    let store = DuckDBStore::from_connection_string(&args.database)?;
    let in_memory = args.database == "duckdb://memory";

    if !in_memory && (args.sample_data || !args.load_data_files.is_empty()) {
        return Err(PopdashError::ValidationError(
            "--sample-data and --load-data need duckdb://memory; use `popdash init` for files"
                .to_string(),
        ));
    }

    if in_memory {
        store.with_connection(|conn| {
            schema::create_schema(conn)?;
            if args.sample_data {
                schema::load_sample_data(conn)?;
            }
            schema::load_table_files(conn, &args.load_data_files)
        })?;
    }

    Ok(store)
}

fn map_policy(args: &MapArgs) -> MapPolicy {
    let mut policy = MapPolicy {
        reference_year: args.reference_year,
        ..MapPolicy::default()
    };
    if !args.excluded.is_empty() {
        policy.excluded = args.excluded.clone();
    }
    policy
}

fn cmd_view(
    query: Option<String>,
    view: Option<String>,
    store_args: StoreArgs,
    map_args: MapArgs,
    format: OutputFormat,
    output: Option<PathBuf>,
    verbose: bool,
) -> anyhow::Result<()> {
    let store = open_store(&store_args)?;
    let geo = match &map_args.geojson {
        Some(path) => GeoSource::load(path),
        None => GeoSource::empty(),
    };
    let policy = map_policy(&map_args);
    let ctx = ViewContext::new(&store, &geo, &policy);

    let response = dispatch(&ctx, query.as_deref(), view.as_deref())?;

    if verbose {
        eprintln!(
            "{}: {} row(s), {} column(s), chart: {}",
            response.title,
            response.table.len(),
            response.table.headers.len(),
            if response.chart.is_some() { "yes" } else { "no" }
        );
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)?,
        OutputFormat::Vegalite => {
            let chart = response.chart.as_ref().ok_or_else(|| {
                anyhow!(
                    "query={} view={} has no chart",
                    response.query.as_str(),
                    response.view.as_str()
                )
            })?;
            serde_json::to_string_pretty(chart)?
        }
        OutputFormat::Html => render_page(
            &response.title,
            &[NavLink {
                label: "Dashboard",
                href: "/".to_string(),
            }],
            &response.table,
            response.plot_html.as_deref(),
        ),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if verbose {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn cmd_init(path: &Path, sample_data: bool, load_data_files: &[String]) -> anyhow::Result<()> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }

    let conn = duckdb::Connection::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    schema::create_schema(&conn)?;
    if sample_data {
        schema::load_sample_data(&conn)?;
    }
    schema::load_table_files(&conn, load_data_files)?;

    eprintln!(
        "Initialized {}; serve it with --database duckdb://{}",
        path.display(),
        path.display()
    );
    Ok(())
}
