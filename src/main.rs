//! Greendash CLI - run the green-finance chart pipeline from the shell.
//!
//! # Main Commands
//!
//! ```bash
//! greendash serve                       # Start HTTP server (port 3000)
//! greendash series issuer-by-year --group-by period --change
//! greendash datasets                    # List the known datasets
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! greendash fetch gdp                   # Fetch + parse one dataset to JSON
//! greendash reshape input.csv --id-columns Country,Region
//! ```

use clap::{Parser, Subcommand};
use greendash::models::{Period, ProceedsCategory, RegionFilter};
use greendash::source::{DatasetId, FileSource, RemoteSource, Source};
use greendash::transform::{run_chart, run_on_source, ChartRequest, GroupKey};
use greendash::{parse_file_auto, reshape};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "greendash")]
#[command(about = "Reshape and aggregate green-finance statistics for charting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known datasets and where they are fetched from
    Datasets {
        /// Read datasets from local CSV files in this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Fetch one dataset and output the parsed table as JSON
    Fetch {
        /// Dataset slug (see `greendash datasets`)
        dataset: String,

        /// Read datasets from local CSV files in this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Melt a local wide CSV into long records
    Reshape {
        /// Input CSV file
        input: PathBuf,

        /// Identifier columns, comma separated (first becomes the entity)
        #[arg(long, value_delimiter = ',')]
        id_columns: Vec<String>,

        /// Columns to unpivot, comma separated (default: 4-digit-year columns)
        #[arg(long, value_delimiter = ',')]
        value_columns: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the full chart pipeline for one dataset
    Series {
        /// Dataset slug (see `greendash datasets`)
        dataset: String,

        /// Read datasets from local CSV files in this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep one year only (4-digit)
        #[arg(long)]
        year: Option<String>,

        /// Keep one region, or "All" to keep every labelled region
        #[arg(long)]
        region: Option<String>,

        /// Keep one country
        #[arg(long)]
        country: Option<String>,

        /// Keep one use-of-proceeds category
        #[arg(long)]
        category: Option<String>,

        /// Group and sum: "period", "entity", or a pass-through column
        #[arg(long)]
        group_by: Option<String>,

        /// Sort grouped points chronologically
        #[arg(long)]
        chronological: bool,

        /// Sort grouped points by descending total
        #[arg(long)]
        ranked: bool,

        /// Drop null and zero values before aggregating
        #[arg(long)]
        drop_zero: bool,

        /// Derive period-over-period percent change
        #[arg(long)]
        change: bool,

        /// Derive percentage shares
        #[arg(long)]
        share: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Read datasets from local CSV files in this directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Datasets { data_dir } => cmd_datasets(source_for(data_dir)),

        Commands::Fetch {
            dataset,
            data_dir,
            output,
        } => cmd_fetch(&dataset, source_for(data_dir), output.as_deref()).await,

        Commands::Reshape {
            input,
            id_columns,
            value_columns,
            output,
        } => cmd_reshape(&input, id_columns, value_columns, output.as_deref()),

        Commands::Series {
            dataset,
            data_dir,
            year,
            region,
            country,
            category,
            group_by,
            chronological,
            ranked,
            drop_zero,
            change,
            share,
            output,
        } => {
            cmd_series(
                &dataset,
                source_for(data_dir),
                SeriesArgs {
                    year,
                    region,
                    country,
                    category,
                    group_by,
                    chronological,
                    ranked,
                    drop_zero,
                    change,
                    share,
                },
                output.as_deref(),
            )
            .await
        }

        Commands::Serve { port, data_dir } => cmd_serve(port, source_for(data_dir)).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn source_for(data_dir: Option<PathBuf>) -> Source {
    match data_dir {
        Some(dir) => Source::File(FileSource::new(dir)),
        None => Source::Remote(RemoteSource::from_env()),
    }
}

fn cmd_datasets(source: Source) -> Result<(), Box<dyn std::error::Error>> {
    for id in DatasetId::ALL {
        println!("{}", id.slug());
        println!("   Location: {}", source.location(id));
        println!("   Id columns: {}", id.default_id_columns().join(", "));
        match id.fixed_value_columns() {
            Some(cols) => println!("   Value columns: {}", cols.join(", ")),
            None => println!("   Value columns: 4-digit-year columns (auto)"),
        }
        println!();
    }
    Ok(())
}

async fn cmd_fetch(
    dataset: &str,
    source: Source,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = DatasetId::from_slug(dataset)?;
    eprintln!("Fetching: {}", source.location(id));

    let parsed = source.fetch(id).await?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        match parsed.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Columns: {}", parsed.table.columns.join(", "));
    eprintln!("Parsed {} rows", parsed.table.row_count());

    let json = serde_json::to_string_pretty(&parsed.table)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_reshape(
    input: &Path,
    id_columns: Vec<String>,
    value_columns: Vec<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Reshaping: {}", input.display());

    let parsed = parse_file_auto(input)?;
    let value_columns = if value_columns.is_empty() {
        greendash::detect_period_columns(&parsed.table)
    } else {
        value_columns
    };

    let records = reshape(&parsed.table, &id_columns, &value_columns)?;
    eprintln!(
        "   {} rows x {} columns -> {} records",
        parsed.table.row_count(),
        value_columns.len(),
        records.len()
    );

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

struct SeriesArgs {
    year: Option<String>,
    region: Option<String>,
    country: Option<String>,
    category: Option<String>,
    group_by: Option<String>,
    chronological: bool,
    ranked: bool,
    drop_zero: bool,
    change: bool,
    share: bool,
}

async fn cmd_series(
    dataset: &str,
    source: Source,
    args: SeriesArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = DatasetId::from_slug(dataset)?;
    let mut request = ChartRequest::new(id);

    if let Some(year) = args.year {
        request = request.period(Period::new(year)?);
    }
    if let Some(ref region) = args.region {
        let filter = RegionFilter::from_label(region)
            .ok_or_else(|| format!("Unknown region: {}", region))?;
        request = request.region(filter);
    }
    if let Some(country) = args.country {
        request = request.entity(country);
    }
    if let Some(ref category) = args.category {
        let category = ProceedsCategory::from_label(category)
            .ok_or_else(|| format!("Unknown category: {}", category))?;
        request = request.category(category);
    }
    if let Some(ref key) = args.group_by {
        let key = match key.as_str() {
            "period" => GroupKey::Period,
            "entity" => GroupKey::Entity,
            attr => GroupKey::Attr(attr.to_string()),
        };
        request = request.group_by(key);
    }
    request.chronological = args.chronological;
    request.ranked = args.ranked;
    request.drop_zero = args.drop_zero;
    request.change = args.change;
    request.share = args.share;

    let report = run_on_source(&source, &request).await?;

    eprintln!("   Records:  {}", report.series.records.len());
    eprintln!("   Entities: {}", report.series.entity_count);
    if let Some(ref points) = report.series.points {
        eprintln!("   Groups:   {}", points.len());
    }
    if let Some(ref headline) = report.series.headline {
        match headline.change {
            Some(change) => eprintln!(
                "   Headline: {} = {:.2} ({:+.2}%)",
                headline.period, headline.total, change
            ),
            None => eprintln!("   Headline: {} = {:.2}", headline.period, headline.total),
        }
    }

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16, source: Source) -> Result<(), Box<dyn std::error::Error>> {
    greendash::server::start_server(port, source).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_series_flags() {
        let cli = Cli::try_parse_from([
            "greendash",
            "series",
            "bonds-by-country",
            "--year",
            "2022",
            "--region",
            "Europe",
            "--group-by",
            "entity",
            "--ranked",
            "--drop-zero",
        ])
        .unwrap();

        match cli.command {
            Commands::Series {
                dataset,
                year,
                region,
                group_by,
                ranked,
                drop_zero,
                change,
                ..
            } => {
                assert_eq!(dataset, "bonds-by-country");
                assert_eq!(year.as_deref(), Some("2022"));
                assert_eq!(region.as_deref(), Some("Europe"));
                assert_eq!(group_by.as_deref(), Some("entity"));
                assert!(ranked);
                assert!(drop_zero);
                assert!(!change);
            }
            _ => panic!("expected series command"),
        }
    }

    #[test]
    fn test_cli_parses_reshape_column_lists() {
        let cli = Cli::try_parse_from([
            "greendash",
            "reshape",
            "bonds.csv",
            "--id-columns",
            "Country,Region",
            "--value-columns",
            "2021,2022",
        ])
        .unwrap();

        match cli.command {
            Commands::Reshape {
                id_columns,
                value_columns,
                ..
            } => {
                assert_eq!(id_columns, vec!["Country", "Region"]);
                assert_eq!(value_columns, vec!["2021", "2022"]);
            }
            _ => panic!("expected reshape command"),
        }
    }

    #[tokio::test]
    async fn test_series_from_file_source() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issuer-by-year.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Type_of_Issuer,2020,2021").unwrap();
        writeln!(file, "Sovereign,10,20").unwrap();
        writeln!(file, "Banks,5,").unwrap();

        let source = Source::File(FileSource::new(dir.path()));
        let request = ChartRequest::new(DatasetId::IssuerByYear)
            .group_by(GroupKey::Period)
            .with_change();
        let report = run_on_source(&source, &request).await.unwrap();

        assert_eq!(report.series.records.len(), 4);
        let points = report.series.points.unwrap();
        assert_eq!(points[0].total, 15.0);
        assert_eq!(points[1].total, 20.0);
        assert_eq!(report.csv_info.row_count, 2);
    }

    #[test]
    fn test_run_chart_reachable_from_bin() {
        use greendash::models::{CellValue, WideTable};

        let table = WideTable::new(
            vec!["Country".into(), "2022".into()],
            vec![vec![
                CellValue::Text("France".into()),
                CellValue::Number(51.9),
            ]],
        )
        .unwrap();
        let series = run_chart(&table, &ChartRequest::new(DatasetId::GdpByCountry)).unwrap();
        assert_eq!(series.records.len(), 1);
    }
}
