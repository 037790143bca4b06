use crate::aggregate::{build_chart_groups, summarize};
use crate::app::router;
use crate::chart::write_charts;
use crate::cli::Cli;
use crate::client::fetch_usage;
use crate::config::Config;
use crate::console::render_metrics;
use crate::errors::MetricsError;
use crate::export::{csv_filename, write_csv};
use crate::models::Record;
use crate::payload::parse_payload;
use crate::state::AppState;
use crate::storage::{upsert_all, MetricsStore, SqliteStore};
use crate::ui::render_dashboard;
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Fetch (or replay) the payload, then run each requested sink in turn.
/// Sink failures are reported and never stop the sinks after them.
pub async fn run_export(cli: &Cli, config: &Config) -> Result<(), MetricsError> {
    let org = config.require_org()?;
    let raw = match &cli.input {
        Some(path) => {
            info!("reading usage payload from {}", path.display());
            fs::read_to_string(path).await?
        }
        None => fetch_usage(config).await?,
    };

    let records = parse_payload(&raw)?;
    let summary = summarize(&records);
    info!(
        "parsed {} day(s): {} suggestions, {} acceptances ({:.1}% accepted)",
        summary.days,
        summary.suggestions,
        summary.acceptances,
        summary.acceptance_rate * 100.0
    );

    if cli.output {
        print!("{}", render_metrics(&records));
    }

    if cli.graph {
        let groups = build_chart_groups(&records);
        if let Err(err) = write_charts(&cli.chart_dir, org, &groups).await {
            error!("failed to write charts: {err}");
        }
    }

    if cli.csv {
        let path = cli
            .csv_dir
            .join(csv_filename(org, Local::now().date_naive()));
        if let Err(err) = write_csv(&path, &records).await {
            error!("failed to write {}: {err}", path.display());
        }
    }

    if cli.sql {
        if let Err(err) = export_sql(config, &records) {
            error!("database export failed: {err}");
        }
    }

    println!("{}", raw.trim_end());
    Ok(())
}

fn export_sql(config: &Config, records: &[Record]) -> Result<(), MetricsError> {
    let store = SqliteStore::from_config(config)?;
    upsert_all(&store, records)?;
    Ok(())
}

pub async fn run_dashboard(config: &Config, out: Option<&Path>) -> Result<(), MetricsError> {
    let store = SqliteStore::from_config(config)?;
    let records = if store.table_exists()? {
        store.fetch_all()?
    } else {
        Vec::new()
    };
    let html = render_dashboard(&records);

    match out {
        Some(path) => {
            fs::write(path, html).await?;
            info!("dashboard written to {} ({} days)", path.display(), records.len());
        }
        None => print!("{html}"),
    }
    Ok(())
}

pub async fn serve(config: &Config, port: u16) -> Result<(), MetricsError> {
    let store = SqliteStore::from_config(config)?;
    let app = router(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
