//! Reconcile command: attribute crossings to trips and write the report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use tollrec_core::{Diagnostics, correlate};

use crate::Config;
use crate::cli::OutputFormat;
use crate::export;
use crate::normalize;

/// Inputs of a reconcile run.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileArgs<'a> {
    pub trips: &'a Path,
    pub crossings: &'a Path,
    pub output: Option<&'a Path>,
    pub format: OutputFormat,
}

/// Runs the reconciliation and returns the report path.
pub fn run<W: Write>(writer: &mut W, config: &Config, args: ReconcileArgs<'_>) -> Result<PathBuf> {
    let engine = config.engine_config()?;
    let trips = normalize::read_trip_log(args.trips, &config.fleet_filter())?;
    let crossings = normalize::read_crossing_log(args.crossings)?;
    let (trips, crossings) = normalize::scope(trips, crossings, config.start_date);

    let correlation =
        correlate(&trips, &crossings, &engine).context("failed to correlate crossings")?;

    let path = args.output.map_or_else(
        || {
            config.output_dir.join(export::default_file_name(
                Local::now().naive_local(),
                args.format,
            ))
        },
        Path::to_path_buf,
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    export::write(BufWriter::new(file), args.format, &correlation.results)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), results = correlation.results.len(), "report written");

    write_summary(writer, &correlation.diagnostics, &path)?;
    Ok(path)
}

fn write_summary<W: Write>(writer: &mut W, diagnostics: &Diagnostics, path: &Path) -> Result<()> {
    writeln!(
        writer,
        "Reconciled {} crossings across {} vehicles",
        diagnostics.crossings_in, diagnostics.vehicles
    )?;
    writeln!(writer, "Attributed: {}", diagnostics.attributed)?;
    writeln!(writer, "Unattributed: {}", diagnostics.unattributed)?;
    if !diagnostics.by_resolution.is_empty() {
        writeln!(writer, "By resolution:")?;
        for (resolution, count) in &diagnostics.by_resolution {
            writeln!(writer, "- {resolution}: {count}")?;
        }
    }
    writeln!(
        writer,
        "Ordering violations: {}",
        diagnostics.ordering_violations
    )?;
    writeln!(
        writer,
        "Unscheduled dates: {} ({} crossings)",
        diagnostics.unscheduled_dates, diagnostics.unscheduled_crossings
    )?;
    writeln!(
        writer,
        "Departures carried forward: {}",
        diagnostics.departures_carried_forward
    )?;
    if !diagnostics.cardinality_holds() {
        writeln!(
            writer,
            "WARNING: {} results for {} crossings",
            diagnostics.results_out, diagnostics.crossings_in
        )?;
    }
    writeln!(writer, "Report: {}", path.display())?;
    Ok(())
}
