use anyhow::{Context, Result};
use log::info;

use tidyplate::table::{Gain, TidyTable};
use tidyplate::transforms::{self, TimeUnit};

use super::config::{AnalysisSection, Config};
use super::TableArgs;

/// Input table plus the analysis settings that apply to it
struct Prepared {
    table: TidyTable,
    group_by: Vec<String>,
    analysis: AnalysisSection,
}

fn prepare(args: &TableArgs) -> Result<Prepared> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    let analysis = Config::load_optional(args.config.as_deref())?.analysis;

    // Grouping flags replace the config list rather than extending it
    let group_by = if args.group_by.is_empty() {
        analysis.group_by.clone()
    } else {
        args.group_by.clone()
    };

    let table = TidyTable::read_csv(&args.input)
        .with_context(|| format!("Failed to read tidy table: {}", args.input.display()))?;
    info!(
        "Read {} rows from {} ({} extra columns)",
        table.len(),
        args.input.display(),
        table.extra_columns().len()
    );

    Ok(Prepared {
        table,
        group_by,
        analysis,
    })
}

fn write(args: &TableArgs, suffix: &str, table: &TidyTable) -> Result<()> {
    let output = args.output_path(suffix);
    table
        .write_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} rows to {}", table.len(), output.display());
    println!("{}", output.display());
    Ok(())
}

/// Reshape a tidy table into per-channel trajectories
pub fn trajectories(args: TableArgs) -> Result<()> {
    let p = prepare(&args)?;
    let result = transforms::extract_trajectories(&p.table).context("Trajectory extraction failed")?;

    let output = args.output_path("trajectories");
    result
        .write_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Wrote {} trajectory points for {} channels to {}",
        result.rows.len(),
        result.channels.len(),
        output.display()
    );
    println!("{}", output.display());
    Ok(())
}

/// Subtract control wells
pub fn background(args: TableArgs, controls: Vec<String>) -> Result<()> {
    let p = prepare(&args)?;
    let result = transforms::background_subtract(&p.table, &controls, &p.group_by)
        .context("Background subtraction failed")?;
    write(&args, "background", &result)
}

/// Average over a time window
pub fn window(args: TableArgs, start: f64, end: f64, unit: TimeUnit) -> Result<()> {
    let p = prepare(&args)?;
    let result = transforms::window_average(&p.table, start, end, unit, &p.group_by)
        .context("Window averaging failed")?;
    write(&args, "window", &result)
}

/// Average the trailing points of each series
pub fn endpoint(args: TableArgs, window_size: usize) -> Result<()> {
    let p = prepare(&args)?;
    let result = transforms::endpoint_average(&p.table, window_size, &p.group_by)
        .context("Endpoint averaging failed")?;
    write(&args, "endpoint", &result)
}

/// Fit smoothing splines
pub fn spline(args: TableArgs, column: String, smoothing: Option<f64>) -> Result<()> {
    let p = prepare(&args)?;
    let smoothing = smoothing.or(p.analysis.smoothing);
    let result = transforms::spline_fit(&p.table, &column, smoothing, &p.group_by)
        .with_context(|| format!("Spline fit of '{}' failed", column))?;
    write(&args, "spline", &result)
}

/// Differentiate smoothing splines
pub fn derivative(args: TableArgs, column: String, smoothing: Option<f64>) -> Result<()> {
    let p = prepare(&args)?;
    let smoothing = smoothing.or(p.analysis.smoothing);
    let result = transforms::smoothed_derivative(&p.table, &column, smoothing, &p.group_by)
        .with_context(|| format!("Derivative of '{}' failed", column))?;
    write(&args, "derivative", &result)
}

/// Normalize by a reference channel
pub fn normalize(args: TableArgs, channel: String, gain: Gain) -> Result<()> {
    let p = prepare(&args)?;
    let result = transforms::normalize(&p.table, &channel, gain, &p.group_by)
        .with_context(|| format!("Normalization by {} (gain {}) failed", channel, gain))?;
    write(&args, "normalized", &result)
}
