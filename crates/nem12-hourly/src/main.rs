mod bootstrap;

use anyhow::Result;
use nem12_core::formatting::{format_energy, format_number, format_power};
use nem12_core::settings::Settings;
use nem12_data::aggregator::HourlyAggregator;
use nem12_data::analysis::{analyze_file, HourlyReport, PipelineOutcome};
use nem12_data::export::write_hourly_csv;
use nem12_data::summary::{
    dataset_overview, hour_of_day_profile, section_energy_totals, section_summaries,
    yearly_row_counts,
};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let app_dir = bootstrap::ensure_directories()?;
    let log_file =
        bootstrap::resolve_log_file(settings.log_file.as_ref(), settings.debug, &app_dir);
    bootstrap::setup_logging(&settings.log_level, log_file.as_ref())?;

    tracing::info!("nem12-hourly v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Input: {}, window: {} days",
        settings.input.display(),
        settings.window_days
    );

    let profile_section = settings.profile_section()?;

    let mut report = match analyze_file(&settings.input, settings.window_days)? {
        PipelineOutcome::Hourly(report) => report,
        PipelineOutcome::NoData { reason, parse } => {
            println!(
                "No valid data was processed ({}). {} lines read, {} interval records.",
                reason, parse.lines_processed, parse.interval_records
            );
            return Ok(());
        }
    };

    HourlyAggregator::sort_for_presentation(&mut report.rows);

    print_summary(&report);

    if let Some(section) = profile_section {
        match hour_of_day_profile(&report.rows, section, settings.profile_year) {
            Some(profile) => {
                let scope = profile
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "all years".to_string());
                println!();
                println!("Hourly energy pattern - {} ({})", section, scope);
                println!(
                    "  Total energy: {}, average power: {}, peak power: {}",
                    format_energy(profile.metrics.total_kwh),
                    format_power(profile.metrics.mean_avg_power_kw),
                    format_power(profile.metrics.peak_power_kw)
                );
                for hour in &profile.hours {
                    println!(
                        "  {:02}:00  {:>12} kWh  {:>10} kW",
                        hour.hour,
                        format_number(hour.mean_energy_kwh, 3),
                        format_number(hour.mean_avg_power_kw, 3)
                    );
                }
            }
            None => println!("No rows for {} in the selected year.", section),
        }
    }

    if settings.no_export {
        tracing::info!("Export skipped");
    } else {
        let written = write_hourly_csv(&settings.output, &report.rows)?;
        println!();
        println!("Wrote {} hourly rows to {}", written, settings.output.display());
    }

    Ok(())
}

fn print_summary(report: &HourlyReport) {
    let overview = dataset_overview(&report.rows);
    let window = &report.window;

    println!("NEM12 hourly summary (last {} days)", window.window_days);
    println!(
        "  Original date range: {} to {}",
        window.min_date, window.max_date
    );
    println!(
        "  Keeping data from:   {} to {}",
        window.cutoff_date, window.max_date
    );
    println!(
        "  5-minute records:    {} read, {} kept",
        format_number(window.samples_before as f64, 0),
        format_number(window.samples_after as f64, 0)
    );
    println!(
        "  NMIs: {}  Sections: {}  Days: {}  Hourly records: {}",
        overview.meters,
        overview.sections,
        overview.days,
        format_number(overview.hourly_rows as f64, 0)
    );
    let found: Vec<&str> = overview.sections_found.iter().map(|s| s.as_str()).collect();
    println!("  Sections found: {}", found.join(", "));

    let parse = &report.parse;
    if parse.rejected_lines() > 0 || parse.unparseable_values > 0 {
        println!(
            "  Skipped: {} lines, {} unreadable values",
            parse.rejected_lines(),
            parse.unparseable_values
        );
    }

    println!();
    println!("Hourly energy by section");
    for s in section_summaries(&report.rows) {
        println!(
            "  {} / {:<15} total {:>12}  mean {:>8}  min {:>8}  max {:>8}  hours {:>6}  days {} ({} to {})",
            s.meter_id,
            s.section.as_str(),
            format_number(s.total_kwh, 3),
            format_number(s.mean_kwh, 3),
            format_number(s.min_kwh, 3),
            format_number(s.max_kwh, 3),
            s.hours,
            s.distinct_days,
            s.first_date,
            s.last_date
        );
    }

    println!();
    println!("Yearly breakdown");
    for (year, count) in yearly_row_counts(&report.rows) {
        println!("  {}: {} hourly records", year, format_number(count as f64, 0));
    }

    println!();
    println!("Energy by section");
    for e in section_energy_totals(&report.rows) {
        println!(
            "  {}: {}, {} avg",
            e.section,
            format_energy(e.total_kwh),
            format_power(e.mean_avg_power_kw)
        );
    }
}
