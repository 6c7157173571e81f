//! # Output
//!
//! Writes the transport coefficients of every condition as JSON, optionally followed by the
//! per-state solution, and prints a short summary to the terminal.

use super::{
    calculations::{ConditionReport, RunState},
    styles::Styles,
};
use crate::{carrier::CarrierType, error::IOError};
use itertools::Itertools;
use owo_colors::OwoColorize;
use std::{fs::File, io::BufWriter, path::Path};

pub(crate) fn write_reports(
    directory: &Path,
    input: &Path,
    reports: &[ConditionReport],
) -> Result<(), IOError> {
    let document = serde_json::json!({
        "input": input.display().to_string(),
        "date": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "results": reports,
    });
    let path = directory.join("transport.json");
    serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &document)?;
    tracing::info!("Transport coefficients written to {}", path.display());
    Ok(())
}

pub(crate) fn write_state(directory: &Path, state: &RunState) -> Result<(), IOError> {
    let path = directory.join("state.json");
    serde_json::to_writer(BufWriter::new(File::create(&path)?), state)?;
    tracing::info!("Per-state solution written to {}", path.display());
    Ok(())
}

pub(crate) fn print_summary(reports: &[ConditionReport], styles: &Styles) {
    for report in reports {
        println!(
            "{}",
            format!(
                "c = {:.3e} cm^-3, T = {} K, E_F = {:.4} eV",
                report.doping, report.temperature, report.fermi
            )
            .style(styles.condition_style)
        );
        for carrier in CarrierType::ALL {
            let transport = &report.transport[carrier];
            let mobility = &transport.mobility;
            let mechanisms = mobility
                .mechanisms
                .iter()
                .map(|(name, value)| format!("{name} {:.4e}", value.mean()))
                .join(", ");
            println!(
                "  {} n = {:.4e} cm^-3, μ = {} cm^2/Vs ({mechanisms}), S = {:.2} μV/K, σ = {:.4e} S/cm",
                format!("{carrier}-type").style(styles.carrier_style),
                report.calculated[carrier],
                format!("{:.4e}", mobility.overall.mean()).style(styles.value_style),
                transport.seebeck,
                transport.mean_conductivity(),
            );
        }
        if report.relative_error > 1e-3 {
            println!(
                "  {}",
                format!(
                    "the Fermi level reproduces the doping to {:.2e}",
                    report.relative_error
                )
                .style(styles.warning_style)
            );
        }
        println!("  combined S = {:.2} μV/K", report.seebeck);
    }
}
