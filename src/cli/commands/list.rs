//! List command - show installed apps

use crate::cache::{AppEntry, CacheState, CacheStore};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::VappResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> VappResult<()> {
    let store = CacheStore::new(config.cache.resolved_root());
    let entries = store.list()?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No apps installed");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[AppEntry]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Installed apps");

    println!(
        "{:<20} {:<10} {:<17} {:<30}",
        style("NAME").bold(),
        style("STATE").bold(),
        style("BUILT").bold(),
        style("SPEC").bold()
    );
    println!("{}", "-".repeat(77));

    for entry in entries {
        let state_styled = match entry.state {
            CacheState::Ready => style("ready").green(),
            CacheState::Building => style("building").yellow(),
            CacheState::Stale => style("stale").red(),
            CacheState::Absent => style("absent").dim(),
        };

        let (built, spec) = match &entry.ready {
            Some(marker) => (
                marker.built_at.format("%Y-%m-%d %H:%M").to_string(),
                marker.spec.to_string(),
            ),
            None => ("-".to_string(), "-".to_string()),
        };

        println!(
            "{:<20} {:<10} {:<17} {:<30}",
            entry.name, state_styled, built, spec
        );
    }

    println!();
    println!("{} app(s)", entries.len());

    let stale = entries.iter().filter(|e| e.state == CacheState::Stale).count();
    if stale > 0 {
        ui::step_warn(
            &ctx,
            &format!("{} app(s) were interrupted mid-build and will be rebuilt on next use", stale),
        );
    }
}

fn print_json(entries: &[AppEntry]) -> VappResult<()> {
    let json = serde_json::to_string_pretty(entries)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(entries: &[AppEntry]) {
    for entry in entries {
        println!("{}", entry.name);
    }
}
