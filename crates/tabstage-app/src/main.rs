//! tabstage staging inspector CLI.
//!
//! Feeds two snapshots of a buffer region through the staging core and
//! prints the resulting plan the way an editor host would receive it.
//! Useful for debugging provider output without a live editor attached.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tabstage_adapters::config::Config;
use tabstage_core::diff::{self, DiffOptions};
use tabstage_core::protocol::ProviderType;
use tabstage_core::staging::{self, StageParams};

#[derive(Parser, Debug)]
#[command(
    name = "tabstage",
    about = "Inspect completion staging plans",
    long_about = "Computes the line diff between an original buffer region and a\n\
                  proposed completion, clusters the changes, and prints the staged\n\
                  application plan with buffer coordinates and cursor targets.",
    version
)]
struct Args {
    /// File holding the original buffer region
    old: PathBuf,

    /// File holding the proposed completion text
    new: PathBuf,

    /// Cursor row in buffer coordinates
    #[arg(long, default_value_t = 1)]
    cursor_row: i64,

    /// Buffer line number of the first completion line
    #[arg(long, default_value_t = 1)]
    base_offset: i64,

    /// Proximity threshold in lines
    #[arg(long, default_value_t = 3)]
    threshold: i64,

    /// Relative path reported in cursor targets
    #[arg(long, default_value = "buffer")]
    path: String,

    /// Provider name to validate against the configuration (zeta,
    /// auto_complete, sweep)
    #[arg(long, default_value = "zeta")]
    provider: String,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Only report whether the completion would be applied in stages
    #[arg(long)]
    split_check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let provider_type: ProviderType = args.provider.parse()?;

    let mut config = Config {
        provider_type,
        proximity_threshold: args.threshold,
        ..Config::default()
    };
    config.sanitize();

    let old_text = fs::read_to_string(&args.old)
        .with_context(|| format!("failed to read {}", args.old.display()))?;
    let new_text = fs::read_to_string(&args.new)
        .with_context(|| format!("failed to read {}", args.new.display()))?;

    let diff = diff::compute_diff_with(
        &old_text,
        &new_text,
        DiffOptions {
            char_diff_min_common: config.char_diff_min_common,
        },
    );

    if args.split_check {
        println!(
            "{}",
            staging::should_split_completion(&diff, config.proximity_threshold)
        );
        return Ok(());
    }

    let new_lines = diff::split_lines(&new_text);
    let result = staging::create_stages(
        &diff,
        &new_lines,
        &StageParams {
            cursor_row: args.cursor_row,
            viewport_top: 0,
            viewport_bottom: 0,
            base_line_offset: args.base_offset,
            proximity_threshold: config.proximity_threshold,
            file_path: &args.path,
        },
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.stages.is_empty() {
        println!("no changes");
        return Ok(());
    }

    let total = result.stages.len();
    for (index, stage) in result.stages.iter().enumerate() {
        println!(
            "stage {}/{}: buffer {}..{} ({} lines){}",
            index + 1,
            total,
            stage.buffer_start,
            stage.buffer_end,
            stage.lines.len(),
            if stage.is_pure_insertion() {
                " [insert]"
            } else {
                ""
            }
        );
        for group in &stage.groups {
            println!(
                "  {:?}: stage lines {}..{}",
                group.kind, group.start_line, group.end_line
            );
        }
        println!(
            "  cursor -> {}:{}{}",
            stage.cursor_target.relative_path,
            stage.cursor_target.line_number,
            if stage.cursor_target.should_retrigger {
                " (retrigger)"
            } else {
                ""
            }
        );
    }

    Ok(())
}
