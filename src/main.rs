use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use contest_points::activity_log::{ActivityLog, ActivityLogEntry};
use contest_points::config::Config;
use contest_points::export::{self, LogTable};
use contest_points::rules::RuleTable;
use contest_points::{cascade, interactive, logging};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

#[derive(Parser)]
#[command(name = "contest-points")]
#[command(about = "Contest points calculator", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Rule table CSV (default: configured path, then "Contest Rule.csv")
    #[arg(short, long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive calculator (default)
    Tui,
    /// List segments, the codes of a segment, or the rows of a code
    List {
        /// Segment to list codes for
        #[arg(short, long)]
        segment: Option<String>,

        /// Code to list rows for (requires --segment)
        #[arg(short, long, requires = "segment")]
        code: Option<String>,
    },
    /// Compute points for one selection
    Calc {
        /// Segment name
        #[arg(short, long)]
        segment: String,

        /// Code (or "Code: Activity") label
        #[arg(short, long)]
        code: String,

        /// Activity, when the code covers several
        #[arg(short, long)]
        activity: Option<String>,

        /// Sub-category, when the code has several
        #[arg(short = 'S', long = "sub-category", alias = "refinement")]
        sub_category: Option<String>,

        /// How many times the activity was done
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Also export the result as a PNG table
        #[arg(long)]
        png: Option<PathBuf>,

        /// Also export the result as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Show or update saved settings
    Config {
        /// Rule table to use by default
        #[arg(long = "set-rules")]
        set_rules: Option<PathBuf>,

        /// Directory for exported files
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Print the current settings
        #[arg(long)]
        show: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // The TUI owns the terminal, so it logs to a file instead of stderr
    let _guard = match cli.command {
        None | Some(Commands::Tui) => match logging::init_with_file("contest-points.log") {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Warning: file logging unavailable: {}", e);
                None
            }
        },
        _ => {
            logging::init();
            None
        }
    };

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let rules = cli.rules.as_deref();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let (rules_path, table) = load_rules(&config, rules)?;
            interactive::run_interactive(
                Arc::new(table),
                rules_path,
                config.resolve_export_dir(),
            )?;
            Ok(())
        }
        Commands::List { segment, code } => {
            let (_, table) = load_rules(&config, rules)?;
            handle_list(&table, segment.as_deref(), code.as_deref());
            Ok(())
        }
        Commands::Calc {
            segment,
            code,
            activity,
            sub_category,
            count,
            png,
            json,
        } => {
            let (_, table) = load_rules(&config, rules)?;
            let selection = CalcSelection {
                segment: &segment,
                code: &code,
                activity: activity.as_deref(),
                sub_category: sub_category.as_deref(),
                count,
            };
            handle_calc(&table, &selection, png.as_deref(), json.as_deref())
        }
        Commands::Config {
            set_rules,
            export_dir,
            show,
        } => handle_config(config, set_rules, export_dir, show),
    }
}

/// Resolve the rule file (flag, then saved setting, then default) and load it
fn load_rules(config: &Config, rules_override: Option<&Path>) -> Result<(PathBuf, RuleTable)> {
    let path = config.resolve_rules_path(rules_override);
    let table = RuleTable::from_path(&path)
        .with_context(|| format!("Cannot start without the rule table {}", path.display()))?;
    Ok((path, table))
}

fn handle_list(table: &RuleTable, segment: Option<&str>, code: Option<&str>) {
    match (segment, code) {
        (None, _) => {
            println!("Segments:");
            for segment in cascade::segments(table) {
                let codes = cascade::codes(table, &segment).len();
                println!("  {} ({} codes)", segment, codes);
            }
        }
        (Some(segment), None) => {
            let codes = cascade::codes(table, segment);
            if codes.is_empty() {
                println!("No codes found for segment '{}'", segment);
                return;
            }
            println!("Codes in {}:", segment);
            for code in codes {
                let needs_choice = cascade::activities(table, segment, &code).is_some()
                    || cascade::refinements(table, segment, &code, None).is_some();
                let marker = if needs_choice { " *" } else { "" };
                println!("  {}{}", code, marker);
            }
            println!("\n* needs an activity or sub-category choice");
        }
        (Some(segment), Some(code)) => {
            let rows: Vec<_> = table
                .rows()
                .iter()
                .filter(|r| r.segment == segment && r.code == code)
                .collect();
            if rows.is_empty() {
                println!("No rows found for {} / {}", segment, code);
                return;
            }
            println!("{} / {}:", segment, code);
            for row in rows {
                println!(
                    "  {:30} {:>6}  {}",
                    row.activity_label(),
                    row.points,
                    row.points_raw.as_deref().unwrap_or("")
                );
            }
        }
    }
}

/// Names given on the `calc` command line
struct CalcSelection<'a> {
    segment: &'a str,
    code: &'a str,
    activity: Option<&'a str>,
    sub_category: Option<&'a str>,
    count: u32,
}

fn handle_calc(
    table: &RuleTable,
    selection: &CalcSelection<'_>,
    png: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let quote = cascade::quote(
        table,
        selection.segment,
        selection.code,
        selection.activity,
        selection.sub_category,
        selection.count,
    )?;

    println!("{} / {} / {}", quote.segment, quote.code, quote.activity_label);
    if let Some(raw) = quote.points_raw.as_deref() {
        println!("Rule text: {}", raw);
    }
    println!(
        "Points: {} × {} = {}",
        quote.points_per_unit,
        quote.count,
        quote.total_points()
    );

    if png.is_none() && json.is_none() {
        return Ok(());
    }

    let mut log = ActivityLog::new();
    log.add(ActivityLogEntry::from(&quote));

    if let Some(path) = png {
        export::export_png(&LogTable::from_log(&log), path)?;
        println!("Saved image to {}", path.display());
    }
    if let Some(path) = json {
        export::export_json(&log, path)?;
        println!("Saved JSON to {}", path.display());
    }

    Ok(())
}

fn handle_config(
    mut config: Config,
    set_rules: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    show: bool,
) -> Result<()> {
    let changed = set_rules.is_some() || export_dir.is_some();

    if let Some(path) = set_rules {
        config.rules_path = Some(path);
    }
    if let Some(dir) = export_dir {
        if !dir.is_dir() {
            return Err(anyhow!(
                "Export directory does not exist: {}",
                dir.display()
            ));
        }
        config.export_dir = Some(dir);
    }

    if changed {
        let path = config.save()?;
        println!("Settings saved to {}", path.display());
    }

    if show || !changed {
        println!("Rule table: {}", config.resolve_rules_path(None).display());
        println!("Export dir: {}", config.resolve_export_dir().display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parsing_default_is_tui() {
        let cli = Cli::try_parse_from(["contest-points"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.rules.is_none());
    }

    #[test]
    fn test_cli_parsing_calc() {
        let cli = Cli::try_parse_from([
            "contest-points",
            "calc",
            "-s",
            "Service",
            "-c",
            "S2",
            "-a",
            "Visit",
            "-S",
            "B",
            "-n",
            "3",
            "--rules",
            "rules.csv",
        ])
        .unwrap();

        assert_eq!(cli.rules, Some(PathBuf::from("rules.csv")));
        match cli.command {
            Some(Commands::Calc {
                segment,
                code,
                activity,
                sub_category,
                count,
                ..
            }) => {
                assert_eq!(segment, "Service");
                assert_eq!(code, "S2");
                assert_eq!(activity.as_deref(), Some("Visit"));
                assert_eq!(sub_category.as_deref(), Some("B"));
                assert_eq!(count, 3);
            }
            _ => panic!("Expected Calc command"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_count() {
        let result = Cli::try_parse_from([
            "contest-points",
            "calc",
            "-s",
            "Service",
            "-c",
            "S1",
            "-n",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parsing_config() {
        let cli = Cli::try_parse_from([
            "contest-points",
            "config",
            "--set-rules",
            "r.csv",
            "--show",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Config {
                set_rules, show, ..
            }) => {
                assert_eq!(set_rules, Some(PathBuf::from("r.csv")));
                assert!(show);
            }
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_cli_list_code_requires_segment() {
        assert!(Cli::try_parse_from(["contest-points", "list", "-c", "S1"]).is_err());
        assert!(Cli::try_parse_from(["contest-points", "list", "-s", "Service", "-c", "S1"]).is_ok());
    }
}
