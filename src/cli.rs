//! Command-line argument parsing for the `esg-sim` binary.

use std::env;
use std::path::PathBuf;

/// Parsed CLI arguments.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub supply: Option<PathBuf>,
    pub demand: Option<PathBuf>,
    pub portfolio: Option<String>,
    pub offsets: Option<Vec<f64>>,
    pub out_dir: Option<PathBuf>,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

/// Parses an explicit argument list (without the program name).
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                set_once(&mut opts.scenario, PathBuf::from(path), "--scenario")?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--supply" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --supply (expected a CSV file path)")?;
                set_once(&mut opts.supply, PathBuf::from(path), "--supply")?;
            }
            "--demand" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --demand (expected a CSV file path)")?;
                set_once(&mut opts.demand, PathBuf::from(path), "--demand")?;
            }
            "--portfolio" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --portfolio (expected a portfolio name)")?;
                set_once(&mut opts.portfolio, name.to_string(), "--portfolio")?;
            }
            "--offsets" => {
                i += 1;
                let raw = args.next_or_err(
                    i,
                    "missing value for --offsets (expected comma-separated numbers)",
                )?;
                set_once(&mut opts.offsets, parse_offsets(raw)?, "--offsets")?;
            }
            "--out-dir" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --out-dir (expected a directory path)")?;
                set_once(&mut opts.out_dir, PathBuf::from(path), "--out-dir")?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if opts.scenario.is_none() && opts.preset.is_none() {
        opts.preset = Some("baseline".to_string());
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_offsets(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("--offsets value \"{s}\" is not a finite number"))
        })
        .collect()
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("esg-sim: merit-order dispatch and portfolio financing simulator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  esg-sim [--scenario <path> | --preset <name>] [--supply <csv>] [--demand <csv>]"
    );
    eprintln!("          [--portfolio <name>] [--offsets <a,b,...>] [--out-dir <dir>]");
    eprintln!();
    eprintln!("Presets: baseline (default), high_rate, markup");
    eprintln!("Logging is controlled with RUST_LOG (default: info).");
}
