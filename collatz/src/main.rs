//! Collatz stopping-time explorer.
//!
//! Each command evaluates one or more variants over `[1, 10^k)` and prints the
//! data a chart would be drawn from, as `key=value` text or JSON. Rendering is
//! left to whatever consumes the output.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use collatz::compare::compare_to_baseline;
use collatz::exit_codes;
use collatz::io::config::{DEFAULT_CONFIG_FILE, ExplorerConfig, load_config, write_config};
use collatz::logging;
use collatz::maximum::max_peaks;
use collatz::ratios::{NUMERATOR, ratio_histogram, ratio_line};
use collatz::stopping_time::{step_histogram, step_scatter};
use collatz::{OverflowPolicy, ResultTriple, Variant, evaluate_one};

/// Largest `k` whose `10^k` fits in a `u64`.
const MAX_POWER: u32 = 19;

#[derive(Parser)]
#[command(
    name = "collatz",
    version,
    about = "Collatz stopping-time explorer for f (standard), g (reduced) and h (main result)"
)]
struct Cli {
    /// Configuration file. Defaults to `collatz.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Compare g (reduced) or h (main result) to f to empirically verify equality.
    Compare {
        #[arg(long = "fn", value_enum)]
        function: Accelerated,
        /// Examine n up to 10^k.
        #[arg(short, long, default_value_t = 5)]
        k: u32,
    },
    /// Maximum value reached for the given function. Leave --fn out for all.
    Max {
        #[arg(long = "fn", value_enum)]
        function: Option<Function>,
        /// Examine n up to 10^k.
        #[arg(short, long, default_value_t = 7)]
        k: u32,
    },
    /// Total stopping time as a histogram or as per-input rows.
    Time {
        #[arg(long = "fn", value_enum)]
        function: Option<Function>,
        /// Examine n up to 10^k.
        #[arg(short, long, default_value_t = 5)]
        k: u32,
        #[arg(long, value_enum)]
        graph: TimeGraph,
    },
    /// Cumulative ratio of h(x) over f(x) or g(x).
    Ratios {
        #[arg(long = "fn", value_enum)]
        function: Denominator,
        /// Examine n up to 10^k.
        #[arg(short, long, default_value_t = 5)]
        k: u32,
        /// Inputs per point (line) or bin resolution (histogram).
        #[arg(long)]
        group: Option<u64>,
        #[arg(long, value_enum)]
        graph: RatioGraph,
    },
    /// Evaluate a single starting value.
    Eval {
        n: u64,
        #[arg(long = "fn", value_enum)]
        function: Option<Function>,
        /// Fail instead of wrapping when a value exceeds 64 bits.
        #[arg(long)]
        checked: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Function {
    F,
    G,
    H,
}

impl From<Function> for Variant {
    fn from(function: Function) -> Self {
        match function {
            Function::F => Variant::Baseline,
            Function::G => Variant::ReducedOdd,
            Function::H => Variant::ReducedOddSecondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Accelerated {
    G,
    H,
}

impl From<Accelerated> for Variant {
    fn from(function: Accelerated) -> Self {
        match function {
            Accelerated::G => Variant::ReducedOdd,
            Accelerated::H => Variant::ReducedOddSecondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Denominator {
    F,
    G,
}

impl From<Denominator> for Variant {
    fn from(function: Denominator) -> Self {
        match function {
            Denominator::F => Variant::Baseline,
            Denominator::G => Variant::ReducedOdd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TimeGraph {
    Histogram,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RatioGraph {
    Line,
    Histogram,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) if !path.exists() => bail!("config file {} not found", path.display()),
        Some(path) => path.clone(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    if let Command::Init { force } = cli.command {
        return cmd_init(&config_path, force);
    }

    let cfg = load_config(&config_path)?;
    let mut out = BufWriter::new(io::stdout().lock());
    let code = match cli.command {
        Command::Init { .. } => exit_codes::OK,
        Command::Compare { function, k } => {
            cmd_compare(&mut out, &cfg, cli.json, function.into(), power_limit(k)?)?
        }
        Command::Max { function, k } => {
            cmd_max(&mut out, &cfg, cli.json, &selected(function), power_limit(k)?)?
        }
        Command::Time { function, k, graph } => cmd_time(
            &mut out,
            &cfg,
            cli.json,
            &selected(function),
            power_limit(k)?,
            graph,
        )?,
        Command::Ratios {
            function,
            k,
            group,
            graph,
        } => {
            let group = group.unwrap_or(cfg.ratio_group);
            cmd_ratios(
                &mut out,
                &cfg,
                cli.json,
                function.into(),
                power_limit(k)?,
                group,
                graph,
            )?
        }
        Command::Eval {
            n,
            function,
            checked,
        } => {
            let overflow = if checked {
                OverflowPolicy::Checked
            } else {
                cfg.overflow
            };
            cmd_eval(&mut out, cli.json, &selected(function), n, overflow)?
        }
    };
    out.flush().context("flush stdout")?;
    Ok(code)
}

/// `[1, 10^k)` upper bound, with `k` in `1..=19`.
fn power_limit(k: u32) -> Result<u64> {
    if !(1..=MAX_POWER).contains(&k) {
        bail!("--k must be in the range 1..{MAX_POWER}: {k}");
    }
    Ok(10u64.pow(k))
}

/// The chosen variant, or all of them.
fn selected(function: Option<Function>) -> Vec<Variant> {
    match function {
        Some(function) => vec![function.into()],
        None => Variant::ALL.to_vec(),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if !force && path.exists() {
        println!("init: config={} unchanged", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(path, &ExplorerConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("init: config={} written", path.display());
    Ok(exit_codes::OK)
}

fn cmd_compare(
    out: &mut impl Write,
    cfg: &ExplorerConfig,
    json: bool,
    variant: Variant,
    limit: u64,
) -> Result<i32> {
    let report = compare_to_baseline(variant, limit, cfg)?;
    if json {
        write_json(out, &report)?;
    } else {
        match &report.mismatch {
            None => writeln!(
                out,
                "compare: fn={} limit={} compared={} result=ok",
                report.variant, report.limit, report.compared
            )?,
            Some(mismatch) => writeln!(
                out,
                "compare: fn={} limit={} n={} f(x)={} {}={}",
                report.variant,
                report.limit,
                mismatch.n,
                triple_text(&mismatch.baseline),
                report.variant,
                triple_text(&mismatch.variant)
            )?,
        }
    }
    Ok(if report.mismatch.is_some() {
        exit_codes::MISMATCH
    } else {
        exit_codes::OK
    })
}

fn cmd_max(
    out: &mut impl Write,
    cfg: &ExplorerConfig,
    json: bool,
    variants: &[Variant],
    limit: u64,
) -> Result<i32> {
    let reports = max_peaks(variants, limit, cfg)?;
    if json {
        write_json(out, &reports)?;
        return Ok(exit_codes::OK);
    }
    for report in &reports {
        writeln!(
            out,
            "max: fn={} limit={} peak={} n={}",
            report.variant, report.limit, report.peak, report.attained_at
        )?;
    }
    Ok(exit_codes::OK)
}

fn cmd_time(
    out: &mut impl Write,
    cfg: &ExplorerConfig,
    json: bool,
    variants: &[Variant],
    limit: u64,
    graph: TimeGraph,
) -> Result<i32> {
    match graph {
        TimeGraph::Histogram => {
            let reports = variants
                .iter()
                .map(|&variant| step_histogram(variant, limit, cfg))
                .collect::<Result<Vec<_>>>()?;
            if json {
                write_json(out, &reports)?;
                return Ok(exit_codes::OK);
            }
            for report in &reports {
                let max_steps = report
                    .max_steps
                    .map_or_else(|| "-".to_string(), |steps| steps.to_string());
                writeln!(
                    out,
                    "time: fn={} limit={} max_steps={} overflow={}",
                    report.variant, report.limit, max_steps, report.overflow
                )?;
                for (steps, count) in &report.buckets {
                    writeln!(out, "{steps} {count}")?;
                }
            }
        }
        TimeGraph::Scatter => {
            let rows = variants
                .iter()
                .map(|&variant| -> Result<_> {
                    Ok((variant, step_scatter(variant, limit, cfg)?))
                })
                .collect::<Result<Vec<_>>>()?;
            if json {
                write_json(out, &rows)?;
                return Ok(exit_codes::OK);
            }
            for (variant, dense) in &rows {
                for (n, triple) in dense.iter() {
                    writeln!(
                        out,
                        "{} {} {} {} {}",
                        variant.symbol(),
                        n,
                        triple.reduced_steps,
                        triple.raw_steps,
                        triple.peak
                    )?;
                }
            }
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_ratios(
    out: &mut impl Write,
    cfg: &ExplorerConfig,
    json: bool,
    denominator: Variant,
    limit: u64,
    group: u64,
    graph: RatioGraph,
) -> Result<i32> {
    match graph {
        RatioGraph::Line => {
            let series = ratio_line(denominator, limit, group, cfg)?;
            if json {
                write_json(out, &series)?;
                return Ok(exit_codes::OK);
            }
            writeln!(
                out,
                "ratios: fn={}/{} limit={} group={} points={}",
                NUMERATOR,
                denominator,
                limit,
                group,
                series.points.len()
            )?;
            for point in &series.points {
                match point.ratio {
                    Some(ratio) => writeln!(out, "{} {ratio}", point.block_start)?,
                    None => writeln!(out, "{} -", point.block_start)?,
                }
            }
        }
        RatioGraph::Histogram => {
            let resolution = usize::try_from(group).context("group does not fit in usize")?;
            let report = ratio_histogram(denominator, limit, resolution, cfg)?;
            if json {
                write_json(out, &report)?;
                return Ok(exit_codes::OK);
            }
            writeln!(
                out,
                "ratios: fn={}/{} limit={} resolution={} bins={}",
                NUMERATOR,
                denominator,
                limit,
                resolution,
                report.bins.len()
            )?;
            for (ratio, count) in &report.bins {
                writeln!(out, "{ratio} {count}")?;
            }
        }
    }
    Ok(exit_codes::OK)
}

#[derive(Serialize)]
struct EvalReport {
    variant: Variant,
    n: u64,
    #[serde(flatten)]
    triple: ResultTriple,
}

fn cmd_eval(
    out: &mut impl Write,
    json: bool,
    variants: &[Variant],
    n: u64,
    overflow: OverflowPolicy,
) -> Result<i32> {
    let reports = variants
        .iter()
        .map(|&variant| -> Result<EvalReport> {
            let triple = evaluate_one(variant, n, overflow)?;
            Ok(EvalReport { variant, n, triple })
        })
        .collect::<Result<Vec<_>>>()?;
    if json {
        write_json(out, &reports)?;
        return Ok(exit_codes::OK);
    }
    for report in &reports {
        writeln!(
            out,
            "eval: fn={} n={} {}",
            report.variant,
            report.n,
            triple_text(&report.triple)
        )?;
    }
    Ok(exit_codes::OK)
}

fn triple_text(triple: &ResultTriple) -> String {
    format!(
        "reduced={} raw={} peak={}",
        triple.reduced_steps, triple.raw_steps, triple.peak
    )
}

/// Serialize `value` as pretty-printed JSON with trailing newline.
fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("serialize json")?;
    writeln!(out)?;
    Ok(())
}
