mod cache;
mod config;
mod error;
mod replace;
mod sim;
mod stats;
mod trace;

use std::{ffi::OsString, fs, path::PathBuf};

use anyhow::Context;
use serde::Serialize;

use config::{CacheConfig, PolicyKind};
use error::{Result, SimError};
use sim::Simulator;
use stats::{CacheStats, OutputFormat};
use trace::Trace;

const USAGE: &str = "\
usage: cache_sim [options] <nsets> <bsize> <assoc> <substitution_policy> <output_flag> <input_file>
       cache_sim [options] --config <json> <output_flag> <input_file>

  substitution_policy  R (random), F (fifo-like) or L (lru-like)
  output_flag          0 for the full report, 1 for a single line

options:
  --config <json>      cache configuration as inline JSON
  -p <path>            cache configuration read from a JSON file
  --json <path>        also write the statistics as JSON
  --seed <n>           seed for the random replacement policy
  --buffer-size <n>    addresses per trace chunk (default 16384)
  --queue-size <n>     trace chunks in flight (default 32)
  -v, --verbose        log progress to stderr";

#[derive(Debug)]
struct Args {
    config: CacheConfig,
    format: OutputFormat,
    input: PathBuf,
    json: Option<PathBuf>,
    seed: Option<u64>,
    words_per_block: usize,
    blocks_per_queue: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a CacheConfig,
    stats: &'a CacheStats,
}

fn invocation(err: pico_args::Error) -> SimError {
    SimError::InvalidInvocation(err.to_string())
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| SimError::InvalidInvocation(format!("{name} should be an integer, got {value:?}")))
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value {
        "0" => Ok(OutputFormat::Verbose),
        "1" => Ok(OutputFormat::Compact),
        _ => Err(SimError::InvalidOutputFlag(value.to_string())),
    }
}

fn parse_args(mut args: pico_args::Arguments) -> Result<Args> {
    let json: Option<PathBuf> = args.opt_value_from_str("--json").map_err(invocation)?;
    let seed: Option<u64> = args.opt_value_from_str("--seed").map_err(invocation)?;
    let words_per_block: usize = args
        .opt_value_from_str("--buffer-size")
        .map_err(invocation)?
        .unwrap_or(1024 * 16);
    let blocks_per_queue: usize = args
        .opt_value_from_str("--queue-size")
        .map_err(invocation)?
        .unwrap_or(32);

    let config_str: Option<String> =
        if let Some(config_str) = args.opt_value_from_str("--config").map_err(invocation)? {
            Some(config_str)
        } else if let Some(config_path) = args.opt_value_from_str::<_, PathBuf>("-p").map_err(invocation)? {
            Some(fs::read_to_string(&config_path).map_err(|err| {
                SimError::io(format!("cannot read {}", config_path.display()), err)
            })?)
        } else {
            None
        };

    let free: Vec<String> = args
        .finish()
        .into_iter()
        .map(|arg: OsString| arg.to_string_lossy().into_owned())
        .collect();

    let (config, rest) = match config_str {
        Some(config_str) => {
            let config: CacheConfig = serde_json::from_str(&config_str)
                .map_err(|err| SimError::InvalidInvocation(format!("bad cache config: {err}")))?;
            config.validate()?;
            (config, free.as_slice())
        }
        None => {
            let [sets, block_size, ways, policy, rest @ ..] = free.as_slice() else {
                return Err(SimError::InvalidInvocation(format!(
                    "expected 6 arguments, got {}",
                    free.len()
                )));
            };
            let config = CacheConfig::new(
                parse_count("nsets", sets)?,
                parse_count("bsize", block_size)?,
                parse_count("assoc", ways)?,
                policy.parse::<PolicyKind>()?,
            )?;
            (config, rest)
        }
    };

    let [flag, input] = rest else {
        return Err(SimError::InvalidInvocation(format!(
            "expected <output_flag> <input_file>, got {} trailing arguments",
            rest.len()
        )));
    };

    Ok(Args {
        config,
        format: parse_format(flag)?,
        input: PathBuf::from(input),
        json,
        seed,
        words_per_block,
        blocks_per_queue,
    })
}

fn main() -> anyhow::Result<()> {
    let mut raw = pico_args::Arguments::from_env();
    if raw.contains(["-v", "--verbose"]) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }

    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(err @ SimError::InvalidInvocation(_)) => {
            eprintln!("{USAGE}");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    run(args)?;
    Ok(())
}

/// Simulates the whole trace, prints the report and writes the optional JSON
/// dump. Nothing is printed if the run fails.
fn run(args: Args) -> anyhow::Result<CacheStats> {
    let cache = args.config.build(args.seed)?;
    let trace = Trace::read(args.input, args.words_per_block, args.blocks_per_queue)?;
    let mut sim = Simulator::new(cache);
    sim.run(trace)?;
    log::info!(
        "finished {:?} simulation: {} accesses, {} lines resident",
        sim.cache().geometry(),
        sim.counters().accesses,
        sim.resident()
    );

    let stats = CacheStats::new(sim.counters());
    match args.format {
        OutputFormat::Verbose => println!("{}", stats.verbose()),
        OutputFormat::Compact => println!("{}", stats.compact()),
    }

    if let Some(path) = args.json {
        let file = fs::File::create(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        let report = Report {
            config: &args.config,
            stats: &stats,
        };
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(stats)
}
