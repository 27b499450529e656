use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use anyhow::{bail, Context};
use clap::Parser;
use cachelab::config::{ReplacementPolicyConfig, SimulatorConfig};
use cachelab::io::open_trace;
use cachelab::simulator::Simulator;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator for valgrind lackey traces"))]
struct Args {
    /// Number of set index bits (2^s sets)
    #[arg(short = 's')]
    set_bits: Option<u32>,

    /// Associativity (number of lines per set)
    #[arg(short = 'E')]
    lines_per_set: Option<usize>,

    /// Number of block bits (2^b bytes per block)
    #[arg(short = 'b')]
    block_bits: Option<u32>,

    /// Trace to replay
    #[arg(short = 't', long)]
    trace: PathBuf,

    /// Evict the least recently used line (default)
    #[arg(short = 'L', conflicts_with = "fifo")]
    lru: bool,

    /// Evict the earliest inserted line
    #[arg(short = 'F')]
    fifo: bool,

    /// Print the outcome of every record
    #[arg(short, long)]
    verbose: bool,

    /// JSON configuration, command line options take precedence over it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail on a malformed trace line instead of treating it as the end of the trace
    #[arg(long)]
    strict: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Also write "hits misses evictions" to this file
    #[arg(long)]
    results_file: Option<PathBuf>,

    /// Print timings after the summary
    #[arg(short, long)]
    performance: bool,

    /// Print the parsed configuration and how many lines were never filled
    #[arg(short, long)]
    debug: bool,
}

/// Builds the configuration from the optional JSON file, then the command line
fn resolve_config(args: &Args) -> anyhow::Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let config_file = File::open(path)
                .with_context(|| format!("Couldn't open the config file at path {}", path.display()))?;
            SimulatorConfig::from_json_reader(BufReader::new(config_file))
                .context("Couldn't parse the config file")?
        }
        None => match (args.set_bits, args.lines_per_set, args.block_bits) {
            (Some(s), Some(e), Some(b)) => SimulatorConfig::new(s, e, b),
            _ => bail!("-s, -E and -b are required unless a config file is given"),
        },
    };
    if let Some(set_bits) = args.set_bits {
        config.set_bits = set_bits;
    }
    if let Some(lines_per_set) = args.lines_per_set {
        config.lines_per_set = lines_per_set;
    }
    if let Some(block_bits) = args.block_bits {
        config.block_bits = block_bits;
    }
    if args.lru {
        config.replacement_policy = ReplacementPolicyConfig::LeastRecentlyUsed;
    } else if args.fifo {
        config.replacement_policy = ReplacementPolicyConfig::FirstInFirstOut;
    }
    config.verbose |= args.verbose;
    config.strict_trace |= args.strict;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let start = Instant::now();
    let args = Args::parse();
    let config = resolve_config(&args)?;
    let mut simulator = Simulator::new(&config).context("Invalid cache configuration")?;
    log::info!("replaying {}", args.trace.display());
    let trace_reader = open_trace(&args.trace)?;
    let records = simulator.records(trace_reader);

    // Annotations can run to millions of lines, so don't flush each one
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut write_error = None;
    let result = *simulator.simulate_with(records, |annotation| {
        if write_error.is_none() {
            write_error = writeln!(out, "{annotation}").err();
        }
    })?;
    if let Some(e) = write_error {
        return Err(e).context("Couldn't write the trace annotations");
    }

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result).context("Couldn't serialise the output")?)?;
    } else {
        writeln!(out, "{result}")?;
    }
    out.flush()?;
    drop(out);

    if let Some(path) = &args.results_file {
        fs::write(path, format!("{} {} {}\n", result.hits, result.misses, result.evictions))
            .with_context(|| format!("Couldn't write the results file at path {}", path.display()))?;
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary. If benchmarking, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        println!("Uninitialised cache lines: {}", simulator.get_uninitialised_line_count());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("csim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn classic_flags() {
        let config = resolve_config(&parse(&["-s", "4", "-E", "2", "-b", "5", "-t", "yi.trace", "-F", "-v"])).unwrap();
        assert_eq!(
            config,
            SimulatorConfig::new(4, 2, 5)
                .with_policy(ReplacementPolicyConfig::FirstInFirstOut)
                .with_verbose(true)
        );
    }

    #[test]
    fn geometry_is_required_without_a_config_file() {
        assert!(resolve_config(&parse(&["-s", "4", "-E", "2", "-t", "yi.trace"])).is_err());
    }

    #[test]
    fn policies_are_exclusive() {
        assert!(Args::try_parse_from(["csim", "-s", "1", "-E", "1", "-b", "1", "-t", "x", "-L", "-F"]).is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let path = std::env::temp_dir().join(format!("csim-{}-config.json", std::process::id()));
        fs::write(&path, r#"{ "set_bits": 2, "lines_per_set": 4, "block_bits": 3, "replacement_policy": "fifo" }"#).unwrap();
        let path_arg = path.to_str().unwrap();
        let config = resolve_config(&parse(&["-c", path_arg, "-t", "yi.trace", "-E", "8", "-L", "--strict"])).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config, SimulatorConfig::new(2, 8, 3).with_strict_trace(true));
    }
}
