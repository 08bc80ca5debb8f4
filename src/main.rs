use std::path::{Path, PathBuf};

use anyhow::Context;
use avicpu::config::Config;
use avicpu::genome::{DEFAULT_ANCESTOR, Genome};
use avicpu::inst::Op;
use avicpu::metrics::{Snapshot, dominant_genome, instruction_histogram};
use avicpu::population::Population;
use avicpu::testcpu::TestCpu;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "avicpu", about = "Digital organisms on a heads-based virtual CPU")]
struct Cli {
    /// Random seed for reproducibility.
    #[arg(long)]
    seed: u64,

    /// Number of updates to run.
    #[arg(long, default_value_t = 1000)]
    updates: u64,

    /// Ancestor genome: a string of instruction symbols, or a file holding one.
    #[arg(long, default_value = DEFAULT_ANCESTOR)]
    ancestor: String,

    /// TOML configuration file. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of organism slots (overrides the config file).
    #[arg(long)]
    population_size: Option<usize>,

    /// Per-copy mutation probability (overrides the config file).
    #[arg(long)]
    copy_mut_prob: Option<f64>,

    /// Compute and output metrics every N updates.
    #[arg(long, default_value_t = 10)]
    metrics_interval: u64,

    /// Run in benchmark mode: suppress CSV, print throughput stats.
    #[arg(long)]
    benchmark: bool,

    /// Evaluate the ancestor on the test CPU instead of running a population.
    #[arg(long)]
    analyze: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "avicpu=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let ancestor = load_ancestor(&cli.ancestor)?;

    if cli.analyze {
        analyze(&config, &ancestor, cli.seed);
    } else if cli.benchmark {
        run_benchmark(config, &ancestor, cli.seed, cli.updates);
    } else {
        if cli.metrics_interval == 0 {
            anyhow::bail!("--metrics-interval must be positive");
        }
        run_simulation(config, &ancestor, cli.seed, cli.updates, cli.metrics_interval);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(size) = cli.population_size {
        config.world.population_size = size;
    }
    if let Some(p) = cli.copy_mut_prob {
        config.hardware.copy_mut_prob = p;
    }
    config.validate()?;
    Ok(config)
}

fn load_ancestor(arg: &str) -> anyhow::Result<Genome> {
    let path = Path::new(arg);
    let genome = if path.is_file() {
        Genome::load(path).with_context(|| format!("loading ancestor {arg}"))?
    } else {
        arg.parse::<Genome>().context("parsing ancestor genome")?
    };
    Ok(genome)
}

fn analyze(config: &Config, ancestor: &Genome, seed: u64) {
    let result = TestCpu::new(&config.hardware)
        .with_seed(seed)
        .evaluate(ancestor);

    print!("{}", ancestor.disassemble());
    println!();
    println!("length:         {}", ancestor.len());
    println!("viable:         {}", result.viable);
    match result.gestation_time {
        Some(time) => println!("gestation time: {time}"),
        None => println!("gestation time: -"),
    }
    println!("copy true:      {}", result.copy_true);
    if let Some(offspring) = &result.offspring {
        println!("offspring:      {offspring}");
    }
    if let Some(reason) = result.failure {
        println!("divide failure: {reason}");
    }
    println!("tasks:          {}", result.task_names().join(" "));

    println!();
    let counts = instruction_histogram(std::slice::from_ref(ancestor));
    for &op in Op::all() {
        let count = counts[op.code() as usize];
        if count > 0 {
            println!("{}  {:<9} x{count:<3} {}", op.symbol(), op.name(), op.description());
        }
    }
}

fn run_simulation(
    config: Config,
    ancestor: &Genome,
    seed: u64,
    updates: u64,
    metrics_interval: u64,
) {
    let population_size = config.world.population_size;
    let mut population = Population::new(config, ancestor, seed);
    tracing::info!(population_size, updates, seed, ancestor = %ancestor, "starting run");

    println!("{}", Snapshot::csv_header());
    println!("{}", Snapshot::capture(&population).csv_row());

    for update in 1..=updates {
        population.update();

        if update % metrics_interval == 0 {
            println!("{}", Snapshot::capture(&population).csv_row());
        }

        if update % 100 == 0 || update == updates {
            eprint!("\rupdate {update}/{updates}");
        }

        if population.num_organisms() == 0 {
            eprintln!();
            tracing::warn!(update, "population died out");
            return;
        }
    }
    eprintln!();

    let genomes = population.genomes();
    if let Some((genome, count)) = dominant_genome(&genomes) {
        tracing::info!(%genome, count, "dominant genome");
    }
}

fn run_benchmark(config: Config, ancestor: &Genome, seed: u64, updates: u64) {
    let population_size = config.world.population_size;
    let time_slice = config.world.time_slice;
    let mut population = Population::new(config, ancestor, seed);

    let start = std::time::Instant::now();
    let mut births = 0u64;
    let mut instructions = 0u64;
    for _ in 0..updates {
        instructions += (population.num_organisms() * time_slice) as u64;
        births += population.update().births as u64;
    }
    let elapsed = start.elapsed();

    let updates_per_sec = updates as f64 / elapsed.as_secs_f64();
    let instructions_per_sec = instructions as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results:");
    eprintln!("  Updates:           {updates}");
    eprintln!("  Population size:   {population_size}");
    eprintln!("  Final organisms:   {}", population.num_organisms());
    eprintln!("  Births:            {births}");
    eprintln!("  Elapsed:           {elapsed:.2?}");
    eprintln!("  Updates/sec:       {updates_per_sec:.1}");
    eprintln!("  Instructions:      {instructions}");
    eprintln!("  Instructions/sec:  {instructions_per_sec:.0}");
}
