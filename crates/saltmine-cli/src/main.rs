//! Saltmine CLI
//!
//! CREATE2 vanity deployment planner and salt search worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use saltmine_core::{Create2Search, Pattern, PatternType, SearchConfig, SearchStats};
use saltmine_crypto::{create2_address, eip55_checksum, parse_fixed_hex};
use saltmine_deploy::{
    audit_combined, derive_init_code_hash, run_batch, ArtifactResolver, AuditStatus, BuildStep,
    CancelToken, CombinedResult, InProcessEngine, InitCodeHash, ProcessEngine, RunConfig,
    SearchControl, SearchEngine, SearchJob, SearchSolution,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "saltmine")]
#[command(author = "Saltmine Team")]
#[command(version = "0.1.0")]
#[command(about = "CREATE2 vanity address planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find vanity salts for every configured contract and write the combined record
    Run {
        /// JSON run configuration (defaults apply to missing keys)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where searches run
        #[arg(short, long, default_value = "process")]
        engine: EngineArg,

        /// Worker executable for the process engine (default: this binary)
        #[arg(long)]
        worker: Option<PathBuf>,

        /// Command run once before the first search, e.g. `cargo build --release`
        #[arg(long, num_args = 1.., allow_hyphen_values = true, value_terminator = ";")]
        build_command: Vec<String>,

        /// Per-contract search timeout in seconds (0 = unlimited)
        #[arg(long)]
        timeout: Option<u64>,

        /// Contract labels, overriding the configured list
        #[arg(long = "contract")]
        contracts: Vec<String>,

        /// Pattern, overriding the configured one
        #[arg(short, long)]
        pattern: Option<String>,

        /// Pattern type, overriding the configured one
        #[arg(short = 't', long)]
        pattern_type: Option<PatternTypeArg>,

        /// Digits the address must also end with
        #[arg(long)]
        suffix: Option<String>,

        /// Build artifact directory
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Combined record path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads per search (0 = auto)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Search a salt for one contract and write the result file (worker mode)
    Search {
        /// CREATE2 factory address
        #[arg(long)]
        factory: String,

        /// Keccak-256 of the contract's init code
        #[arg(long)]
        init_code_hash: String,

        /// Hex digits to search for
        #[arg(short, long)]
        pattern: String,

        /// Pattern type: prefix, suffix, or contains
        #[arg(short = 't', long, default_value = "suffix")]
        pattern_type: PatternTypeArg,

        /// Digits the address must also end with
        #[arg(long)]
        suffix: Option<String>,

        /// Contract label recorded in the output
        #[arg(long)]
        contract_name: String,

        /// Number of threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Result file
        #[arg(short, long)]
        output: PathBuf,

        /// Match letters against the EIP-55 checksum case
        #[arg(long)]
        case_sensitive: bool,

        /// Maximum time in seconds (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_time: u64,

        /// Suppress live statistics
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the init code hash of a contract
    Hash {
        /// Contract label
        label: String,

        /// Build artifact directory
        #[arg(long, default_value = "../artifacts")]
        artifacts: PathBuf,
    },

    /// Compute a CREATE2 address
    Predict {
        #[arg(long)]
        factory: String,

        #[arg(long)]
        salt: String,

        #[arg(long)]
        init_code_hash: String,
    },

    /// Re-check a combined record against the current build artifacts
    Verify {
        /// Combined record
        file: PathBuf,

        /// Build artifact directory
        #[arg(long, default_value = "../artifacts")]
        artifacts: PathBuf,
    },

    /// Run benchmark
    Benchmark {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Number of threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,
    },
}

#[derive(Clone, ValueEnum)]
enum EngineArg {
    /// Spawn a `search` worker per contract
    Process,
    /// Search on this process's thread pool
    InProcess,
}

#[derive(Clone, ValueEnum)]
enum PatternTypeArg {
    Prefix,
    Suffix,
    Contains,
}

impl From<PatternTypeArg> for PatternType {
    fn from(arg: PatternTypeArg) -> Self {
        match arg {
            PatternTypeArg::Prefix => PatternType::Prefix,
            PatternTypeArg::Suffix => PatternType::Suffix,
            PatternTypeArg::Contains => PatternType::Contains,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            engine,
            worker,
            build_command,
            timeout,
            contracts,
            pattern,
            pattern_type,
            suffix,
            artifacts,
            output,
            threads,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::load(&path)?,
                None => RunConfig::default(),
            };
            if let Some(timeout) = timeout {
                run_config.timeout_secs = timeout;
            }
            if !contracts.is_empty() {
                run_config.contracts = contracts;
            }
            if let Some(pattern) = pattern {
                run_config.pattern = pattern;
            }
            if let Some(pattern_type) = pattern_type {
                run_config.pattern_type = pattern_type.into();
            }
            if suffix.is_some() {
                run_config.suffix = suffix;
            }
            if let Some(artifacts) = artifacts {
                run_config.artifacts_dir = artifacts;
            }
            if let Some(output) = output {
                run_config.output = output;
            }
            if let Some(threads) = threads {
                run_config.threads = threads;
            }
            cmd_run(&run_config, engine, worker, build_command)?;
        }
        Commands::Search {
            factory,
            init_code_hash,
            pattern,
            pattern_type,
            suffix,
            contract_name,
            threads,
            output,
            case_sensitive,
            max_time,
            quiet,
        } => {
            let target = Pattern {
                value: pattern,
                pattern_type: pattern_type.into(),
                case_insensitive: !case_sensitive,
                required_suffix: suffix.map(|s| s.strip_prefix("0x").unwrap_or(&s).to_string()),
            };
            cmd_search(
                &factory,
                &init_code_hash,
                target,
                &contract_name,
                threads,
                &output,
                max_time,
                !quiet,
            )?;
        }
        Commands::Hash { label, artifacts } => {
            cmd_hash(&label, &artifacts)?;
        }
        Commands::Predict {
            factory,
            salt,
            init_code_hash,
        } => {
            cmd_predict(&factory, &salt, &init_code_hash)?;
        }
        Commands::Verify { file, artifacts } => {
            cmd_verify(&file, &artifacts)?;
        }
        Commands::Benchmark { duration, threads } => {
            cmd_benchmark(duration, threads)?;
        }
    }

    Ok(())
}

/// Ctrl-C raises the returned token
fn install_cancel_handler() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, stopping...");
        handler_token.cancel();
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}

fn cmd_run(
    config: &RunConfig,
    engine_arg: EngineArg,
    worker: Option<PathBuf>,
    build_command: Vec<String>,
) -> Result<()> {
    let settings = config.settings()?;
    let cancel = install_cancel_handler()?;

    eprintln!("Saltmine v0.1.0");
    eprintln!("Network:   {}", settings.network());
    eprintln!("Factory:   {}", settings.factory_hex());
    eprintln!("Pattern:   {}", settings.target());
    eprintln!("Threads:   {}", settings.threads());
    eprintln!("Contracts: {}", settings.contracts().join(", "));
    eprintln!();

    let engine: Box<dyn SearchEngine> = match engine_arg {
        EngineArg::InProcess => Box::new(InProcessEngine::new().with_progress(true).with_reports(true)),
        EngineArg::Process => {
            let program = match worker {
                Some(path) => path,
                None => std::env::current_exe().context("cannot locate the saltmine binary")?,
            };
            let mut engine = ProcessEngine::new(program);
            if let Some((program, args)) = build_command.split_first() {
                engine = engine.with_build(BuildStep::new(program.clone(), args.to_vec()));
            }
            Box::new(engine)
        }
    };

    let outcome = run_batch(&settings, engine.as_ref(), &cancel)?;

    outcome.report.log_summary();
    println!();
    print!("{}", outcome.report);

    let Some(combined) = &outcome.combined else {
        bail!("no contract produced a verified address");
    };

    print!("{}", combined);

    match outcome.persisted {
        Ok(()) => {
            println!("Saved to {}", settings.output_path().display());
            Ok(())
        }
        Err(err) => Err(err).context("results above were verified but not saved"),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_search(
    factory: &str,
    init_code_hash: &str,
    target: Pattern,
    contract_name: &str,
    threads: usize,
    output: &Path,
    max_time: u64,
    show_progress: bool,
) -> Result<()> {
    let factory = parse_fixed_hex::<20>(factory).context("invalid --factory")?;
    let init_code_hash: InitCodeHash = init_code_hash.parse().context("invalid --init-code-hash")?;
    target.validate()?;

    let threads = if threads == 0 { num_cpus::get() } else { threads };
    info!(
        "{}: searching {} for {} on {} threads",
        contract_name, init_code_hash, target, threads
    );

    let job = SearchJob::new(factory, init_code_hash, target, contract_name, threads, output);
    let control = SearchControl::new(
        install_cancel_handler()?,
        (max_time > 0).then(|| Duration::from_secs(max_time)),
    );

    let engine = InProcessEngine::new()
        .with_progress(show_progress)
        .with_reports(true);
    let solution = engine.search(&job, &control)?;

    print_result(contract_name, &solution);
    println!("Saved to {}", output.display());
    Ok(())
}

fn cmd_hash(label: &str, artifacts: &Path) -> Result<()> {
    let artifact = ArtifactResolver::new(artifacts).resolve(label)?;
    let hash = derive_init_code_hash(&artifact.init_code)?;

    eprintln!("Artifact: {}", artifact.path.display());
    println!("{}", hash);
    Ok(())
}

fn cmd_predict(factory: &str, salt: &str, init_code_hash: &str) -> Result<()> {
    let factory = parse_fixed_hex::<20>(factory).context("invalid --factory")?;
    let salt = parse_fixed_hex::<32>(salt).context("invalid --salt")?;
    let init_code_hash = parse_fixed_hex::<32>(init_code_hash).context("invalid --init-code-hash")?;

    println!("{}", eip55_checksum(&create2_address(&factory, &salt, &init_code_hash)));
    Ok(())
}

fn cmd_verify(file: &Path, artifacts: &Path) -> Result<()> {
    let combined = CombinedResult::load(file)?;
    let entries = audit_combined(&combined, &ArtifactResolver::new(artifacts))?;

    println!("Network: {}", combined.network());
    println!("Factory: {}", combined.factory());
    println!("{:-<60}", "");

    let mut failures = 0;
    for entry in &entries {
        let address = combined
            .contracts()
            .get(&entry.label)
            .map(|s| s.address.as_str())
            .unwrap_or("?");
        match &entry.status {
            AuditStatus::Verified => println!("✓ {:<28} {}", entry.label, address),
            AuditStatus::AddressMismatch { computed } => {
                failures += 1;
                println!("✗ {:<28} {} (salt now gives {})", entry.label, address, computed);
            }
            AuditStatus::Unresolved(reason) => {
                failures += 1;
                println!("? {:<28} {}", entry.label, reason);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} contract(s) failed verification", failures, entries.len());
    }
    println!("All {} contract(s) verified", entries.len());
    Ok(())
}

fn cmd_benchmark(duration_secs: u64, threads: usize) -> Result<()> {
    eprintln!("Benchmarking CREATE2 for {} seconds...", duration_secs);
    eprintln!("Threads: {}", if threads == 0 { num_cpus::get() } else { threads });
    eprintln!();

    // Effectively impossible pattern, runs until timeout
    let pat = Pattern::prefix("0".repeat(40));

    let config = SearchConfig {
        threads,
        max_time: Some(Duration::from_secs(duration_secs)),
        show_progress: true,
        ..Default::default()
    };

    let search = Create2Search::new(&[0u8; 20], &[0u8; 32], vec![pat], config)?;
    let stats = SearchStats::new();
    let _ = search.run_with_stats(&AtomicBool::new(false), &stats)?;

    println!("Salts tested: {}", stats.total_salts());
    println!("Speed:        {:.2} Msalt/s", stats.salts_per_second() / 1_000_000.0);
    eprintln!("\nBenchmark complete!");

    Ok(())
}

fn print_result(label: &str, solution: &SearchSolution) {
    println!();
    println!("🎉 MATCH FOUND!");
    println!("{:-<60}", "");
    println!("Contract:  {}", label);
    println!("Address:   {}", solution.address);
    println!("Salt:      {}", solution.salt);
    println!("{:-<60}", "");
    println!("Attempts:  {}", solution.attempts);
    println!("Time:      {:.2}s", solution.duration_seconds);
}
