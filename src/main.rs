// src/main.rs
use clap::Parser;
use pow_miner_rs::miner::algorithm;
use pow_miner_rs::network::api::{ClientInfo, LedgerSession};
use pow_miner_rs::stats::reporter::format_hashrate;
use pow_miner_rs::utils::logging::init_bench_logging;
use pow_miner_rs::{self, *};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;

/// How often the background reporter logs a stats line
const STATS_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Submission failures in a row before the loop takes a long pause
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Length of the pause after too many consecutive failures
const FAILURE_PAUSE: Duration = Duration::from_secs(30);

/// Main entry point for the miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Benchmark(opts) => run_benchmark(opts),
        cli::Action::Probe(opts) => run_probe(opts),
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Starts the mining operation with given configuration options
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads configuration and applies CLI overrides
/// 3. Sets up statistics reporting
/// 4. Probes the ledger and establishes a session
/// 5. Runs the round loop (search, tune, submit) until interrupted
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = if opts.config.exists() {
        config::load(&opts.config)?
    } else {
        log::info!("No config at {}, using defaults", opts.config.display());
        Config::default()
    };

    // Apply CLI overrides
    if let Some(url) = opts.url {
        config.server.base_url = url;
    }
    if let Some(threads) = opts.threads {
        config.miner.threads = threads;
    }
    if let Some(difficulty) = opts.difficulty {
        config.miner.difficulty = difficulty.clamp(1, 10);
    }
    if let Some(algo) = opts.algorithm {
        config.miner.algorithm = algo.to_string();
    }
    if opts.auto_difficulty {
        config.auto_difficulty.enabled = true;
    }
    if let Some(limit) = opts.cpu_limit {
        config.miner.cpu_limit = limit.clamp(10, 100);
    }
    if let Some(user_id) = opts.user_id {
        config.auth.user_id = Some(user_id);
    }
    if let Some(username) = opts.username {
        config.auth.username = Some(username);
    }
    config.validate()?;

    // Shared state and background reporting
    let stats = Arc::new(StatsAggregator::new());
    stats.set_difficulty(config.miner.difficulty);
    let reporter = StatsReporter::new(stats.clone(), STATS_REPORT_INTERVAL);
    reporter.start_reporting();

    let api = ApiClient::new(&config.server)?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        api.probe().await?;
        let session = establish_session(&api, &config, &stats).await?;
        log::info!("Mining as {} (id {})", session.username, session.user_id);
        mining_loop(config, api, stats, reporter, session).await
    })
}

/// Resolves a ledger session from the configured credentials
///
/// A configured user id skips the login call; the identity check still
/// runs to refresh the balance but a failure there is not fatal.
async fn establish_session(
    api: &ApiClient,
    config: &Config,
    stats: &StatsAggregator,
) -> Result<LedgerSession, MinerError> {
    if let Some(user_id) = config.auth.user_id {
        let username = config
            .auth
            .username
            .clone()
            .unwrap_or_else(|| format!("user_{}", user_id));
        match api.get_stats(user_id).await {
            Ok(balance) => stats.set_balance(balance),
            Err(e) => log::warn!("Identity check failed, continuing with configured id: {}", e),
        }
        return Ok(LedgerSession {
            user_id,
            username,
            balance: 0.0,
            total_mined: 0.0,
        });
    }

    let (username, password) = match (&config.auth.username, &config.auth.password) {
        (Some(user), Some(pass)) => (user.clone(), pass.clone()),
        _ => {
            return Err(MinerError::ConfigError(
                "credentials required: set auth.username and auth.password, or pass --user-id"
                    .into(),
            ));
        }
    };

    let client_info = ClientInfo::new(config.miner.threads);
    let session = api.login(&username, &password, &client_info).await?;
    stats.set_account(session.balance, session.total_mined);
    Ok(session)
}

/// Runs mining rounds until the process is interrupted
///
/// Each round: generate an opaque candidate, race the worker pool for a
/// solution, record the round rate, let the difficulty controller react,
/// then push the solution through the submission pipeline.
async fn mining_loop(
    config: Config,
    api: ApiClient,
    stats: Arc<StatsAggregator>,
    mut reporter: StatsReporter,
    session: LedgerSession,
) -> Result<(), MinerError> {
    let algorithm_kind = config.miner.algorithm()?;
    let algorithm = algorithm::create(algorithm_kind);
    let scheduler = Arc::new(Scheduler::new(stats.clone(), &config.miner));
    let controller = DifficultyController::new(stats.clone(), &config.auto_difficulty);
    let pipeline = SubmissionPipeline::new(api, stats.clone(), session.user_id, &config.submit);

    let mut difficulty = config.miner.difficulty;
    let mut consecutive_failures: u32 = 0;

    log::info!(
        "Starting mining: {} workers, difficulty {}, algorithm {}, auto-difficulty {}",
        scheduler.worker_count(),
        difficulty,
        algorithm_kind,
        if config.auto_difficulty.enabled { "on" } else { "off" },
    );

    loop {
        let round_difficulty = difficulty;
        let candidate = BlockCandidate {
            data: generate_block_data(session.user_id),
            difficulty: round_difficulty,
        };

        let round_scheduler = scheduler.clone();
        let round_algorithm = algorithm.clone();
        let solution =
            tokio::task::spawn_blocking(move || round_scheduler.search(&candidate, round_algorithm))
                .await?;

        let Some(solution) = solution else {
            log::info!("Generating new work");
            tokio::time::sleep(Duration::from_secs(1)).await;
            continue;
        };

        let elapsed = solution.elapsed.as_secs_f64();
        let rate = if elapsed > 0.0 {
            solution.nonce as f64 / elapsed
        } else {
            0.0
        };
        controller.record_rate(rate);
        difficulty = controller.maybe_adjust(difficulty);

        let system_info = reporter.system_info(config.miner.threads);
        let outcome = pipeline
            .submit(&solution, round_difficulty, rate, system_info)
            .await;

        if outcome.accepted {
            consecutive_failures = 0;
            tokio::time::sleep(Duration::from_secs(1)).await;
        } else {
            consecutive_failures += 1;
            log::warn!(
                "Submission failed ({}/{})",
                consecutive_failures,
                MAX_CONSECUTIVE_FAILURES
            );
            if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                log::error!(
                    "Too many consecutive submission failures, pausing {}s",
                    FAILURE_PAUSE.as_secs()
                );
                tokio::time::sleep(FAILURE_PAUSE).await;
                consecutive_failures = 0;
            } else {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// Generates an opaque payload for one round
///
/// Stands in for the external block-data generator: wall-clock seconds,
/// random entropy, and the account id keep candidates unique per round.
fn generate_block_data(user_id: u64) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let entropy: u32 = rand::thread_rng().gen_range(1_000_000..10_000_000);
    format!("block_{}_{}_{}", timestamp, entropy, user_id)
}

/// Checks connectivity to the configured ledger service
fn run_probe(opts: cli::ProbeOptions) -> Result<(), MinerError> {
    utils::init_logging();

    let mut config = if opts.config.exists() {
        config::load(&opts.config)?
    } else {
        Config::default()
    };
    if let Some(url) = opts.url {
        config.server.base_url = url;
    }

    let api = ApiClient::new(&config.server)?;
    log::info!("Probing {}", api.api_url());

    let rt = Runtime::new()?;
    rt.block_on(async {
        api.probe().await?;
        Ok::<(), MinerError>(())
    })
}

/// Runs hash variant benchmarks
///
/// # Operations
/// 1. Initializes benchmark-specific logging
/// 2. Creates the requested hash variant
/// 3. Spawns worker threads hashing for the configured duration
/// 4. Reports aggregate performance statistics
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();

    let algorithm = algorithm::create(opts.algorithm);
    let stats = Arc::new(StatsAggregator::new());

    log::info!(
        "Starting {} benchmark for {} seconds on {} threads",
        opts.algorithm,
        opts.duration,
        opts.threads
    );

    let start_time = Instant::now();
    let duration = Duration::from_secs(opts.duration);
    let handles: Vec<_> = (0..opts.threads)
        .map(|id| {
            let algo = algorithm.clone();
            let stats = stats.clone();
            std::thread::spawn(move || {
                let data = format!("bench_{}", id);
                let mut nonce: u64 = 0;
                let mut hashes: u64 = 0;
                let mut window: u64 = 0;
                let mut last_log = Instant::now();

                while start_time.elapsed() < duration {
                    let _ = algo.hash(&data, nonce);
                    nonce += 1;
                    hashes += 1;
                    window += 1;

                    if window == 1_000 {
                        stats.add_hashes(window);
                        window = 0;
                        if last_log.elapsed().as_secs() >= 1 {
                            log::debug!(
                                "Thread {}: {:.1} H/s",
                                id,
                                hashes as f64 / start_time.elapsed().as_secs_f64()
                            );
                            last_log = Instant::now();
                        }
                    }
                }
                stats.add_hashes(window);
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| MinerError::WorkerFault("benchmark thread panicked".into()))?;
    }

    let snap = stats.snapshot();
    let elapsed = start_time.elapsed().as_secs_f64();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", snap.total_hashes);
    log::info!(
        "Average hashrate: {}",
        format_hashrate(snap.total_hashes as f64 / elapsed)
    );
    log::logger().flush();

    Ok(())
}

/// Generates configuration template file
///
/// # Operations
/// 1. Generates the commented template content
/// 2. Writes the template to the specified output file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let template = config::generate_template();
    std::fs::write(opts.output, template)?;
    Ok(())
}
