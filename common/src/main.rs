use clap::{Args, Parser, Subcommand};
use minesweeper_inference::*;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minesweeper-inference")]
#[command(version, about = "Minesweeper agent backed by a SAT solver", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game, printing the board after every move
    Play {
        #[command(flatten)]
        game: GameArgs,
        /// Pause between moves, in milliseconds
        #[arg(long, default_value_t = 200)]
        delay_ms: u64,
    },
    /// Average score and forced guesses over a range of mine counts
    Sweep {
        #[command(flatten)]
        game: GameArgs,
        /// Smallest mine count
        #[arg(long, default_value_t = 1)]
        from: usize,
        /// Largest mine count
        #[arg(long, default_value_t = 20)]
        to: usize,
        #[arg(long, default_value_t = 1)]
        step: usize,
        /// Games per point
        #[arg(long, default_value_t = 10)]
        games: usize,
    },
    /// Average score and forced guesses over fog probabilities
    Fog {
        #[command(flatten)]
        game: GameArgs,
        /// Number of evenly spaced probabilities in [0, 1]
        #[arg(long, default_value_t = 11)]
        points: usize,
        /// Games per point
        #[arg(long, default_value_t = 10)]
        games: usize,
    },
}

#[derive(Args)]
struct GameArgs {
    /// Side length of the board
    #[arg(long, default_value_t = 8)]
    dim: usize,
    #[arg(long, default_value_t = 10)]
    mines: usize,
    /// Highest reasoning tier before guessing
    #[arg(long, value_enum, default_value_t = Tier::Cardinality)]
    tier: Tier,
    /// Encoding of the board-wide mine count
    #[arg(long, value_enum, default_value_t = CardinalityEncoding::Binomial)]
    encoding: CardinalityEncoding,
    /// Largest binomial mine-count constraint to build, in clauses. Larger
    /// constraints use a sequential counter
    #[arg(long, default_value_t = 200_000)]
    clause_limit: u64,
    #[arg(long, default_value_t = 0.0)]
    fog: f64,
    #[arg(long)]
    seed: Option<u64>,
    /// Run the consistency check after every global query
    #[arg(long)]
    check: bool,
}

impl GameArgs {
    fn spec(&self) -> GameSpec {
        GameSpec {
            dim: self.dim,
            mines: self.mines,
            fog_probability: self.fog,
            seed: self.seed,
            agent: AgentConfig {
                max_tier: self.tier,
                cardinality: self.encoding,
                cardinality_clause_limit: Some(self.clause_limit),
                check_consistency: self.check,
                ..AgentConfig::default()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Play { game, delay_ms } => play(&game.spec(), delay_ms),
        Commands::Sweep {
            game,
            from,
            to,
            step,
            games,
        } => {
            let points = sweep_density(&game.spec(), (from..=to).step_by(step.max(1)), games)?;
            print_points("mines", &points);
            Ok(())
        }
        Commands::Fog {
            game,
            points,
            games,
        } => {
            let last = points.saturating_sub(1).max(1) as f64;
            let probabilities = (0..points).map(|i| i as f64 / last);
            let points = sweep_fog(&game.spec(), probabilities, games)?;
            print_points("fog", &points);
            Ok(())
        }
    }
}

fn play(spec: &GameSpec, delay_ms: u64) -> anyhow::Result<()> {
    let (board, rng) = spec.board_and_rng()?;

    println!("--- Minesweeper Inference ---");
    println!(
        "{0}x{0} board, {1} mines, reasoning up to {2:?}",
        spec.dim, spec.mines, spec.agent.max_tier
    );

    let mut agent = Agent::new(board, rng, spec.agent.clone())?;
    let delay = Duration::from_millis(delay_ms);
    agent.on_redraw(move |snapshot| {
        println!("{}", snapshot);
        // Make the game watchable
        thread::sleep(delay);
    });
    let report = agent.solve()?;

    println!("\n--- Game Over ---");
    match report.score {
        Some(score) => println!(
            "Score: {:.3} ({} correct flags, {} incorrect, {} mines)",
            score.value(),
            score.correct_flags,
            score.incorrect_flags,
            score.total_mines
        ),
        None => println!("The game ended unexpectedly."),
    }
    println!(
        "Moves: {}, forced guesses: {}, mines hit: {}",
        report.moves, report.forced_guesses, report.mines_hit
    );
    println!(
        "Deductions: {} local, {} global, {} cardinality",
        report.deductions.local, report.deductions.global, report.deductions.cardinality
    );
    Ok(())
}

fn print_points(label: &str, points: &[SweepPoint]) {
    println!("{:>8} {:>8} {:>8}", label, "score", "guesses");
    for point in points {
        println!(
            "{:>8.2} {:>8.3} {:>8.2}",
            point.x, point.mean_score, point.mean_forced_guesses
        );
    }
}
