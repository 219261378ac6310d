use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dayplan_core::SleepQuality;

mod config;
mod day_cmd;
mod state;
mod tasks_cmd;

use config::{init_config, load_config};
use state::Store;

#[derive(Parser, Debug)]
#[command(
    name = "dayplan",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYPLAN_BUILD_SHA"), ")"),
    about = "Energy-aware daily planner"
)]
struct Cli {
    /// Debug logging (overridden by DAYPLAN_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directory with a default config and an empty backlog
    Init,

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Manage the task backlog
    Tasks {
        #[command(subcommand)]
        command: tasks_cmd::TasksCommand,
    },

    /// Answer the morning questions and build today's plan
    Checkin {
        /// terrible | poor | ok | good | great
        #[arg(long)]
        sleep: SleepQuality,

        /// Energy level right now, 1-10
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=10))]
        energy: i32,

        /// Hours available today (default from config)
        #[arg(long)]
        hours: Option<f64>,
    },

    /// Show today's plan and progress
    Plan,

    /// Mark a task done and collect its points
    Done {
        task_id: String,
    },

    /// Log how long a task actually took and how draining it was
    Review {
        task_id: String,

        /// Actual minutes spent
        #[arg(long)]
        minutes: Option<i32>,

        /// Actual energy it took, 1-10
        #[arg(long)]
        energy: Option<f64>,
    },

    /// Show the points total and recent ledger entries
    Points {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write config.toml with defaults if missing
    Init,

    /// Print the effective configuration
    Show,
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DAYPLAN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let store = Store::open_default()?;
    let now = Utc::now();

    match cli.command {
        Command::Init => {
            init_config(&store)?;
            if !store.tasks_path().exists() {
                store.save_tasks(&[])?;
                println!("Wrote {}", store.tasks_path().display());
            }
            println!("\nNext:");
            println!("- Import tasks: dayplan tasks import <tasks.json>");
            println!("- Each morning: dayplan checkin --sleep ok --energy 6 --hours 8");
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => init_config(&store)?,
            ConfigCommand::Show => {
                let cfg = load_config(&store)?;
                println!("# {}", store.config_path().display());
                print!("{}", toml::to_string_pretty(&cfg)?);
                println!("# data dir: {}", store.root().display());
            }
        },

        Command::Tasks { command } => tasks_cmd::run(&store, command)?,

        Command::Checkin { sleep, energy, hours } => {
            let cfg = load_config(&store)?;
            let state = day_cmd::checkin(&store, &cfg, sleep, energy, hours, now)?;
            let (mandatory, critical, normal) = state.plan.tier_counts();
            println!(
                "Plan for {}: {mandatory} mandatory, {critical} critical, {normal} other\n",
                state.date
            );
            print!("{}", day_cmd::render_plan(&state.plan, &state.completed));
            if state.plan.has_errors() {
                println!("\nNot everything fits today. Defer something or check in with more hours.");
            }
        }

        Command::Plan => {
            let cfg = load_config(&store)?;
            day_cmd::show_plan(&store, &cfg, now)?;
        }

        Command::Done { task_id } => {
            let cfg = load_config(&store)?;
            let c = day_cmd::complete(&store, &cfg, &task_id, now)?;
            if c.award.low_energy_bonus {
                println!(
                    "Done: {} +{} points ({} x{} low-energy bonus)",
                    c.task.name, c.award.points, c.award.base, c.award.multiplier
                );
            } else {
                println!("Done: {} +{} points", c.task.name, c.award.points);
            }
            println!("Progress: {}/{} planned", c.progress.completed, c.progress.planned);
            if let Some(bonus) = c.perfect_day_bonus {
                println!("Perfect day! +{bonus} points");
            }
        }

        Command::Review { task_id, minutes, energy } => {
            let cfg = load_config(&store)?;
            let r = day_cmd::review(&store, &cfg, &task_id, minutes, energy, now)?;
            println!(
                "Reviewed {}: {} sample(s), avg {} min, avg energy {:.1}",
                r.task.name, r.count, r.avg_duration_minutes, r.avg_energy
            );
            if let Some(points) = r.feedback_points {
                println!("+{points} feedback points");
            }
        }

        Command::Points { limit } => day_cmd::show_points(&store, limit)?,
    }

    Ok(())
}
