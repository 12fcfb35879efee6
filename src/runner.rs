use std::path::Path;
use std::str::FromStr;

use clap::{Args, Command, FromArgMatches as _};
use log::{info, warn, LevelFilter};

use crate::error::ContagionError;
use crate::log::{set_log_level, set_module_filters};
use crate::population::{Population, PopulationConfig};

/// Upper bound on the ticks simulated when no step count is given
pub const MAX_UNBOUNDED_TICKS: u64 = 1_000_000;

/// Default cli arguments for the contagion runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Random seed; overrides the seed from the config file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a population config file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Number of ticks to simulate. 0 runs until everyone is infected
    #[arg(short, long, default_value = "0")]
    pub steps: u64,

    /// Log statistics every this many ticks. 0 disables periodic reports
    #[arg(long, default_value = "100")]
    pub report_interval: u64,

    /// Log level (`info`) or comma separated module filters (`info,contagion::agent=trace`)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

fn create_contagion_cli() -> Command {
    let cli = Command::new("contagion").about("Simulates contagion in a mobile population");
    BaseArgs::augment_args(cli)
}

/// Runs a population with default cli arguments
///
/// # Errors
/// Returns an error if argument parsing, config loading or population setup fails
pub fn run_with_args() -> Result<Population, Box<dyn std::error::Error>> {
    let cli = create_contagion_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(base_args_matches)
}

/// Builds the population described by `args` and steps it headlessly.
///
/// # Errors
/// Returns an error if the log level, the config file or the population is invalid
pub fn run_with_args_internal(args: BaseArgs) -> Result<Population, Box<dyn std::error::Error>> {
    if let Some(log_level) = &args.log_level {
        let (global, modules) = parse_log_levels(log_level)?;
        if let Some(level) = global {
            set_log_level(level);
        }
        let filters: Vec<(&str, LevelFilter)> = modules
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
    }

    // Optionally read the population from a file
    let mut config = if args.config.is_empty() {
        PopulationConfig::default()
    } else {
        info!("Loading population config from: {}", args.config);
        PopulationConfig::from_json_file(Path::new(&args.config))?
    };
    if let Some(seed) = args.random_seed {
        config.random_seed = seed;
    }

    let mut population = Population::from_config(&config)?;
    drive(&mut population, args.steps, args.report_interval);
    Ok(population)
}

fn drive(population: &mut Population, steps: u64, report_interval: u64) {
    let chunk = if report_interval == 0 {
        steps.max(1)
    } else {
        report_interval
    };

    if steps > 0 {
        let mut remaining = steps;
        while remaining > 0 {
            let ticks = remaining.min(chunk);
            population.step(ticks);
            remaining -= ticks;
            if report_interval > 0 {
                report(population);
            }
        }
        return;
    }

    let mut elapsed = 0;
    loop {
        let infected = population.infected_count();
        if infected == population.agents().len() {
            break;
        }
        if infected == 0 {
            warn!("no infected agents, nothing can spread");
            break;
        }
        if elapsed >= MAX_UNBOUNDED_TICKS {
            warn!("stopping after {MAX_UNBOUNDED_TICKS} ticks with susceptible agents left");
            break;
        }
        let ticks = chunk.min(MAX_UNBOUNDED_TICKS - elapsed);
        population.step(ticks);
        elapsed += ticks;
        if report_interval > 0 {
            report(population);
        }
    }
}

fn report(population: &Population) {
    info!(
        "t={} infected={:.1}% R={:.3}",
        population.current_time(),
        population.infected_percent(),
        population.reproduction_ratio()
    );
}

/// One line describing the state of `population`.
#[must_use]
pub fn summary_line(population: &Population) -> String {
    format!(
        "t={} agents={} infected={} ({:.1}%) transmissions={} R={:.3}",
        population.current_time(),
        population.agents().len(),
        population.infected_count(),
        population.infected_percent(),
        population.total_transmissions(),
        population.reproduction_ratio()
    )
}

/// Parses `info` or `warn,contagion::agent=trace` into an optional global level and a list of
/// module filters. A later global level replaces an earlier one.
///
/// # Errors
/// Returns `ContagionError::InvalidConfig` for an unknown level or an empty module name
pub fn parse_log_levels(
    levels: &str,
) -> Result<(Option<LevelFilter>, Vec<(String, LevelFilter)>), ContagionError> {
    let parse_level = |level: &str| {
        LevelFilter::from_str(level.trim())
            .map_err(|_| ContagionError::InvalidConfig(format!("unknown log level '{level}'")))
    };

    let mut global = None;
    let mut modules = Vec::new();
    for item in levels.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((module, level)) => {
                let module = module.trim();
                if module.is_empty() {
                    return Err(ContagionError::InvalidConfig(format!(
                        "missing module name in '{item}'"
                    )));
                }
                modules.push((module.to_string(), parse_level(level)?));
            }
            None => global = Some(parse_level(item)?),
        }
    }
    Ok((global, modules))
}
