use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Error};
use clap::Parser;
use env_logger::{fmt, Builder, Target};
use log::{error, info, Level, LevelFilter, Record};
use std::io::Write as _;

use cdcl_sat::{SolveResult, Solver, SolverConfig};

/// A CDCL based SAT solver.
#[derive(Parser)]
#[command(name = "cdcl-sat", version)]
struct Cli {
    /// The input file to use (stdin if omitted or "-")
    input: Option<PathBuf>,

    /// Read parameters from a TOML configuration file
    #[arg(long = "config", value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Set a single config option as KEY=VALUE, may be repeated
    #[arg(short = 'C', long = "config-option", value_name = "KEY=VALUE")]
    config_options: Vec<String>,

    /// Seed the decision polarity RNG (shorthand for --config-option polarity_seed=N)
    #[arg(long = "seed", value_name = "N")]
    seed: Option<u64>,
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(env_var) = std::env::var("CDCL_SAT_LOG") {
        builder.parse_filters(&env_var);
    }

    builder.init();
}

fn main() {
    init_logging();
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{:#}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn load_config(cli: &Cli) -> Result<SolverConfig, Error> {
    let mut config = match &cli.config_file {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            SolverConfig::from_toml(&contents)?
        }
        None => SolverConfig::default(),
    };

    for option in &cli.config_options {
        let (key, value) = option
            .split_once('=')
            .with_context(|| format!("invalid config option '{}', expected KEY=VALUE", option))?;
        config.set_option(key, value)?;
    }

    if let Some(seed) = cli.seed {
        config.polarity_seed = Some(seed);
    }

    Ok(config)
}

fn main_with_err() -> Result<i32, Error> {
    let cli = Cli::parse();

    info!("starting cdcl-sat {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let mut solver = Solver::with_config(config);

    let stdin = io::stdin();
    let mut locked_stdin;
    let mut opened_file;

    let path = cli
        .input
        .as_deref()
        .filter(|path| path.as_os_str() != "-");

    let file: &mut dyn Read = match path {
        Some(path) => {
            info!("reading file '{}'", path.display());
            opened_file = fs::File::open(path)
                .with_context(|| format!("failed to open input file '{}'", path.display()))?;
            &mut opened_file
        }
        None => {
            info!("reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin
        }
    };

    solver.add_dimacs_cnf(file)?;

    match solver.solve() {
        SolveResult::Sat => {
            println!("s SATISFIABLE");
            print!("v");
            let model = solver.model().unwrap();
            for (index, &value) in model.iter().enumerate() {
                let dimacs_var = index as isize + 1;
                print!(" {}", if value { dimacs_var } else { -dimacs_var });
            }
            println!(" 0");
            Ok(10)
        }
        SolveResult::Unsat => {
            println!("s UNSATISFIABLE");
            Ok(20)
        }
    }
}
