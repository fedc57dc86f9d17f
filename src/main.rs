// Entry point: parses the command line, loads config and prints JSON results.
mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Args, Command, parse_traits};
use sixlines::config::AppConfig;
use sixlines::error::Result;
use sixlines::oracle::diagnosis::{
    DiagnosisReport, DiagnosisRequest, Diagnoser, Normalization, TripleRequest,
};
use sixlines::oracle::hexagram::HexagramResolver;
use sixlines::oracle::reference::ReferenceTable;
use sixlines::oracle::scenario::ScenarioTreeGenerator;
use sixlines::oracle::selector::SelectionMode;
use sixlines::oracle::transition::LineState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn load_reference(path: Option<&Path>) -> Result<ReferenceTable> {
    match path {
        Some(p) => {
            let table = ReferenceTable::load(p)?;
            debug!("Loaded {} reference entries from {}", table.len(), p.display());
            Ok(table)
        }
        None => Ok(ReferenceTable::new()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AppConfig::load_or_default(path),
        None => AppConfig::default(),
    };
    let params = config.engine_params()?;
    let diagnoser = Diagnoser::new(params);

    match args.command {
        Command::Diagnose {
            category,
            traits,
            seed,
            softmax,
            temperature,
            ranked,
            avoid_pure,
            tree_line,
            reference,
            debug,
        } => {
            let reference = load_reference(reference.as_deref())?;
            let mut request = DiagnosisRequest::new(parse_traits(&traits)?, category);
            if softmax {
                request.normalization = Normalization::Softmax { temperature };
            }
            if ranked {
                request.selection = SelectionMode::Ranked { avoid_pure };
            }
            request.scenario_line = tree_line;
            request.debug = debug;
            let mut rng = make_rng(seed);
            print_json(&diagnoser.diagnose(&request, &mut rng, &reference)?)
        }
        Command::Triple {
            engine,
            interface,
            safe_mode,
            seed,
            debug,
        } => {
            let request = TripleRequest {
                engine: parse_traits(&engine)?,
                interface: parse_traits(&interface)?,
                safe_mode: parse_traits(&safe_mode)?,
                normalization: Normalization::default(),
                selection: SelectionMode::default(),
                debug,
            };
            let mut rng = make_rng(seed);
            let empty = ReferenceTable::new();
            print_json(&diagnoser.diagnose_triple(&request, &mut rng, &empty)?)
        }
        Command::Tree {
            hexagram,
            line,
            reference,
        } => {
            let reference = load_reference(reference.as_deref())?;
            let start = LineState::new(hexagram, line)?;
            let tree = ScenarioTreeGenerator::new(&reference, params.scenario).generate(start);
            print_json(&tree)
        }
        Command::Resolve { upper, lower } => {
            print_json(&HexagramResolver::resolve_labels(&upper, &lower)?)
        }
        Command::Calibrate {
            category,
            traits,
            draws,
            seed,
        } => {
            let traits = parse_traits(&traits)?;
            let mut rng = make_rng(seed);
            print_json(&diagnoser.calibrate(&traits, category, draws, &mut rng)?)
        }
        Command::Schema => print_json(&schemars::schema_for!(DiagnosisReport)),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
