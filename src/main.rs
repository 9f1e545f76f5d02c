use std::path::PathBuf;

use log::{info, warn};

use bearing_fix::api::{JsonFormatter, TextFormatter};
use bearing_fix::storage::{FixStore, MemoryStore, Registration};
use bearing_fix::synthetic::SyntheticSurvey;
use bearing_fix::utils::logging;
use bearing_fix::{EngineConfig, FixAggregator};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Process a JSON batch of observation records
    Process { batch: PathBuf },
    /// Generate and process a synthetic survey
    Simulate { seed: u64, groups: usize },
    /// List the fixes stored in a snapshot
    Fixes { snapshot: PathBuf },
    /// List or extend the animal registry of a snapshot
    Animals { snapshot: PathBuf, register: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    command: Command,
    store: Option<PathBuf>,
    config: Option<PathBuf>,
    verbosity: u8,
    text: bool,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {p} <batch.json> [--store <snapshot.json>] [--config <config.json>] [--text] [--verbose]\n   \
         or: {p} --simulate [--seed <n>] [--groups <n>] [--store <snapshot.json>] [--config <config.json>] [--text]\n   \
         or: {p} --fixes <snapshot.json> [--text]\n   \
         or: {p} --animals <snapshot.json> [--register <animal_id>]",
        p = program
    )
}

fn parse_args(args: &[String]) -> Result<CliOptions, String> {
    let mut batch = None;
    let mut simulate = false;
    let mut seed = SyntheticSurvey::default().seed;
    let mut groups = SyntheticSurvey::default().groups;
    let mut fixes = None;
    let mut animals = None;
    let mut register = None;
    let mut store = None;
    let mut config = None;
    let mut verbosity = 0u8;
    let mut text = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--store" => store = Some(PathBuf::from(value("--store")?)),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--fixes" => fixes = Some(PathBuf::from(value("--fixes")?)),
            "--animals" => animals = Some(PathBuf::from(value("--animals")?)),
            "--register" => register = Some(value("--register")?),
            "--seed" => {
                let raw = value("--seed")?;
                seed = raw.parse().map_err(|_| format!("invalid seed: {}", raw))?;
            }
            "--groups" => {
                let raw = value("--groups")?;
                groups = raw.parse().map_err(|_| format!("invalid group count: {}", raw))?;
            }
            "--simulate" => simulate = true,
            "--text" => text = true,
            "--verbose" | "-v" => verbosity = verbosity.saturating_add(1),
            other if other.starts_with('-') => return Err(format!("unknown option: {}", other)),
            other => {
                if batch.replace(PathBuf::from(other)).is_some() {
                    return Err("only one batch file may be given".to_string());
                }
            }
        }
    }

    let command = match (batch, simulate, fixes, animals) {
        (Some(batch), false, None, None) => Command::Process { batch },
        (None, true, None, None) => Command::Simulate { seed, groups },
        (None, false, Some(snapshot), None) => Command::Fixes { snapshot },
        (None, false, None, Some(snapshot)) => Command::Animals { snapshot, register },
        (None, false, None, None) => return Err("no command given".to_string()),
        _ => return Err("choose exactly one of <batch.json>, --simulate, --fixes, --animals".to_string()),
    };

    Ok(CliOptions {
        command,
        store,
        config,
        verbosity,
        text,
    })
}

fn load_store(path: Option<&PathBuf>) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("bearing-fix", |s| s.as_str()).to_string();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", usage(&program));
            return Err("Invalid arguments".into());
        }
    };

    if let Err(e) = logging::init_with_level(logging::level_from_verbosity(options.verbosity)) {
        eprintln!("logger already installed: {}", e);
    }

    let config = match &options.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match &options.command {
        Command::Process { batch } => {
            let json = std::fs::read_to_string(batch)?;
            let aggregator = FixAggregator::new(load_store(options.store.as_ref())?, config)?;
            let report = aggregator.process_json(&json)?;
            if let Some(path) = &options.store {
                aggregator.store().save(path)?;
                info!("snapshot saved to {}", path.display());
            }
            if options.text {
                print!("{}", TextFormatter::new().format_report(&report));
            } else {
                println!("{}", JsonFormatter::pretty().format(&report)?);
            }
        }
        Command::Simulate { seed, groups } => {
            let survey = SyntheticSurvey {
                seed: *seed,
                groups: *groups,
                ..SyntheticSurvey::default()
            };
            let data = survey.generate();
            info!("simulated {} sightings in {} groups", data.records.len(), data.targets.len());

            let aggregator = FixAggregator::new(load_store(options.store.as_ref())?, config)?;
            let report = aggregator.process_batch(&data.records)?;
            if let Some(path) = &options.store {
                aggregator.store().save(path)?;
            }
            if options.text {
                print!("{}", TextFormatter::new().format_report(&report));
                for target in &data.targets {
                    if let Some(fix) = aggregator.store().fix(&target.group_id)? {
                        println!(
                            "  {} miss distance: {:.1} m",
                            target.group_id,
                            fix.position().distance_to(&target.position)
                        );
                    }
                }
            } else {
                println!("{}", JsonFormatter::pretty().format(&report)?);
            }
        }
        Command::Fixes { snapshot } => {
            let store = MemoryStore::load(snapshot)?;
            let fixes = store.fixes()?;
            if options.text {
                let formatter = TextFormatter::new();
                for fix in &fixes {
                    println!("{}", formatter.format_fix(fix));
                }
            } else {
                println!("{}", JsonFormatter::pretty().format(&fixes)?);
            }
        }
        Command::Animals { snapshot, register } => {
            let store = MemoryStore::load(snapshot)?;
            if let Some(id) = register {
                match store.register_animal(id)? {
                    Registration::Added => {
                        store.save(snapshot)?;
                        println!("Added {}", id);
                    }
                    Registration::Exists => warn!("animal {} already registered", id),
                }
            }
            for id in store.animals()? {
                println!("{}", id);
            }
        }
    }

    Ok(())
}
