mod cli;
mod prompt;

use agrisense::config::Config;
use agrisense::error::AgriSenseError;
use agrisense::models::Observation;
use agrisense::report::Advisory;
use agrisense::RulesEngine;
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Demo {
        format: OutputFormat::Text,
    });

    match command {
        Commands::Init => {
            let path = Config::default()
                .write_to(cli.config)
                .context("Failed to write default configuration")?;
            println!("Configuration written to {}", path.display());
        }
        Commands::Check => check(cli.config),
        Commands::Rules => {
            let config = load_config(cli.config);
            let engine = RulesEngine::from_config(&config)?;
            println!("{:<30} {:>8}  NAME", "ID", "SALIENCE");
            for (id, name, salience) in engine.rules() {
                println!("{:<30} {:>8}  {}", id, salience, name);
            }
        }
        Commands::Demo { format } => {
            let config = load_config(cli.config);
            diagnose(&config, &Observation::demo(), format);
        }
        Commands::Run { input, format } => {
            let config = load_config(cli.config);
            let observation = match Observation::load(&input) {
                Ok(o) => o,
                Err(e) => fail(&e),
            };
            diagnose(&config, &observation, format);
        }
        Commands::Interactive { format } => {
            let config = load_config(cli.config);
            let observation = match prompt::collect_observation() {
                Ok(o) => o,
                Err(e) => fail(&e),
            };
            diagnose(&config, &observation, format);
        }
    }

    Ok(())
}

fn load_config(config_override: Option<std::path::PathBuf>) -> Config {
    match Config::load(config_override) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Run `agrisense init` to write a default config.");
            std::process::exit(1);
        }
    }
}

fn check(config_override: Option<std::path::PathBuf>) {
    match Config::located(config_override.as_ref()) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none found, using built-in defaults"),
    }

    let config = load_config(config_override);
    let t = &config.thresholds;
    println!(
        "  NPK bands (ppm): low < {}, medium < {}",
        t.npk.low_below, t.npk.medium_below
    );
    println!(
        "  pH normal range: {}..={}",
        t.ph.acidic_below, t.ph.alkaline_above
    );
    println!("  Blight humidity above: {}%", t.blight_humidity_above);
    println!(
        "  Nitrogen deficiency below: {} ppm",
        t.nitrogen_deficiency_below
    );
    println!("  Max iterations: {}", config.engine.max_iterations);

    match RulesEngine::from_config(&config) {
        Ok(engine) => println!("OK: {} rules loaded", engine.rules().len()),
        Err(e) => fail(&e),
    }
}

fn diagnose(config: &Config, observation: &Observation, format: OutputFormat) {
    match advise(config, observation) {
        Ok(advisory) => match format {
            OutputFormat::Text => print!("{}", advisory.render_text()),
            OutputFormat::Json => match advisory.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => fail(&e),
            },
        },
        Err(e) => fail(&e),
    }
}

fn advise(config: &Config, observation: &Observation) -> agrisense::Result<Advisory> {
    let mut engine = RulesEngine::from_config(config)?;
    engine.reset();
    for fact in observation.to_facts() {
        engine.declare(fact)?;
    }
    engine.run()?;
    Ok(Advisory::from_engine(&engine))
}

fn fail(e: &AgriSenseError) -> ! {
    tracing::debug!("{:?}", e);
    eprintln!("{}", e.user_message());
    std::process::exit(1);
}
