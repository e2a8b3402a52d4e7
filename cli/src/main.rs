mod command;
mod config;
mod render;
mod repl;

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use actions::LocalActionBackend;
use agent::{Orchestrator, Session};
use providers::provider_trait::ProviderError;
use providers::ProviderChoice;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, ConfigError};
use crate::render::Renderer;
use crate::repl::Repl;

const LOG_ENV: &str = "FLUX_LOG";

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    provider: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
    no_color: bool,
}

fn print_help() {
    println!("flux - interactive chat client with checkpoints and a read-only agent mode");
    println!();
    println!("USAGE:");
    println!("  flux [--provider <groq|stub>] [--model <id>] [--config <path>] [--no-color]");
    println!("  flux --help");
    println!();
    println!("ENVIRONMENT:");
    println!("  GROQ_API_KEY       API key for the groq provider (or GROQ_API_KEY_FILE)");
    println!("  GROQ_BASE_URL      OpenAI-compatible endpoint base URL");
    println!("  FLUX_PROVIDER      provider name (default: groq)");
    println!("  FLUX_MODEL         model identifier");
    println!("  {LOG_ENV:<18} tracing filter, e.g. debug (default: error)");
    println!("  NO_COLOR           disable colored output");
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("missing value for {}", args[i]))
        };
        match args[i].as_str() {
            "--provider" => {
                parsed.provider = Some(value()?);
                i += 2;
            }
            "--model" => {
                parsed.model = Some(value()?);
                i += 2;
            }
            "--config" => {
                parsed.config_path = Some(PathBuf::from(value()?));
                i += 2;
            }
            "--no-color" => {
                parsed.no_color = true;
                i += 1;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(parsed)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: CliArgs) -> Result<(), StartupError> {
    let (mut config, source) = CliConfig::resolve(cli.config_path.as_deref())?;
    config.apply_env(|key| env::var(key).ok());
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    if cli.no_color {
        config.use_colors = false;
    }
    tracing::debug!(provider = %config.provider, model = %config.model, %source, "configuration resolved");

    let provider = ProviderChoice::by_name(&config.provider, &config.http_settings())?;
    let backend = LocalActionBackend::from_current_dir(config.read_policy())?;
    let orchestrator = Orchestrator::new(provider, backend, config.provider_config());

    let stdout = io::stdout();
    let interactive = stdout.is_terminal();
    let renderer = Renderer::new(config.use_colors && interactive);
    let mut stdout = stdout.lock();
    if interactive {
        renderer.clear_screen(&mut stdout)?;
    }

    let mut repl = Repl::new(
        orchestrator,
        Session::new(config.system_prompt.clone()),
        renderer,
        source.to_string(),
        io::stdin().lock(),
        stdout,
    );
    repl.run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let parsed = parse_args(&args(&[
            "--provider", "stub", "--model", "m", "--config", "c.json", "--no-color",
        ]))
        .expect("args");
        assert_eq!(
            parsed,
            CliArgs {
                provider: Some("stub".to_string()),
                model: Some("m".to_string()),
                config_path: Some(PathBuf::from("c.json")),
                no_color: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(parse_args(&args(&["--verbose"])).is_err());
        assert_eq!(
            parse_args(&args(&["--model"])),
            Err("missing value for --model".to_string())
        );
    }

    #[test]
    fn missing_credential_message_names_the_variable() {
        let err = StartupError::from(ProviderError::MissingCredential { var: "GROQ_API_KEY" });
        assert_eq!(err.to_string(), "GROQ_API_KEY not set");
    }
}
