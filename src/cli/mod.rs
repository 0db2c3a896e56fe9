use crate::{
    config::{parse_bind_addr, PlannerConfig, API_KEY_VARS},
    core::{SessionStore, TripPlanner, TripSession},
    server,
};
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};

fn command() -> Command {
    Command::new("trip-planner")
        .version("0.1.0")
        .about("Conversational travel itinerary planner backed by an OpenAI-compatible LLM")
        .subcommand_required(true)
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .global(true)
                .help("API key for the model provider (or set GROQ_API_KEY / OPENAI_API_KEY)"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .global(true)
                .help("Model used to write the itinerary (or set TRIP_PLANNER_MODEL)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .global(true)
                .help("OpenAI-compatible base URL (or set TRIP_PLANNER_BASE_URL / OPENAI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .help("Upper bound on the itinerary generation call"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log output (-v info, -vv debug)"),
        )
        .subcommand(Command::new("chat").about("Plan a trip interactively in the terminal"))
        .subcommand(
            Command::new("serve")
                .about("Serve the chat HTTP API")
                .arg(
                    Arg::new("bind")
                        .short('b')
                        .long("bind")
                        .value_name("ADDR")
                        .help("Address to listen on (or set TRIP_PLANNER_BIND / PORT)"),
                ),
        )
}

/// CLI entry point for the trip-planner tool
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let matches = command().get_matches();
    let serving = matches.subcommand_name() == Some("serve");
    init_tracing(matches.get_count("verbose"), serving);

    let config = resolve_config(&matches)?;
    info!(
        model = config.model(),
        base_url = config.base_url(),
        "configuration loaded"
    );

    match matches.subcommand() {
        Some(("serve", serve_matches)) => {
            let config = match serve_matches.get_one::<String>("bind") {
                Some(bind) => config.with_bind_addr(parse_bind_addr(bind)?),
                None => config,
            };
            let planner = Arc::new(TripPlanner::from_config(&config));
            let store = SessionStore::from_config(&config);
            server::serve(planner, store, config.bind_addr()).await?;
        }
        _ => chat(&config).await?,
    }

    Ok(())
}

fn init_tracing(verbosity: u8, serving: bool) {
    let level = match (verbosity, serving) {
        (0, false) => Level::WARN,
        (0, true) | (1, _) => Level::INFO,
        _ => Level::DEBUG,
    };

    // Logs go to stderr so they never interleave with the chat transcript.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(matches: &ArgMatches) -> anyhow::Result<PlannerConfig> {
    let mut config = match matches.get_one::<String>("api-key") {
        Some(api_key) => PlannerConfig::from_lookup(|key| {
            if API_KEY_VARS.contains(&key) {
                Some(api_key.clone())
            } else {
                env::var(key).ok()
            }
        }),
        None => PlannerConfig::from_env(),
    }
    .context("failed to load planner configuration")?;

    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.as_str());
    }

    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.as_str());
    }

    if let Some(timeout) = matches.get_one::<String>("timeout") {
        let seconds: u64 = timeout
            .parse()
            .with_context(|| format!("--timeout must be a number of seconds, got {timeout}"))?;
        config = config.with_timeout(Duration::from_secs(seconds));
    }

    Ok(config)
}

/// One conversation over stdin/stdout; the session is threaded through each turn
async fn chat(config: &PlannerConfig) -> anyhow::Result<()> {
    let planner = TripPlanner::from_config(config);
    let mut session = TripSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Travel Itinerary Chatbot 🤖✈️  (type 'exit' to quit)\n");
    println!("{}", planner.greeting());

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        let turn = planner.advance(session, &line).await;
        println!("\n{}", turn.reply);
        session = turn.session;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_serve_bind_flag() {
        let matches = command()
            .try_get_matches_from(["trip-planner", "serve", "--bind", "0.0.0.0:9000"])
            .unwrap();
        let (name, serve_matches) = matches.subcommand().unwrap();
        assert_eq!(name, "serve");
        assert_eq!(
            serve_matches.get_one::<String>("bind").map(String::as_str),
            Some("0.0.0.0:9000")
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = command()
            .try_get_matches_from(["trip-planner", "chat", "-m", "llama-3.1-8b-instant", "-vv"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("model").map(String::as_str),
            Some("llama-3.1-8b-instant")
        );
        assert_eq!(matches.get_count("verbose"), 2);
    }
}
