//! herodex - command-line front end for the hero catalogue.
//!
//! Every command goes through `HeroStore`, so pages come from the local cache
//! when possible and mutations keep that cache in step with the server.

use std::io;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use herodex_core::{Config, Hero, HeroApiClient, HeroCache, HeroStore, StoreState};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Commands
// ============================================================================

const USAGE: &str = "\
Usage: herodex <command> [args]

Commands:
  list [page] [limit]       Show one page of heroes
  show <id>                 Show a hero by id
  find <name>               Show a hero by exact name
  search <query>            Suggest hero names (3+ characters)
  names <a,b,...>           Show the heroes with the given names
  add <name> [power,...]    Create a hero
  edit <id> [name] [power,...]
                            Rename a hero and/or replace its powers
  delete <id>               Delete a hero
  clear-cache               Erase the local cache";

#[derive(Debug, PartialEq)]
enum Command {
    List { page: Option<u32>, limit: Option<u32> },
    Show(i64),
    Find(String),
    Search(String),
    Names(Vec<String>),
    Add { name: String, powers: Vec<String> },
    Edit { id: i64, name: Option<String>, powers: Option<Vec<String>> },
    Delete(i64),
    ClearCache,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let Some((command, rest)) = args.split_first() else {
            return Ok(Command::List { page: None, limit: None });
        };

        let command = match command.as_str() {
            "list" => Command::List {
                page: rest.first().map(|p| parse_number(p, "page")).transpose()?,
                limit: rest.get(1).map(|l| parse_number(l, "limit")).transpose()?,
            },
            "show" => Command::Show(parse_number(required(rest, "id")?, "id")?),
            "find" => Command::Find(rest.join(" ")),
            "search" => Command::Search(rest.join(" ")),
            "names" => Command::Names(split_list(&rest.join(" "))),
            "add" => Command::Add {
                name: required(rest, "name")?.to_string(),
                powers: rest.get(1).map(|p| split_list(p)).unwrap_or_default(),
            },
            "edit" => Command::Edit {
                id: parse_number(required(rest, "id")?, "id")?,
                name: rest.get(1).map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                powers: rest.get(2).map(|p| split_list(p)),
            },
            "delete" => Command::Delete(parse_number(required(rest, "id")?, "id")?),
            "clear-cache" => Command::ClearCache,
            other => bail!("Unknown command: {}", other),
        };

        if let Command::Find(name) = &command {
            if name.trim().is_empty() {
                bail!("Missing argument: name");
            }
        }
        Ok(command)
    }
}

fn required<'a>(rest: &'a [String], what: &str) -> Result<&'a str> {
    rest.first()
        .map(String::as_str)
        .with_context(|| format!("Missing argument: {}", what))
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse()
        .ok()
        .with_context(|| format!("Invalid {}: {}", what, raw))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ============================================================================
// Output
// ============================================================================

fn print_hero(hero: &Hero) {
    let id = hero.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    println!("#{} {}", id, hero.name);
    if let Some(identity) = &hero.alternate_identity {
        println!("  identity:    {}", identity);
    }
    if let Some(affiliation) = &hero.affiliation {
        println!("  affiliation: {}", affiliation);
    }
    if !hero.powers.is_empty() {
        println!("  powers:      {}", hero.powers.join(", "));
    }
}

fn print_page(heroes: &[Hero], state: &StoreState) {
    for hero in heroes {
        let id = hero.id.map(|id| id.to_string()).unwrap_or_default();
        println!("{:>5}  {}", id, hero.name);
    }
    println!(
        "page {}/{} ({} heroes)",
        state.page,
        state.page_count().max(1),
        state.total_count
    );
}

/// Print the store error, if any. Store failures do not change the exit status.
fn report(state: &StoreState) {
    if let Some(message) = &state.error {
        eprintln!("Error: {}", message);
    }
}

// ============================================================================
// Main
// ============================================================================

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=herodex_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default().with_env_overrides()
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let config = load_config();
    let cache = HeroCache::open(config.cache_dir()?).context("Failed to open hero cache")?;
    let client = HeroApiClient::new(&config).context("Failed to build API client")?;
    info!(base_url = %client.base_url(), ?command, "Running command");

    let store = HeroStore::new(client, cache, &config);
    match command {
        Command::List { page, limit } => {
            store
                .fetch_page(
                    page.unwrap_or(config.default_page),
                    limit.unwrap_or(config.default_limit),
                )
                .await;
            let state = store.snapshot();
            if state.error.is_none() {
                print_page(&store.sorted_by_id(), &state);
            }
            report(&state);
            return Ok(());
        }
        Command::Show(id) => store.fetch_by_id(id).await,
        Command::Find(name) => store.fetch_by_name(name.trim()).await,
        Command::Search(query) => {
            let names = store.search(&query).await;
            if names.is_empty() {
                println!("No suggestions");
            }
            for name in names {
                println!("{}", name);
            }
            return Ok(());
        }
        Command::Names(names) => {
            store.fetch_by_names(&names).await;
            let state = store.snapshot();
            if state.error.is_none() {
                for hero in &state.items {
                    print_hero(hero);
                }
            }
            report(&state);
            return Ok(());
        }
        Command::Add { name, powers } => store.create(Hero::named(name).with_powers(powers)).await,
        Command::Edit { id, name, powers } => {
            store.fetch_by_id(id).await;
            let Some(mut hero) = store.selected().filter(|_| store.error().is_none()) else {
                report(&store.snapshot());
                return Ok(());
            };
            if let Some(name) = name {
                hero.name = name;
            }
            if let Some(powers) = powers {
                hero.powers = powers;
            }
            store.update(hero).await;
        }
        Command::Delete(id) => {
            store.remove(id).await;
            let state = store.snapshot();
            if state.error.is_none() {
                println!("Deleted hero {} ({} left in cache)", id, state.total_count);
            }
            report(&state);
            return Ok(());
        }
        Command::ClearCache => {
            store.clear_cache();
            println!("Cache cleared");
            return Ok(());
        }
    }

    let state = store.snapshot();
    if let (None, Some(hero)) = (&state.error, &state.selected) {
        print_hero(hero);
    }
    report(&state);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
