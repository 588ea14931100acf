use std::{error::Error, fs, path::Path, process::exit};

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use findice::{
    BankConfig, BankEnvironment, DEFAULT_SERVICE_NAME, add_system_prompt, get_active_system_prompt,
    get_api_configs, get_bank_config, get_system_prompts, initialize_db, mask_secret, set_api_key,
    set_bank_config,
};

/// A utility for managing the admin configuration of FinDice: API keys for
/// the assistant, its system prompt and the bank aggregation credentials.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the API key for an LLM service.
    LlmKey {
        /// The service name the key belongs to.
        #[arg(long, default_value = DEFAULT_SERVICE_NAME)]
        service: String,

        /// The API key.
        #[arg(long)]
        key: String,
    },

    /// Add a system prompt for the assistant. The newest prompt is used.
    SystemPrompt {
        /// A short name for the prompt.
        #[arg(long)]
        name: String,

        /// Path to a text file containing the prompt.
        #[arg(long)]
        file: String,
    },

    /// Set the bank aggregation credentials.
    Bank {
        #[arg(long)]
        client_id: String,

        #[arg(long)]
        secret: String,

        /// "sandbox", "development", "production" or a base URL.
        #[arg(long, default_value = "sandbox")]
        environment: String,
    },

    /// Print the current configuration with secrets masked.
    Show,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let db_path = Path::new(&args.db_path);
    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    match args.command {
        Command::LlmKey { service, key } => {
            let service = service.trim();
            let key = key.trim();
            if service.is_empty() || key.is_empty() {
                eprintln!("The service name and key cannot be empty.");
                exit(1);
            }

            set_api_key(service, key, &connection)?;
            println!("Saved the API key for {service}.");
        }
        Command::SystemPrompt { name, file } => {
            let content = fs::read_to_string(&file)?;
            if content.trim().is_empty() {
                eprintln!("The system prompt in {file:?} is empty.");
                exit(1);
            }

            let prompt = add_system_prompt(name.trim(), content.trim(), &connection)?;
            println!("Added system prompt {:?} (ID {}).", prompt.name, prompt.id);
        }
        Command::Bank {
            client_id,
            secret,
            environment,
        } => {
            let config = BankConfig {
                client_id: client_id.trim().to_owned(),
                secret: secret.trim().to_owned(),
                environment: BankEnvironment::parse(&environment),
            };

            set_bank_config(&config, &connection)?;
            println!(
                "Saved the bank credentials for {}.",
                config.environment.base_url()
            );
        }
        Command::Show => show(&connection)?,
    }

    Ok(())
}

fn show(connection: &Connection) -> Result<(), findice::Error> {
    println!("API keys:");
    let api_configs = get_api_configs(connection)?;
    if api_configs.is_empty() {
        println!("  (none)");
    }
    for config in api_configs {
        println!("  {}: {}", config.service_name, mask_secret(&config.api_key));
    }

    println!();
    println!("System prompts:");
    let active_id = get_active_system_prompt(connection)?.map(|prompt| prompt.id);
    let prompts = get_system_prompts(connection)?;
    if prompts.is_empty() {
        println!("  (none, the built-in prompt is used)");
    }
    for prompt in prompts {
        let marker = if Some(prompt.id) == active_id {
            " (active)"
        } else {
            ""
        };
        println!(
            "  {} {:?} added {}{marker}",
            prompt.id,
            prompt.name,
            prompt.created_at.date()
        );
    }

    println!();
    println!("Bank:");
    match get_bank_config(connection)? {
        Some(config) => {
            println!("  client ID: {}", config.client_id);
            println!("  secret: {}", mask_secret(&config.secret));
            println!("  environment: {}", config.environment);
        }
        None => println!("  (not configured)"),
    }

    Ok(())
}
