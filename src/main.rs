// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use forms::RegistrationForm;

mod accounts;
mod config;
mod database;
mod error;
mod forms;
mod ingredient;
mod profile;
mod recipe;
#[cfg(test)]
mod testing;
mod web;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the JSON API.
    Serve,
    /// Register a chef. The account stays inactive until activated.
    Register {
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// Activate the account straight away.
        #[arg(long)]
        activate: bool,
    },
    Activate {
        username: String,
    },
    DeleteUser {
        username: String,
    },
    /// List active chefs and the permissions they hold.
    Chefs,
    AddIngredient {
        names: Vec<String>,
    },
}

fn serve(conn: database::Connection, config: &config::Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(conn, config.bind_address))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::Config::load()?;
    simple_logger::SimpleLogger::new()
        .with_level(config.log_level)
        .init()?;
    log::debug!("{config:?}");

    let mut conn = database::establish_connection(&config.database_path)?;
    match args.commands {
        Commands::Serve => serve(conn, &config)?,
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            activate,
        } => {
            let form = RegistrationForm {
                username,
                first_name,
                last_name,
                email,
            };
            let mut user = accounts::register(&mut conn, form)?;
            if activate {
                user = accounts::activate(&mut conn, user.id)?;
            }
            println!("registered {} with id {}", user.username, user.id);
        }
        Commands::Activate { username } => {
            let user = accounts::find_by_username(&mut conn, &username)?;
            accounts::activate(&mut conn, user.id)?;
        }
        Commands::DeleteUser { username } => {
            let user = accounts::find_by_username(&mut conn, &username)?;
            accounts::delete(&mut conn, user.id)?;
        }
        Commands::Chefs => {
            for (_, user) in profile::active(&mut conn)? {
                let permissions = accounts::permissions(&mut conn, user.id)?;
                let codenames: Vec<&str> = permissions.iter().map(|p| p.as_ref()).collect();
                println!("{} {} [{}]", user.id, user.username, codenames.join(", "));
            }
        }
        Commands::AddIngredient { names } => {
            for name in names {
                let ingredient = ingredient::create(&mut conn, &name)?;
                println!("{} {}", ingredient.id, ingredient.name);
            }
        }
    }

    Ok(())
}
