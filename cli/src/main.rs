mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_export, cmd_find, cmd_ingredients, cmd_interactive, cmd_meals, cmd_measures, cmd_recipes,
    cmd_show,
};
use crate::config::Config;
use foodblog_core::FoodBlog;

#[derive(Parser)]
#[command(
    name = "foodblog",
    version,
    about = "Record recipes and find the ones you can cook",
    long_about = "Record recipes, the meals they suit and the ingredients they need.\n\
                  Run without a command to add recipes interactively, or pass\n\
                  --ingredients/--meals to look up what you can make."
)]
struct Cli {
    /// Path to the catalog database
    #[arg(default_value = "food_blog.db")]
    database: PathBuf,
    /// Comma-separated ingredients every returned recipe must use
    #[arg(long)]
    ingredients: Option<String>,
    /// Comma-separated meals; recipes must be served at one of them
    #[arg(long)]
    meals: Option<String>,
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the meals a recipe can be served at
    Meals,
    /// List the units of measure
    Measures,
    /// List the known ingredients
    Ingredients,
    /// List all recipes
    Recipes,
    /// Show a recipe with its meals and ingredient lines
    Show {
        /// Recipe ID
        recipe_id: i64,
    },
    /// Dump the whole catalog as JSON
    Export,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.database)?;
    let blog = FoodBlog::initialize(&config.db_path)?;
    let json = cli.json;

    match cli.command {
        Some(Commands::Meals) => cmd_meals(&blog, json)?,
        Some(Commands::Measures) => cmd_measures(&blog, json)?,
        Some(Commands::Ingredients) => cmd_ingredients(&blog, json)?,
        Some(Commands::Recipes) => cmd_recipes(&blog, json)?,
        Some(Commands::Show { recipe_id }) => cmd_show(&blog, recipe_id, json)?,
        Some(Commands::Export) => cmd_export(&blog)?,
        None if cli.ingredients.is_some() || cli.meals.is_some() => cmd_find(
            &blog,
            cli.ingredients.as_deref(),
            cli.meals.as_deref(),
            json,
        )?,
        None => {
            let stdin = io::stdin();
            cmd_interactive(&blog, &mut stdin.lock(), &mut io::stdout())?;
        }
    }

    blog.shutdown()?;
    Ok(())
}
