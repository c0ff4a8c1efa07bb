use clap::{Parser as ClapParser, Subcommand};
use std::{
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;
use twoway_sql::{
    EngineConfig,
    cli::{self, CliError, RenderOptions, RenderResult},
    output::{display_sql, to_json, to_json_pretty},
};

#[derive(ClapParser)]
#[command(name = "twoway")]
#[command(about = "twoway - Render 2-way SQL templates into SQL and bind values")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against JSON parameters
    Render {
        /// The template text
        template: String,

        /// JSON parameters (reads from stdin if not provided)
        #[arg(short, long)]
        params: Option<String>,

        /// Engine configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root parameter name used by the template
        #[arg(long)]
        root_name: Option<String>,

        /// Declared type for a null value, as path=type (repeatable)
        #[arg(short = 't', long = "type", value_name = "PATH=TYPE")]
        types: Vec<String>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,

        /// Print SQL with bind values inlined instead of JSON
        #[arg(long)]
        display: bool,
    },

    /// Validate template syntax without rendering
    Check {
        /// The template text
        template: String,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'twoway docs' to list categories)
        category: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            template,
            params,
            config,
            root_name,
            types,
            pretty,
            display,
        } => run_render(template, params, config, root_name, types, pretty, display),
        Commands::Check { template } => run_check(template),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_render(
    template: String,
    params: Option<String>,
    config: Option<PathBuf>,
    root_name: Option<String>,
    types: Vec<String>,
    pretty: bool,
    display: bool,
) -> Result<(), CliError> {
    let params = match params {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let types = types
        .iter()
        .map(|t| cli::parse_type_declaration(t))
        .collect::<Result<Vec<_>, _>>()?;

    let options = RenderOptions {
        template,
        params,
        root_name,
        config,
        types,
        syntax_only: false,
    };

    if let RenderResult::Rendered(bound) = cli::execute_render(&options)? {
        let output = if display {
            display_sql(&bound)
        } else if pretty {
            to_json_pretty(&bound)
        } else {
            to_json(&bound)
        };
        println!("{}", output);
    }
    Ok(())
}

fn run_check(template: String) -> Result<(), CliError> {
    let options = RenderOptions {
        template,
        syntax_only: true,
        ..RenderOptions::default()
    };

    if let RenderResult::SyntaxValid { nodes } = cli::execute_render(&options)? {
        println!("Syntax is valid ({} nodes)", nodes);
    }
    Ok(())
}
