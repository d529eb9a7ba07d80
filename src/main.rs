// src/main.rs

use clap::{CommandFactory, Parser};
use mason::cli::{Cli, Commands};
use mason::{commands, Config, Context};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("mason: {e}");
        std::process::exit(1);
    }
}

fn run() -> mason::Result<()> {
    let cli = Cli::parse();

    // Completions never need registries or the data dir
    let command = match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mason", &mut std::io::stdout());
            return Ok(());
        }
        command => command,
    };

    let config = Config::from_env();

    // The lock covers the whole mutating path, including any registry
    // download the context performs on first use. Reads stay lock-free.
    let needs_lock = matches!(
        command,
        Commands::Install { .. }
            | Commands::Uninstall { .. }
            | Commands::Update
            | Commands::Upgrade { .. }
    );
    let _lock = if needs_lock {
        Some(mason::lock::ProcessLock::acquire(&config.lock_path)?)
    } else {
        None
    };

    let mut ctx = Context::new(config)?;

    match command {
        Commands::Install {
            package,
            update_registries,
        } => commands::install(&mut ctx, &package, update_registries),
        Commands::Uninstall { package } => commands::uninstall(&ctx, &package),
        Commands::Update => commands::update(&mut ctx),
        Commands::Upgrade { package, yes } => commands::upgrade(&mut ctx, &package, yes),
        Commands::List => commands::list(&ctx),
        Commands::Search {
            query,
            category,
            language,
        } => commands::search(
            &ctx,
            query.as_deref(),
            category.as_deref(),
            language.as_deref(),
        ),
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
