use clap::Parser;

use mediascribe::cli::{Cli, Commands};
use mediascribe::commands::{self, TranscribeOptions};
use mediascribe::config::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediascribe=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Transcribe {
            file,
            word_timestamps,
            language,
            model,
            device,
            clean,
        } => commands::run_transcribe(
            config,
            &file,
            &TranscribeOptions {
                word_timestamps,
                language,
                model,
                device,
                clean,
            },
        ),
        Commands::Ask {
            question,
            transcript,
            provider,
            model,
        } => commands::run_ask(
            &config,
            &question,
            &transcript,
            provider.as_deref(),
            model.as_deref(),
        ),
        Commands::Models => commands::run_models(&config),
        Commands::Clean { root, terminate } => commands::run_clean(&root, terminate),
        Commands::Config { write } => commands::run_config(write),
    }
}
