use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mediascribe",
    version,
    about = "Audio/video transcription with LLM-backed transcript Q&A"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio or video file
    Transcribe {
        /// File to transcribe
        file: PathBuf,

        /// Emit one timestamped line per word
        #[arg(long)]
        word_timestamps: bool,

        /// Override the configured language hint
        #[arg(long)]
        language: Option<String>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Override the configured device (auto, cpu, cuda)
        #[arg(long)]
        device: Option<String>,

        /// Delete the session workspace after printing the transcript
        #[arg(long)]
        clean: bool,
    },

    /// Ask a question about a saved transcript
    Ask {
        /// The question to ask
        question: String,

        /// Path to the transcript file
        #[arg(long)]
        transcript: PathBuf,

        /// Provider selector (gemini or ollama; prefix-matched)
        #[arg(long)]
        provider: Option<String>,

        /// Override the provider's configured model
        #[arg(long)]
        model: Option<String>,
    },

    /// List models available on the local LLM daemon
    Models,

    /// Delete a session workspace
    Clean {
        /// Workspace root to delete
        root: PathBuf,

        /// Terminate the process after cleanup
        #[arg(long)]
        terminate: bool,
    },

    /// Print the commented default configuration
    Config {
        /// Write it to the platform config directory instead of stdout
        #[arg(long)]
        write: bool,
    },
}
