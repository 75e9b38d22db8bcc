//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MindWatch - mental wellness dashboard client
///
/// Aggregates music-listening and video-watch-history analytics into one
/// wellness score and chats about them with the MindWatch assistant.
///
/// Examples:
///   mindwatch login
///   mindwatch auth "https://app.example.com/auth/callback?token=..."
///   mindwatch status
///   mindwatch analyze watch-history.html
///   mindwatch chat "How is my week looking?"
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// MindWatch backend base URL
    ///
    /// Can also be set via MINDWATCH_API_URL or .mindwatch.toml.
    #[arg(long, value_name = "URL", env = "MINDWATCH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Data directory for persisted session state
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mindwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the sign-in URL to open in a browser
    Login,

    /// Consume the sign-in callback address and store the session
    Auth {
        /// The full address the identity provider redirected back to
        #[arg(value_name = "CALLBACK_URL")]
        callback_url: String,
    },

    /// Clear the stored session
    Logout,

    /// Print the Spotify connect URL to open in a browser
    Connect,

    /// Show the wellness overview (score, band, per-source summaries)
    Status {
        /// Redirect address from a completed connect flow
        /// (e.g. "/dashboard?spotify=connected")
        #[arg(long, value_name = "URL")]
        callback: Option<String>,
    },

    /// Upload YouTube watch history for content analysis
    Analyze {
        /// watch-history.html from Google Takeout (required)
        #[arg(value_name = "WATCH_HISTORY")]
        watch_history: PathBuf,

        /// search-history.html from Google Takeout (optional)
        #[arg(long, value_name = "FILE")]
        search_history: Option<PathBuf>,
    },

    /// Chat with the MindWatch assistant
    Chat {
        /// Message to send. Omit for an interactive session.
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,
    },
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Command::Analyze {
            ref watch_history, ..
        } = self.command
        {
            if !watch_history.exists() {
                return Err(format!(
                    "Watch history file does not exist: {}",
                    watch_history.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
