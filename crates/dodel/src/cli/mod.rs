//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for dodel using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `init`: Initialize a new dodel repository
//! - `post`: Submit a post or a comment
//! - `vote`: Up- or downvote a post
//! - `feed`: Show the ranked feed
//! - `show`: Show a post and its comments
//! - `karma`: Show a user's karma
//! - `info`: Show repository information
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! dodel post --author alice --text "Hello, world" --color blue
//! dodel vote dodel-a3f8 --user bob
//! dodel post --author bob --text "Hi!" --parent dodel-a3f8
//! dodel feed --limit 10 --user bob
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

// Re-export argument structs
pub use args::{FeedArgs, InfoArgs, InitArgs, KarmaArgs, PostArgs, ShowArgs, VoteArgs};

// Re-export validators for external use
pub use validators::{
    validate_color, validate_min_rank, validate_post_id, validate_text, validate_user,
};

/// Dodel - a small ranked social feed
///
/// Submit posts and comments, vote on them, and read a feed ranked by age
/// and votes. State lives in `.dodel/snapshot.json`.
#[derive(Parser, Debug)]
#[command(name = "dodel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new dodel repository
    ///
    /// Creates the `.dodel/` directory with configuration and an empty snapshot.
    Init(InitArgs),

    /// Show repository information
    ///
    /// Displays the snapshot path, vote policy, and summary statistics.
    Info(InfoArgs),

    /// Submit a post, or a comment with `--parent`
    Post(PostArgs),

    /// Vote on a post
    ///
    /// Upvotes by default. A later vote by the same user replaces the earlier
    /// one unless the repository uses the strict vote policy.
    Vote(VoteArgs),

    /// Show the ranked feed
    ///
    /// Lists recent top-level posts, best ranked first. Defaults come from
    /// the `feed` section of the configuration.
    Feed(FeedArgs),

    /// Show a post and its comments
    Show(ShowArgs),

    /// Show a user's karma
    ///
    /// Karma is the sum of net votes over every post the user wrote.
    Karma(KarmaArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::Post(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_post(&app, args, output_mode).await
            }
            Some(Commands::Vote(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_vote(&app, args, output_mode).await
            }
            Some(Commands::Feed(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_feed(&app, args, output_mode).await
            }
            Some(Commands::Show(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_show(&app, args, output_mode).await
            }
            Some(Commands::Karma(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_karma(&app, args, output_mode).await
            }
            None => {
                println!("Dodel social feed");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
