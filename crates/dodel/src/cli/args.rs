//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;

use super::validators::{
    validate_color, validate_min_rank, validate_post_id, validate_text, validate_user,
};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Start with an empty store when the snapshot file is missing
    ///
    /// Without this flag a missing snapshot is an error on every later
    /// command.
    #[arg(long)]
    pub allow_missing: bool,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `post` command
#[derive(Parser, Debug, Clone)]
pub struct PostArgs {
    /// Submitting user
    #[arg(short, long, value_parser = validate_user)]
    pub author: String,

    /// Post body
    #[arg(short, long, value_parser = validate_text)]
    pub text: String,

    /// Display color for the author name (e.g., blue or #1a2b3c)
    #[arg(short, long, value_parser = validate_color, default_value = "")]
    pub color: String,

    /// Post to comment on
    #[arg(short, long, value_parser = validate_post_id)]
    pub parent: Option<String>,
}

/// Arguments for the `vote` command
#[derive(Parser, Debug, Clone)]
pub struct VoteArgs {
    /// Post to vote on
    #[arg(value_parser = validate_post_id)]
    pub post_id: String,

    /// Voting user
    #[arg(short, long, value_parser = validate_user)]
    pub user: String,

    /// Cast a downvote instead of an upvote
    #[arg(short, long)]
    pub down: bool,
}

/// Arguments for the `feed` command
///
/// Unset values fall back to the `feed` section of the configuration.
#[derive(Parser, Debug, Clone)]
pub struct FeedArgs {
    /// Maximum number of posts to display
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Hide posts older than this many hours
    #[arg(long)]
    pub max_age_hours: Option<u32>,

    /// Hide posts ranked below this value
    #[arg(long, allow_negative_numbers = true, value_parser = validate_min_rank)]
    pub min_rank: Option<f64>,

    /// Show this user's votes alongside each post
    #[arg(short, long, value_parser = validate_user)]
    pub user: Option<String>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Post ID to display
    #[arg(value_parser = validate_post_id)]
    pub post_id: String,

    /// Show this user's votes alongside the post and its comments
    #[arg(short, long, value_parser = validate_user)]
    pub user: Option<String>,
}

/// Arguments for the `karma` command
#[derive(Parser, Debug, Clone)]
pub struct KarmaArgs {
    /// User whose karma to show
    #[arg(value_parser = validate_user)]
    pub user: String,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}
