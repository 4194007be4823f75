//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers
//! - `age`: "5 minutes ago" style ages

mod age;
pub mod color;

use crate::domain::{Post, PostSummary, StoreStats, VotePolicy, VoteState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::path::Path;

pub use age::humanize_age;
pub use color::success;

use color::{bold, colorize_author, colorize_id, colorize_votes, dimmed, vote_marker};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_colors: bool) -> Self {
        Self {
            max_width,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `DODEL_MAX_WIDTH`: Maximum content width (default: 100)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `DODEL_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        let max_width = match env::var("DODEL_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "DODEL_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        // Respect NO_COLOR (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("DODEL_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| w.0)
        .into()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// View Types
// ============================================================================

/// A post as shown to one viewer: counters plus the viewer's standing vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    /// The post and its counters
    #[serde(flatten)]
    pub summary: PostSummary,

    /// The viewer's standing vote, when a viewer was named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_state: Option<VoteState>,
}

impl PostView {
    /// View without a viewer
    pub fn new(summary: PostSummary) -> Self {
        Self {
            summary,
            vote_state: None,
        }
    }

    fn post(&self) -> &Post {
        &self.summary.post
    }
}

/// Repository overview for the `info` command
#[derive(Debug, Clone, Serialize)]
pub struct RepoInfo<'a> {
    /// The `.dodel` directory
    pub dodel_dir: &'a Path,
    /// Snapshot file backing the store
    pub snapshot: &'a Path,
    /// Repeat-vote handling
    pub policy: VotePolicy,
    /// Store counts
    pub stats: StoreStats,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print the ranked feed
pub fn print_feed(views: &[PostView], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            print_feed_text(&mut handle, views, Utc::now(), &config)
        }
        OutputMode::Json => write_json(&mut handle, &views),
    }
}

/// Print one post with its comment thread (for the show command)
pub fn print_post_details(
    view: &PostView,
    comments: &[PostView],
    mode: OutputMode,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            print_post_details_text(&mut handle, view, comments, Utc::now(), &config)
        }
        OutputMode::Json => {
            #[derive(Serialize)]
            struct Details<'a> {
                #[serde(flatten)]
                post: &'a PostView,
                thread: &'a [PostView],
            }
            write_json(
                &mut handle,
                &Details {
                    post: view,
                    thread: comments,
                },
            )
        }
    }
}

/// Print a user's karma
pub fn print_karma(user: &str, karma: i64, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            writeln!(
                handle,
                "{} has {} karma",
                bold(user, &config),
                colorize_votes(karma, &config)
            )
        }
        OutputMode::Json => write_json(
            &mut handle,
            &serde_json::json!({ "user": user, "karma": karma }),
        ),
    }
}

/// Print the repository overview
pub fn print_info(info: &RepoInfo<'_>, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match mode {
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            print_info_text(&mut handle, info, &config)
        }
        OutputMode::Json => write_json(&mut handle, info),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

/// One-line byline: author, age, comment count and the viewer's vote.
fn byline(view: &PostView, now: DateTime<Utc>, config: &OutputConfig) -> String {
    let post = view.post();
    let comments = match view.summary.comment_count {
        1 => "1 comment".to_string(),
        n => format!("{n} comments"),
    };

    let mut line = format!(
        "{} {} {}",
        colorize_author(&post.author, &post.color, config),
        dimmed(&humanize_age(post.created_at, now), config),
        dimmed(&format!("· {comments}"), config),
    );

    if let Some(state) = view.vote_state {
        let marker = vote_marker(state, config);
        if !marker.is_empty() {
            line.push(' ');
            line.push_str(&marker);
        }
    }
    line
}

fn print_feed_text<W: Write>(
    w: &mut W,
    views: &[PostView],
    now: DateTime<Utc>,
    config: &OutputConfig,
) -> io::Result<()> {
    if views.is_empty() {
        writeln!(w, "No posts in the feed.")?;
        return Ok(());
    }

    let width = get_terminal_width().min(config.max_width);

    for (position, view) in views.iter().enumerate() {
        let post = view.post();
        writeln!(
            w,
            "{:>3}. {:>4}  {}",
            position + 1,
            colorize_votes(view.summary.net_votes, config),
            colorize_id(post.id.as_str(), config),
        )?;
        for line in wrap_text(&post.text, width.saturating_sub(11)) {
            writeln!(w, "           {line}")?;
        }
        writeln!(w, "           {}", byline(view, now, config))?;
    }

    Ok(())
}

fn print_post_details_text<W: Write>(
    w: &mut W,
    view: &PostView,
    comments: &[PostView],
    now: DateTime<Utc>,
    config: &OutputConfig,
) -> io::Result<()> {
    let width = get_terminal_width().min(config.max_width);
    let post = view.post();

    writeln!(
        w,
        "{} {}",
        colorize_id(post.id.as_str(), config),
        colorize_votes(view.summary.net_votes, config)
    )?;
    if let Some(parent) = &post.parent {
        writeln!(
            w,
            "{} {}",
            dimmed("In reply to:", config),
            colorize_id(parent.as_str(), config)
        )?;
    }
    writeln!(w, "{}", byline(view, now, config))?;
    writeln!(
        w,
        "{} {}",
        dimmed("Created:", config),
        post.created_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(w)?;
    for line in wrap_text(&post.text, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }

    if comments.is_empty() {
        return Ok(());
    }

    writeln!(w)?;
    writeln!(w, "{} ({}):", bold("Comments", config), comments.len())?;
    for comment in comments {
        writeln!(w)?;
        writeln!(
            w,
            "  {} {}  {}",
            colorize_votes(comment.summary.net_votes, config),
            colorize_id(comment.post().id.as_str(), config),
            byline(comment, now, config)
        )?;
        for line in wrap_text(&comment.post().text, width.saturating_sub(4)) {
            writeln!(w, "    {line}")?;
        }
    }

    Ok(())
}

fn print_info_text<W: Write>(
    w: &mut W,
    info: &RepoInfo<'_>,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        dimmed("Repository:", config),
        info.dodel_dir.display()
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Snapshot:", config),
        info.snapshot.display()
    )?;
    writeln!(w, "{} {}", dimmed("Vote policy:", config), info.policy)?;
    writeln!(w)?;
    writeln!(
        w,
        "{} {} ({} top-level, {} comments)",
        dimmed("Posts:", config),
        info.stats.posts,
        info.stats.top_level,
        info.stats.comments
    )?;
    writeln!(w, "{} {}", dimmed("Votes:", config), info.stats.votes)?;
    writeln!(w, "{} {}", dimmed("Authors:", config), info.stats.authors)?;
    Ok(())
}

/// Wrap text to fit within a given width, preserving existing line breaks.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width.max(1))
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}
