//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success:   green   (positive net votes, upvotes, completed actions)
//!   - Error:     red     (negative net votes, downvotes)
//!   - Info:      cyan    (post IDs)
//!   - Muted:     dimmed  (field labels, ages)
//!   - Emphasis:  bold    (section headers)
//!   - Authors are shown in the color they chose for the post, when it is
//!     a color name the terminal knows.

use crate::domain::VoteState;
use colored::{Color, Colorize};

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Colorize a post ID (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

/// Signed vote count, green when positive and red when negative.
pub(crate) fn colorize_votes(net_votes: i64, config: &OutputConfig) -> String {
    let text = format!("{net_votes:+}");
    if !config.use_colors {
        return text;
    }
    match net_votes.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text,
    }
}

/// Short marker for a user's standing vote, empty when there is none.
pub(crate) fn vote_marker(state: VoteState, config: &OutputConfig) -> String {
    match state {
        VoteState::None => String::new(),
        VoteState::Upvoted => success("[upvoted]", config),
        VoteState::Downvoted => error("[downvoted]", config),
    }
}

/// Author name in the post's color. Unknown color names fall back to plain.
pub(crate) fn colorize_author(author: &str, color: &str, config: &OutputConfig) -> String {
    if !config.use_colors || color.is_empty() {
        return author.to_string();
    }
    match color.parse::<Color>() {
        Ok(color) => author.color(color).to_string(),
        Err(()) => author.to_string(),
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
