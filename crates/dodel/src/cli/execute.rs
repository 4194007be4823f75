//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{FeedArgs, InfoArgs, InitArgs, KarmaArgs, PostArgs, ShowArgs, VoteArgs};
use crate::app::App;
use crate::commands::init::max_age_from_hours;
use crate::domain::{NewPost, Post, PostId, VoteState};
use crate::error::Error;
use crate::id_generation::validate_id;
use crate::output::{self, OutputMode, PostView};
use crate::storage::PostStore;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!("Initializing dodel repository...");
    }

    let result = init::init(&current_dir, args.allow_missing).await?;

    if !args.quiet {
        println!("Initialized dodel in {}", result.dodel_dir.display());
        println!("  Config:   {}", result.config_file.display());
        println!("  Snapshot: {}", result.snapshot_file.display());
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let stats = app.store().stats().await?;

    let info = output::RepoInfo {
        dodel_dir: app.dodel_dir(),
        snapshot: app.snapshot_path(),
        policy: app.config().voting.policy,
        stats,
    };

    output::print_info(&info, output_mode)?;
    Ok(())
}

/// Execute the post command
pub async fn execute_post(app: &App, args: &PostArgs, output_mode: OutputMode) -> Result<()> {
    let mut new_post = NewPost::new(&args.author, &args.text).with_color(&args.color);
    if let Some(parent) = &args.parent {
        new_post = new_post.reply_to(PostId::new(parent.as_str()));
    }

    let id = app
        .store()
        .submit_post(new_post)
        .await
        .map_err(|e| with_id_hint(e, &app.config().id_prefix))?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => {
            let summary = app.store().post_summary(&id).await?;
            output::print_json(&PostView::new(summary))?;
        }
        OutputMode::Text => {
            let config = output::OutputConfig::from_env();
            let noun = if args.parent.is_some() { "comment" } else { "post" };
            output::print_message(&format!(
                "{} Created {noun} {id}",
                output::success("✓", &config)
            ))?;
        }
    }

    Ok(())
}

/// Execute the vote command
pub async fn execute_vote(app: &App, args: &VoteArgs, output_mode: OutputMode) -> Result<()> {
    let post_id = PostId::new(args.post_id.as_str());
    let upvote = !args.down;

    let net_votes = app
        .store()
        .cast_vote(&args.user, &post_id, upvote)
        .await
        .map_err(|e| with_id_hint(e, &app.config().id_prefix))?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "post_id": post_id,
                "user": args.user,
                "vote_state": VoteState::from_upvote(upvote),
                "net_votes": net_votes,
            }))?;
        }
        OutputMode::Text => {
            let config = output::OutputConfig::from_env();
            let direction = if upvote { "Upvoted" } else { "Downvoted" };
            output::print_message(&format!(
                "{} {direction} {post_id} ({net_votes:+} net)",
                output::success("✓", &config)
            ))?;
        }
    }

    Ok(())
}

/// Execute the feed command
pub async fn execute_feed(app: &App, args: &FeedArgs, output_mode: OutputMode) -> Result<()> {
    let mut query = app.config().feed_query();
    if let Some(limit) = args.limit {
        query.limit = limit;
    }
    if let Some(hours) = args.max_age_hours {
        query.max_age = max_age_from_hours(i64::from(hours));
    }
    if let Some(min_rank) = args.min_rank {
        query.min_rank = min_rank;
    }

    let posts = app.store().list_feed(&query).await?;
    let views = build_views(app.store(), &posts, args.user.as_deref()).await?;

    output::print_feed(&views, output_mode)?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let post_id = PostId::new(args.post_id.as_str());
    let user = args.user.as_deref();

    let summary = app
        .store()
        .post_summary(&post_id)
        .await
        .map_err(|e| with_id_hint(e, &app.config().id_prefix))?;
    let mut view = PostView::new(summary);
    if let Some(user) = user {
        view.vote_state = Some(app.store().vote_state(&post_id, user).await?);
    }

    let comments = app.store().list_comments(&post_id).await?;
    let thread = build_views(app.store(), &comments, user).await?;

    output::print_post_details(&view, &thread, output_mode)?;
    Ok(())
}

/// Execute the karma command
pub async fn execute_karma(app: &App, args: &KarmaArgs, output_mode: OutputMode) -> Result<()> {
    let karma = app.store().karma(&args.user).await?;
    output::print_karma(&args.user, karma, output_mode)?;
    Ok(())
}

/// Point at the expected ID format when an unknown ID does not match it.
fn with_id_hint(error: Error, prefix: &str) -> anyhow::Error {
    match &error {
        Error::PostNotFound(id) if !validate_id(id.as_str(), prefix) => {
            let hint = format!("IDs in this repository look like {prefix}-a3f8 or {prefix}-a3f8.1");
            anyhow::Error::new(error).context(hint)
        }
        _ => error.into(),
    }
}

/// Pair posts with their counters and, when a viewer is named, their vote.
async fn build_views(
    store: &dyn PostStore,
    posts: &[Post],
    viewer: Option<&str>,
) -> Result<Vec<PostView>> {
    let summaries = store.summarize(posts).await?;
    let mut views = Vec::with_capacity(summaries.len());

    for summary in summaries {
        let mut view = PostView::new(summary);
        if let Some(user) = viewer {
            view.vote_state = Some(store.vote_state(&view.summary.post.id, user).await?);
        }
        views.push(view);
    }

    Ok(views)
}
