//! Snapshot persistence for in-memory stores.
//!
//! This module loads and saves the whole store as one JSON document. Loading
//! is resilient: records that cannot be restored are skipped and reported as
//! [`LoadWarning`]s instead of failing the load.

use super::inner::StoreInner;
use crate::domain::snapshot::SnapshotDocument;
use crate::error::{PersistenceError, Result};
use crate::storage::{PostStore, StoreOptions};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Non-fatal problems found while restoring a snapshot.
///
/// Each warning names the record's position in its array (0-based) so the
/// offending entry can be found in the file.
///
/// **Example:**
/// ```no_run
/// # use dodel::storage::{StoreOptions, in_memory::{load_from_snapshot, LoadWarning}};
/// # use std::path::Path;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let (_store, warnings) =
///     load_from_snapshot(Path::new(".dodel/snapshot.json"), &StoreOptions::default()).await?;
///
/// for warning in warnings {
///     if let LoadWarning::OrphanedVote { index, post_id } = &warning {
///         eprintln!("vote {index} targets unknown post {post_id}");
///     } else {
///         eprintln!("{warning}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Post record with a blank id, author or text, or a bad timestamp.
    ///
    /// **Effect**: the post is skipped.
    InvalidPost {
        /// Position in `posts`
        index: usize,
        /// The record's id, possibly empty
        id: String,
        /// What was wrong
        error: String,
    },

    /// A post id appears more than once.
    ///
    /// **Effect**: the first occurrence wins, later ones are skipped.
    DuplicatePost {
        /// Position in `posts`
        index: usize,
        /// The repeated id
        id: String,
    },

    /// A comment whose parent was not restored before it.
    ///
    /// **Effect**: the comment is skipped.
    OrphanedComment {
        /// Position in `posts`
        index: usize,
        /// The comment's id
        id: String,
        /// The missing parent id
        parent: String,
    },

    /// Vote record with a blank voter or a bad timestamp.
    ///
    /// **Effect**: the vote is skipped.
    InvalidVote {
        /// Position in `votes`
        index: usize,
        /// What was wrong
        error: String,
    },

    /// A vote on a post that was not restored.
    ///
    /// **Effect**: the vote is skipped.
    OrphanedVote {
        /// Position in `votes`
        index: usize,
        /// The unknown post id
        post_id: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::InvalidPost { index, id, error } => {
                write!(f, "skipped post #{index} ({id:?}): {error}")
            }
            LoadWarning::DuplicatePost { index, id } => {
                write!(f, "skipped post #{index}: duplicate id {id}")
            }
            LoadWarning::OrphanedComment { index, id, parent } => {
                write!(f, "skipped comment #{index} ({id}): unknown parent {parent}")
            }
            LoadWarning::InvalidVote { index, error } => {
                write!(f, "skipped vote #{index}: {error}")
            }
            LoadWarning::OrphanedVote { index, post_id } => {
                write!(f, "skipped vote #{index}: unknown post {post_id}")
            }
        }
    }
}

/// Fill an empty store from a snapshot document.
///
/// Posts are restored in document order, so a comment is only accepted if
/// its parent appeared earlier. Votes are restored after all posts.
pub(super) fn restore(
    inner: &mut StoreInner,
    document: SnapshotDocument,
) -> Vec<LoadWarning> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in document.posts.into_iter().enumerate() {
        let post = match record.to_post() {
            Ok(post) => post,
            Err(error) => {
                warnings.push(LoadWarning::InvalidPost {
                    index,
                    id: record.id,
                    error,
                });
                continue;
            }
        };

        if !seen.insert(post.id.clone()) {
            warnings.push(LoadWarning::DuplicatePost {
                index,
                id: post.id.to_string(),
            });
            continue;
        }

        if let Some(parent) = &post.parent
            && !inner.contains(parent)
        {
            warnings.push(LoadWarning::OrphanedComment {
                index,
                id: post.id.to_string(),
                parent: parent.to_string(),
            });
            continue;
        }

        inner.insert_post(post);
    }

    for (index, record) in document.votes.into_iter().enumerate() {
        let vote = match record.to_vote() {
            Ok(vote) => vote,
            Err(error) => {
                warnings.push(LoadWarning::InvalidVote { index, error });
                continue;
            }
        };

        if !inner.contains(&vote.post_id) {
            warnings.push(LoadWarning::OrphanedVote {
                index,
                post_id: vote.post_id.to_string(),
            });
            continue;
        }

        inner.insert_vote(vote);
    }

    inner.update_id_generator_if_needed();

    warnings
}

/// Load a store from a snapshot file.
///
/// A missing file yields an empty store when `options.allow_missing` is set
/// and [`PersistenceError::Missing`] otherwise.
///
/// # Returns
///
/// The store plus every record-level problem that was skipped.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the file is missing (and not allowed to
/// be), unreadable, or not a snapshot document.
pub async fn load_from_snapshot(
    path: &Path,
    options: &StoreOptions,
) -> Result<(Box<dyn PostStore>, Vec<LoadWarning>)> {
    let document = read_document(path, options.allow_missing).await?;
    let mut inner = StoreInner::new(options.prefix.clone(), options.policy);
    let warnings = restore(&mut inner, document);

    info!(
        path = %path.display(),
        posts = inner.posts.len(),
        votes = inner.votes.len(),
        skipped = warnings.len(),
        "Loaded snapshot"
    );

    Ok((Box::new(Arc::new(RwLock::new(inner))), warnings))
}

/// Read a snapshot document, applying the missing-file policy.
pub(crate) async fn read_document(path: &Path, allow_missing: bool) -> Result<SnapshotDocument> {
    let document = dodel_snapshot::read_json_if_exists::<SnapshotDocument, _>(path)
        .await
        .map_err(|e| PersistenceError::reading(path, e))?;

    match document {
        Some(document) => Ok(document),
        None if allow_missing => {
            info!(path = %path.display(), "No snapshot found, starting empty");
            Ok(SnapshotDocument::default())
        }
        None => Err(PersistenceError::Missing(path.to_path_buf()).into()),
    }
}

/// Save a store to a snapshot file with an atomic write.
///
/// State is captured through [`PostStore::export_snapshot`], so the store's
/// lock is released before any disk I/O starts.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the document cannot be encoded or written.
pub async fn save_to_snapshot(store: &dyn PostStore, path: &Path) -> Result<()> {
    let document = store.export_snapshot().await?;

    dodel_snapshot::write_json_atomic(path, &document)
        .await
        .map_err(|e| PersistenceError::writing(path, e))?;

    info!(
        path = %path.display(),
        posts = document.posts.len(),
        votes = document.votes.len(),
        "Saved snapshot"
    );
    Ok(())
}

/// Log every warning from a load or reload.
pub(crate) fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        warn!(%warning, "Snapshot record skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{SnapshotPost, SnapshotVote};
    use crate::domain::{PostId, VotePolicy};

    fn record(id: &str, parent: &str, author: &str) -> SnapshotPost {
        SnapshotPost {
            id: id.to_string(),
            parent: parent.to_string(),
            author: author.to_string(),
            text: "text".to_string(),
            color: String::new(),
            created_at: 1_700_000_000,
            net_votes: 99,
            comment_count: 99,
        }
    }

    fn vote(post: &str, user: &str) -> SnapshotVote {
        SnapshotVote {
            author: user.to_string(),
            post_id: post.to_string(),
            upvote: true,
            cast_at: 1_700_000_100,
        }
    }

    fn empty() -> StoreInner {
        StoreInner::new("dodel".to_string(), VotePolicy::Overwrite)
    }

    #[test]
    fn restore_ignores_saved_counters() {
        let mut inner = empty();
        let warnings = restore(
            &mut inner,
            SnapshotDocument {
                posts: vec![record("p", "", "alice")],
                votes: vec![vote("p", "bob")],
            },
        );

        assert!(warnings.is_empty());
        assert_eq!(inner.net_votes(&PostId::new("p")), 1);
        assert_eq!(inner.comment_count(&PostId::new("p")), 0);
    }

    #[test]
    fn restore_skips_bad_records() {
        let mut inner = empty();
        let warnings = restore(
            &mut inner,
            SnapshotDocument {
                posts: vec![
                    record("p", "", "alice"),
                    record("p", "", "mallory"),
                    record("q", "", "  "),
                    record("c", "missing", "bob"),
                ],
                votes: vec![vote("p", "bob"), vote("gone", "bob"), vote("p", "")],
            },
        );

        assert_eq!(inner.posts.len(), 1);
        assert_eq!(inner.votes.len(), 1);
        assert_eq!(
            warnings,
            vec![
                LoadWarning::DuplicatePost {
                    index: 1,
                    id: "p".to_string()
                },
                LoadWarning::InvalidPost {
                    index: 2,
                    id: "q".to_string(),
                    error: "author is empty".to_string()
                },
                LoadWarning::OrphanedComment {
                    index: 3,
                    id: "c".to_string(),
                    parent: "missing".to_string()
                },
                LoadWarning::OrphanedVote {
                    index: 1,
                    post_id: "gone".to_string()
                },
                LoadWarning::InvalidVote {
                    index: 2,
                    error: "voter is empty".to_string()
                },
            ]
        );
    }

    #[test]
    fn restored_ids_are_not_reissued() {
        let mut inner = empty();
        restore(
            &mut inner,
            SnapshotDocument {
                posts: vec![record("dodel-abcd", "", "alice"), record("dodel-abcd.1", "dodel-abcd", "bob")],
                votes: vec![],
            },
        );

        let next = inner
            .generate_id(
                &crate::domain::NewPost::new("carol", "hi").reply_to(PostId::new("dodel-abcd")),
            )
            .unwrap();
        assert_eq!(next, PostId::new("dodel-abcd.2"));
    }

    #[test]
    fn warnings_render_readably() {
        let warning = LoadWarning::OrphanedVote {
            index: 4,
            post_id: "dodel-zz".to_string(),
        };
        assert_eq!(warning.to_string(), "skipped vote #4: unknown post dodel-zz");
    }
}
