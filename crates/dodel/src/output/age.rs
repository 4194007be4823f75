//! Human-readable post ages.

use chrono::{DateTime, Utc};

/// Describe how long ago `created_at` was, relative to `now`.
///
/// Ages under five seconds (or in the future) read "just now". Beyond that
/// the largest whole unit is used, up to hours: "12 seconds ago",
/// "a minute ago", "5 minutes ago", "an hour ago", "30 hours ago".
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use dodel::output::humanize_age;
///
/// let now = Utc::now();
/// assert_eq!(humanize_age(now - Duration::minutes(5), now), "5 minutes ago");
/// assert_eq!(humanize_age(now, now), "just now");
/// ```
pub fn humanize_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now - created_at;
    let hours = age.num_hours();
    let minutes = age.num_minutes();
    let seconds = age.num_seconds();

    if hours >= 2 {
        format!("{hours} hours ago")
    } else if hours == 1 {
        "an hour ago".to_string()
    } else if minutes >= 2 {
        format!("{minutes} minutes ago")
    } else if minutes == 1 {
        "a minute ago".to_string()
    } else if seconds >= 5 {
        format!("{seconds} seconds ago")
    } else {
        "just now".to_string()
    }
}
