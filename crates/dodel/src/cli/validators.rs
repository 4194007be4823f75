//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Maximum length of a user name.
pub const MAX_USER_LENGTH: usize = 64;

/// Maximum length of a post body.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Position of the first control character, ignoring those `allowed` keeps.
fn control_char_position(s: &str, allowed: impl Fn(char) -> bool) -> Option<usize> {
    s.chars().position(|c| {
        let code = c as u32;
        !allowed(c) && (code < 0x20 || (0x7F..=0x9F).contains(&code))
    })
}

/// Validate a post ID.
///
/// Expected format: `prefix-hash` with optional `.N` comment suffixes,
/// e.g. `dodel-a3f8` or `dodel-a3f8.2`. The prefix itself is checked
/// against the repository when the post is looked up.
pub fn validate_post_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Post ID cannot be empty".to_string());
    }

    let Some((prefix, rest)) = s.split_once('-') else {
        return Err(format!(
            "Invalid post ID format: '{s}'. Expected format: prefix-hash (e.g., dodel-a3f8)"
        ));
    };

    if prefix.is_empty() || rest.is_empty() {
        return Err(format!(
            "Invalid post ID format: '{s}'. Expected format: prefix-hash (e.g., dodel-a3f8)"
        ));
    }

    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
    {
        return Err(format!("Post ID '{s}' contains invalid characters"));
    }

    Ok(s.to_string())
}

/// Validate a user name (post author or voter).
pub fn validate_user(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("User cannot be empty".to_string());
    }

    if s.chars().count() > MAX_USER_LENGTH {
        return Err(format!(
            "User cannot exceed {MAX_USER_LENGTH} characters, got {}",
            s.chars().count()
        ));
    }

    if let Some(pos) = control_char_position(s, |_| false) {
        return Err(format!(
            "User contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate a post body.
///
/// Allows newlines and tabs but rejects other control characters.
pub fn validate_text(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Text cannot be empty".to_string());
    }

    if s.len() > MAX_TEXT_LENGTH {
        return Err(format!(
            "Text cannot exceed {MAX_TEXT_LENGTH} bytes, got {}",
            s.len()
        ));
    }

    if let Some(pos) = control_char_position(s, |c| matches!(c, '\t' | '\n' | '\r')) {
        return Err(format!(
            "Text contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate a display color: a color name or a `#rrggbb` value.
pub fn validate_color(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.len() > 32 {
        return Err("Color cannot exceed 32 characters".to_string());
    }

    let valid = match s.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => s.chars().all(|c| c.is_ascii_alphabetic() || c == '_' || c == ' '),
    };

    if !valid {
        return Err(format!(
            "Invalid color '{s}'. Use a color name (e.g., blue) or #rrggbb"
        ));
    }

    Ok(s.to_string())
}

/// Validate a minimum rank. NaN would make every comparison false.
pub fn validate_min_rank(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid rank '{s}'. Expected a number"))?;

    if value.is_nan() {
        return Err("Rank must be a number".to_string());
    }

    Ok(value)
}
