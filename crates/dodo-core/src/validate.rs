//! Input validation shared by every service.

use crate::error::{Error, Result};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_LABEL_LEN: usize = 50;
pub const MAX_ACTOR_LEN: usize = 64;
pub const MAX_URL_LEN: usize = 2048;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

fn validate_text(field: &'static str, s: &str, max_len: usize) -> Result<()> {
    if s.trim() != s {
        return Err(Error::validation(
            field,
            s,
            "must not start or end with whitespace",
        ));
    }
    if s.is_empty() {
        return Err(Error::validation(field, s, "must not be empty"));
    }
    if s.chars().count() > max_len {
        return Err(Error::validation(
            field,
            s,
            format!("must be <= {max_len} characters"),
        ));
    }
    if s.chars().any(char::is_control) {
        return Err(Error::validation(
            field,
            s,
            "must not contain control characters",
        ));
    }
    Ok(())
}

pub fn validate_title(s: &str) -> Result<()> {
    validate_text("title", s, MAX_TITLE_LEN)
}

pub fn validate_name(s: &str) -> Result<()> {
    validate_text("name", s, MAX_NAME_LEN)
}

pub fn validate_label_name(s: &str) -> Result<()> {
    validate_text("label", s, MAX_LABEL_LEN)
}

/// Descriptions are free-form but bounded.
pub fn validate_description(s: &str) -> Result<()> {
    if s.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::validation(
            "description",
            s.chars().take(32).collect::<String>(),
            format!("must be <= {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

/// Actors, members, managers and assignees share one identifier format.
pub fn validate_actor(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation("actor", s, "must not be empty"));
    }
    if s.chars().count() > MAX_ACTOR_LEN {
        return Err(Error::validation(
            "actor",
            s,
            format!("must be <= {MAX_ACTOR_LEN} characters"),
        ));
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::validation(
            "actor",
            s,
            "must not contain whitespace or control characters",
        ));
    }
    Ok(())
}

/// Accepts `#rrggbb` in any case and returns the lowercase form.
pub fn normalize_color(s: &str) -> Result<String> {
    let valid = s.len() == 7
        && s.starts_with('#')
        && s.chars().skip(1).all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(s.to_ascii_lowercase())
    } else {
        Err(Error::validation(
            "color",
            s,
            "must be '#' followed by 6 hex digits",
        ))
    }
}

pub fn validate_url(s: &str) -> Result<()> {
    if s.chars().count() > MAX_URL_LEN {
        return Err(Error::validation(
            "url",
            s,
            format!("must be <= {MAX_URL_LEN} characters"),
        ));
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::validation(
            "url",
            s,
            "must not contain whitespace",
        ));
    }
    let Some(rest) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return Err(Error::validation(
            "url",
            s,
            "must start with http:// or https://",
        ));
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(Error::validation("url", s, "must include a host"));
    }
    Ok(())
}

/// Trim, validate, sort and dedupe a list of identifiers.
pub fn normalize_actors(values: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        validate_actor(value)?;
        out.push(value.to_string());
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Sort and dedupe a list of ids.
#[must_use]
pub fn normalize_ids(values: &[i64]) -> Vec<i64> {
    let mut out = values.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}
