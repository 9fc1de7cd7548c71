//! Business rules on top of the repositories.
//!
//! Services validate input, check existence and uniqueness, and wrap
//! multi-statement writes in a transaction. They return
//! [`crate::error::Result`] so callers can map failures to stable codes.

pub mod activity;
pub mod label;
pub mod project;
pub mod reference;
pub mod team;
pub mod todo;

use crate::error::{Error, Result};
use crate::validate::{validate_actor, validate_description};

/// Reject an empty actor with [`Error::MissingActor`], then validate its form.
pub fn require_actor(actor: &str) -> Result<()> {
    if actor.trim().is_empty() {
        return Err(Error::MissingActor);
    }
    validate_actor(actor)
}

fn check_description(description: Option<&str>) -> Result<()> {
    description.map_or(Ok(()), validate_description)
}

/// Resolve a patched nullable field against its current value.
fn patched<T: Clone>(current: Option<&T>, patch: Option<&Option<T>>) -> Option<T> {
    match patch {
        Some(value) => value.clone(),
        None => current.cloned(),
    }
}
