// Copyright 2023 Remi Bernotavicius

use crate::accounts::Permission;
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` if nothing was recorded, otherwise a validation error carrying every message.
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The record does not exist, or the requester isn't allowed to know that it does.
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("permission {0:?} required")]
    PermissionDenied(Permission),

    #[error(transparent)]
    Database(diesel::result::Error),

    #[error(transparent)]
    Connection(#[from] diesel::ConnectionError),

    #[error("migration failed: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("bad configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound("record".into()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Error::Integrity(info.message().to_owned())
            }
            err => Error::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn field_errors_display() {
    let mut errors = FieldErrors::new();
    errors.add("title", "This field is required.");
    errors.add("ingredient_form-0-quantity", "This field is required.");
    assert_eq!(
        errors.to_string(),
        "ingredient_form-0-quantity: This field is required.; title: This field is required."
    );
    assert_eq!(errors.get("title"), ["This field is required."]);
    assert!(errors.get("directions").is_empty());
    assert!(matches!(errors.into_result(()), Err(Error::Validation(_))));
}
