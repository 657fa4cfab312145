//! Route handlers grouped by resource.

pub mod admin;
pub mod auth;
pub mod books;
pub mod combos;
pub mod health;
pub mod orders;
pub mod reviews;
pub mod users;

use axum::Json;
use axum::extract::{Path, Query};
use axum_extra::extract::WithRejection;

use crate::error::AppError;

/// JSON body whose parse failures render as our 400 error body.
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

/// Numeric `{id}` path segment.
pub type IdPath = WithRejection<Path<u64>, AppError>;

pub type QueryParams<T> = WithRejection<Query<T>, AppError>;

