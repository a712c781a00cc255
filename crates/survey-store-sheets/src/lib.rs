//! Google Sheets backend for the survey response store.
//!
//! Talks to the Sheets v4 `values` API over [`reqwest`], authenticating as a
//! service account with the OAuth 2.0 JWT-bearer grant. Every read fetches
//! the whole sheet and runs it through [`survey_core::table::Table`], so a
//! sheet that has been edited by hand never breaks the survey.

mod auth;
mod store;

pub mod error;

pub use auth::ServiceAccountKey;
pub use error::{Error, Result};
pub use store::{SheetsConfig, SheetsStore};
