//! # Roster Core
//!
//! Core types and traits for the Roster account directory.
//!
//! This crate provides the abstractions the server is built on:
//! - The unified error type
//! - The [`Account`] model and form validation
//! - The [`AccountStore`] trait with an in-memory implementation
//! - The [`ImageUploader`] seam for profile pictures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod store;
pub mod upload;

pub use account::{Account, AccountForm, NewAccount, DEFAULT_PROFILE_PIC};
pub use error::{Error, Result};
pub use store::{AccountStore, InMemoryStore};
pub use upload::{DisabledUploader, ImageUploader, UploadedFile};
