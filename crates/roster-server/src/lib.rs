//! # Roster Server
//!
//! HTTP server for the account directory: server-rendered pages for listing,
//! creating, editing and deleting accounts, with profile pictures stored on
//! Cloudinary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloudinary;
pub mod handlers;
pub mod server;
pub mod views;

pub use cloudinary::{CloudinaryConfig, CloudinaryUploader};
pub use server::{AppState, Server, ServerConfig};
pub use views::Views;
