//! Google Drive backend.
//!
//! - OAuth2 installed-app flow with a persisted, auto-refreshed token
//! - Drive Activity v2 client for the activity log
//! - Drive v3 client for file metadata and permissions

pub mod activity;
pub mod auth;
pub mod client;
pub mod credentials;

pub use activity::ActivityClient;
pub use auth::{AuthConfig, AuthManager, TokenManager, Tokens, SCOPES};
pub use client::DriveClient;
pub use credentials::{
    launch_browser, parse_callback, AuthCallback, ClientSecrets, CredentialProvider, TokenStore,
};
