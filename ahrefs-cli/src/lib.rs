//! Ahrefs API CLI Library
//!
//! This library provides the core functionality for the `ahrefs` command
//! line tool.
//!
//! # Public API
//!
//! The primary public API is the [`client::AhrefsClient`] which executes
//! requests against the Ahrefs API v3 with retries and response metadata.
//! Invocation settings are resolved with [`config::Settings::builder`].
//!
//! ```no_run
//! use ahrefs_cli::client::{AhrefsClient, ClientConfig, Params};
//! use ahrefs_core::models::DomainRatingResponse;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AhrefsClient::new(ClientConfig::new("my-api-key"))?;
//! let params = Params::new().set("target", "ahrefs.com").set("mode", "domain");
//! let response = client.get("/site-explorer/domain-rating", params).await?;
//!
//! let rating: DomainRatingResponse = response.json()?;
//! println!("DR {}", rating.domain_rating.domain_rating);
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// HTTP client for the Ahrefs API.
pub mod client;

/// Stored API key and invocation settings.
pub mod config;

/// Classified API and request errors.
pub mod error;

/// Output rendering.
pub mod format;

// Mock API server shared by unit and integration tests
#[doc(hidden)]
pub mod test_utils;
