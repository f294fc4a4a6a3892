//! fpl-auth: sign-in handshake and authenticated client for the Fantasy
//! Premier League API.
//!
//! The account provider has no password grant. Signing in means replaying
//! what a browser does: a PKCE authorization request, a scraped login page,
//! a three-step login policy, a redirect carrying the authorization code,
//! and finally the code exchange. [`auth::Handshake`] runs that chain;
//! [`client::FplClient`] carries the resulting bearer token.
//!
//! # Quick Start
//!
//! ```no_run
//! use fpl_auth::prelude::*;
//!
//! # async fn example() -> fpl_auth::error::Result<()> {
//! let config = FplConfig::from_env()?;
//! let client = fpl_auth::client::login(&config).await?;
//! let team = client.my_team(5_252_797).await?;
//! println!("{team}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod util;
