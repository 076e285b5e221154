//! # fetchguard
//!
//! SSRF-safe HTTP fetching for server-side "fetch this URL for me" features.
//!
//! `fetchguard` validates URLs before any socket is opened to them, follows
//! redirects manually so every hop is re-validated (defeating DNS rebinding
//! between validation and use), bounds redirect chains and per-hop latency,
//! and caps how much response body is ever read into memory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fetchguard::{fetch, read_text, FetchConfig};
//!
//! # async fn example() -> Result<(), fetchguard::Error> {
//! let response = fetch("https://example.com/listing", &FetchConfig::default()).await?;
//! let text = read_text(response).await?;
//! println!("fetched {} chars", text.len());
//! # Ok(())
//! # }
//! ```
//!
//! Validation alone, without fetching:
//!
//! ```rust,no_run
//! use fetchguard::{validate, Policy};
//!
//! # async fn example() -> Result<(), fetchguard::Error> {
//! let checked = validate("https://example.com/api", Policy::PublicOnly).await?;
//! println!("safe to connect to {} ({})", checked.host, checked.ip);
//! # Ok(())
//! # }
//! ```
//!
//! There is deliberately no cache of validated hosts: a hostname that was
//! safe a moment ago can re-resolve to a private address. Every call, and
//! every redirect hop within a call, checks again.

mod blocklist;
mod body;
mod error;
mod fetch;
mod policy;
mod resolver;
mod safe_url;
mod validate;

pub use blocklist::is_private_ip;
pub use body::{read_text, read_text_safe, DEFAULT_MAX_BODY_BYTES};
pub use error::Error;
pub use fetch::{fetch, fetch_sync, fetch_with, FetchConfig};
pub use policy::Policy;
pub use resolver::{Resolve, StaticResolver, SystemResolver};
pub use safe_url::{HostKind, SafeUrl};
pub use validate::{validate, validate_sync, validate_with, Validated};
