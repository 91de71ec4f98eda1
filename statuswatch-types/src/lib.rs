//! # statuswatch-types
//!
//! Core types for status page monitoring. This crate defines the normalized
//! model every vendor adapter maps into: a six-value status scale, the
//! components a page reports on, and the result of one fetch attempt.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable `serde` as needed
//! - **Vendor agnostic**: Statuspage, Instatus, cloud health feeds, RSS feeds or custom pages
//! - **Ergonomic builders**: Fluent API for constructing results
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/YAML/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use statuswatch_types::{NormalizedStatus, ProviderResult};
//!
//! let result = ProviderResult::builder("statuspage", "github")
//!     .component("API Requests", |c| c.status(NormalizedStatus::Operational))
//!     .component("Webhooks", |c| {
//!         c.group("Core").status(NormalizedStatus::Degraded)
//!     })
//!     .open_incidents(1)
//!     .build();
//!
//! assert_eq!(result.components.len(), 2);
//! assert_eq!(result.open_incidents, Some(1));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod component;
mod page;
mod result;
mod status;

pub use component::*;
pub use page::*;
pub use result::*;
pub use status::*;
