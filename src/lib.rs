//! Rust’s turnkey client pool for identity-provider-backed APIs—credential-aware caching,
//! single-flight construction, and token-bound TTLs in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod facade;
pub mod key;
pub mod obs;
pub mod pool;
pub mod testutil;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use crate::{
	error::{Error, Result},
	facade::RequestFacade,
	pool::{ClientFactory, ClientPool},
};
