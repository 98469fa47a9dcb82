//! # Remote Record API
//!
//! This module contains everything that talks to the record API over HTTP.
//!
//! * **[`RecordsClient`]:** Executes list queries against the `items` endpoint and reads
//!   the response envelope, whatever shape it comes in.
//! * **[`ClientFactory`]:** Hands out one shared client per (token, environment, log level)
//!   tuple, so a grid firing a request on every keystroke does not rebuild its HTTP client
//!   and connection pool each time.
pub mod client;
pub mod factory;
mod types;

pub use client::RecordsClient;
pub use factory::ClientFactory;
pub use types::*;
