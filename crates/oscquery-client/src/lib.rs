//! OSCQuery Client
//!
//! Reads another process's OSCQuery surface over HTTP:
//!
//! ```no_run
//! use oscquery_client::OscQueryClient;
//!
//! # async fn run() -> oscquery_client::Result<()> {
//! let client = OscQueryClient::new()?;
//! let tree = client.tree("127.0.0.1:8080".parse().unwrap()).await?;
//! println!("{} nodes", tree.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::OscQueryClient;
pub use error::{ClientError, Result};
