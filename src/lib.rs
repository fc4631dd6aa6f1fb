//! Query the CMS Data Bookkeeping Service (DBS) for datasets and files.
//!
//! This crate implements a `betterDAS`-style flow: compose command-line
//! filters into DBS reader lookups, then sort and print the matching
//! dataset paths or logical file names.
//!
//! ## Quick start
//! - Configure a grid proxy via `X509_USER_PROXY` (create one with
//!   `voms-proxy-init -voms cms`) or a `.dbsqueryrc` file (supported in the
//!   current directory and in your home directory).
//! - Build a [`FilterSpec`] and call [`list_datasets`] or [`list_files`].
//!
//! ```no_run
//! use anyhow::Result;
//! use dbsquery::{DbsClient, FilterSpec, Instance, list_datasets};
//!
//! fn main() -> Result<()> {
//!     let client = DbsClient::from_env(Instance::Global)?;
//!     let filters = FilterSpec {
//!         primary_datasets: vec!["ZeroBias".to_string()],
//!         data_tiers: vec!["RAW".to_string()],
//!         ..Default::default()
//!     };
//!     for dataset in list_datasets(&client, &filters)? {
//!         println!("{}", dataset);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod query;
mod records;

pub use client::{ClientConfig, DbsClient, Instance};
pub use query::{Catalog, DatasetQuery, FilterSpec, SortOrder, list_datasets, list_files};
pub use records::{DatasetRecord, FileRecord};
