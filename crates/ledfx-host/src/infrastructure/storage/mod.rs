//! Storage infrastructure: layout file persistence.
//!
//! The `config` sub-module reads and writes the TOML layout file and
//! resolves it into a validated [`ledfx_core::LayoutModel`] plus the channel
//! specs needed to reach each panel.

pub mod config;
