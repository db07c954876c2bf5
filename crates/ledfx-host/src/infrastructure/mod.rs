//! Infrastructure layer for the LED host.
//!
//! OS-facing adapters: UDP device channels and the TOML layout file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `ledfx_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
