//! Domain entities for LedFx.
//!
//! This module contains pure data and rules with no infrastructure
//! dependencies: no sockets, no clocks, no files.
//!
//! - [`geometry`] describes where each physical panel sits in window space and
//!   how window coordinates resolve to panel cells.
//! - [`color`] holds the per-panel color buffer and the canonical row-major
//!   flattening that both wire encoders consume.

/// Panel placement and window-to-cell coordinate mapping.
///
/// See [`geometry::LayoutModel`] for the main type.
pub mod geometry;

/// RGB pixels and per-panel color buffers.
pub mod color;
