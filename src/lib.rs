//! Deterministic reshaping engine for tabular data.
//!
//! A session accumulates column renames, value-change rules and per-column
//! target types (interactively or from a declarative mapping table), then a
//! single pipeline run applies them in a fixed order: substitute values, cast
//! the declared columns, rename, and check every column for type drift. The
//! run always yields a result table together with a conversion log and the
//! errors and warnings it could not resolve on its own.

pub mod cast;
pub mod coerce;
pub mod consistency;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod pipeline;
pub mod profile;
pub mod rules;
pub mod substitute;
pub mod table;
