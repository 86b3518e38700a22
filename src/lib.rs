//! Core library for the vehicle-importer command line application.
//!
//! Vehicle records are collected in a working list and exported as a
//! multi-sheet workbook. The typed record lives in [`model`], the fixed sheet
//! layout in [`schema`], cell encodings in [`encode`] and the record → row
//! projections in [`flatten`]. IO adapters live under [`io`] and the
//! export/import orchestration in [`sync`].

pub mod draft;
pub mod encode;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod schema;
pub mod session;
pub mod sync;

pub use error::{Result, ToolError};
