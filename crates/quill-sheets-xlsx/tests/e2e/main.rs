//! End-to-end tests for quill-sheets-xlsx.
//!
//! Each test builds the exact container it needs in memory with
//! [`Fixture`], then reads it back through the public reader, stream and
//! writer APIs and asserts on what comes out.

mod common;
mod reading;
mod streaming;
mod writing;

pub use common::*;
