//! Common utilities for the container-query engine.
//!
//! This crate provides shared infrastructure used by every other crate:
//! - **Warning System** - colored, de-duplicated terminal output
//! - **Networking** - blocking fetch of stylesheet text (`http(s)` and `data:` URLs)
//! - **URL resolution** - resolving stylesheet-relative references

pub mod net;
pub mod url;
pub mod warning;
