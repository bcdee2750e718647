//! `webgaze-mcp` crate (library surface).
//!
//! End users run the `webgaze` binary (CLI + MCP stdio server). The library
//! target exists so embedders can reach the core types without depending on
//! the workspace's internal crate layout.

pub use webgaze_core as core;
