//! Public facade crate for `webgaze`.
//!
//! No IO or browser logic lives here; everything backend-agnostic
//! (types, errors, traits) comes re-exported from `webgaze-core`.

pub use webgaze_core::*;
