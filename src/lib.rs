//! Defect analytics pipeline: load → normalize → filter → aggregate.
//!
//! The UI binary (`src/main.rs`) owns no logic; everything it renders is
//! produced by [`state::AppState`] from the pure functions in [`data`].

pub mod config;
pub mod data;
pub mod error;
pub mod state;
