//! Engine data structures: sprites and textures.
//!
//! This module contains the core data types for scene representation:
//!
//! - `sprite` is the drawable image sprite (texture + quad + transform state)
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod sprite;
pub mod texture;
