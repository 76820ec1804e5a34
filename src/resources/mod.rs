/**
 * This module contains all logic for loading image files from external
 * sources. Natively assets are read from `./assets/`; on the web they are
 * fetched relative to the site origin.
 */
pub mod texture;

pub use texture::{load_binary, load_texture};
