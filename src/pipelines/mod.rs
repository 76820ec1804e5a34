/**
 * Render pipeline definitions. There is exactly one: the textured-quad
 * sprite pipeline.
 */
pub mod sprite;
