//! quad-ngin
//!
//! A lightweight, cross-platform sprite renderer focused on native and WASM
//! compatibility. This crate exposes a small surface for loading image files
//! as GPU textures and drawing them as flat textured quads in a 3D scene,
//! with per-sprite translation, z-rotation, uniform scaling and colour tint.
//!
//! High-level modules
//! - `camera`: camera types and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/config
//! - `data_structures`: engine data models (sprites, textures)
//! - `flow`: high level flow control (scenes / update loops)
//! - `pipelines`: definition of the textured-quad render pipeline
//! - `resources`: helpers to load image files and create GPU textures
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::WindowEvent;
pub use wgpu::*;
