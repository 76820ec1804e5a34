//! The drawable image sprite.
//!
//! A [`Sprite`] owns one GPU texture and a precompiled four-vertex quad.
//! Position, rotation, scale and tint are plain public fields mutated by
//! direct assignment; every draw rebuilds the model matrix from them, so
//! there is no transform state left behind between frames.

use cgmath::{Deg, Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    context::{Context, InitContext},
    data_structures::texture::Texture,
    pipelines,
    resources,
};

/// Degrees subtracted from `rotation` on each draw that spins.
const SPIN_STEP: f32 = 0.1;

/// One corner of the textured quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl SpriteVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

// A unit quad around the origin. Texture rows run top to bottom, so the v
// coordinate is flipped relative to the vertex y axis.
pub const QUAD_VERTICES: [SpriteVertex; 4] = [
    SpriteVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 1.0] },
    SpriteVertex { position: [1.0, -1.0, 0.0], tex_coords: [1.0, 1.0] },
    SpriteVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 0.0] },
    SpriteVertex { position: [-1.0, 1.0, 0.0], tex_coords: [0.0, 0.0] },
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// The per-sprite data as it is stored on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteRaw {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

/**
 * As we store the sprite data directly in GPU memory we need to tell what
 * the bytes refer to.
 *
 * Stride layout here: model matrix as four 4d vectors, then the RGBA tint.
 */
impl SpriteRaw {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteRaw>() as wgpu::BufferAddress,
            // Step per instance: the quad vertices are reused and the shader
            // advances to the next sprite only between instances.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    // corresponds to the @location in the shader file.
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// A drawable image sprite: one texture, one quad, one transform.
///
/// Created via [`Sprite::load`], drawn once per frame inside an open render
/// pass and released with [`Sprite::delete`] (or on drop). The transform
/// fields are public and mutated by direct assignment:
///
/// ```ignore
/// let mut ship = Sprite::load(&ctx, "ship.png", [0.0; 3].into()).await?;
/// ship.scalar = 0.5;
/// ship.color = [1.0, 0.6, 0.6, 1.0];
/// ```
#[derive(Debug)]
pub struct Sprite {
    pub position: Vector3<f32>,
    /// Rotation about the z axis in degrees.
    pub rotation: f32,
    /// Uniform scale factor.
    pub scalar: f32,
    /// RGBA tint multiplied over the sampled texel.
    pub color: [f32; 4],
    texture: Texture,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
}

impl Sprite {
    /// Load an image file and return it as a drawable sprite.
    ///
    /// Reads from the platform asset location (see
    /// [`crate::resources::load_binary`]), uploads the pixels as a 2D
    /// texture and precompiles the quad geometry. Decoding failures
    /// propagate from the `image` crate.
    pub async fn load(
        ctx: &InitContext,
        file_name: &str,
        position: Vector3<f32>,
    ) -> anyhow::Result<Self> {
        let texture =
            resources::texture::load_texture(file_name, &ctx.device, &ctx.queue, None).await?;
        Ok(Self::from_texture(ctx, texture, position))
    }

    /// Build a sprite around an already-uploaded texture.
    pub fn from_texture(ctx: &InitContext, texture: Texture, position: Vector3<f32>) -> Self {
        let layout = pipelines::sprite::sprite_texture_layout(&ctx.device);
        let bind_group = pipelines::sprite::mk_bind_group(&ctx.device, &texture, &layout);
        let pipeline =
            pipelines::sprite::mk_sprite_pipeline(&ctx.device, &ctx.config, &ctx.camera_layout);

        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Vertex Buffer"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Index Buffer"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });

        let rotation = 0.0;
        let scalar = 1.0;
        let color = [1.0, 1.0, 1.0, 1.0];
        let raw = SpriteRaw {
            model: model_matrix(position, rotation, scalar).into(),
            tint: color,
        };
        let instance_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Instance Buffer"),
                contents: bytemuck::cast_slice(&[raw]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Self {
            position,
            rotation,
            scalar,
            color,
            texture,
            bind_group,
            pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
        }
    }

    /// Width and height of the underlying texture in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.texture.texture.width(), self.texture.texture.height())
    }

    /// Draw the sprite, assumed once per frame inside an open render pass.
    ///
    /// The model matrix is rebuilt from the public fields on every call, so
    /// external mutations take effect on the next frame without further
    /// bookkeeping. Sprites right of the origin (or parked at x == -1) spin
    /// slowly about z.
    pub fn draw(&mut self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        if should_spin(self.position) {
            self.rotation -= SPIN_STEP;
        }

        let raw = SpriteRaw {
            model: model_matrix(self.position, self.rotation, self.scalar).into(),
            tint: self.color,
        };
        ctx.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&[raw]));

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }

    /// Release the GPU texture.
    ///
    /// Dropping the sprite frees everything eventually; `delete` destroys
    /// the texture allocation immediately.
    pub fn delete(self) {
        self.texture.texture.destroy();
    }
}

/// Translate, rotate about z, then uniformly scale.
fn model_matrix(position: Vector3<f32>, rotation: f32, scalar: f32) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from_angle_z(Deg(rotation))
        * Matrix4::from_scale(scalar)
}

fn should_spin(position: Vector3<f32>) -> bool {
    position.x > 0.0 || position.x == -1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn spin_heuristic_matches_position() {
        assert!(should_spin(Vector3::new(0.5, 0.0, 0.0)));
        assert!(should_spin(Vector3::new(-1.0, 3.0, -2.0)));
        assert!(!should_spin(Vector3::new(0.0, 1.0, 0.0)));
        assert!(!should_spin(Vector3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn translation_lands_in_the_fourth_column() {
        let m = model_matrix(Vector3::new(1.0, -2.0, 3.0), 0.0, 1.0);
        assert_close(m.w.x, 1.0);
        assert_close(m.w.y, -2.0);
        assert_close(m.w.z, 3.0);
        assert_close(m.w.w, 1.0);
    }

    #[test]
    fn uniform_scale_sits_on_the_diagonal() {
        let m = model_matrix(Vector3::new(0.0, 0.0, 0.0), 0.0, 2.5);
        assert_close(m.x.x, 2.5);
        assert_close(m.y.y, 2.5);
        assert_close(m.z.z, 2.5);
    }

    #[test]
    fn rotation_spins_counter_clockwise_about_z() {
        let m = model_matrix(Vector3::new(0.0, 0.0, 0.0), 90.0, 1.0);
        let v = m * cgmath::Vector4::new(1.0, 0.0, 0.0, 1.0);
        // +x maps onto +y a quarter turn later.
        assert_close(v.x, 0.0);
        assert_close(v.y, 1.0);
    }

    #[test]
    fn rotation_applies_before_translation() {
        let m = model_matrix(Vector3::new(5.0, 0.0, 0.0), 90.0, 1.0);
        let v = m * cgmath::Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_close(v.x, 5.0);
        assert_close(v.y, 1.0);
    }

    #[test]
    fn quad_is_a_closed_fan_over_four_vertices() {
        assert_eq!(QUAD_VERTICES.len(), 4);
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|i| (*i as usize) < QUAD_VERTICES.len()));
    }
}
