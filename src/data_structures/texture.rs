//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture
//! resources, plus helper methods for creating depth textures and uploading
//! textures from decoded image data.

use anyhow::*;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage, load_from_memory_with_format};

/// A GPU texture with a view and optional sampler.
///
/// Wraps WGPU texture objects along with associated views and samplers.
/// Deliberately not `Clone`: a sprite owns its texture exclusively and
/// releases it on [`crate::data_structures::sprite::Sprite::delete`].
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// The returned texture is suitable for use as a `RENDER_ATTACHMENT`
    /// in render passes.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format` is an optional file format hint (e.g., "png"). If the hint
    ///   is missing or unknown, the format is guessed from the content.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
    ) -> Result<Self> {
        let img = decode_image(bytes, format)?;
        Self::from_image(device, queue, &img, Some(label))
    }

    /// Upload a decoded image as a single-mip sRGB 2D texture.
    ///
    /// The sampler filters linearly and clamps to the edge on all axes, so
    /// tinted, scaled sprites never bleed the opposite border in.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &DynamicImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        let rgba = to_rgba_pixels(img);

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_clamped_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// Decode raw image file bytes, preferring the extension hint.
///
/// A missing or unknown hint falls back to sniffing the content.
pub(crate) fn decode_image(bytes: &[u8], format: Option<&str>) -> Result<DynamicImage> {
    let img = match format.and_then(ImageFormat::from_extension) {
        Some(fmt) => load_from_memory_with_format(bytes, fmt)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(img)
}

/// Convert a decoded image into the fixed RGBA upload layout.
///
/// Layouts that carry an alpha channel (RGBA, gray+alpha, in any bit depth)
/// keep it through the RGBA conversion. Every other layout goes through RGB
/// with an opaque alpha channel appended.
pub(crate) fn to_rgba_pixels(img: &DynamicImage) -> RgbaImage {
    if img.color().has_alpha() {
        img.to_rgba8()
    } else {
        let rgb = img.to_rgb8();
        RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            let p = rgb.get_pixel(x, y);
            Rgba([p[0], p[1], p[2], 255])
        })
    }
}

pub fn create_clamped_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("in-memory png encode");
        bytes
    }

    #[test]
    fn rgb_images_get_an_opaque_alpha_channel() {
        let rgb = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8, y as u8, 7]));
        let rgba = to_rgba_pixels(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(rgba.dimensions(), (4, 3));
        for (x, y, p) in rgba.enumerate_pixels() {
            assert_eq!(p.0, [x as u8, y as u8, 7, 255]);
        }
    }

    #[test]
    fn rgba_images_pass_through_untouched() {
        let src = RgbaImage::from_fn(2, 2, |x, y| Rgba([1, 2, 3, (x + y) as u8 * 90]));
        let rgba = to_rgba_pixels(&DynamicImage::ImageRgba8(src.clone()));
        assert_eq!(rgba, src);
    }

    #[test]
    fn gray_alpha_images_keep_their_alpha_channel() {
        let src = GrayAlphaImage::from_fn(2, 2, |x, y| LumaA([128, if x == y { 0 } else { 200 }]));
        let rgba = to_rgba_pixels(&DynamicImage::ImageLumaA8(src));
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
        assert_eq!(rgba.get_pixel(1, 0)[3], 200);
        assert_eq!(rgba.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn sixteen_bit_rgba_keeps_transparency() {
        let src = image::ImageBuffer::from_pixel(3, 3, image::Rgba([65535u16, 0, 0, 0]));
        let rgba = to_rgba_pixels(&DynamicImage::ImageRgba16(src));
        assert_eq!(rgba.dimensions(), (3, 3));
        let p = rgba.get_pixel(1, 1);
        assert_eq!(p[0], 255);
        assert_eq!(p[3], 0);
    }

    #[test]
    fn decoding_a_known_png_preserves_its_dimensions() {
        let src = RgbImage::from_pixel(8, 5, Rgb([200, 10, 30]));
        let bytes = png_bytes(DynamicImage::ImageRgb8(src));

        let decoded = decode_image(&bytes, Some("png")).expect("png decode");
        assert_eq!(decoded.dimensions(), (8, 5));
        let rgba = to_rgba_pixels(&decoded);
        assert_eq!(rgba.get_pixel(4, 2).0, [200, 10, 30, 255]);
    }

    #[test]
    fn unknown_format_hints_are_ignored_in_favour_of_sniffing() {
        let src = RgbImage::from_pixel(6, 4, Rgb([9, 9, 9]));
        let bytes = png_bytes(DynamicImage::ImageRgb8(src));

        // A useless hint must not panic or fail; the content is sniffed.
        let decoded = decode_image(&bytes, Some("not-an-extension")).expect("hint fallback");
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(
            decode_image(&bytes, None).expect("sniffed decode").dimensions(),
            (6, 4)
        );
    }
}
