//! GPU integration tests: texture upload and sprite construction on a
//! headless device. Gated behind `integration-tests` because they need a
//! working adapter.

#[cfg(feature = "integration-tests")]
mod gpu {
    use image::{DynamicImage, Rgb, RgbImage};
    use quad_ngin::{
        camera,
        context::InitContext,
        data_structures::{sprite::Sprite, texture::Texture},
    };

    async fn headless_device() -> (wgpu::Device, wgpu::Queue) {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no adapter available for integration tests");
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("device request failed")
    }

    fn init_context(device: &wgpu::Device, queue: &wgpu::Queue) -> InitContext {
        InitContext {
            device: device.clone(),
            queue: queue.clone(),
            config: wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                width: 256,
                height: 256,
                present_mode: wgpu::PresentMode::Fifo,
                alpha_mode: wgpu::CompositeAlphaMode::Auto,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
            camera_layout: camera::camera_layout(device),
        }
    }

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([40, 40, 40])
            }
        }))
    }

    #[test]
    fn uploaded_texture_matches_image_dimensions() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (device, queue) = headless_device().await;
            let img = checkerboard(16, 9);
            let texture =
                Texture::from_image(&device, &queue, &img, Some("checker")).expect("upload");
            assert_eq!(texture.texture.width(), 16);
            assert_eq!(texture.texture.height(), 9);
        });
    }

    #[test]
    fn sprite_owns_its_texture_until_delete() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (device, queue) = headless_device().await;
            let ctx = init_context(&device, &queue);
            let img = checkerboard(8, 8);
            let texture = Texture::from_image(&device, &queue, &img, Some("checker")).unwrap();

            let mut sprite = Sprite::from_texture(&ctx, texture, [2.0, 0.0, 0.0].into());
            assert_eq!(sprite.dimensions(), (8, 8));

            // Transform state is plain field assignment.
            sprite.rotation = 45.0;
            sprite.scalar = 2.0;
            sprite.color = [1.0, 0.0, 0.0, 0.5];

            sprite.delete();
        });
    }
}
