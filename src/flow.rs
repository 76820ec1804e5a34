//! Flow control and application event loop.
//!
//! This module provides the main event loop and scene abstraction. A scene
//! owns a set of sprites, updates them each frame and draws them into the
//! render pass the engine configures (clear colour, depth attachment and
//! camera uniform are handled here, so a sprite's `draw` only has to replay
//! its quad).
//!
//! # Lifecycle
//!
//! 1. `run` builds the winit event loop and the [`App`]
//! 2. on resume the window and [`Context`] are created and every
//!    [`SceneConstructor`] is awaited (this is where sprites load)
//! 3. each frame: window events, render pass with every scene's
//!    `on_render`, then `on_update` with the elapsed time

use std::{iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    data_structures::texture::Texture,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Trait for implementing a renderable scene.
///
/// A scene manages a self-contained set of sprites: loading happens in the
/// async constructor, per-frame logic in `on_update` and drawing in
/// `on_render`. The engine coordinates the event loop, surface management
/// and the camera, and calls into the scenes each frame.
pub trait SpriteScene {
    /// Initialize the scene and configure the context.
    ///
    /// This is the place to modify the [`Context`], e.g. the clear colour
    /// or the camera start position.
    fn on_init(&mut self, _ctx: &mut Context) {}

    /// Update state every frame.
    ///
    /// Called with the elapsed time `dt` before the next redraw is
    /// scheduled. Sprite fields mutated here are picked up by the next
    /// `draw`.
    fn on_update(&mut self, _ctx: &Context, _dt: Duration) {}

    /// Handle window events (keyboard, mouse, resizing, etc.).
    fn on_window_events(&mut self, _ctx: &Context, _event: &WindowEvent) {}

    /// Draw the scene's sprites into the already-configured render pass.
    fn on_render(&mut self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>);
}

/// Type alias for a scene constructor (factory function).
///
/// A scene constructor takes an [`InitContext`] and asynchronously returns
/// a boxed [`SpriteScene`]. This allows lazy initialization and resource
/// loading, e.g. awaiting [`crate::data_structures::sprite::Sprite::load`].
pub type SceneConstructor =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn SpriteScene>>>>>;

/// Application state bundle: GPU context and surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = match Context::new(window).await {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        Self {
            ctx,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self, scenes: &mut Vec<Box<dyn SpriteScene>>) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Refresh the camera uniform before the pass replays it.
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            for scene in scenes.iter_mut() {
                scene.on_render(&self.ctx, &mut render_pass);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        scenes: Vec<Box<dyn SpriteScene>>,
    },
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // This will hold the fully initialized scenes once they are ready.
    scenes: Vec<Box<dyn SpriteScene>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<SceneConstructor>>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, constructors: Vec<SceneConstructor>) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            scenes: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        let constructors = self.constructors.take().unwrap();

        let init_future = async move {
            let app_state = AppState::new(window).await;

            let scene_futures: Vec<_> = constructors
                .into_iter()
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let scenes: Vec<_> = futures::future::join_all(scene_futures).await;
            (app_state, scenes)
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (mut app_state, scenes) = self.async_runtime.block_on(init_future);
            self.scenes = scenes;
            self.scenes
                .iter_mut()
                .for_each(|scene| scene.on_init(&mut app_state.ctx));
            self.state = Some(app_state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let (app_state, scenes) = init_future.await;
                assert!(
                    proxy
                        .send_event(FlowEvent::Initialized {
                            state: app_state,
                            scenes,
                        })
                        .is_ok()
                );
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { state, scenes } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                self.scenes = scenes;

                // Important: Trigger a resize and redraw now that we are initialized
                let app_state = self.state.as_mut().unwrap();
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                self.scenes
                    .iter_mut()
                    .for_each(|scene| scene.on_init(&mut app_state.ctx));
                app_state.ctx.window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        self.scenes
            .iter_mut()
            .for_each(|scene| scene.on_window_events(&state.ctx, &event));

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&mut self.scenes) {
                    Ok(_) => {
                        self.scenes
                            .iter_mut()
                            .for_each(|scene| scene.on_update(&state.ctx, dt));
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run the event loop until the window closes.
///
/// Every constructor is awaited once the GPU context exists; the resulting
/// scenes are rendered in order each frame.
pub fn run(constructors: Vec<SceneConstructor>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, constructors);

    event_loop.run_app(&mut app)?;

    Ok(())
}
