//! Windowed walkthrough application
//!
//! Wires the [`Viewer`] to a winit event loop, the render engine and the UI
//! overlay. Asset loads finish on worker threads and come back as
//! [`ViewerEvent`]s through the event loop proxy, so every state change
//! happens on the event loop thread.

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{LoadEvent, LoadSink, ThreadedLoader},
    config::ViewerConfig,
    error::ViewerError,
    gfx::RenderEngine,
    ui::{controls_panel, UiManager},
    viewer::Viewer,
};

/// Events sent to the event loop from other threads
#[derive(Debug)]
pub enum ViewerEvent {
    Load(LoadEvent),
}

/// Delivers load events through the event loop
#[derive(Clone)]
pub struct ProxySink(EventLoopProxy<ViewerEvent>);

impl LoadSink for ProxySink {
    fn deliver(&self, event: LoadEvent) {
        if self.0.send_event(ViewerEvent::Load(event)).is_err() {
            log::debug!("Event loop closed, dropping load event");
        }
    }
}

pub struct DoorwayApp {
    event_loop: EventLoop<ViewerEvent>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    viewer: Viewer<ThreadedLoader<ProxySink>>,
    failure: Option<ViewerError>,
}

impl DoorwayApp {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::<ViewerEvent>::with_user_event().build()?;
        let loader = ThreadedLoader::new(
            config.asset_root.clone(),
            ProxySink(event_loop.create_proxy()),
        );
        let viewer = Viewer::new(config.clone(), loader);

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                viewer,
                failure: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    ///
    /// # Errors
    /// Fails when the window or the graphics device cannot be created
    pub fn run(self) -> Result<(), ViewerError> {
        let Self {
            event_loop,
            mut app_state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut app_state)?;

        match app_state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let (width, height) = self.config.window_size;
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(self.config.window_title.clone())
                    .with_inner_size(LogicalSize::new(width, height)),
            )?,
        );

        let (width, height) = window.inner_size().into();
        let renderer = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.viewer.resize(width, height);
        self.window = Some(window);
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), &self.window)
        else {
            return;
        };

        self.viewer.update();

        let state = self.viewer.state();
        let status = self.viewer.status().clone();
        let viewer = &mut self.viewer;
        let ui_manager = &mut self.ui_manager;
        let cameras = &mut viewer.cameras;
        let controller = &mut cameras.controller;

        let result = render_engine.render_frame(
            &mut viewer.store,
            &cameras.camera,
            ui_manager.as_mut().map(|ui_manager| {
                move |device: &wgpu::Device,
                      queue: &wgpu::Queue,
                      encoder: &mut wgpu::CommandEncoder,
                      view: &wgpu::TextureView| {
                    ui_manager.draw(device, queue, encoder, window, view, |ui| {
                        controls_panel(ui, controller, state, &status);
                    });
                }
            }),
        );

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(err) => log::warn!("Dropped frame: {}", err),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init_graphics(event_loop) {
            log::error!("Startup failed: {}", err);
            self.failure = Some(err);
            event_loop.exit();
            return;
        }

        self.viewer.start();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Load(event) => self.viewer.on_load_event(event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Handle UI input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(window, &ui_event) {
                return;
            }
        }

        self.viewer.handle_input(&event);

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                self.viewer.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
