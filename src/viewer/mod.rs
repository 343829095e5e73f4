//! # Walkthrough viewer state
//!
//! [`Viewer`] owns everything the walkthrough mutates: the scene store, the
//! map camera and its controls, the picker, the highlight tracker and the
//! scene transition controller. Input, load events and frame updates all
//! enter through it, one at a time, on the event loop thread.

pub mod highlight;
pub mod transition;

use winit::event::WindowEvent;

use crate::{
    assets::{AssetLoader, LoadEvent},
    config::ViewerConfig,
    gfx::{
        camera::{CameraManager, PointerGesture, Viewport},
        picking::ObjectPicker,
        scene::SceneGraphStore,
    },
};

pub use highlight::{ClickAction, HighlightTracker};
pub use transition::{
    LoadStatus, Scene, SceneContext, SceneTransitionController, StatusBoard, ViewerState,
};

pub struct Viewer<L: AssetLoader> {
    pub store: SceneGraphStore,
    pub cameras: CameraManager,
    picker: ObjectPicker,
    highlight: HighlightTracker,
    controller: SceneTransitionController,
    viewport: Viewport,
    loader: L,
}

impl<L: AssetLoader> Viewer<L> {
    pub fn new(config: ViewerConfig, loader: L) -> Self {
        let (width, height) = config.window_size;
        Self {
            store: SceneGraphStore::new(config.environment),
            cameras: CameraManager::from_config(&config),
            picker: ObjectPicker::new(),
            highlight: HighlightTracker::new(config.highlight_color, config.door_id.clone()),
            viewport: Viewport::new(width, height),
            controller: SceneTransitionController::new(config),
            loader,
        }
    }

    /// Enters the exterior scene
    pub fn start(&mut self) {
        let (controller, mut ctx) = self.split();
        controller.start(&mut ctx);
    }

    pub fn state(&self) -> ViewerState {
        self.controller.state()
    }

    pub fn status(&self) -> &StatusBoard {
        self.controller.status()
    }

    pub fn highlight(&self) -> &HighlightTracker {
        &self.highlight
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Feeds a window event to the map controls and reacts to the
    /// resulting hover or click
    pub fn handle_input(&mut self, event: &WindowEvent) {
        match self.cameras.process_event(event, self.viewport) {
            PointerGesture::Hover { x, y } => self.on_pointer_move(x, y),
            PointerGesture::Click { x, y } => self.on_click(x, y),
            PointerGesture::None => {}
        }
    }

    /// Updates the hover highlight; only active inside
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !self.controller.highlighting_enabled() {
            return;
        }
        let result = self
            .picker
            .pick((x, y), self.viewport, &self.cameras.camera, &self.store);
        if let Some(graph) = self.store.graph_mut() {
            self.highlight.on_pointer_move(&result, graph);
        }
    }

    pub fn on_click(&mut self, x: f32, y: f32) {
        let result = self
            .picker
            .pick((x, y), self.viewport, &self.cameras.camera, &self.store);
        let action = match self.store.graph() {
            Some(graph) => self.highlight.on_click(&result, graph),
            None => ClickAction::None,
        };

        let (controller, mut ctx) = self.split();
        controller.on_click_action(action, &mut ctx);
    }

    pub fn on_load_event(&mut self, event: LoadEvent) {
        let (controller, mut ctx) = self.split();
        controller.on_load_event(event, &mut ctx);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        self.cameras.camera.resize_projection(width, height);
    }

    /// One damped camera step; call once per frame
    pub fn update(&mut self) {
        self.cameras.update();
    }

    fn split(&mut self) -> (&mut SceneTransitionController, SceneContext<'_>) {
        (
            &mut self.controller,
            SceneContext {
                store: &mut self.store,
                camera: &mut self.cameras.camera,
                highlight: &mut self.highlight,
                loader: &mut self.loader,
            },
        )
    }
}
