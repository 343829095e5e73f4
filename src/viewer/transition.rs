//! Exterior to interior walkthrough state machine
//!
//! ```text
//! ExteriorActive --door click--> LoadingInterior --loaded--> InteriorActive
//!       ^                               |
//!       +-------- load failed ----------+
//! ```

use crate::{
    assets::{AssetLoader, LoadEvent, LoadEventKind, LoadRequest, LoadTicket},
    config::{SceneConfig, ViewerConfig},
    error::LoadError,
    gfx::{
        camera::MapCamera,
        scene::{SceneGraph, SceneGraphStore},
    },
};

use super::highlight::{ClickAction, HighlightTracker};

/// The two walkthrough scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Exterior,
    Interior,
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scene::Exterior => write!(f, "Exterior"),
            Scene::Interior => write!(f, "Interior"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    ExteriorActive,
    LoadingInterior,
    InteriorActive,
}

impl ViewerState {
    /// Scene the store holds, or is about to hold
    pub fn scene(self) -> Scene {
        match self {
            ViewerState::ExteriorActive => Scene::Exterior,
            ViewerState::LoadingInterior | ViewerState::InteriorActive => Scene::Interior,
        }
    }
}

/// Progress of the load the controller is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatus {
    pub url: String,
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadStatus {
    /// Completed fraction, when the total size is known
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(total) if total > 0 => Some((self.loaded as f32 / total as f32).min(1.0)),
            _ => None,
        }
    }
}

/// Operator-visible status shown by the controls panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBoard {
    pub loading: Option<LoadStatus>,
    pub last_error: Option<String>,
}

/// Everything a transition may touch
pub struct SceneContext<'a> {
    pub store: &'a mut SceneGraphStore,
    pub camera: &'a mut MapCamera,
    pub highlight: &'a mut HighlightTracker,
    pub loader: &'a mut dyn AssetLoader,
}

pub struct SceneTransitionController {
    config: ViewerConfig,
    state: ViewerState,
    pending: Option<LoadRequest>,
    next_ticket: u64,
    status: StatusBoard,
}

impl SceneTransitionController {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            state: ViewerState::ExteriorActive,
            pending: None,
            next_ticket: 1,
            status: StatusBoard::default(),
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Ticket of the load whose completion is awaited
    pub fn pending_ticket(&self) -> Option<LoadTicket> {
        self.pending.as_ref().map(|request| request.ticket)
    }

    /// Pointer-move highlighting only runs inside
    pub fn highlighting_enabled(&self) -> bool {
        self.state == ViewerState::InteriorActive
    }

    /// Enters the exterior scene and requests its model
    pub fn start(&mut self, ctx: &mut SceneContext) {
        self.enter_exterior(ctx);
    }

    pub fn on_click_action(&mut self, action: ClickAction, ctx: &mut SceneContext) {
        if action != ClickAction::EnterInterior {
            return;
        }
        if self.state != ViewerState::ExteriorActive {
            log::debug!("Ignoring door click while {:?}", self.state);
            return;
        }

        log::info!("Entering interior");
        ctx.store.clear();
        ctx.highlight.forget();
        self.state = ViewerState::LoadingInterior;
        let url = self.config.interior.url.clone();
        self.request(url, ctx.loader);
    }

    pub fn on_load_event(&mut self, event: LoadEvent, ctx: &mut SceneContext) {
        if self.pending_ticket() != Some(event.ticket) {
            log::warn!("Ignoring event for stale load {}", event.ticket);
            return;
        }

        match event.kind {
            LoadEventKind::Progress { loaded, total } => {
                if let Some(status) = self.status.loading.as_mut() {
                    status.loaded = loaded;
                    status.total = total;
                }
            }
            LoadEventKind::Finished(outcome) => {
                self.pending = None;
                self.status.loading = None;
                match outcome {
                    Ok(graph) => self.loaded(graph, ctx),
                    Err(error) => self.failed(error, ctx),
                }
            }
        }
    }

    fn loaded(&mut self, mut graph: SceneGraph, ctx: &mut SceneContext) {
        graph.flag_interactive(&self.config.interactive_marker);

        if self.state == ViewerState::InteriorActive {
            log::warn!("Discarding model loaded after the walkthrough finished");
            return;
        }
        self.status.last_error = None;

        match self.state {
            ViewerState::ExteriorActive => {
                let renamed = graph.rename_meshes(&self.config.door_label, &self.config.door_id);
                if renamed == 0 {
                    log::warn!("Exterior model has no '{}' node", self.config.door_label);
                }
                graph.set_root_scale(self.config.exterior.root_scale);
                graph.log_nodes();
                ctx.store.install(graph);
                log::info!("Exterior ready");
            }
            ViewerState::LoadingInterior => {
                graph.set_root_scale(self.config.interior.root_scale);
                graph.log_nodes();
                ctx.store.install(graph);
                install_scene(&self.config.interior, ctx);
                self.state = ViewerState::InteriorActive;
                log::info!("Interior ready");
            }
            ViewerState::InteriorActive => {}
        }
    }

    fn failed(&mut self, error: LoadError, ctx: &mut SceneContext) {
        log::error!("Load failed: {}", error);
        self.status.last_error = Some(error_text(&error));

        if self.state == ViewerState::LoadingInterior {
            log::info!("Returning to exterior");
            self.enter_exterior(ctx);
        }
    }

    fn enter_exterior(&mut self, ctx: &mut SceneContext) {
        ctx.store.clear();
        ctx.store.set_environment(self.config.environment);
        ctx.highlight.forget();
        install_scene(&self.config.exterior, ctx);

        self.state = ViewerState::ExteriorActive;
        let url = self.config.exterior.url.clone();
        self.request(url, ctx.loader);
    }

    fn request(&mut self, url: String, loader: &mut dyn AssetLoader) {
        let request = LoadRequest {
            ticket: LoadTicket(self.next_ticket),
            url,
        };
        self.next_ticket += 1;

        self.status.loading = Some(LoadStatus {
            url: request.url.clone(),
            loaded: 0,
            total: None,
        });
        self.pending = Some(request.clone());
        loader.load(request);
    }
}

/// Adds the fixed lights and camera pose of a scene
fn install_scene(scene: &SceneConfig, ctx: &mut SceneContext) {
    for light in &scene.lights {
        ctx.store.add_light(*light);
    }
    ctx.camera.apply_pose(&scene.camera);
}

/// Error message with its source chain
fn error_text(error: &LoadError) -> String {
    let mut text = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::hex_color,
        gfx::{
            camera::CameraManager,
            scene::{Material, Mesh, Node},
        },
    };
    use cgmath::{Matrix4, Vector3};

    #[derive(Default)]
    struct RecordingLoader {
        requests: Vec<LoadRequest>,
    }

    impl AssetLoader for RecordingLoader {
        fn load(&mut self, request: LoadRequest) {
            self.requests.push(request);
        }
    }

    struct Fixture {
        config: ViewerConfig,
        controller: SceneTransitionController,
        store: SceneGraphStore,
        camera: MapCamera,
        highlight: HighlightTracker,
        loader: RecordingLoader,
    }

    impl Fixture {
        fn new() -> Self {
            let config = ViewerConfig::default();
            Self {
                controller: SceneTransitionController::new(config.clone()),
                store: SceneGraphStore::new(config.environment),
                camera: CameraManager::from_config(&config).camera,
                highlight: HighlightTracker::new(config.highlight_color, config.door_id.clone()),
                loader: RecordingLoader::default(),
                config,
            }
        }

        fn with_ctx<R>(&mut self, f: impl FnOnce(&mut SceneTransitionController, &mut SceneContext) -> R) -> R {
            let mut ctx = SceneContext {
                store: &mut self.store,
                camera: &mut self.camera,
                highlight: &mut self.highlight,
                loader: &mut self.loader,
            };
            f(&mut self.controller, &mut ctx)
        }

        fn start(&mut self) {
            self.with_ctx(|controller, ctx| controller.start(ctx));
        }

        fn click(&mut self, action: ClickAction) {
            self.with_ctx(|controller, ctx| controller.on_click_action(action, ctx));
        }

        fn deliver(&mut self, event: LoadEvent) {
            self.with_ctx(|controller, ctx| controller.on_load_event(event, ctx));
        }

        fn last_ticket(&self) -> LoadTicket {
            self.loader.requests.last().unwrap().ticket
        }

        fn last_url(&self) -> &str {
            &self.loader.requests.last().unwrap().url
        }

        fn finish_ok(&mut self, graph: SceneGraph) {
            let ticket = self.last_ticket();
            self.deliver(LoadEvent::finished(ticket, Ok(graph)));
        }
    }

    fn triangle() -> Mesh {
        Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            vec![0, 1, 2],
            Material::default(),
        )
    }

    fn exterior_graph() -> SceneGraph {
        let mut graph = SceneGraph::new("louvre");
        let root = graph.root();
        graph.add_child(root, Node::mesh("Pyramid", triangle()));
        graph.add_child(root, Node::mesh("courtyard", triangle()));
        graph
    }

    fn interior_graph() -> SceneGraph {
        let mut graph = SceneGraph::new("gallery");
        let root = graph.root();
        graph.add_child(root, Node::mesh("Object_12", triangle()));
        graph.add_child(root, Node::mesh("floor", triangle()));
        graph
    }

    fn in_exterior() -> Fixture {
        let mut fixture = Fixture::new();
        fixture.start();
        fixture.finish_ok(exterior_graph());
        fixture
    }

    fn interior_failure(url: &str) -> LoadError {
        LoadError::Io {
            url: url.to_string(),
            loaded: 1024,
            total: Some(4096),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
        }
    }

    #[test]
    fn start_requests_exterior_with_lights_and_pose() {
        let mut fixture = Fixture::new();
        fixture.start();

        assert_eq!(fixture.controller.state(), ViewerState::ExteriorActive);
        assert_eq!(fixture.last_url(), "louvre2.gltf");
        assert_eq!(fixture.store.lights().len(), 3);
        assert_eq!(fixture.camera.eye, Vector3::new(-70.0, 70.0, -400.0));
        assert!(!fixture.controller.highlighting_enabled());
        assert!(fixture.controller.status().loading.is_some());
    }

    #[test]
    fn exterior_load_normalizes_the_door() {
        let fixture = in_exterior();
        let graph = fixture.store.graph().unwrap();
        assert!(graph.find_by_name("pyramid").is_some());
        assert!(graph.find_by_name("Pyramid").is_none());
        assert_eq!(fixture.controller.status().loading, None);
    }

    #[test]
    fn door_click_loads_interior_and_installs_it() {
        let mut fixture = in_exterior();
        fixture.click(ClickAction::EnterInterior);

        assert_eq!(fixture.controller.state(), ViewerState::LoadingInterior);
        assert!(fixture.store.is_empty());
        assert_eq!(fixture.last_url(), "scene.glb");
        assert_eq!(fixture.store.take_released().len(), 2);

        fixture.camera.rotate(0.5, 0.2);
        fixture.finish_ok(interior_graph());

        assert_eq!(fixture.controller.state(), ViewerState::InteriorActive);
        assert!(fixture.controller.highlighting_enabled());

        let graph = fixture.store.graph().unwrap();
        let root = graph.node(graph.root()).unwrap();
        assert_eq!(root.transform, Matrix4::from_scale(16.0));
        let painting = graph.find_by_name("Object_12").unwrap();
        assert!(graph.node(painting).unwrap().interactive);

        let lights = fixture.store.lights();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights[0].color, hex_color(0xffffff));
        assert_eq!(lights[0].intensity, 1.5);

        assert_eq!(fixture.camera.eye, Vector3::new(10.0, 0.0, 10.0));
        assert_eq!(fixture.camera.target, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(fixture.camera.bounds, fixture.config.interior.camera.bounds);
        assert!(!fixture.camera.is_moving());
    }

    #[test]
    fn clicks_outside_exterior_change_nothing() {
        let mut fixture = in_exterior();
        fixture.click(ClickAction::None);
        assert_eq!(fixture.controller.state(), ViewerState::ExteriorActive);
        assert!(fixture.store.graph().is_some());

        fixture.click(ClickAction::EnterInterior);
        // double click on the door while loading
        fixture.click(ClickAction::EnterInterior);
        assert_eq!(fixture.loader.requests.len(), 2);

        fixture.finish_ok(interior_graph());
        fixture.click(ClickAction::EnterInterior);
        assert_eq!(fixture.controller.state(), ViewerState::InteriorActive);
        assert_eq!(fixture.loader.requests.len(), 2);
    }

    #[test]
    fn interior_failure_returns_to_exterior() {
        let mut fixture = in_exterior();
        fixture.click(ClickAction::EnterInterior);
        let ticket = fixture.last_ticket();
        fixture.deliver(LoadEvent::finished(ticket, Err(interior_failure("scene.glb"))));

        assert_eq!(fixture.controller.state(), ViewerState::ExteriorActive);
        let error = fixture.controller.status().last_error.clone().unwrap();
        assert!(error.contains("scene.glb"));
        assert!(error.contains("1024 of 4096 bytes"));

        // exterior lights are back and the exterior is requested again
        assert_eq!(fixture.store.lights().len(), 3);
        assert_eq!(fixture.last_url(), "louvre2.gltf");
        assert_eq!(fixture.camera.eye, Vector3::new(-70.0, 70.0, -400.0));

        fixture.finish_ok(exterior_graph());
        assert!(fixture.store.graph().is_some());
        assert_eq!(fixture.controller.status().last_error, None);
        fixture.click(ClickAction::EnterInterior);
        assert_eq!(fixture.controller.state(), ViewerState::LoadingInterior);

        fixture.finish_ok(interior_graph());
        assert_eq!(fixture.controller.state(), ViewerState::InteriorActive);
        assert_eq!(fixture.controller.status().last_error, None);
    }

    #[test]
    fn exterior_failure_is_reported_without_retry() {
        let mut fixture = Fixture::new();
        fixture.start();
        let ticket = fixture.last_ticket();
        fixture.deliver(LoadEvent::finished(
            ticket,
            Err(LoadError::Empty {
                url: "louvre2.gltf".to_string(),
            }),
        ));

        assert_eq!(fixture.controller.state(), ViewerState::ExteriorActive);
        assert_eq!(fixture.loader.requests.len(), 1);
        assert!(fixture.controller.status().last_error.is_some());
        assert_eq!(fixture.store.lights().len(), 3);
    }

    #[test]
    fn stale_completions_are_ignored() {
        let mut fixture = Fixture::new();
        fixture.start();
        let exterior_ticket = fixture.last_ticket();
        // door clicked before the exterior finished (e.g. a cached graph)
        fixture.click(ClickAction::EnterInterior);

        fixture.deliver(LoadEvent::finished(exterior_ticket, Ok(exterior_graph())));
        assert!(fixture.store.graph().is_none());
        assert_eq!(fixture.controller.state(), ViewerState::LoadingInterior);

        fixture.finish_ok(interior_graph());
        assert_eq!(fixture.controller.state(), ViewerState::InteriorActive);
        assert!(fixture.store.graph().unwrap().find_by_name("Object_12").is_some());
    }

    #[test]
    fn progress_updates_the_status_board() {
        let mut fixture = Fixture::new();
        fixture.start();
        let ticket = fixture.last_ticket();
        fixture.deliver(LoadEvent::progress(ticket, 50, Some(200)));

        let status = fixture.controller.status().loading.clone().unwrap();
        assert_eq!(status.url, "louvre2.gltf");
        assert_eq!(status.fraction(), Some(0.25));
    }
}
