//! Viewer configuration
//!
//! Every constant that shapes the walkthrough lives here: which models are
//! loaded, where the camera starts in each scene, the fixed lights, the
//! naming conventions used to find the door and the interactive objects.
//! The defaults reproduce the gallery walkthrough the viewer was built for.

use std::path::PathBuf;

use cgmath::Vector3;

/// Environment variable that overrides [`ViewerConfig::asset_root`]
pub const ASSET_ROOT_ENV: &str = "DOORWAY_ASSET_ROOT";

/// Distance and angle limits for the map controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Smallest angle between the view offset and world up, in radians
    pub min_polar_angle: f32,
    /// Largest angle between the view offset and world up, in radians
    pub max_polar_angle: f32,
}

impl Default for ControlBounds {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
        }
    }
}

/// Fixed camera placement applied when a scene becomes active
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub bounds: ControlBounds,
}

/// Background and fog shared by every scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub background: [f32; 3],
    /// Density of exponential-squared fog, zero disables it
    pub fog_density: f32,
}

/// Light kinds installed into the scene store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional { position: Vector3<f32> },
    Point { position: Vector3<f32>, range: f32 },
}

/// A light with its color and intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpec {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl LightSpec {
    pub fn ambient(color: u32, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: hex_color(color),
            intensity,
        }
    }

    pub fn directional(color: u32, intensity: f32, position: Vector3<f32>) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color: hex_color(color),
            intensity,
        }
    }

    pub fn point(color: u32, intensity: f32, range: f32, position: Vector3<f32>) -> Self {
        Self {
            kind: LightKind::Point { position, range },
            color: hex_color(color),
            intensity,
        }
    }
}

/// Settings for one of the two scenes
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Model path relative to the asset root
    pub url: String,
    /// Uniform scale applied to the root of the loaded graph
    pub root_scale: f32,
    pub lights: Vec<LightSpec>,
    pub camera: CameraPose,
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub asset_root: PathBuf,
    pub window_title: String,
    pub window_size: (u32, u32),
    pub environment: Environment,
    pub exterior: SceneConfig,
    pub interior: SceneConfig,

    /// Raw node label the exterior model uses for the door
    pub door_label: String,
    /// Canonical door identifier checked on click
    pub door_id: String,
    /// Substring that marks a node as highlightable
    pub interactive_marker: String,
    pub highlight_color: [f32; 3],

    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub damping_factor: f32,
    /// Pointer travel in pixels past which a press becomes a drag, not a click
    pub click_tolerance: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets/models"),
            window_title: "Doorway".to_string(),
            window_size: (1200, 800),
            environment: Environment {
                background: hex_color(0xcccccc),
                fog_density: 0.002,
            },
            exterior: SceneConfig {
                url: "louvre2.gltf".to_string(),
                root_scale: 1.0,
                lights: vec![
                    LightSpec::directional(0xffffff, 3.0, Vector3::new(1.0, 1.0, 1.0)),
                    LightSpec::directional(0x002288, 3.0, Vector3::new(-1.0, -1.0, -1.0)),
                    LightSpec::ambient(0x555555, 1.0),
                ],
                camera: CameraPose {
                    position: Vector3::new(-70.0, 70.0, -400.0),
                    target: Vector3::new(0.0, 0.0, 0.0),
                    bounds: ControlBounds {
                        min_distance: 100.0,
                        max_distance: 500.0,
                        min_polar_angle: 0.0,
                        max_polar_angle: std::f32::consts::FRAC_PI_2,
                    },
                },
            },
            interior: SceneConfig {
                url: "scene.glb".to_string(),
                root_scale: 16.0,
                lights: vec![
                    LightSpec::ambient(0xffffff, 1.5),
                    LightSpec::point(0xffffff, 1.0, 100.0, Vector3::new(2.0, 3.0, 2.0)),
                ],
                camera: CameraPose {
                    position: Vector3::new(10.0, 0.0, 10.0),
                    target: Vector3::new(0.0, 0.0, 0.0),
                    bounds: ControlBounds {
                        min_distance: 1.0,
                        max_distance: 50.0,
                        min_polar_angle: 0.0,
                        max_polar_angle: std::f32::consts::PI,
                    },
                },
            },
            door_label: "Pyramid".to_string(),
            door_id: "pyramid".to_string(),
            interactive_marker: "Object_".to_string(),
            highlight_color: hex_color(0xff0000),
            fovy_degrees: 60.0,
            znear: 1.0,
            zfar: 1000.0,
            damping_factor: 0.05,
            click_tolerance: 4.0,
        }
    }
}

impl ViewerConfig {
    /// Default configuration with the asset root taken from
    /// `DOORWAY_ASSET_ROOT` when it is set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(ASSET_ROOT_ENV) {
            config.asset_root = PathBuf::from(root);
        }
        config
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }
}

/// Converts a `0xRRGGBB` color into linear-ish float components
pub fn hex_color(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
