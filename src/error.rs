//! Error types for the Doorway viewer
//!
//! Asset loading failures are recoverable and flow back into the scene
//! transition controller; [`ViewerError`] covers startup failures that stop
//! the application before the first frame.

use thiserror::Error;

/// Failure outcome of a single asset load request.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{url}' ({})", progress_text(.loaded, .total))]
    Io {
        url: String,
        loaded: u64,
        total: Option<u64>,
        #[source]
        source: std::io::Error,
    },

    #[error("'{url}' has no supported model extension (expected .gltf, .glb or .obj)")]
    UnsupportedFormat { url: String },

    #[error("failed to parse OBJ model '{url}'")]
    Obj {
        url: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to parse glTF model '{url}'")]
    Gltf {
        url: String,
        #[source]
        source: gltf::Error,
    },

    #[error("'{url}' contains no renderable geometry")]
    Empty { url: String },

    #[error("loader worker for '{url}' stopped before reporting an outcome")]
    WorkerLost { url: String },
}

impl LoadError {
    /// URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            LoadError::Io { url, .. }
            | LoadError::UnsupportedFormat { url }
            | LoadError::Obj { url, .. }
            | LoadError::Gltf { url, .. }
            | LoadError::Empty { url }
            | LoadError::WorkerLost { url } => url,
        }
    }
}

fn progress_text(loaded: &u64, total: &Option<u64>) -> String {
    match total {
        Some(total) => format!("{loaded} of {total} bytes received"),
        None => format!("{loaded} bytes received"),
    }
}

/// Startup failures of the windowed application
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to create the event loop")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create the window")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create the rendering surface")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable graphics adapter found")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open the graphics device")]
    Device(#[from] wgpu::RequestDeviceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_reports_url_and_progress() {
        let err = LoadError::Io {
            url: "models/room.glb".to_string(),
            loaded: 512,
            total: Some(2048),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        };

        let text = err.to_string();
        assert!(text.contains("models/room.glb"));
        assert!(text.contains("512 of 2048 bytes"));
        assert_eq!(err.url(), "models/room.glb");
    }

    #[test]
    fn io_error_without_total_reports_loaded_bytes() {
        let err = LoadError::Io {
            url: "a.obj".to_string(),
            loaded: 0,
            total: None,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        assert!(err.to_string().contains("0 bytes received"));
    }
}
