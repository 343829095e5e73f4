//! # Asset Loading
//!
//! Asynchronous model loading. A request carries a [`LoadTicket`]; the loader
//! reports byte progress and then exactly one terminal outcome for it through
//! a [`LoadSink`]. Outcomes are plain `Result`s: a ticket that has not
//! finished yet is pending, `Ok` carries the parsed [`SceneGraph`], `Err` a
//! [`LoadError`] describing what went wrong and how far the transfer got.
//!
//! Supported formats are glTF 2.0 (`.gltf`, `.glb`) and Wavefront OBJ.
//!
//! [`SceneGraph`]: crate::gfx::scene::SceneGraph

pub mod gltf_model;
pub mod loader;
pub mod obj_model;

use std::path::Path;

use crate::{error::LoadError, gfx::scene::SceneGraph};

pub use loader::ThreadedLoader;

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    /// Model path relative to the loader's asset root
    pub url: String,
}

#[derive(Debug)]
pub enum LoadEventKind {
    Progress { loaded: u64, total: Option<u64> },
    Finished(Result<SceneGraph, LoadError>),
}

#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: LoadTicket,
    pub kind: LoadEventKind,
}

impl LoadEvent {
    pub fn progress(ticket: LoadTicket, loaded: u64, total: Option<u64>) -> Self {
        Self {
            ticket,
            kind: LoadEventKind::Progress { loaded, total },
        }
    }

    pub fn finished(ticket: LoadTicket, outcome: Result<SceneGraph, LoadError>) -> Self {
        Self {
            ticket,
            kind: LoadEventKind::Finished(outcome),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, LoadEventKind::Finished(_))
    }
}

/// Receives load events, possibly from a worker thread
pub trait LoadSink: Clone + Send + 'static {
    fn deliver(&self, event: LoadEvent);
}

impl LoadSink for std::sync::mpsc::Sender<LoadEvent> {
    fn deliver(&self, event: LoadEvent) {
        if self.send(event).is_err() {
            log::warn!("Load event dropped: receiver is gone");
        }
    }
}

/// Capability to start asynchronous model loads
pub trait AssetLoader {
    /// Starts loading; returns immediately. Events for `request.ticket` are
    /// delivered later, ending with exactly one `Finished`.
    fn load(&mut self, request: LoadRequest);
}

/// Model formats recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Obj,
}

impl ModelFormat {
    pub fn from_url(url: &str) -> Option<Self> {
        let extension = Path::new(url).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(ModelFormat::Gltf),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }
}

/// Parses model bytes; `base` resolves external buffers and material files
pub fn parse_model(url: &str, bytes: &[u8], base: Option<&Path>) -> Result<SceneGraph, LoadError> {
    let format = ModelFormat::from_url(url).ok_or_else(|| LoadError::UnsupportedFormat {
        url: url.to_string(),
    })?;

    let graph = match format {
        ModelFormat::Gltf => gltf_model::parse(url, bytes, base)?,
        ModelFormat::Obj => obj_model::parse(url, bytes, base)?,
    };

    if !graph.has_geometry() {
        return Err(LoadError::Empty {
            url: url.to_string(),
        });
    }
    Ok(graph)
}
