use std::{
    fs::File,
    io::Read,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    thread,
};

use super::{parse_model, AssetLoader, LoadEvent, LoadRequest, LoadSink};
use crate::error::LoadError;

/// Read granularity; progress is reported once per chunk
const CHUNK_SIZE: usize = 64 * 1024;

/// Loads each request on its own worker thread.
///
/// Files are read from `root` in chunks with a progress event per chunk,
/// then parsed off the main thread. Every request ends with exactly one
/// `Finished` event, including when the worker cannot be spawned or panics.
pub struct ThreadedLoader<S: LoadSink> {
    root: PathBuf,
    sink: S,
}

impl<S: LoadSink> ThreadedLoader<S> {
    pub fn new(root: impl Into<PathBuf>, sink: S) -> Self {
        Self {
            root: root.into(),
            sink,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl<S: LoadSink> AssetLoader for ThreadedLoader<S> {
    fn load(&mut self, request: LoadRequest) {
        log::info!("Loading {} (ticket {})", request.url, request.ticket);

        let path = self.root.join(&request.url);
        let sink = self.sink.clone();
        let worker_request = request.clone();

        let spawned = thread::Builder::new()
            .name(format!("asset-loader-{}", request.ticket.0))
            .spawn(move || run_request(&path, worker_request, sink));

        if let Err(e) = spawned {
            log::error!("Failed to spawn loader thread for {}: {}", request.url, e);
            self.sink.deliver(LoadEvent::finished(
                request.ticket,
                Err(LoadError::WorkerLost { url: request.url }),
            ));
        }
    }
}

fn run_request<S: LoadSink>(path: &Path, request: LoadRequest, sink: S) {
    let ticket = request.ticket;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let bytes = read_with_progress(path, &request, &sink)?;
        parse_model(&request.url, &bytes, path.parent())
    }))
    .unwrap_or_else(|_| {
        Err(LoadError::WorkerLost {
            url: request.url.clone(),
        })
    });

    sink.deliver(LoadEvent::finished(ticket, outcome));
}

/// Reads the whole file, reporting progress after every chunk
fn read_with_progress<S: LoadSink>(
    path: &Path,
    request: &LoadRequest,
    sink: &S,
) -> Result<Vec<u8>, LoadError> {
    let mut loaded = 0u64;
    let mut total = None;
    let io_error = |loaded, total, source| LoadError::Io {
        url: request.url.clone(),
        loaded,
        total,
        source,
    };

    let mut file = File::open(path).map_err(|e| io_error(loaded, total, e))?;
    total = file.metadata().ok().map(|metadata| metadata.len());

    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut chunk)
            .map_err(|e| io_error(loaded, total, e))?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        loaded += read as u64;
        sink.deliver(LoadEvent::progress(request.ticket, loaded, total));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{LoadEventKind, LoadTicket};
    use std::{sync::mpsc, time::Duration};

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("doorway-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn collect_until_finished(rx: &mpsc::Receiver<LoadEvent>) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            let event = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            let done = event.is_terminal();
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[test]
    fn missing_file_fails_with_url() {
        let (tx, rx) = mpsc::channel();
        let mut loader = ThreadedLoader::new(fixture_dir("missing"), tx);
        loader.load(LoadRequest {
            ticket: LoadTicket(3),
            url: "nowhere.glb".to_string(),
        });

        let events = collect_until_finished(&rx);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            LoadEventKind::Finished(Err(LoadError::Io { url, loaded, .. })) => {
                assert_eq!(url, "nowhere.glb");
                assert_eq!(*loaded, 0);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[0].ticket, LoadTicket(3));
    }

    #[test]
    fn progress_precedes_the_parsed_graph() {
        let dir = fixture_dir("obj");
        let source = "o Pyramid\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        std::fs::write(dir.join("door.obj"), source).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut loader = ThreadedLoader::new(&dir, tx);
        loader.load(LoadRequest {
            ticket: LoadTicket(1),
            url: "door.obj".to_string(),
        });

        let events = collect_until_finished(&rx);
        let (last, progress) = events.split_last().unwrap();
        assert!(!progress.is_empty());
        match progress.last().map(|e| &e.kind) {
            Some(LoadEventKind::Progress { loaded, total }) => {
                assert_eq!(*loaded, source.len() as u64);
                assert_eq!(*total, Some(source.len() as u64));
            }
            other => panic!("unexpected event {other:?}"),
        }
        match &last.kind {
            LoadEventKind::Finished(Ok(graph)) => assert!(graph.find_by_name("Pyramid").is_some()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unsupported_file_reports_format_error() {
        let dir = fixture_dir("fbx");
        std::fs::write(dir.join("room.fbx"), b"binary").unwrap();

        let (tx, rx) = mpsc::channel();
        let mut loader = ThreadedLoader::new(&dir, tx);
        loader.load(LoadRequest {
            ticket: LoadTicket(2),
            url: "room.fbx".to_string(),
        });

        let events = collect_until_finished(&rx);
        assert!(matches!(
            events.last().map(|e| &e.kind),
            Some(LoadEventKind::Finished(Err(LoadError::UnsupportedFormat { .. })))
        ));
    }
}
