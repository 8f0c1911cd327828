use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::{AssetError, CreatureAsset};

/// Starts asset imports on background threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssetLoader;

impl AssetLoader {
    /// Begin importing `path`; the returned handle is polled from the frame loop.
    pub fn spawn(path: impl AsRef<Path>) -> PendingAsset {
        let path: PathBuf = path.as_ref().to_path_buf();
        let source = path.display().to_string();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let fallback = tx.clone();

        let spawned = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = CreatureAsset::load(&path);
                // The receiver may be gone if the scene shut down first.
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            tracing::error!(%source, error = %e, "failed to start asset loader thread");
            let _ = fallback.send(Err(AssetError::Io(e)));
        }

        PendingAsset {
            source,
            rx,
            done: false,
        }
    }
}

/// A handle to an import in flight. Yields its result exactly once.
#[derive(Debug)]
pub struct PendingAsset {
    source: String,
    rx: Receiver<Result<CreatureAsset, AssetError>>,
    done: bool,
}

impl PendingAsset {
    /// A handle that is already resolved, for synchronous callers and tests.
    pub fn ready(source: impl Into<String>, result: Result<CreatureAsset, AssetError>) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _ = tx.send(result);
        Self {
            source: source.into(),
            rx,
            done: false,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True once the result has been handed out.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Non-blocking check. Returns `Some` once, then `None` forever.
    pub fn poll(&mut self) -> Option<Result<CreatureAsset, AssetError>> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(AssetError::LoaderVanished))
            }
        }
    }

    /// Block until the import finishes.
    pub fn wait(mut self) -> Result<CreatureAsset, AssetError> {
        if self.done {
            return Err(AssetError::LoaderVanished);
        }
        self.done = true;
        self.rx.recv().unwrap_or(Err(AssetError::LoaderVanished))
    }
}
