//! Background image preloading.
//!
//! `ImageCache` owns a worker thread that fetches and decodes image references
//! handed to it by [`AnnotationStore::set_annotation_set`](super::AnnotationStore::set_annotation_set).
//! Requests never block the caller; the renderer polls for settled images.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use web_time::Instant;

use super::store::Preloader;
use crate::error::{AnnotatorError, Result};

/// Load state of one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// Requested, not settled yet
    Pending,
    /// Decoded successfully
    Loaded { width: u32, height: u32 },
    /// Fetch or decode failed. Requesting the source again retries it.
    Failed(String),
}

impl ImageStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ImageStatus::Pending)
    }
}

/// Resolves an image reference to its pixel dimensions.
///
/// Runs on the cache's worker thread.
pub trait ImageFetcher: Send + 'static {
    fn fetch(&self, source: &str) -> Result<(u32, u32)>;
}

impl<F> ImageFetcher for F
where
    F: Fn(&str) -> Result<(u32, u32)> + Send + 'static,
{
    fn fetch(&self, source: &str) -> Result<(u32, u32)> {
        self(source)
    }
}

/// Reads the reference as a filesystem path. Only the image header is parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ImageFetcher for FileFetcher {
    fn fetch(&self, source: &str) -> Result<(u32, u32)> {
        image::ImageReader::open(source)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| AnnotatorError::decode(source, e.to_string()))
    }
}

/// Message sent to the worker thread.
enum ThreadMessage {
    Fetch(String),
    Shutdown,
}

/// Settled fetch sent back from the worker thread.
struct FetchResult {
    source: String,
    result: Result<(u32, u32)>,
}

/// Cache of image load states keyed by image reference.
pub struct ImageCache {
    statuses: HashMap<String, ImageStatus>,
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<FetchResult>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ImageCache {
    /// Spawn a cache that loads images from the filesystem.
    pub fn new() -> Result<Self> {
        Self::with_fetcher(FileFetcher)
    }

    /// Spawn a cache with a custom fetcher.
    pub fn with_fetcher(fetcher: impl ImageFetcher) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<FetchResult>();

        let thread_handle = thread::Builder::new()
            .name("image-preload".to_string())
            .spawn(move || {
                log::debug!("Image preload thread started");
                Self::thread_loop(fetcher, request_rx, result_tx);
                log::debug!("Image preload thread exiting");
            })?;

        Ok(Self {
            statuses: HashMap::new(),
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
        })
    }

    fn thread_loop(
        fetcher: impl ImageFetcher,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<FetchResult>,
    ) {
        while let Ok(ThreadMessage::Fetch(source)) = request_rx.recv() {
            let result = fetcher.fetch(&source);
            if result_tx.send(FetchResult { source, result }).is_err() {
                log::warn!("Result channel closed, preload thread exiting");
                break;
            }
        }
    }

    /// Queue a source for loading.
    ///
    /// Pending and loaded sources are left alone; failed ones are retried.
    pub fn request(&mut self, source: &str) {
        match self.statuses.get(source) {
            Some(ImageStatus::Pending) | Some(ImageStatus::Loaded { .. }) => return,
            Some(ImageStatus::Failed(_)) => log::debug!("Retrying preload of {}", source),
            None => {}
        }

        if self
            .request_tx
            .send(ThreadMessage::Fetch(source.to_string()))
            .is_err()
        {
            log::error!("Failed to queue preload of {}: worker gone", source);
            self.statuses.insert(
                source.to_string(),
                ImageStatus::Failed("preload worker is not running".to_string()),
            );
            return;
        }
        self.statuses
            .insert(source.to_string(), ImageStatus::Pending);
    }

    /// Current state of a source, `None` if it was never requested.
    pub fn status(&self, source: &str) -> Option<&ImageStatus> {
        self.statuses.get(source)
    }

    /// Number of requests not settled yet.
    pub fn pending_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| !s.is_settled())
            .count()
    }

    /// Drain settled results without blocking.
    ///
    /// Returns the sources that settled since the last call with their new state.
    pub fn poll(&mut self) -> Vec<(String, ImageStatus)> {
        let mut settled = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(result) => settled.push(self.record(result)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Image preload thread disconnected");
                    break;
                }
            }
        }
        settled
    }

    /// Block until `source` settles or `timeout` elapses.
    ///
    /// Results for other sources that arrive in the meantime are recorded too.
    pub fn wait_for(&mut self, source: &str, timeout: Duration) -> Option<ImageStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.statuses.get(source) {
                None => return None,
                Some(status) if status.is_settled() => return Some(status.clone()),
                Some(_) => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.statuses.get(source).cloned();
            }
            match self.result_rx.recv_timeout(remaining) {
                Ok(result) => {
                    self.record(result);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Image preload thread disconnected");
                    return self.statuses.get(source).cloned();
                }
            }
        }
    }

    fn record(&mut self, result: FetchResult) -> (String, ImageStatus) {
        let status = match result.result {
            Ok((width, height)) => {
                log::debug!("Preloaded {} ({}x{})", result.source, width, height);
                ImageStatus::Loaded { width, height }
            }
            Err(e) => {
                log::error!("Failed to preload {}: {}", result.source, e);
                ImageStatus::Failed(e.to_string())
            }
        };
        self.statuses.insert(result.source.clone(), status.clone());
        (result.source, status)
    }
}

impl Preloader for ImageCache {
    fn preload(&mut self, source: &str) {
        self.request(source);
    }
}

impl Drop for ImageCache {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("Image preload thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}
