//! Refresh engine.
//!
//! The engine owns the active roots, the settings, the document overlay and
//! the latest [`Snapshot`]. Each refresh computes a brand-new snapshot on the
//! blocking pool and publishes it; readers only ever see complete snapshots.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use guardrail_api::ApiReport;
use guardrail_core::{Pass, RootDescriptor};
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info};

use crate::overlay::{DocumentOverlay, OverlayRoot};
use crate::settings::Settings;

/// One published refresh result
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Monotonic refresh counter; 0 before the first refresh
    pub version: u64,
    pub pass: Pass,
}

impl Snapshot {
    pub fn report(&self) -> ApiReport {
        ApiReport::from_pass(&self.pass, self.version)
    }
}

pub struct Engine {
    /// Latest snapshot
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    /// Sender for broadcasting snapshots to subscribers
    update_tx: watch::Sender<Arc<Snapshot>>,
    update_rx: watch::Receiver<Arc<Snapshot>>,
    roots: Arc<RwLock<Vec<RootDescriptor>>>,
    settings: Arc<RwLock<Settings>>,
    /// Unsaved editor buffers
    overlay: Arc<RwLock<DocumentOverlay>>,
    version: Arc<AtomicU64>,
}

impl Engine {
    /// Create an engine and run the first refresh.
    pub async fn new(settings: Settings, roots: Vec<RootDescriptor>) -> Result<Self> {
        let initial = Arc::new(Snapshot::default());
        let (update_tx, update_rx) = watch::channel(Arc::clone(&initial));

        let engine = Self {
            snapshot: Arc::new(RwLock::new(initial)),
            update_tx,
            update_rx,
            roots: Arc::new(RwLock::new(roots)),
            settings: Arc::new(RwLock::new(settings)),
            overlay: Arc::new(RwLock::new(DocumentOverlay::default())),
            version: Arc::new(AtomicU64::new(0)),
        };
        engine.refresh().await?;
        Ok(engine)
    }

    /// The latest published snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.update_rx.clone()
    }

    /// Number of refreshes started so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub async fn settings(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub async fn roots(&self) -> Vec<RootDescriptor> {
        self.roots.read().await.clone()
    }

    /// Replace the set of active roots and refresh.
    pub async fn set_roots(&self, roots: Vec<RootDescriptor>) -> Result<(u64, Duration)> {
        *self.roots.write().await = roots;
        self.refresh().await
    }

    /// Designate (or clear) the primary root and refresh.
    pub async fn set_primary_root(&self, primary_root: Option<PathBuf>) -> Result<(u64, Duration)> {
        self.settings.write().await.primary_root = primary_root;
        self.refresh().await
    }

    /// Register an open document (editor didOpen).
    pub async fn overlay_open(&self, path: PathBuf, content: String) {
        debug!(path = %path.display(), "overlay: opened");
        self.overlay.write().await.insert(path, content);
        if let Err(e) = self.refresh().await {
            error!("Refresh failed after overlay_open: {e:?}");
        }
    }

    /// Update an open document (editor didChange).
    pub async fn overlay_change(&self, path: PathBuf, content: String) {
        debug!(path = %path.display(), "overlay: changed");
        self.overlay.write().await.insert(path, content);
        if let Err(e) = self.refresh().await {
            error!("Refresh failed after overlay_change: {e:?}");
        }
    }

    /// Forget an open document (editor didClose); disk contents apply again.
    pub async fn overlay_close(&self, path: PathBuf) {
        debug!(path = %path.display(), "overlay: closed");
        self.overlay.write().await.remove(&path);
        if let Err(e) = self.refresh().await {
            error!("Refresh failed after overlay_close: {e:?}");
        }
    }

    /// Recompute everything from scratch and publish the result.
    ///
    /// Returns the version of the snapshot that is current afterwards and the
    /// time spent. When a refresh started later has already been published,
    /// this refresh's result is discarded.
    pub async fn refresh(&self) -> Result<(u64, Duration)> {
        let start = Instant::now();

        // Version first: every input written before this point is visible
        // to the reads below, so a higher version never sees older inputs.
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let settings = self.settings.read().await.clone();
        let roots = self.roots.read().await.clone();
        let overlay = self.overlay.read().await.clone();

        let pass = tokio::task::spawn_blocking(move || {
            let layout = settings.layout();
            Pass::compute_with(&roots, settings.primary_root.as_deref(), |descriptor| {
                OverlayRoot::new(descriptor.path.clone(), &layout, &overlay)
            })
        })
        .await
        .wrap_err("Coverage refresh did not complete")?;

        let snapshot = Arc::new(Snapshot { version, pass });
        {
            let mut current = self.snapshot.write().await;
            if current.version > version {
                debug!(
                    discarded = version,
                    current = current.version,
                    "newer snapshot already published"
                );
                return Ok((current.version, start.elapsed()));
            }
            *current = Arc::clone(&snapshot);
            // Broadcast under the lock so subscribers see versions in order.
            self.update_tx.send_replace(snapshot);
        }

        let elapsed = start.elapsed();
        info!("Refresh completed in {:?} (version {})", elapsed, version);
        Ok((version, elapsed))
    }
}
