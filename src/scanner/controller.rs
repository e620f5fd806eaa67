//! Control surface over the scan loop: start, pause/resume, stop, and
//! read-only counters. The loop runs on its own task so a host's main
//! thread stays free for control-plane work.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::detect::CompositeDetector;
use crate::exec::InputBackend;
use crate::notify::NotificationSink;
use crate::ocr::{TextExtractor, TextRecognizer};
use crate::window::{WindowFilter, WindowService};

use super::loop_worker::{scan_loop, ScanContext, ScanStats};

pub struct ScanController {
    windows: Arc<dyn WindowService>,
    recognizer: Arc<dyn TextRecognizer>,
    input: Arc<dyn InputBackend>,
    sink: Arc<dyn NotificationSink>,
    config: Arc<Config>,
    stats: Arc<ScanStats>,

    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    pause_tx: Option<watch::Sender<bool>>,
}

impl ScanController {
    pub fn new(
        windows: Arc<dyn WindowService>,
        recognizer: Arc<dyn TextRecognizer>,
        input: Arc<dyn InputBackend>,
        sink: Arc<dyn NotificationSink>,
        config: Config,
    ) -> Self {
        Self {
            windows,
            recognizer,
            input,
            sink,
            config: Arc::new(config),
            stats: Arc::new(ScanStats::default()),
            handle: None,
            cancel_token: None,
            pause_tx: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("scan loop already active");
        }

        let ctx = ScanContext {
            windows: Arc::clone(&self.windows),
            extractor: Arc::new(TextExtractor::new(
                Arc::clone(&self.recognizer),
                self.config.ocr.clone(),
            )),
            detector: CompositeDetector::new(&self.config.patterns),
            input: Arc::clone(&self.input),
            sink: Arc::clone(&self.sink),
            filter: WindowFilter::new(self.config.filters.clone()),
            config: Arc::clone(&self.config),
            stats: Arc::clone(&self.stats),
        };

        let cancel_token = CancellationToken::new();
        let (pause_tx, pause_rx) = watch::channel(false);

        let handle = tokio::spawn(scan_loop(ctx, cancel_token.clone(), pause_rx));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.pause_tx = Some(pause_tx);
        info!(
            "scan loop started (interval {}s, cooldown {}s)",
            self.config.timing.scan_interval_secs, self.config.timing.cooldown_secs
        );
        Ok(())
    }

    /// The loop keeps ticking while paused but does no processing.
    pub fn pause(&self) {
        if let Some(tx) = &self.pause_tx {
            let _ = tx.send(true);
            info!("scanning paused");
        }
    }

    pub fn resume(&self) {
        if let Some(tx) = &self.pause_tx {
            let _ = tx.send(false);
            info!("scanning resumed");
        }
    }

    /// Cancel the loop and join it. Observed at the next tick or during any
    /// sleep; in-flight capture or recognition runs to completion.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.pause_tx = None;

        if let Some(handle) = self.handle.take() {
            handle.await.context("scan loop task failed to join")?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_tx
            .as_ref()
            .map(|tx| *tx.borrow())
            .unwrap_or(false)
    }

    pub fn approval_count(&self) -> u64 {
        self.stats.approval_count()
    }

    pub fn check_count(&self) -> u64 {
        self.stats.check_count()
    }
}
