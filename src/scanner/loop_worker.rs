//! The scan loop: one logical worker driving the whole pipeline. Sequential
//! per-window processing is intentional; recognition latency, not CPU, is
//! the bottleneck, and only one window can hold OS foreground focus anyway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::{interval, sleep, timeout, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::cooldown::CooldownTracker;
use crate::detect::CompositeDetector;
use crate::exec::InputBackend;
use crate::notify::{NotificationItem, NotificationSink};
use crate::ocr::{ExtractMode, ExtractedText, TextExtractor};
use crate::window::{WindowFilter, WindowId, WindowInfo, WindowService};

use super::phash::{compute_phash, hamming_distance};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Coarse keywords that make a non-matching text worth a debug excerpt.
const POTENTIAL_KEYWORDS: [&str; 5] = ["do you want", "would you", "proceed", "select", "choose"];

/// Read-only counters shared with the control surface.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub approvals: AtomicU64,
    pub checks: AtomicU64,
}

impl ScanStats {
    pub fn approval_count(&self) -> u64 {
        self.approvals.load(Ordering::Relaxed)
    }

    pub fn check_count(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

/// Everything the loop needs, wired once at `start()`.
pub(super) struct ScanContext {
    pub windows: Arc<dyn WindowService>,
    pub extractor: Arc<TextExtractor>,
    pub detector: CompositeDetector,
    pub input: Arc<dyn InputBackend>,
    pub sink: Arc<dyn NotificationSink>,
    pub filter: WindowFilter,
    pub config: Arc<Config>,
    pub stats: Arc<ScanStats>,
}

#[derive(Clone)]
struct GateEntry {
    phash: String,
    recognized_at: Instant,
}

/// Loop-owned mutable state; nothing here is shared across threads.
struct LoopState {
    cooldowns: CooldownTracker,
    gate: HashMap<WindowId, GateEntry>,
    pending: Vec<NotificationItem>,
}

impl LoopState {
    fn new(config: &Config) -> Self {
        Self {
            cooldowns: CooldownTracker::new(Duration::from_secs(config.timing.cooldown_secs)),
            gate: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

pub(super) async fn scan_loop(
    ctx: ScanContext,
    cancel: CancellationToken,
    pause: watch::Receiver<bool>,
) {
    let mut ticker = interval(Duration::from_secs(ctx.config.timing.scan_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = LoopState::new(&ctx.config);
    let status_every = Duration::from_secs(ctx.config.timing.status_interval_secs);
    let mut last_status = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *pause.borrow() {
                    continue;
                }

                if let Err(err) = run_cycle(&ctx, &mut state, &cancel).await {
                    log_error!("scan cycle failed: {err:#}");
                    let backoff = Duration::from_secs(ctx.config.timing.error_backoff_secs);
                    tokio::select! {
                        _ = sleep(backoff) => {}
                        _ = cancel.cancelled() => break,
                    }
                }

                if last_status.elapsed() >= status_every {
                    log_info!(
                        "[status] approvals={} checks={} tracked={}",
                        ctx.stats.approval_count(),
                        ctx.stats.check_count(),
                        state.cooldowns.tracked_windows()
                    );
                    last_status = Instant::now();
                }
            }
            _ = cancel.cancelled() => {
                log_info!("scan loop shutting down");
                break;
            }
        }
    }
}

/// One pass over every candidate window, followed by a notification flush.
async fn run_cycle(
    ctx: &ScanContext,
    state: &mut LoopState,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let service = Arc::clone(&ctx.windows);
    let windows = tokio::task::spawn_blocking(move || service.enumerate()).await?;

    let candidates: Vec<WindowInfo> = windows
        .into_iter()
        .filter(|w| ctx.filter.is_candidate(w))
        .collect();
    log_debug!("cycle: {} candidate window(s)", candidates.len());

    let per_window_budget = Duration::from_secs(ctx.config.timing.capture_timeout_secs);
    for window in candidates {
        if cancel.is_cancelled() {
            break;
        }
        ctx.stats.checks.fetch_add(1, Ordering::Relaxed);

        match timeout(per_window_budget, process_window(ctx, state, &window)).await {
            Ok(Ok(Some(item))) => state.pending.push(item),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => {
                // Transient acquisition failures recover by skipping.
                log_debug!("skipping \"{}\": {err:#}", window.title);
            }
            Err(_) => {
                log_warn!(
                    "window \"{}\" exceeded the {}s budget, skipping",
                    window.title,
                    per_window_budget.as_secs()
                );
            }
        }
    }

    flush_notifications(ctx, state);
    Ok(())
}

async fn process_window(
    ctx: &ScanContext,
    state: &mut LoopState,
    window: &WindowInfo,
) -> anyhow::Result<Option<NotificationItem>> {
    if !state.cooldowns.should_act(window.id) {
        return Ok(None);
    }

    let Some(extracted) = acquire_text(ctx, state, window).await? else {
        return Ok(None);
    };
    if extracted.text.is_empty() {
        return Ok(None);
    }

    let detection = ctx.detector.classify(&extracted.text);
    if !detection.is_approval {
        maybe_log_potential(&extracted, window);
        return Ok(None);
    }

    log_info!(
        "approval prompt in \"{}\" (pattern={}, confidence={:.2}), answering '{}'",
        window.title,
        detection.matched_pattern.as_deref().unwrap_or("?"),
        detection.confidence,
        detection.recommended_key
    );

    let input = Arc::clone(&ctx.input);
    let target = window.clone();
    let key = detection.recommended_key;
    let outcome =
        tokio::task::spawn_blocking(move || input.activate_and_send(&target, key)).await?;

    if !outcome.success {
        // No action happened, so the window stays cooldown-eligible.
        log_warn!(
            "keystroke failed for \"{}\": {}",
            window.title,
            outcome.error.as_deref().unwrap_or("unknown")
        );
        return Ok(None);
    }

    state.cooldowns.record_action(window.id);
    ctx.stats.approvals.fetch_add(1, Ordering::Relaxed);
    log_info!(
        "answered '{}' in \"{}\" (total {})",
        outcome.key_sent,
        window.title,
        ctx.stats.approval_count()
    );

    Ok(Some(NotificationItem::for_approval(
        &window.title,
        outcome.key_sent,
        &extracted.text,
    )))
}

/// Capture and recognize one window under `spawn_blocking`. The perceptual
/// hash gate skips recognition while the frame is visually unchanged,
/// unless the refresh interval has elapsed, so a noisy first read cannot
/// park a window forever.
async fn acquire_text(
    ctx: &ScanContext,
    state: &mut LoopState,
    window: &WindowInfo,
) -> anyhow::Result<Option<ExtractedText>> {
    let service = Arc::clone(&ctx.windows);
    let extractor = Arc::clone(&ctx.extractor);
    let prior = state.gate.get(&window.id).cloned();
    let threshold = ctx.config.ocr.phash_change_threshold;
    let refresh = Duration::from_secs(ctx.config.ocr.ocr_refresh_secs);
    let id = window.id;

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<(String, ExtractedText)>> {
        let Some(frame) = service.capture(id)? else {
            return Ok(None);
        };

        let phash = compute_phash(&frame.image);
        if let Some(prior) = prior {
            let unchanged = hamming_distance(&phash, &prior.phash) < threshold;
            if unchanged && prior.recognized_at.elapsed() < refresh {
                return Ok(None);
            }
        }

        let extracted = extractor.extract(&frame, ExtractMode::Fast);
        Ok(Some((phash, extracted)))
    })
    .await??;

    match result {
        Some((phash, extracted)) => {
            state.gate.insert(
                id,
                GateEntry {
                    phash,
                    recognized_at: Instant::now(),
                },
            );
            Ok(Some(extracted))
        }
        None => Ok(None),
    }
}

fn maybe_log_potential(extracted: &ExtractedText, window: &WindowInfo) {
    let lower = extracted.text.to_lowercase();
    if POTENTIAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        let excerpt: String = extracted.text.chars().take(120).collect();
        log_debug!(
            "\"{}\" has prompt-like wording but no approval pattern: {excerpt:?}",
            window.title
        );
    }
}

fn flush_notifications(ctx: &ScanContext, state: &mut LoopState) {
    if state.pending.is_empty() {
        return;
    }
    log_debug!("flushing {} notification(s)", state.pending.len());
    for item in state.pending.drain(..) {
        if !ctx.sink.show(&item) {
            log_warn!("notification for \"{}\" was not shown", item.window_title);
        }
    }
}
