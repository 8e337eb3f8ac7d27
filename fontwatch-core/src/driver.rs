//! Timer driver — runs a [`FontWatch`] on a tokio interval.
//!
//! Single-threaded: the surface is borrowed for the whole run and the
//! callback is not `Send`, so drive it on a current-thread runtime or a
//! `LocalSet`. Other tasks on the same thread may touch the environment
//! between ticks (through a shared `Rc<RefCell<_>>` surface).

use std::future::Future;
use std::sync::Arc;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::baseline::BaselineCache;
use crate::error::WatchResult;
use crate::options::WatchOptions;
use crate::settle::Settlement;
use crate::surface::Surface;
use crate::watch::{FontWatch, Step};

/// Drive `watch` until it finalizes. Resolves to the same result the
/// callback received.
pub async fn drive<S, P>(watch: &mut FontWatch<S::Node, P>, surface: &mut S) -> WatchResult
where
    S: Surface,
    P: Settlement,
{
    drive_until(watch, surface, std::future::pending::<()>()).await
}

/// Like [`drive`], but cancels the run as soon as `cancelled` resolves.
pub async fn drive_until<S, P, C>(
    watch: &mut FontWatch<S::Node, P>,
    surface: &mut S,
    cancelled: C,
) -> WatchResult
where
    S: Surface,
    P: Settlement,
    C: Future<Output = ()>,
{
    tokio::pin!(cancelled);

    let mut step = watch.start(surface);
    let mut ticker: Option<Interval> = None;

    while let Step::Poll { after } = step {
        let ticker = ticker.get_or_insert_with(|| {
            let mut interval = time::interval_at(Instant::now() + after, after);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        tokio::select! {
            _ = ticker.tick() => {
                step = watch.tick(surface);
            }
            _ = &mut cancelled => {
                step = watch.cancel(surface);
            }
        }
    }

    watch.outcome().cloned().unwrap_or(Ok(()))
}

/// Watch `families` on `surface` and invoke `callback` once when every
/// family has settled or the attempt budget ran out.
///
/// `options` defaults to [`WatchOptions::default`].
pub async fn on_fonts_load<S, I, F, C>(
    surface: &mut S,
    families: I,
    callback: C,
    options: Option<WatchOptions>,
) -> WatchResult
where
    S: Surface,
    I: IntoIterator<Item = F>,
    F: Into<String>,
    C: FnOnce(WatchResult) + 'static,
{
    let mut watch = FontWatch::new(families)
        .with_options(options.unwrap_or_default())
        .on_complete(callback);
    drive(&mut watch, surface).await
}

/// [`on_fonts_load`] reusing a baseline shared with other runs.
pub async fn on_fonts_load_cached<S, I, F, C>(
    surface: &mut S,
    families: I,
    callback: C,
    options: Option<WatchOptions>,
    cache: Arc<BaselineCache>,
) -> WatchResult
where
    S: Surface,
    I: IntoIterator<Item = F>,
    F: Into<String>,
    C: FnOnce(WatchResult) + 'static,
{
    let mut watch = FontWatch::new(families)
        .with_options(options.unwrap_or_default())
        .with_baseline_cache(cache)
        .on_complete(callback);
    drive(&mut watch, surface).await
}
