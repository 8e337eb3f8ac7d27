//! Timer-driven end-to-end runs under tokio's paused clock.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use common::ScheduledSurface;
use fontwatch_core::{
    drive_until, on_fonts_load, on_fonts_load_cached, BaselineCache, FontWatch, FontsNotLoaded,
    WatchOptions, WatchResult,
};
use tokio::time::{Duration, Instant};

/// Callback that records how often it ran and with what.
fn recorder() -> (Rc<Cell<u32>>, Rc<RefCell<Option<WatchResult>>>, impl FnOnce(WatchResult)) {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(None));
    let (c, s) = (calls.clone(), seen.clone());
    (calls, seen, move |result| {
        c.set(c.get() + 1);
        *s.borrow_mut() = Some(result);
    })
}

#[tokio::test(start_paused = true)]
async fn test_font_settles_after_two_ticks() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    surface.load_at("MyWebFont", start + Duration::from_millis(500));
    let (calls, seen, cb) = recorder();

    let options = WatchOptions::default()
        .with_max_num_of_tries(5)
        .with_try_interval_ms(250);
    let result = on_fonts_load(&mut surface, ["MyWebFont"], cb, Some(options)).await;

    assert_eq!(result, Ok(()));
    assert_eq!(calls.get(), 1);
    assert_eq!(*seen.borrow(), Some(Ok(())));
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(start.elapsed() < Duration::from_millis(750));
    assert_eq!(surface.live_nodes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_never_loading_font_times_out() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    let (calls, seen, cb) = recorder();

    let options = WatchOptions::from_json(r#"{"maxNumOfTries": 3, "tryIntervalMs": 100}"#).unwrap();
    let result = on_fonts_load(&mut surface, ["MyWebFont"], cb, Some(options)).await;

    let expected = FontsNotLoaded::new(vec!["MyWebFont".into()]);
    assert_eq!(result, Err(expected.clone()));
    assert_eq!(*seen.borrow(), Some(Err(expected)));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(surface.live_nodes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_already_loaded_needs_no_tick() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    surface.load_at("Inter", start);
    surface.load_at("Lobster", start);
    let (calls, _, cb) = recorder();

    let result = on_fonts_load(&mut surface, ["Inter", "Lobster"], cb, None).await;

    assert_eq!(result, Ok(()));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(surface.live_nodes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_request_succeeds_immediately() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    let (calls, _, cb) = recorder();

    let result = on_fonts_load(&mut surface, Vec::<String>::new(), cb, None).await;

    assert_eq!(result, Ok(()));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(surface.containers_created, 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_tries_never_polls() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    surface.load_at("Late", start + Duration::from_millis(10));
    let (calls, _, cb) = recorder();

    let options = WatchOptions::default().with_max_num_of_tries(0);
    let result = on_fonts_load(&mut surface, ["Late"], cb, Some(options)).await;

    assert_eq!(result, Err(FontsNotLoaded::new(vec!["Late".into()])));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_lists_only_missing_in_request_order() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    surface.load_at("Loaded", start + Duration::from_millis(100));

    let options = WatchOptions::default()
        .with_max_num_of_tries(4)
        .with_try_interval_ms(50);
    let result = on_fonts_load(
        &mut surface,
        ["Broken One", "Loaded", "Broken Two", "Broken One"],
        |_| {},
        Some(options),
    )
    .await;

    assert_eq!(
        result,
        Err(FontsNotLoaded::new(vec![
            "Broken One".into(),
            "Broken Two".into(),
            "Broken One".into(),
        ]))
    );
    assert_eq!(start.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_runs_own_their_containers() {
    let start = Instant::now();
    let mut shared = ScheduledSurface::new();
    shared.load_at("Fast", start + Duration::from_millis(100));
    shared.load_at("Slow", start + Duration::from_millis(700));
    let surface = Rc::new(RefCell::new(shared));

    let (calls_a, _, cb_a) = recorder();
    let (calls_b, _, cb_b) = recorder();
    let mut handle_a = surface.clone();
    let mut handle_b = surface.clone();

    let (a, b) = tokio::join!(
        on_fonts_load(&mut handle_a, ["Fast"], cb_a, None),
        on_fonts_load(&mut handle_b, ["Slow"], cb_b, None),
    );

    assert_eq!(a, Ok(()));
    assert_eq!(b, Ok(()));
    assert_eq!(calls_a.get(), 1);
    assert_eq!(calls_b.get(), 1);
    assert_eq!(surface.borrow().containers_created, 2);
    assert_eq!(surface.borrow().live_nodes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shared_baseline_measured_once() {
    let mut surface = ScheduledSurface::new();
    let cache = Arc::new(BaselineCache::new());
    let options = WatchOptions::default().with_max_num_of_tries(1);

    for _ in 0..3 {
        let _ = on_fonts_load_cached(&mut surface, ["Missing"], |_| {}, Some(options.clone()), cache.clone()).await;
    }

    assert_eq!(surface.baseline_measurements, 1);
    assert!(cache.is_populated());
    assert_eq!(surface.live_nodes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_run_early() {
    let start = Instant::now();
    let mut surface = ScheduledSurface::new();
    let (calls, seen, cb) = recorder();
    let mut watch = FontWatch::new(["Never"]).on_complete(cb);

    let result = drive_until(
        &mut watch,
        &mut surface,
        tokio::time::sleep(Duration::from_millis(600)),
    )
    .await;

    assert_eq!(result, Err(FontsNotLoaded::new(vec!["Never".into()])));
    assert_eq!(*seen.borrow(), Some(result));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::from_millis(600));
    assert_eq!(watch.state().attempts, 2);
    assert_eq!(surface.live_nodes(), 0);
}
