use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::America::Toronto;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shabbat_clock::calendar::{CalendarFeed, FeedWindow, RawEvent};
use shabbat_clock::config::{Config, RestPeriodAuthority};
use shabbat_clock::display::ClockFace;
use shabbat_clock::engine::{DayKind, Engine, FeedHealth, StatusSource};
use shabbat_clock::error::{EngineError, EngineResult};
use shabbat_clock::time_source::{ManualTimeSource, TimeSource};

/// Feed that serves a fixed list and counts requests.
#[derive(Default)]
struct ScriptedFeed {
    items: Vec<RawEvent>,
    failing: AtomicBool,
    calls: AtomicUsize,
    windows: Mutex<Vec<FeedWindow>>,
}

impl ScriptedFeed {
    fn new(items: Vec<RawEvent>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn last_window(&self) -> Option<FeedWindow> {
        self.windows.lock().unwrap().last().copied()
    }
}

impl CalendarFeed for ScriptedFeed {
    fn fetch(&self, window: FeedWindow) -> impl Future<Output = EngineResult<Vec<RawEvent>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push(window);
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(EngineError::FeedUnavailable("scripted outage".to_string()))
        } else {
            Ok(self.items.clone())
        };
        async move { result }
    }

    fn describe(&self) -> String {
        "scripted feed".to_string()
    }
}

/// Vaughan, June 2024.
fn june_2024() -> Vec<RawEvent> {
    vec![
        RawEvent::new("Erev Shavuot", "holiday", "2024-06-11"),
        RawEvent::new("Candle lighting: 8:37pm", "candles", "2024-06-11T20:37:00-04:00"),
        RawEvent::new("Shavuot I", "holiday", "2024-06-12").yom_tov(),
        RawEvent::new("Candle lighting: 9:38pm", "candles", "2024-06-12T21:38:00-04:00"),
        RawEvent::new("Shavuot II", "holiday", "2024-06-13").yom_tov(),
        RawEvent::new("Havdalah: 9:39pm", "havdalah", "2024-06-13T21:39:00-04:00"),
        RawEvent::new("Candle lighting: 8:43pm", "candles", "2024-06-21T20:43:00-04:00"),
        RawEvent::new("Parashat Balak", "parashat", "2024-06-22"),
        RawEvent::new("Havdalah: 9:10pm", "havdalah", "2024-06-22T21:10:00-04:00"),
        RawEvent::new("Broken entry", "holiday", "sometime in June"),
        RawEvent::new("Rosh Chodesh Tamuz", "roshchodesh", "2024-07-06"),
        RawEvent::new("Rosh Chodesh Tamuz", "holiday", "2024-07-07"),
    ]
}

fn toronto(m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Toronto
        .with_ymd_and_hms(2024, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn engine_at(
    config: &Config,
    items: Vec<RawEvent>,
    start: DateTime<Utc>,
) -> (Engine<ScriptedFeed>, Arc<ManualTimeSource>) {
    let clock = Arc::new(ManualTimeSource::new(start));
    let engine = Engine::new(config, ScriptedFeed::new(items), clock.clone());
    (engine, clock)
}

fn feed(engine: &Engine<ScriptedFeed>) -> &ScriptedFeed {
    engine.fetcher().feed()
}

#[tokio::test]
async fn test_saturday_evening_before_havdalah() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 22, 20, 0));
    let now = engine.now();

    let state = engine.classify_day(now).await.unwrap();
    assert_eq!(state.kind, DayKind::Shabbat);
    assert_eq!(state.label.as_deref(), Some("Parashat Balak"));
    assert!(state.rest_period);

    let boundary = engine.resolve_boundary(now).await.unwrap();
    assert!(boundary.candle_lighting.is_none());
    assert_eq!(boundary.havdalah.unwrap().title(), "Havdalah: 9:10pm");
    assert_eq!(boundary.effective_day, NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());

    let face = ClockFace::compose(&engine.tick().await);
    assert_eq!(face.date_line, "Shabbat Shalom");
    assert_eq!(face.info_line.as_deref(), Some("Shabbat Ends: 9:10 PM"));
    assert!(face.highlighted);
}

#[tokio::test]
async fn test_saturday_after_havdalah_rolls_over_to_empty_sunday() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 22, 21, 15));
    let now = engine.now();

    let boundary = engine.resolve_boundary(now).await.unwrap();
    assert!(boundary.is_empty());
    assert_eq!(boundary.effective_day, NaiveDate::from_ymd_opt(2024, 6, 23).unwrap());

    // The classifier still sees Saturday's Shabbat event
    let state = engine.classify_day(now).await.unwrap();
    assert_eq!(state.kind, DayKind::Shabbat);

    let status = engine.tick().await;
    assert!(status.state.rest_period);
    assert!(status.state.boundary.is_none());
}

#[tokio::test]
async fn test_boundary_authority_ends_rest_period_after_havdalah() {
    let config = Config {
        rest_period_authority: Some(RestPeriodAuthority::Boundary),
        ..Config::default()
    };

    let (engine, clock) = engine_at(&config, june_2024(), toronto(6, 22, 20, 0));
    assert!(engine.tick().await.state.rest_period);

    clock.set(toronto(6, 22, 21, 15));
    let status = engine.tick().await;
    assert_eq!(status.state.kind, DayKind::Shabbat);
    assert!(!status.state.rest_period);
}

#[tokio::test]
async fn test_friday_after_candle_lighting_looks_at_saturday() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 21, 20, 43));
    let now = engine.now();

    let boundary = engine.resolve_boundary(now).await.unwrap();
    let saturday = NaiveDate::from_ymd_opt(2024, 6, 22).unwrap();
    assert_eq!(boundary.effective_day, saturday);
    assert!(boundary.candle_lighting.is_none());
    assert_eq!(boundary.havdalah.unwrap().date(), saturday);
}

#[tokio::test]
async fn test_friday_afternoon_shows_shabbat_start() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 21, 15, 0));
    let face = ClockFace::compose(&engine.tick().await);
    assert_eq!(face.date_line, "Friday, June 21, 2024");
    assert_eq!(face.info_line.as_deref(), Some("Shabbat Starts: 8:43 PM"));
    assert!(!face.highlighted);
}

#[tokio::test]
async fn test_yom_tov_and_erev_yom_tov() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 11, 10, 0));

    let status = engine.tick().await;
    assert_eq!(status.state.kind, DayKind::Holiday);
    assert!(!status.state.rest_period);
    let face = ClockFace::compose(&status);
    assert_eq!(face.date_line, "Tuesday, June 11, 2024 · Erev Shavuot");
    assert_eq!(face.info_line.as_deref(), Some("Candle Lighting: 8:37 PM"));

    clock.set(toronto(6, 12, 10, 0));
    let status = engine.tick().await;
    assert_eq!(status.state.kind, DayKind::YomTov);
    assert!(status.state.rest_period);
    let face = ClockFace::compose(&status);
    assert_eq!(face.date_line, "Chag Sameach · Shavuot I");
    assert_eq!(face.info_line.as_deref(), Some("Candle Lighting: 9:38 PM"));
}

#[tokio::test]
async fn test_unmapped_category_is_ignored() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(7, 6, 10, 0));
    let state = engine.classify_day(engine.now()).await.unwrap();
    assert_eq!(state.kind, DayKind::Weekday);
}

#[tokio::test]
async fn test_fetch_within_ttl_is_shared() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 20, 9, 0));
    let fetcher = engine.fetcher();

    let first = fetcher.fetch_events(engine.now(), clock.now()).await.unwrap();
    clock.advance(TimeDelta::minutes(4));
    let second = fetcher.fetch_events(engine.now(), clock.now()).await.unwrap();

    assert!(Arc::ptr_eq(&first.events, &second.events));
    assert!(!second.stale);
    assert_eq!(feed(&engine).calls(), 1);
    // The malformed entry is dropped, the rest kept
    assert_eq!(first.events.len(), june_2024().len() - 1);
}

#[tokio::test]
async fn test_fetch_after_ttl_hits_the_feed() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 20, 9, 0));

    engine.tick().await;
    engine.tick().await;
    assert_eq!(feed(&engine).calls(), 1);

    clock.advance(TimeDelta::minutes(5));
    engine.tick().await;
    assert_eq!(feed(&engine).calls(), 2);
}

#[tokio::test]
async fn test_day_filter_is_idempotent_within_ttl() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 22, 12, 0));
    let fetcher = engine.fetcher();

    let first = fetcher.events_on_day(engine.now(), clock.now()).await.unwrap();
    let second = fetcher.events_on_day(engine.now(), clock.now()).await.unwrap();

    assert!(Arc::ptr_eq(&first.events, &second.events));
    let titles: Vec<&str> = first.events.iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec!["Parashat Balak", "Havdalah: 9:10pm"]);
}

#[tokio::test]
async fn test_failed_refresh_serves_stale_and_retries() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 22, 12, 0));
    let fetcher = engine.fetcher();

    let fresh = fetcher.fetch_events(engine.now(), clock.now()).await.unwrap();
    feed(&engine).set_failing(true);
    clock.advance(TimeDelta::minutes(6));

    let stale = fetcher.fetch_events(engine.now(), clock.now()).await.unwrap();
    assert!(stale.stale);
    assert!(Arc::ptr_eq(&fresh.events, &stale.events));
    assert_eq!(feed(&engine).calls(), 2);

    // Still invalid, so the next read tries again
    fetcher.fetch_events(engine.now(), clock.now()).await.unwrap();
    assert_eq!(feed(&engine).calls(), 3);

    let status = engine.tick().await;
    assert!(status.is_stale());
    assert_eq!(status.state.kind, DayKind::Shabbat);
    assert!(ClockFace::compose(&status).degraded);
}

#[tokio::test]
async fn test_offset_outside_window_forces_refetch() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 1, 9, 0));

    engine.tick().await;
    assert_eq!(feed(&engine).calls(), 1);
    assert_eq!(
        feed(&engine).last_window().unwrap().start,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    );

    // 40 days later is past the cached month
    engine.set_offset(40 * 24 * 60 * 60 * 1000);
    let status = engine.tick().await;
    assert_eq!(status.now.date_naive(), NaiveDate::from_ymd_opt(2024, 7, 11).unwrap());
    assert_eq!(feed(&engine).calls(), 2);
    assert_eq!(
        feed(&engine).last_window().unwrap().start,
        NaiveDate::from_ymd_opt(2024, 7, 11).unwrap()
    );

    engine.reset_offset();
    assert_eq!(engine.offset(), 0);
}

#[tokio::test]
async fn test_offset_within_window_uses_cache() {
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), toronto(6, 20, 9, 0));

    engine.tick().await;
    assert_eq!(engine.adjust_offset(2 * 24 * 60 * 60 * 1000), 2 * 24 * 60 * 60 * 1000);
    let status = engine.tick().await;

    assert_eq!(status.state.kind, DayKind::Shabbat);
    assert_eq!(feed(&engine).calls(), 1);
}

#[tokio::test]
async fn test_unrepresentable_offset_keeps_ticking_at_real_time() {
    let start = toronto(6, 20, 9, 0);
    let (engine, _clock) = engine_at(&Config::default(), june_2024(), start);

    engine.set_offset(1_000_000_000_000 * 60_000);
    let status = engine.tick().await;
    assert_eq!(status.now.with_timezone(&Utc), start);

    assert_eq!(engine.adjust_offset(i64::MAX), i64::MAX);
    assert_eq!(engine.now().with_timezone(&Utc), start);
}

#[tokio::test]
async fn test_rollover_on_spring_forward_night_reaches_next_day() {
    // 2024-03-10 is 23 hours long in Toronto
    let items = vec![
        RawEvent::new("Havdalah: 7:05pm", "havdalah", "2024-03-09T19:05:00-05:00"),
        RawEvent::new("Candle lighting: 7:00pm", "candles", "2024-03-10T19:00:00-04:00"),
    ];
    let (engine, _clock) = engine_at(&Config::default(), items, toronto(3, 9, 23, 30));

    let boundary = engine.resolve_boundary(engine.now()).await.unwrap();
    assert_eq!(boundary.effective_day, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    assert_eq!(
        boundary.candle_lighting.unwrap().title(),
        "Candle lighting: 7:00pm"
    );
}

#[tokio::test]
async fn test_rollover_on_fall_back_day_leaves_the_day() {
    // 2024-11-03 is 25 hours long in Toronto; 24h later is still the 3rd
    let items = vec![
        RawEvent::new("Candle lighting", "candles", "2024-11-03"),
        RawEvent::new("Havdalah: 6:00pm", "havdalah", "2024-11-04T18:00:00-05:00"),
    ];
    let (engine, _clock) = engine_at(&Config::default(), items, toronto(11, 3, 0, 30));

    let boundary = engine.resolve_boundary(engine.now()).await.unwrap();
    assert_eq!(boundary.effective_day, NaiveDate::from_ymd_opt(2024, 11, 4).unwrap());
    assert!(boundary.candle_lighting.is_none());
    assert_eq!(boundary.havdalah.unwrap().title(), "Havdalah: 6:00pm");
}

#[tokio::test]
async fn test_solar_fallback_and_recovery() {
    let (engine, clock) = engine_at(&Config::default(), june_2024(), toronto(6, 22, 12, 0));
    feed(&engine).set_failing(true);

    let status = engine.tick().await;
    assert_eq!(status.source, StatusSource::Solar);
    assert_eq!(status.state.kind, DayKind::Shabbat);
    assert_eq!(
        status.state.boundary.as_ref().map(|b| b.title()),
        Some("Shabbat Ends")
    );
    assert_eq!(engine.health(), FeedHealth::Degraded);

    // Nothing was cached, so every tick retries
    clock.advance(TimeDelta::seconds(1));
    engine.tick().await;
    assert_eq!(feed(&engine).calls(), 2);

    feed(&engine).set_failing(false);
    clock.advance(TimeDelta::seconds(1));
    let status = engine.tick().await;
    assert_eq!(status.source, StatusSource::Calendar { stale: false });
    assert_eq!(status.state.label.as_deref(), Some("Parashat Balak"));
    assert_eq!(engine.health(), FeedHealth::Healthy);
}

#[tokio::test]
async fn test_solar_fallback_on_a_weekday_is_neutral() {
    let (engine, _clock) = engine_at(&Config::default(), Vec::new(), toronto(6, 18, 12, 0));
    feed(&engine).set_failing(true);

    let status = engine.tick().await;
    assert_eq!(status.source, StatusSource::Solar);
    assert_eq!(status.state.kind, DayKind::Weekday);
    assert!(status.state.boundary.is_none());
}

#[tokio::test]
async fn test_date_only_candle_lighting() {
    let items = vec![RawEvent::new("Candle lighting", "candles", "2024-06-21")];
    let (engine, clock) = engine_at(&Config::default(), items, toronto(6, 20, 23, 0));

    let snapshot = engine
        .fetcher()
        .fetch_events(engine.now(), clock.now())
        .await
        .unwrap();
    let event = &snapshot.events[0];
    assert!(event.is_candle_lighting());
    assert!(!event.has_time());
    assert_eq!(
        event.instant(),
        Toronto.with_ymd_and_hms(2024, 6, 21, 0, 0, 1).unwrap()
    );

    // Thursday night: nothing today, so nothing shown yet
    let boundary = engine.resolve_boundary(engine.now()).await.unwrap();
    assert!(boundary.is_empty());
}
