use chrono::{Datelike, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use std::future::Future;
use std::sync::Arc;

use shabbat_clock::calendar::{CalendarEvent, CalendarFeed, CategoryMap, FeedWindow, RawEvent};
use shabbat_clock::config::Config;
use shabbat_clock::engine::{DayKind, Engine, classify_events};
use shabbat_clock::error::EngineResult;
use shabbat_clock::time_source::ManualTimeSource;

/// Feed that always answers with the same items.
struct FixedFeed(Vec<RawEvent>);

impl CalendarFeed for FixedFeed {
    fn fetch(&self, _window: FeedWindow) -> impl Future<Output = EngineResult<Vec<RawEvent>>> + Send {
        let items = self.0.clone();
        async move { Ok(items) }
    }

    fn describe(&self) -> String {
        "fixed feed".to_string()
    }
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn timezone_strategy() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(chrono_tz::America::Toronto),
        Just(chrono_tz::Europe::London),
        Just(chrono_tz::Asia::Jerusalem),
        Just(chrono_tz::Australia::Melbourne),
    ]
}

fn category_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("holiday"),
        Just("parashat"),
        Just("candles"),
        Just("havdalah"),
        Just("omer"),
        Just("roshchodesh"),
    ]
}

proptest! {
    /// Bare dates always land one second after local midnight.
    #[test]
    fn date_only_is_one_second_past_midnight(date in date_strategy(), tz in timezone_strategy()) {
        let raw = RawEvent::new("Candle lighting", "candles", &date.format("%Y-%m-%d").to_string());
        let event = CalendarEvent::classify(&raw, &CategoryMap::default(), tz).unwrap();

        prop_assert_eq!(event.date(), date);
        prop_assert_eq!(event.instant().hour(), 0);
        prop_assert_eq!(event.instant().minute(), 0);
        prop_assert_eq!(event.instant().second(), 1);
        prop_assert!(!event.has_time());
    }

    /// A Yom Tov event anywhere in the day outranks plain holidays and Shabbat.
    #[test]
    fn yom_tov_wins_regardless_of_order(
        others in prop::collection::vec(category_strategy(), 0..6),
        position in 0usize..7,
    ) {
        let tz = chrono_tz::America::Toronto;
        let map = CategoryMap::default();
        let mut raws: Vec<RawEvent> = others
            .iter()
            .enumerate()
            .map(|(i, category)| RawEvent::new(&format!("event {i}"), category, "2024-06-12"))
            .collect();
        raws.push(RawEvent::new("Plain holiday", "holiday", "2024-06-12"));
        let at = position.min(raws.len());
        raws.insert(at, RawEvent::new("Shavuot I", "holiday", "2024-06-12").yom_tov());

        let events: Vec<CalendarEvent> = raws
            .iter()
            .map(|raw| CalendarEvent::classify(raw, &map, tz).unwrap())
            .collect();
        let state = classify_events(&events);

        prop_assert_eq!(state.kind, DayKind::YomTov);
        prop_assert_eq!(state.label.as_deref(), Some("Shavuot I"));
        prop_assert!(state.rest_period);
    }

    /// Once today's candle lighting has passed, only the next day's boundaries are returned.
    #[test]
    fn elapsed_candle_lighting_rolls_over(
        date in date_strategy(),
        candle_minute in (17 * 60u32)..(21 * 60),
        elapsed_minutes in 0i64..(2 * 60),
        tomorrow_has_havdalah in any::<bool>(),
    ) {
        let tz = chrono_tz::America::Toronto;
        let candles = tz
            .with_ymd_and_hms(date.year(), date.month(), date.day(), candle_minute / 60, candle_minute % 60, 0)
            .single()
            .unwrap();
        let tomorrow = date.succ_opt().unwrap();
        let havdalah = candles + TimeDelta::days(1) + TimeDelta::minutes(65);

        let mut items = vec![RawEvent::new("Candle lighting", "candles", &candles.to_rfc3339())];
        if tomorrow_has_havdalah {
            items.push(RawEvent::new("Havdalah", "havdalah", &havdalah.to_rfc3339()));
        }

        let now = candles + TimeDelta::minutes(elapsed_minutes);
        let clock = Arc::new(ManualTimeSource::new(now.with_timezone(&Utc)));
        let engine = Engine::new(&Config::default(), FixedFeed(items), clock);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let boundary = runtime.block_on(engine.resolve_boundary(engine.now())).unwrap();

        prop_assert_eq!(boundary.effective_day, tomorrow);
        prop_assert!(boundary.candle_lighting.is_none());
        match boundary.havdalah {
            Some(event) => {
                prop_assert!(tomorrow_has_havdalah);
                prop_assert_eq!(event.date(), tomorrow);
                prop_assert!(event.instant() > now);
            }
            None => prop_assert!(!tomorrow_has_havdalah),
        }
    }
}
