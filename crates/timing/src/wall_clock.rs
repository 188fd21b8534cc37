//! Wall-clock conversion and diffing with microsecond precision.
//!
//! Instants travel as text in one of two forms: the compact serialized form
//! (`1662625532.744800`, parsed with the `from` format) and the rendered form
//! (`2022-09-08 08:25:32.744800`, produced with the `to` format). Intervals are
//! computed between two rendered instants.
//!
//! Text carrying an epoch timestamp or an offset names one instant in every
//! zone. Zone-less local text that falls in a DST fold resolves to the earlier
//! of the two instants.

use chrono::format::{parse, Item, Parsed, StrftimeItems};
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::sync::Arc;

use crate::clock::{SystemWallClock, WallClock};
use crate::error::{TimingError, TimingResult};
use crate::format::{FormatOverrides, FormatRegistry, ResolvedFormats, EPOCH_FORMAT};
use crate::interval::Interval;

/// Result of one wall-clock measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Rendered start instant
    pub start: String,
    /// Rendered end instant
    pub ended: String,
    /// Rendered interval between the two
    pub took: String,
}

/// A [`DiffResult`] plus the exact instant it ended at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub diff: DiffResult,
    pub ended_at: DateTime<Utc>,
}

/// Look up an IANA time zone name.
pub fn parse_zone(name: &str) -> TimingResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| TimingError::UnknownTimeZone(name.to_string()))
}

/// Parse `input` with a strftime `format`, interpreting zone-less fields in `zone`.
pub fn parse_instant(input: &str, format: &str, zone: &Tz) -> TimingResult<DateTime<Tz>> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, input, StrftimeItems::new(format))
        .map_err(|_| TimingError::format(input, format))?;

    let instant = match (parsed.timestamp(), parsed.offset()) {
        (_, Some(_)) => parsed.to_datetime().ok().map(|dt| dt.with_timezone(zone)),
        (Some(_), None) => parsed
            .to_naive_datetime_with_offset(0)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(zone)),
        // Ambiguous local times take the earlier instant; skipped ones fail.
        (None, None) => parsed
            .to_naive_datetime_with_offset(0)
            .ok()
            .and_then(|naive| zone.from_local_datetime(&naive).earliest()),
    };

    instant.ok_or_else(|| TimingError::format(input, format))
}

/// Render an instant with a strftime `format`.
pub fn render_instant<T>(instant: &DateTime<T>, format: &str) -> TimingResult<String>
where
    T: TimeZone,
    T::Offset: fmt::Display,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(TimingError::pattern(format, "unsupported strftime directive"));
    }

    let mut out = String::new();
    write!(out, "{}", instant.format_with_items(items.iter()))
        .map_err(|_| TimingError::pattern(format, "cannot render this instant"))?;
    Ok(out)
}

/// Converts between serialized and rendered instants and diffs them.
#[derive(Debug, Clone)]
pub struct WallClockDiffEngine {
    formats: FormatRegistry,
    zone: Tz,
    clock: Arc<dyn WallClock>,
    request_start: String,
}

impl WallClockDiffEngine {
    /// Create an engine on the system clock, in UTC, with default formats.
    ///
    /// `request_start` is the serialized instant the current unit of work
    /// began; it is used whenever a measurement has no explicit start. See
    /// [`normalize_request_start`](Self::normalize_request_start).
    pub fn new(request_start: impl Into<String>) -> Self {
        Self {
            formats: FormatRegistry::new(),
            zone: Tz::UTC,
            clock: Arc::new(SystemWallClock),
            request_start: request_start.into(),
        }
    }

    /// Set the display time zone.
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    /// Replace the wall-clock source.
    pub fn with_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the format registry.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Mutable access to the defaults; changes persist for later calls.
    pub fn formats_mut(&mut self) -> &mut FormatRegistry {
        &mut self.formats
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn request_start(&self) -> &str {
        &self.request_start
    }

    /// Validate the request start and rewrite it in the active `from` format.
    ///
    /// Bare epoch seconds such as `1662625532` or `1662625532.7448` are
    /// accepted and padded to the serialized precision.
    pub fn normalize_request_start(&mut self) -> TimingResult<&str> {
        let from = self.formats.from_format();
        let instant = self.parse_serialized(&self.request_start, from)?;
        let normalized = render_instant(&instant, from)?;

        tracing::debug!(
            target: "timing::wall_clock",
            raw = %self.request_start,
            normalized = %normalized,
            "request start normalized"
        );
        self.request_start = normalized;
        Ok(self.request_start.as_str())
    }

    /// Serialize an instant with the active `from` format.
    pub fn serialize(&self, instant: DateTime<Utc>) -> TimingResult<String> {
        render_instant(&instant.with_timezone(&self.zone), self.formats.from_format())
    }

    /// Serialize the clock's current instant with the active `from` format.
    pub fn serialize_now(&self) -> TimingResult<String> {
        self.serialize(self.current())
    }

    /// Parse `serialized` with `from` and render it with `to`.
    ///
    /// Either format falls back to the registry default when `None`.
    pub fn parse_and_render(
        &self,
        serialized: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> TimingResult<String> {
        let from = from.unwrap_or(self.formats.from_format());
        let to = to.unwrap_or(self.formats.to_format());
        let instant = parse_instant(serialized, from, &self.zone)?;
        render_instant(&instant, to)
    }

    /// Render the current instant.
    pub fn now(&self, to: Option<&str>) -> TimingResult<String> {
        let to = to.unwrap_or(self.formats.to_format());
        render_instant(&self.current().with_timezone(&self.zone), to)
    }

    /// The clock's instant at microsecond precision.
    fn current(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    /// Parse a start token in `from`, falling back to bare epoch seconds.
    fn parse_serialized(&self, token: &str, from: &str) -> TimingResult<DateTime<Tz>> {
        parse_instant(token, from, &self.zone)
            .or_else(|err| parse_instant(token, EPOCH_FORMAT, &self.zone).map_err(|_| err))
    }

    /// Interval between two instants rendered in `parse_format`.
    pub fn interval(&self, a: &str, b: &str, parse_format: &str) -> TimingResult<Interval> {
        let a = parse_instant(a, parse_format, &self.zone)?;
        let b = parse_instant(b, parse_format, &self.zone)?;
        Ok(Interval::from_delta(b.signed_duration_since(a)))
    }

    /// Rendered interval from `a` to `b`, both in the active `to` format.
    ///
    /// The result is always a magnitude; callers order `a` before `b` for an
    /// "elapsed" reading.
    pub fn diff(&self, a: &str, b: &str, diff: Option<&str>) -> TimingResult<String> {
        let interval = self.interval(a, b, self.formats.to_format())?;
        interval.format(diff.unwrap_or(self.formats.diff_format()))
    }

    /// Measure from `start` (or the request start) to now.
    pub fn diff_to_now(
        &self,
        start: Option<&str>,
        overrides: &FormatOverrides,
    ) -> TimingResult<DiffResult> {
        self.measure_to_now(start, overrides)
            .map(|measurement| measurement.diff)
    }

    /// Like [`diff_to_now`](Self::diff_to_now), also returning the end instant.
    ///
    /// `took` is computed between the two instants, not their renderings, so
    /// it stays exact across DST folds and for `to` formats without a date.
    pub fn measure_to_now(
        &self,
        start: Option<&str>,
        overrides: &FormatOverrides,
    ) -> TimingResult<Measurement> {
        let formats = self.formats.resolve(overrides);
        let token = start.unwrap_or(self.request_start.as_str());

        let started_at = self.parse_serialized(token, formats.from)?;
        let ended_at = self.current().with_timezone(&self.zone);
        let diff = self.render_diff(&started_at, &ended_at, formats)?;

        tracing::trace!(
            target: "timing::wall_clock",
            start = %diff.start,
            ended = %diff.ended,
            took = %diff.took,
            "diff to now"
        );

        Ok(Measurement {
            diff,
            ended_at: ended_at.with_timezone(&Utc),
        })
    }

    fn render_diff(
        &self,
        started_at: &DateTime<Tz>,
        ended_at: &DateTime<Tz>,
        formats: ResolvedFormats<'_>,
    ) -> TimingResult<DiffResult> {
        let took = Interval::from_delta(ended_at.signed_duration_since(*started_at));
        Ok(DiffResult {
            start: render_instant(started_at, formats.to)?,
            ended: render_instant(ended_at, formats.to)?,
            took: took.format(formats.diff)?,
        })
    }

    /// Turn a rendered instant back into the compact serialized form.
    pub fn reserialize(&self, rendered: &str, overrides: &FormatOverrides) -> TimingResult<String> {
        let formats = self.formats.resolve(overrides);
        self.parse_and_render(rendered, Some(formats.to), Some(formats.from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualWallClock;
    use crate::error::ErrorKind;
    use chrono::TimeDelta;
    use proptest::prelude::*;

    const T0: &str = "1662625532.744800";

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_662_625_532, 744_800_000).unwrap()
    }

    fn engine_at(instant: DateTime<Utc>) -> (WallClockDiffEngine, ManualWallClock) {
        let clock = ManualWallClock::new(instant);
        let engine = WallClockDiffEngine::new(T0).with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_parse_and_render_default() {
        let (engine, _) = engine_at(t0());
        assert_eq!(
            engine.parse_and_render(T0, None, None).unwrap(),
            "2022-09-08 08:25:32.744800"
        );
    }

    #[test]
    fn test_parse_and_render_in_zone() {
        let (engine, _) = engine_at(t0());
        let engine = engine.with_zone(parse_zone("Europe/Berlin").unwrap());
        assert_eq!(
            engine.parse_and_render(T0, None, None).unwrap(),
            "2022-09-08 10:25:32.744800"
        );
        // Serialized form is zone independent
        assert_eq!(
            engine.parse_and_render(T0, None, Some("%s.%6f")).unwrap(),
            T0
        );
    }

    #[test]
    fn test_parse_and_render_override_formats() {
        let (engine, _) = engine_at(t0());
        let rendered = engine
            .parse_and_render("2022-09-08T08:25:32", Some("%Y-%m-%dT%H:%M:%S"), Some("%d.%m.%Y"))
            .unwrap();
        assert_eq!(rendered, "08.09.2022");

        // Overrides do not leak into the defaults
        assert_eq!(engine.formats().to_format(), crate::DATE_FORMAT);
    }

    #[test]
    fn test_parse_failure_names_input() {
        let (engine, _) = engine_at(t0());
        let err = engine.parse_and_render("not a time", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("not a time"));
    }

    #[test]
    fn test_render_with_bad_format() {
        let (engine, _) = engine_at(t0());
        let err = engine.parse_and_render(T0, None, Some("%Y %!")).unwrap_err();
        assert!(matches!(err, TimingError::InvalidPattern { .. }));
    }

    #[test]
    fn test_now_uses_clock() {
        let (engine, clock) = engine_at(t0());
        assert_eq!(engine.now(None).unwrap(), "2022-09-08 08:25:32.744800");

        clock.advance(TimeDelta::microseconds(5));
        assert_eq!(engine.now(None).unwrap(), "2022-09-08 08:25:32.744805");
        assert_eq!(engine.now(Some("%H:%M")).unwrap(), "08:25");
    }

    #[test]
    fn test_now_truncates_to_micros() {
        let (engine, _) = engine_at(t0() + TimeDelta::nanoseconds(999));
        assert_eq!(engine.now(None).unwrap(), "2022-09-08 08:25:32.744800");
    }

    #[test]
    fn test_diff() {
        let (engine, _) = engine_at(t0());
        let took = engine
            .diff("2022-09-08 08:25:32.744800", "2022-09-08 08:25:34.000000", None)
            .unwrap();
        assert_eq!(took, "1.255200");

        let took = engine
            .diff(
                "2022-09-08 08:25:32.744800",
                "2022-09-08 08:27:34.000000",
                Some("%I:%S.%F"),
            )
            .unwrap();
        assert_eq!(took, "02:01.255200");
    }

    #[test]
    fn test_diff_reversed_is_magnitude() {
        let (engine, _) = engine_at(t0());
        let took = engine
            .diff(
                "2022-09-08 08:25:34.000000",
                "2022-09-08 08:25:32.744800",
                Some("%R%T.%F"),
            )
            .unwrap();
        assert_eq!(took, "-1.255200");
    }

    #[test]
    fn test_diff_unparsable() {
        let (engine, _) = engine_at(t0());
        let err = engine
            .diff("2022-09-08 08:25:32.744800", "1662625532.744800", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("1662625532.744800"));
    }

    #[test]
    fn test_diff_to_now_from_request_start() {
        let (engine, _) = engine_at(t0() + TimeDelta::seconds(1));
        let result = engine.diff_to_now(None, &FormatOverrides::none()).unwrap();

        assert_eq!(result.start, "2022-09-08 08:25:32.744800");
        assert_eq!(result.ended, "2022-09-08 08:25:33.744800");
        assert_eq!(result.took, "1.000000");
    }

    #[test]
    fn test_diff_to_now_with_overrides() {
        let (engine, _) = engine_at(t0() + TimeDelta::milliseconds(2_500));
        let overrides = FormatOverrides::none()
            .with_to("%d.%m.%Y %H:%M:%S%.6f")
            .with_diff("%S.%F");
        let result = engine.diff_to_now(Some(T0), &overrides).unwrap();

        assert_eq!(result.start, "08.09.2022 08:25:32.744800");
        assert_eq!(result.ended, "08.09.2022 08:25:35.244800");
        assert_eq!(result.took, "02.500000");
    }

    #[test]
    fn test_diff_to_now_bad_request_start() {
        let clock = ManualWallClock::new(t0());
        let engine = WallClockDiffEngine::new("garbage").with_clock(clock);
        let err = engine.diff_to_now(None, &FormatOverrides::none()).unwrap_err();
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn test_reserialize() {
        let (engine, _) = engine_at(t0());
        let token = engine
            .reserialize("2022-09-08 08:25:32.744800", &FormatOverrides::none())
            .unwrap();
        assert_eq!(token, T0);
    }

    #[test]
    fn test_serialize_now() {
        let (engine, clock) = engine_at(t0());
        assert_eq!(engine.serialize_now().unwrap(), T0);
        clock.advance(TimeDelta::seconds(-1));
        assert_eq!(engine.serialize_now().unwrap(), "1662625531.744800");
    }

    fn new_york_at(instant: DateTime<Utc>, request_start: &str) -> WallClockDiffEngine {
        WallClockDiffEngine::new(request_start)
            .with_clock(ManualWallClock::new(instant))
            .with_zone(parse_zone("America/New_York").unwrap())
    }

    #[test]
    fn test_fold_hour_serialized_form() {
        // 2022-11-06 01:20 happens twice in New York: EDT, then EST.
        let first = DateTime::from_timestamp(1_667_712_000, 0).unwrap();
        let engine = new_york_at(first, "1667712000.000000");

        assert_eq!(
            engine.parse_and_render("1667712000.000000", None, None).unwrap(),
            "2022-11-06 01:20:00.000000"
        );
        assert_eq!(
            engine.parse_and_render("1667715600.000000", None, None).unwrap(),
            "2022-11-06 01:20:00.000000"
        );
        assert_eq!(engine.serialize_now().unwrap(), "1667712000.000000");
    }

    #[test]
    fn test_fold_hour_rendered_form_takes_earlier() {
        let first = DateTime::from_timestamp(1_667_712_000, 0).unwrap();
        let engine = new_york_at(first, "1667712000.000000");

        let token = engine
            .reserialize("2022-11-06 01:30:00.000000", &FormatOverrides::none())
            .unwrap();
        assert_eq!(token, "1667712600.000000");
    }

    #[test]
    fn test_skipped_local_time_rejected() {
        let (engine, _) = engine_at(t0());
        let engine = engine.with_zone(parse_zone("America/New_York").unwrap());
        let err = engine
            .reserialize("2022-03-13 02:30:00.000000", &FormatOverrides::none())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_measure_across_fold() {
        // 01:20 EDT to 01:50 EST is ninety minutes, not thirty.
        let ended = DateTime::from_timestamp(1_667_717_400, 0).unwrap();
        let engine = new_york_at(ended, "1667712000.000000");
        let measured = engine
            .measure_to_now(None, &FormatOverrides::none())
            .unwrap();

        assert_eq!(measured.diff.start, "2022-11-06 01:20:00.000000");
        assert_eq!(measured.diff.ended, "2022-11-06 01:50:00.000000");
        assert_eq!(measured.diff.took, "5400.000000");
        assert_eq!(measured.ended_at, ended);
        assert_eq!(engine.serialize(measured.ended_at).unwrap(), "1667717400.000000");
    }

    #[test]
    fn test_diff_to_now_with_time_only_format() {
        let (engine, _) = engine_at(t0() + TimeDelta::milliseconds(1_250));
        let overrides = FormatOverrides::none().with_to("%H:%M:%S%.6f");
        let result = engine.diff_to_now(None, &overrides).unwrap();

        assert_eq!(result.start, "08:25:32.744800");
        assert_eq!(result.took, "1.250000");
    }

    #[test]
    fn test_normalize_request_start() {
        for (raw, normalized) in [
            ("1662625532.7448", "1662625532.744800"),
            ("1662625532", "1662625532.000000"),
            ("1662625532.744800", "1662625532.744800"),
            ("1662625532.7448001", "1662625532.744800"),
        ] {
            let (_, clock) = engine_at(t0());
            let mut engine = WallClockDiffEngine::new(raw).with_clock(clock);
            assert_eq!(engine.normalize_request_start().unwrap(), normalized);
            assert_eq!(engine.request_start(), normalized);
        }
    }

    #[test]
    fn test_normalize_request_start_rejects_garbage() {
        let mut engine = WallClockDiffEngine::new("soon");
        let err = engine.normalize_request_start().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(engine.request_start(), "soon");
    }

    #[test]
    fn test_short_fraction_start_measures() {
        let (engine, _) = engine_at(t0() + TimeDelta::seconds(1));
        let result = engine
            .diff_to_now(Some("1662625532.7448"), &FormatOverrides::none())
            .unwrap();
        assert_eq!(result.took, "1.000000");
    }

    #[test]
    fn test_unknown_zone() {
        let err = parse_zone("Mars/Olympus_Mons").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    proptest! {
        #[test]
        fn prop_serialized_round_trip(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
            let (engine, _) = engine_at(t0());
            let token = format!("{secs}.{micros:06}");
            let rendered = engine.parse_and_render(&token, None, None).unwrap();
            let back = engine.reserialize(&rendered, &FormatOverrides::none()).unwrap();
            prop_assert_eq!(back, token);
        }

        #[test]
        fn prop_round_trip_in_zone(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
            // Fold hours repeat local times, so the rendered form carries
            // the offset to stay unambiguous.
            let (engine, _) = engine_at(t0());
            let engine = engine
                .with_zone(parse_zone("America/New_York").unwrap())
                .with_formats(FormatRegistry::with_spec(crate::FormatSpec {
                    to: "%Y-%m-%d %H:%M:%S%.6f %z".to_string(),
                    ..Default::default()
                }));
            let token = format!("{secs}.{micros:06}");
            let rendered = engine.parse_and_render(&token, None, None).unwrap();
            let back = engine.reserialize(&rendered, &FormatOverrides::none()).unwrap();
            prop_assert_eq!(back, token);
        }
    }
}
