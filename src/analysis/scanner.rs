use chrono::{DateTime, Duration, Utc};

use crate::propagation::PropagationContext;

use super::types::{PairOutcome, ScanHit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ScanParams {
    pub window: ScanWindow,
    pub coarse_step: Duration,
    pub fine_step: Duration,
    pub threshold_km: f64,
}

#[derive(Debug, Clone, Copy)]
struct Minimum {
    time: DateTime<Utc>,
    distance_km: f64,
    relative_velocity_km_s: f64,
}

/// One element of the lazy all-pairs scan: which pair, and what came of it.
#[derive(Debug)]
pub struct PairResult {
    pub user: usize,
    pub catalog: usize,
    pub outcome: PairOutcome,
}

/// Lazy all-pairs scan over (user, catalog). Pairs are evaluated one at a
/// time as the iterator is driven, so the caller can account progress and
/// honor cancellation at pair boundaries. A satellite without a usable
/// propagation context makes all of its pairs unscored.
pub fn scan<'a>(
    user: &'a [Option<PropagationContext>],
    catalog: &'a [Option<PropagationContext>],
    params: &'a ScanParams,
) -> impl Iterator<Item = PairResult> + 'a {
    user.iter().enumerate().flat_map(move |(ui, u)| {
        catalog.iter().enumerate().map(move |(ci, c)| {
            let outcome = match (u, c) {
                (Some(u), Some(c)) => scan_pair(u, c, params),
                _ => PairOutcome::Unscored,
            };
            PairResult {
                user: ui,
                catalog: ci,
                outcome,
            }
        })
    })
}

/// Sample both propagators across the window at the coarse step, tracking
/// the running minimum separation. When a coarse sample dips under the
/// threshold and under the current minimum, a fine sweep over half a coarse
/// step on either side refines the time of closest approach. Failed samples
/// are skipped; a pair with no valid sample at all is unscored.
pub fn scan_pair(
    user: &PropagationContext,
    catalog: &PropagationContext,
    params: &ScanParams,
) -> PairOutcome {
    let mut minimum: Option<Minimum> = None;

    let mut cursor = params.window.start;
    while cursor <= params.window.end {
        if let Some(sample) = sample_pair(user, catalog, cursor) {
            let refine = sample.distance_km < params.threshold_km
                && minimum.map_or(true, |m| sample.distance_km < m.distance_km);
            update_minimum(&mut minimum, sample);

            if refine {
                fine_sweep(user, catalog, cursor, params, &mut minimum);
            }
        }
        cursor += params.coarse_step;
    }

    match minimum {
        None => PairOutcome::Unscored,
        Some(m) if m.distance_km < params.threshold_km => PairOutcome::Hit(ScanHit {
            time_of_min: m.time,
            min_distance_km: m.distance_km,
            relative_velocity_km_s: m.relative_velocity_km_s,
        }),
        Some(_) => PairOutcome::Clear,
    }
}

fn fine_sweep(
    user: &PropagationContext,
    catalog: &PropagationContext,
    around: DateTime<Utc>,
    params: &ScanParams,
    minimum: &mut Option<Minimum>,
) {
    let half = params.coarse_step / 2;
    let sweep_end = around + half;
    let mut cursor = around - half;
    while cursor <= sweep_end {
        if cursor != around {
            if let Some(sample) = sample_pair(user, catalog, cursor) {
                update_minimum(minimum, sample);
            }
        }
        cursor += params.fine_step;
    }
}

fn update_minimum(minimum: &mut Option<Minimum>, sample: Minimum) {
    let better = minimum.map_or(true, |m| sample.distance_km < m.distance_km);
    if better {
        *minimum = Some(sample);
    }
}

fn sample_pair(
    user: &PropagationContext,
    catalog: &PropagationContext,
    timestamp: DateTime<Utc>,
) -> Option<Minimum> {
    // A failed propagation skips the sample, it never aborts the pair.
    let u = user.propagate(timestamp).ok()?;
    let c = catalog.propagate(timestamp).ok()?;
    Some(Minimum {
        time: timestamp,
        distance_km: u.separation_km(&c),
        relative_velocity_km_s: u.relative_velocity_km_s(&c),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Origin, Satellite, TwoLineElement};
    use chrono::TimeZone;

    const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
    // Same orbit as ISS_LINE2 with the mean anomaly advanced by 0.1 degrees:
    // a small along-track phase offset, roughly 12 km of separation.
    const OFFSET_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.1288 15.72125391563538";
    // Near-equatorial orbit at 2 rev/day, tens of thousands of km away.
    const FAR_LINE2: &str =
        "2 25544   3.0000 100.0000 0001000  90.0000 180.0000  2.00000000 12347";
    const JUNK_LINE1: &str = "1 99999U 00000A   00000.00000000  .00000000  00000-0  00000-0 0  000X";
    const JUNK_LINE2: &str = "2 99999  00.0000 000.0000 0000000 000.0000 000.0000 00.00000000  000X";
    // Very low orbit with an extreme drag term. It propagates fine near its
    // epoch but the drag perturbation drives the eccentricity out of range
    // partway through a long window.
    const DECAYING_LINE1: &str =
        "1 88888U 08001A   08264.51782528  .00073094  13844-3  99999-0 0    12";
    const DECAYING_LINE2: &str =
        "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518    13";

    fn context(line1: &str, line2: &str) -> PropagationContext {
        let sat = Satellite {
            name: "TEST".into(),
            tle: TwoLineElement::new(line1, line2).unwrap(),
            origin: Origin::Catalog,
        };
        PropagationContext::from_satellite(&sat).unwrap()
    }

    fn params(step_seconds: i64, threshold_km: f64) -> ScanParams {
        let start = Utc.with_ymd_and_hms(2008, 9, 20, 13, 0, 0).unwrap();
        ScanParams {
            window: ScanWindow {
                start,
                end: start + Duration::hours(1),
            },
            coarse_step: Duration::seconds(step_seconds),
            fine_step: Duration::seconds(step_seconds.min(60) / 4 + 1),
            threshold_km,
        }
    }

    #[test]
    fn phase_offset_pair_is_a_hit() {
        let user = context(ISS_LINE1, ISS_LINE2);
        let other = context(ISS_LINE1, OFFSET_LINE2);
        match scan_pair(&user, &other, &params(60, 50.0)) {
            PairOutcome::Hit(hit) => {
                assert!(
                    hit.min_distance_km > 1.0 && hit.min_distance_km < 50.0,
                    "distance {}",
                    hit.min_distance_km
                );
                assert!(hit.relative_velocity_km_s < 1.0);
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn smaller_step_never_reports_a_larger_minimum() {
        let user = context(ISS_LINE1, ISS_LINE2);
        let other = context(ISS_LINE1, OFFSET_LINE2);
        let coarse = match scan_pair(&user, &other, &params(120, 50.0)) {
            PairOutcome::Hit(hit) => hit.min_distance_km,
            other => panic!("expected hit, got {other:?}"),
        };
        let fine = match scan_pair(&user, &other, &params(30, 50.0)) {
            PairOutcome::Hit(hit) => hit.min_distance_km,
            other => panic!("expected hit, got {other:?}"),
        };
        // Both grids sample within a few seconds of the true minimum, so
        // the finer scan may only improve by more than sampling noise.
        assert!(fine <= coarse + 0.01, "fine {fine} vs coarse {coarse}");
    }

    #[test]
    fn distant_pair_is_clear() {
        let user = context(ISS_LINE1, ISS_LINE2);
        let far = context(ISS_LINE1, FAR_LINE2);
        assert_eq!(scan_pair(&user, &far, &params(60, 50.0)), PairOutcome::Clear);
    }

    #[test]
    fn scan_covers_all_pairs_and_marks_unusable_contexts_unscored() {
        let user = vec![Some(context(ISS_LINE1, ISS_LINE2))];
        let junk = Satellite {
            name: "JUNK".into(),
            tle: TwoLineElement::new(JUNK_LINE1, JUNK_LINE2).unwrap(),
            origin: Origin::Catalog,
        };
        assert!(PropagationContext::from_satellite(&junk).is_err());
        let catalog = vec![Some(context(ISS_LINE1, FAR_LINE2)), None];

        let p = params(60, 50.0);
        let results: Vec<_> = scan(&user, &catalog, &p).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, PairOutcome::Clear);
        assert_eq!(results[1].outcome, PairOutcome::Unscored);
    }

    #[test]
    fn mid_window_propagation_failures_are_skipped() {
        let user = context(ISS_LINE1, ISS_LINE2);
        let decaying = context(DECAYING_LINE1, DECAYING_LINE2);

        // Window opens at the decaying satellite's epoch, where it still
        // propagates, and runs long enough for the model to break down.
        let start = Utc.with_ymd_and_hms(2008, 9, 20, 12, 25, 40).unwrap();
        let end = start + Duration::hours(48);
        assert!(decaying.propagate(start).is_ok());
        assert!(decaying.propagate(end).is_err());

        let p = ScanParams {
            window: ScanWindow { start, end },
            coarse_step: Duration::minutes(30),
            fine_step: Duration::seconds(60),
            threshold_km: 50.0,
        };
        // The valid early samples still yield a minimum; the pair is scored
        // over them instead of being written off as unscored.
        let outcome = scan_pair(&user, &decaying, &p);
        assert!(
            !matches!(outcome, PairOutcome::Unscored),
            "expected a scored outcome, got {outcome:?}"
        );
    }

    #[test]
    fn identical_orbits_report_zero_separation() {
        let a = context(ISS_LINE1, ISS_LINE2);
        let b = context(ISS_LINE1, ISS_LINE2);
        match scan_pair(&a, &b, &params(60, 50.0)) {
            PairOutcome::Hit(hit) => assert!(hit.min_distance_km < 1e-9),
            other => panic!("expected hit, got {other:?}"),
        }
    }
}
