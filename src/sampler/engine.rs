//! Background sampling engine
//!
//! One worker thread turns the current program into plottable geometry.
//! The host and the worker share a single mutex-guarded [`Shared`] block:
//! the host writes settings (source, domain, mode) and marks them dirty;
//! the worker snapshots the settings, evaluates a full pass against a
//! fresh [`Session`], and publishes the result back. A pass aborts early
//! when a different program or mode arrives, and a finished pass is only
//! published if its mode and source are still current — the view never
//! shows geometry from a stale mode. A domain-only change keeps the
//! finished pass; the next pass resamples the moved window.
//!
//! A fault in user source ends the pass but keeps the points computed
//! before it, so the plot shows the curve up to the faulting sample
//! alongside the diagnostic.

use super::domain::{CoordinateMode, Domain};
use crate::interpreter::{Diagnostic, Session};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Samples per curve pass (cartesian and polar)
pub const CURVE_POINTS: usize = 1024;

/// Grid side length for a surface pass
pub const SURFACE_GRID: usize = 32;

/// Samples between progress reports and staleness checks
const PROGRESS_STRIDE: usize = 32;

/// Geometry produced by one pass
#[derive(Debug, Clone, PartialEq)]
pub enum PointSet {
    /// Curve samples: `(x, y)` in cartesian mode, `(theta, r)` in polar
    Planar(Vec<(f64, f64)>),
    /// `(x, y, z)` samples laid out row-major over the domain grid
    Surface {
        points: Vec<(f64, f64, f64)>,
        rows: usize,
        cols: usize,
    },
}

/// What the host sees when it polls the engine
#[derive(Debug, Clone, Default)]
pub struct PlotResult {
    pub mode: CoordinateMode,
    pub domain: Domain,
    pub points: Option<PointSet>,
    pub diagnostic: Option<Diagnostic>,
    /// Fraction of the in-flight pass completed, 1.0 when idle
    pub progress: f64,
}

#[derive(Clone)]
struct Snapshot {
    source: String,
    domain: Domain,
    mode: CoordinateMode,
}

struct Shared {
    snapshot: Snapshot,
    dirty: bool,
    shutdown: bool,
    result: PlotResult,
}

/// Handle to the sampling worker
pub struct Sampler {
    state: Arc<(Mutex<Shared>, Condvar)>,
    worker: Option<JoinHandle<()>>,
}

impl Sampler {
    /// Start the worker with the default cartesian program. The first
    /// pass begins immediately.
    pub fn spawn() -> Self {
        let mode = CoordinateMode::default();
        let shared = Shared {
            snapshot: Snapshot {
                source: mode.default_source().to_string(),
                domain: Domain::default(),
                mode,
            },
            dirty: true,
            shutdown: false,
            result: PlotResult::default(),
        };
        let state = Arc::new((Mutex::new(shared), Condvar::new()));

        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || worker_loop(worker_state));

        Sampler {
            state,
            worker: Some(worker),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Snapshot)) {
        let (lock, cvar) = &*self.state;
        let mut shared = lock_shared(lock);
        apply(&mut shared.snapshot);
        shared.dirty = true;
        cvar.notify_one();
    }

    /// Replace the program; triggers a fresh pass
    pub fn set_source(&self, source: &str) {
        self.update(|snap| snap.source = source.to_string());
    }

    /// Switch coordinate mode; triggers a fresh pass
    pub fn set_mode(&self, mode: CoordinateMode) {
        self.update(|snap| snap.mode = mode);
    }

    pub fn set_domain(&self, domain: Domain) {
        self.update(|snap| snap.domain = domain);
    }

    pub fn zoom(&self, factor: f64) {
        self.update(|snap| snap.domain.zoom(factor));
    }

    pub fn pan(&self, dx: f64, dy: f64) {
        self.update(|snap| snap.domain.pan(dx, dy));
    }

    /// Latest published result plus in-flight progress
    pub fn published(&self) -> PlotResult {
        let (lock, _) = &*self.state;
        lock_shared(lock).result.clone()
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(&mut self) {
        {
            let (lock, cvar) = &*self.state;
            lock_shared(lock).shutdown = true;
            cvar.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Sampler {
    /// Signal the worker and detach; a mid-pass worker notices the flag
    /// at its next staleness check and exits on its own.
    fn drop(&mut self) {
        let (lock, cvar) = &*self.state;
        lock_shared(lock).shutdown = true;
        cvar.notify_one();
    }
}

fn lock_shared<'a>(lock: &'a Mutex<Shared>) -> MutexGuard<'a, Shared> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn worker_loop(state: Arc<(Mutex<Shared>, Condvar)>) {
    let (lock, cvar) = &*state;
    loop {
        let snapshot = {
            let mut shared = lock_shared(lock);
            loop {
                if shared.shutdown {
                    return;
                }
                if shared.dirty {
                    break;
                }
                shared = match cvar.wait(shared) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
            shared.dirty = false;
            shared.result.progress = 0.0;
            shared.snapshot.clone()
        };

        if let Some(result) = run_pass(&snapshot, &state) {
            let mut shared = lock_shared(lock);
            if shared.shutdown {
                return;
            }
            // Publish unless the program or mode moved on; a domain-only
            // change keeps the finished pass until the next one lands.
            if shared.snapshot.mode == snapshot.mode
                && shared.snapshot.source == snapshot.source
            {
                shared.result = result;
            }
        }
    }
}

/// Report pass progress; returns false when the pass should abort
/// because a different program or mode (or a shutdown) arrived. A
/// domain-only change lets the pass run to completion.
fn report_progress(state: &(Mutex<Shared>, Condvar), snapshot: &Snapshot, fraction: f64) -> bool {
    let mut shared = lock_shared(&state.0);
    if shared.shutdown {
        return false;
    }
    if shared.snapshot.mode != snapshot.mode || shared.snapshot.source != snapshot.source {
        return false;
    }
    shared.result.progress = fraction;
    true
}

/// Evaluate one full pass. Returns `None` when the pass was abandoned.
fn run_pass(snapshot: &Snapshot, state: &(Mutex<Shared>, Condvar)) -> Option<PlotResult> {
    let mut result = PlotResult {
        mode: snapshot.mode,
        domain: snapshot.domain,
        points: None,
        diagnostic: None,
        progress: 1.0,
    };

    let mut session = Session::new();
    if let Err(diag) = session.load(&snapshot.source) {
        result.diagnostic = Some(diag);
        return Some(result);
    }

    match snapshot.mode {
        CoordinateMode::Cartesian | CoordinateMode::Polar => {
            let mut points = Vec::with_capacity(CURVE_POINTS);
            for i in 0..CURVE_POINTS {
                let arg = match snapshot.mode {
                    CoordinateMode::Polar => {
                        i as f64 / (CURVE_POINTS - 1) as f64 * std::f64::consts::TAU
                    }
                    _ => snapshot.domain.sample_x(i, CURVE_POINTS),
                };
                match session.call_entry("main", &[arg]) {
                    Ok(value) => points.push((arg, value)),
                    Err(diag) => {
                        // Keep the partial curve up to the fault.
                        result.diagnostic = Some(diag);
                        break;
                    }
                }
                if i % PROGRESS_STRIDE == 0
                    && !report_progress(state, snapshot, (i + 1) as f64 / CURVE_POINTS as f64)
                {
                    return None;
                }
            }
            result.points = Some(PointSet::Planar(points));
        }

        CoordinateMode::Surface => {
            let mut points = Vec::with_capacity(SURFACE_GRID * SURFACE_GRID);
            'rows: for row in 0..SURFACE_GRID {
                let y = snapshot.domain.sample_y(row, SURFACE_GRID);
                for col in 0..SURFACE_GRID {
                    let x = snapshot.domain.sample_x(col, SURFACE_GRID);
                    match session.call_entry("main", &[x, y]) {
                        Ok(z) => points.push((x, y, z)),
                        Err(diag) => {
                            result.diagnostic = Some(diag);
                            break 'rows;
                        }
                    }
                }
                if !report_progress(state, snapshot, (row + 1) as f64 / SURFACE_GRID as f64) {
                    return None;
                }
            }
            result.points = Some(PointSet::Surface {
                points,
                rows: SURFACE_GRID,
                cols: SURFACE_GRID,
            });
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(sampler: &Sampler, pred: impl Fn(&PlotResult) -> bool) -> PlotResult {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let result = sampler.published();
            if pred(&result) {
                return result;
            }
            assert!(Instant::now() < deadline, "sampler did not converge");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn default_program_publishes_a_full_curve() {
        let mut sampler = Sampler::spawn();
        let result = wait_for(&sampler, |r| r.points.is_some());
        match result.points {
            Some(PointSet::Planar(points)) => {
                assert_eq!(points.len(), CURVE_POINTS);
                // y = x along the default window
                assert_eq!(points[0], (-10.0, -10.0));
                let (x, y) = points[CURVE_POINTS - 1];
                assert!((x - 10.0).abs() < 1e-12 && (y - 10.0).abs() < 1e-12);
            }
            other => panic!("expected a planar curve, got {:?}", other),
        }
        assert!(result.diagnostic.is_none());
        sampler.shutdown();
    }

    #[test]
    fn fault_keeps_partial_points_and_diagnostic() {
        let mut sampler = Sampler::spawn();
        sampler.set_domain(Domain {
            origin: (0.0, 0.0),
            extent: (10.0, 10.0),
        });
        // Faults at the first sample, x == 0
        sampler.set_source("double main(double x) { return 1.0 / x; }");
        let result = wait_for(&sampler, |r| r.diagnostic.is_some());

        let diag = result.diagnostic.clone().map(|d| d.to_string()).unwrap_or_default();
        assert!(diag.contains("Division by zero"), "{}", diag);
        match result.points {
            Some(PointSet::Planar(points)) => assert!(points.is_empty()),
            other => panic!("expected a planar curve, got {:?}", other),
        }
        sampler.shutdown();
    }

    #[test]
    fn parse_error_publishes_diagnostic_without_points() {
        let mut sampler = Sampler::spawn();
        sampler.set_source("double main(double x) { return x + ; }");
        let result = wait_for(&sampler, |r| r.diagnostic.is_some());
        assert!(result.points.is_none());
        sampler.shutdown();
    }

    #[test]
    fn surface_mode_publishes_a_grid() {
        let mut sampler = Sampler::spawn();
        sampler.set_mode(CoordinateMode::Surface);
        sampler.set_source(CoordinateMode::Surface.default_source());
        let result = wait_for(&sampler, |r| {
            matches!(r.points, Some(PointSet::Surface { .. })) && r.diagnostic.is_none()
        });
        match result.points {
            Some(PointSet::Surface { points, rows, cols }) => {
                assert_eq!((rows, cols), (SURFACE_GRID, SURFACE_GRID));
                assert_eq!(points.len(), SURFACE_GRID * SURFACE_GRID);
                assert!(points.iter().all(|&(_, _, z)| (0.0..=1.0).contains(&z)));
                // The first sample sits at the lower-left domain corner
                assert_eq!((points[0].0, points[0].1), (-10.0, -10.0));
            }
            other => panic!("expected a surface, got {:?}", other),
        }
        assert_eq!(result.mode, CoordinateMode::Surface);
        sampler.shutdown();
    }

    #[test]
    fn domain_only_change_lets_a_pass_complete() {
        let snapshot = Snapshot {
            source: CoordinateMode::Cartesian.default_source().to_string(),
            domain: Domain::default(),
            mode: CoordinateMode::Cartesian,
        };
        let mut moved = snapshot.clone();
        moved.domain.pan(0.25, 0.0);
        // The shared settings already moved to a different window
        let state = Arc::new((
            Mutex::new(Shared {
                snapshot: moved,
                dirty: true,
                shutdown: false,
                result: PlotResult::default(),
            }),
            Condvar::new(),
        ));
        let result = run_pass(&snapshot, &state).expect("pass should run to completion");
        assert!(matches!(result.points, Some(PointSet::Planar(_))));
    }

    #[test]
    fn source_change_aborts_a_running_pass() {
        let snapshot = Snapshot {
            source: CoordinateMode::Cartesian.default_source().to_string(),
            domain: Domain::default(),
            mode: CoordinateMode::Cartesian,
        };
        let mut edited = snapshot.clone();
        edited.source = "double main(double x) { return x * x; }".to_string();
        let state = Arc::new((
            Mutex::new(Shared {
                snapshot: edited,
                dirty: true,
                shutdown: false,
                result: PlotResult::default(),
            }),
            Condvar::new(),
        ));
        assert!(run_pass(&snapshot, &state).is_none());
    }

    #[test]
    fn shutdown_joins_the_worker() {
        let mut sampler = Sampler::spawn();
        sampler.set_source("double main(double x) { return sin(x); }");
        sampler.shutdown();
        assert!(sampler.worker.is_none());
    }
}
