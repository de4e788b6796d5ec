// Integration tests for the background sampling engine

use cplot::sampler::{
    CoordinateMode, Domain, PlotResult, PointSet, Sampler, CURVE_POINTS, SURFACE_GRID,
};
use std::time::{Duration, Instant};

fn wait_for(sampler: &Sampler, pred: impl Fn(&PlotResult) -> bool) -> PlotResult {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let result = sampler.published();
        if pred(&result) {
            return result;
        }
        assert!(
            Instant::now() < deadline,
            "sampler did not reach the expected state; last: {:?}",
            result.diagnostic
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_curve_matches_direct_evaluation() {
    let mut sampler = Sampler::spawn();
    sampler.set_source("double main(double x) { return sin(x); }");
    let result = wait_for(&sampler, |r| {
        r.diagnostic.is_none()
            && matches!(&r.points, Some(PointSet::Planar(p))
                if p.len() == CURVE_POINTS && (p[0].1 - p[0].0.sin()).abs() < 1e-12)
    });

    if let Some(PointSet::Planar(points)) = result.points {
        for &(x, y) in points.iter().step_by(100) {
            assert!((y - x.sin()).abs() < 1e-12, "f({}) = {}", x, y);
        }
    }
    sampler.shutdown();
}

#[test]
fn test_polar_sweep_covers_full_turn() {
    let mut sampler = Sampler::spawn();
    sampler.set_mode(CoordinateMode::Polar);
    sampler.set_source("double main(double t) { return 1.0; }");
    let result = wait_for(&sampler, |r| {
        r.mode == CoordinateMode::Polar
            && r.diagnostic.is_none()
            && matches!(&r.points, Some(PointSet::Planar(p))
                if !p.is_empty() && p[0].1 == 1.0)
    });

    match result.points {
        Some(PointSet::Planar(points)) => {
            assert_eq!(points.len(), CURVE_POINTS);
            assert_eq!(points[0].0, 0.0);
            let last_theta = points[CURVE_POINTS - 1].0;
            assert!((last_theta - std::f64::consts::TAU).abs() < 1e-12);
            assert!(points.iter().all(|&(_, r)| r == 1.0));
        }
        other => panic!("expected a planar point set, got {:?}", other),
    }
    sampler.shutdown();
}

#[test]
fn test_surface_grid_dimensions() {
    let mut sampler = Sampler::spawn();
    sampler.set_mode(CoordinateMode::Surface);
    sampler.set_source("double main(double x, double y) { return x + y; }");
    let result = wait_for(&sampler, |r| {
        matches!(r.points, Some(PointSet::Surface { .. })) && r.diagnostic.is_none()
    });

    match result.points {
        Some(PointSet::Surface { points, rows, cols }) => {
            assert_eq!(rows, SURFACE_GRID);
            assert_eq!(cols, SURFACE_GRID);
            assert_eq!(points.len(), SURFACE_GRID * SURFACE_GRID);
            // Row-major: the first and last samples are the domain corners
            assert_eq!(points[0], (-10.0, -10.0, -20.0));
            assert_eq!(points[points.len() - 1], (10.0, 10.0, 20.0));
            assert!(points.iter().all(|&(x, y, z)| z == x + y));
        }
        other => panic!("expected a surface, got {:?}", other),
    }
    sampler.shutdown();
}

#[test]
fn test_fault_mid_domain_keeps_leading_points() {
    let mut sampler = Sampler::spawn();
    sampler.set_domain(Domain {
        origin: (-10.0, -10.0),
        extent: (20.0, 20.0),
    });
    // Faults when x reaches 0 at the middle of the sweep
    sampler.set_source(
        "double main(double x) { if (x >= 0.0) { return 1.0 / 0.0; } return x; }",
    );
    let result = wait_for(&sampler, |r| r.diagnostic.is_some() && r.points.is_some());

    match result.points {
        Some(PointSet::Planar(points)) => {
            assert!(!points.is_empty());
            assert!(points.len() < CURVE_POINTS);
            assert!(points.iter().all(|&(x, _)| x < 0.0));
        }
        other => panic!("expected a planar point set, got {:?}", other),
    }
    sampler.shutdown();
}

#[test]
fn test_wrong_arity_for_mode_reports_contract_error() {
    let mut sampler = Sampler::spawn();
    sampler.set_mode(CoordinateMode::Surface);
    // One parameter, but surface mode calls with two
    sampler.set_source("double main(double x) { return x; }");
    let result = wait_for(&sampler, |r| r.diagnostic.is_some());

    let diag = result.diagnostic.expect("diagnostic");
    assert!(diag.location.is_none());
    assert!(diag.message.contains("main"), "{}", diag.message);
    sampler.shutdown();
}

#[test]
fn test_zoom_triggers_a_new_pass_over_the_new_window() {
    let mut sampler = Sampler::spawn();
    sampler.set_source("double main(double x) { return x; }");
    wait_for(&sampler, |r| r.points.is_some());

    sampler.zoom(0.5);
    let result = wait_for(&sampler, |r| {
        matches!(&r.points, Some(PointSet::Planar(p))
            if !p.is_empty() && p[0].0 == -5.0)
    });
    assert_eq!(result.domain.x_range(), (-5.0, 5.0));
    sampler.shutdown();
}

#[test]
fn test_rapid_edits_converge_to_the_last_source() {
    let mut sampler = Sampler::spawn();
    for i in 0..50 {
        sampler.set_source(&format!("double main(double x) {{ return {}.0; }}", i));
    }
    let result = wait_for(&sampler, |r| {
        matches!(&r.points, Some(PointSet::Planar(p))
            if !p.is_empty() && p[0].1 == 49.0)
    });
    assert!(result.diagnostic.is_none());
    sampler.shutdown();
}

#[test]
fn test_mode_switch_never_publishes_stale_geometry() {
    let mut sampler = Sampler::spawn();
    sampler.set_mode(CoordinateMode::Surface);
    sampler.set_source(CoordinateMode::Surface.default_source());
    wait_for(&sampler, |r| {
        matches!(r.points, Some(PointSet::Surface { .. }))
    });

    sampler.set_mode(CoordinateMode::Cartesian);
    sampler.set_source(CoordinateMode::Cartesian.default_source());
    let result = wait_for(&sampler, |r| {
        matches!(r.points, Some(PointSet::Planar(_)))
    });
    // Once planar geometry is out, it describes the cartesian pass
    assert_eq!(result.mode, CoordinateMode::Cartesian);
    sampler.shutdown();
}

#[test]
fn test_mode_switch_mid_pass_discards_surface_geometry() {
    let mut sampler = Sampler::spawn();
    // Let the startup pass settle so in-flight progress below belongs to
    // the slow surface pass.
    wait_for(&sampler, |r| r.points.is_some());

    // Each sample burns enough work that the pass spans many progress
    // reports, leaving a wide window to switch modes mid-pass.
    sampler.set_source(
        "double main(double x, double y) {\n\
             double s = 0.0;\n\
             int i;\n\
             for (i = 0; i < 2000; i++) { s = s + sin(i * 0.001); }\n\
             return s * 0.0 + x + y;\n\
         }",
    );
    sampler.set_mode(CoordinateMode::Surface);
    wait_for(&sampler, |r| r.progress > 0.0 && r.progress < 1.0);

    sampler.set_mode(CoordinateMode::Cartesian);
    sampler.set_source("double main(double x) { return x; }");

    // From here on, surface geometry must never appear; the cartesian
    // pass eventually supersedes whatever was published before.
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let result = sampler.published();
        assert!(
            !matches!(result.points, Some(PointSet::Surface { .. })),
            "surface geometry published after switching to cartesian"
        );
        if let Some(PointSet::Planar(points)) = &result.points {
            if points.first() == Some(&(-10.0, -10.0)) {
                break;
            }
        }
        assert!(
            Instant::now() < deadline,
            "cartesian pass never arrived; last: {:?}",
            result.diagnostic
        );
        std::thread::sleep(Duration::from_millis(1));
    }
    sampler.shutdown();
}
