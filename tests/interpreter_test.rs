// Integration tests for the C-subset interpreter

use cplot::interpreter::Session;

fn call(source: &str, args: &[f64]) -> Result<f64, String> {
    let mut session = Session::new();
    session.load(source).map_err(|d| d.to_string())?;
    session.call_entry("main", args).map_err(|d| d.to_string())
}

#[test]
fn test_plain_polynomial() {
    let source = r#"
        double main(double x) {
            return x * x - 2.0 * x + 1.0;
        }
    "#;
    assert_eq!(call(source, &[3.0]).unwrap(), 4.0);
    assert_eq!(call(source, &[1.0]).unwrap(), 0.0);
}

#[test]
fn test_two_argument_entry() {
    let source = r#"
        double main(double x, double y) {
            return hypot(x, y);
        }
    "#;
    assert_eq!(call(source, &[3.0, 4.0]).unwrap(), 5.0);
}

#[test]
fn test_helper_functions_and_globals() {
    let source = r#"
        double scale = 2.0;

        double square(double v) {
            return v * v;
        }

        double main(double x) {
            return scale * square(x);
        }
    "#;
    assert_eq!(call(source, &[3.0]).unwrap(), 18.0);
}

#[test]
fn test_control_flow() {
    let source = r#"
        double main(double x) {
            double total = 0.0;
            int i;
            for (i = 1; i <= 10; i++) {
                if (i % 2 == 0) {
                    continue;
                }
                if (i > 7) {
                    break;
                }
                total += i;
            }
            while (total < 0.0) {
                total = total + 1.0;
            }
            return total;
        }
    "#;
    // 1 + 3 + 5 + 7
    assert_eq!(call(source, &[0.0]).unwrap(), 16.0);
}

#[test]
fn test_block_scoping_shadows_and_restores() {
    let source = r#"
        double main(double x) {
            double v = 1.0;
            {
                double v = 2.0;
                v = v + 1.0;
            }
            return v;
        }
    "#;
    assert_eq!(call(source, &[0.0]).unwrap(), 1.0);
}

#[test]
fn test_redeclaration_in_a_block_does_not_leak_out() {
    let source = r#"
        double main(double x) {
            double v = 1.0;
            {
                double v = 2.0;
                double v = 3.0;
            }
            return v;
        }
    "#;
    assert_eq!(call(source, &[0.0]).unwrap(), 1.0);
}

#[test]
fn test_arrays_in_loops() {
    let source = r#"
        double main(double x) {
            double samples[8];
            int i;
            for (i = 0; i < 8; i++) {
                samples[i] = sin(x + i);
            }
            double sum = 0.0;
            for (i = 0; i < 8; i++) {
                sum += samples[i];
            }
            return sum;
        }
    "#;
    let expected: f64 = (0..8).map(|i| (1.0 + i as f64).sin()).sum();
    assert!((call(source, &[1.0]).unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_pointer_walk() {
    let source = r#"
        double main(double x) {
            double a[3];
            double *p;
            int i;
            p = a;
            for (i = 0; i < 3; i++) {
                *(p + i) = x * (i + 1);
            }
            return a[0] + a[1] + a[2];
        }
    "#;
    assert_eq!(call(source, &[2.0]).unwrap(), 12.0);
}

#[test]
fn test_division_by_zero_reports_location() {
    let mut session = Session::new();
    session
        .load("double main(double x) {\n    return 1.0 / x;\n}")
        .unwrap();
    let err = session.call_entry("main", &[0.0]).unwrap_err();
    assert!(err.message.contains("Division by zero"));
    assert_eq!(err.location.map(|l| l.line), Some(2));
}

#[test]
fn test_integer_division_by_zero_faults_too() {
    let source = "double main(double x) { int a = 1; int b = 0; return a / b; }";
    let err = call(source, &[0.0]).unwrap_err();
    assert!(err.contains("Division by zero"), "{}", err);
}

#[test]
fn test_parse_error_carries_location() {
    let mut session = Session::new();
    let err = session
        .load("double main(double x) {\n    return x +;\n}")
        .unwrap_err();
    assert_eq!(err.location.map(|l| l.line), Some(2));
}

#[test]
fn test_out_of_bounds_is_a_fault_not_a_crash() {
    let source = r#"
        double main(double x) {
            double a[4];
            a[0] = 1.0;
            return a[10];
        }
    "#;
    let err = call(source, &[0.0]).unwrap_err();
    assert!(err.contains("out of bounds"), "{}", err);
}

#[test]
fn test_session_reuse_after_reset() {
    let mut session = Session::new();
    session
        .load("double main(double x) { return 1.0 / x; }")
        .unwrap();
    assert!(session.call_entry("main", &[0.0]).is_err());
    assert!(session.is_poisoned());

    // A fresh load replaces the poisoned state entirely
    session
        .load("double main(double x) { return x + 1.0; }")
        .unwrap();
    assert!(!session.is_poisoned());
    assert_eq!(session.call_entry("main", &[1.0]).unwrap(), 2.0);
}

#[test]
fn test_deterministic_across_sessions() {
    let source = r#"
        double noise(double t) {
            return fmod(t * 12.9898, 1.0);
        }
        double main(double x) {
            return noise(x) + cos(x);
        }
    "#;
    let a = call(source, &[0.37]).unwrap();
    let b = call(source, &[0.37]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_entry_contract_rejects_pointer_return() {
    let source = r#"
        double *main(double x) {
            return 0;
        }
    "#;
    let mut session = Session::new();
    session.load(source).unwrap();
    let err = session.call_entry("main", &[0.0]).unwrap_err();
    assert!(err.location.is_none());
    assert!(err.message.contains("must return"), "{}", err.message);
}

#[test]
fn test_ternary_and_logical_operators() {
    let source = r#"
        double main(double x) {
            int in_band = x > -1.0 && x < 1.0;
            return in_band ? fabs(x) : 1.0;
        }
    "#;
    assert_eq!(call(source, &[0.5]).unwrap(), 0.5);
    assert_eq!(call(source, &[4.0]).unwrap(), 1.0);
}

#[test]
fn test_float_keyword_is_double() {
    let source = r#"
        float main(float x) {
            float half = x / 2.0;
            return half;
        }
    "#;
    assert_eq!(call(source, &[5.0]).unwrap(), 2.5);
}

#[test]
fn test_tan_near_asymptote_faults() {
    // tan(pi/2) overflows to a non-finite value in the library
    let source = "double main(double x) { return 1.0 / (x - x); }";
    assert!(call(source, &[1.0]).is_err());

    let source = "double main(double x) { return exp(x); }";
    let err = call(source, &[1000.0]).unwrap_err();
    assert!(err.contains("exp"), "{}", err);
}
