//! Built-in math library
//!
//! Mirrors the slice of `<math.h>` the plotter exposes to user source.
//! Every builtin takes `double` arguments and returns `double`; integer
//! arguments promote at the call site. The table is static so the host
//! can enumerate signatures for its help view without a live session.

/// One entry of the math library
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub native: fn(&[f64]) -> f64,
}

impl Builtin {
    /// C-style signature, e.g. `double atan2(double, double)`
    pub fn signature(&self) -> String {
        let params = std::iter::repeat("double")
            .take(self.arity)
            .collect::<Vec<_>>()
            .join(", ");
        format!("double {}({})", self.name, params)
    }
}

fn native_sin(args: &[f64]) -> f64 {
    args[0].sin()
}
fn native_cos(args: &[f64]) -> f64 {
    args[0].cos()
}
fn native_tan(args: &[f64]) -> f64 {
    args[0].tan()
}
fn native_asin(args: &[f64]) -> f64 {
    args[0].asin()
}
fn native_acos(args: &[f64]) -> f64 {
    args[0].acos()
}
fn native_atan(args: &[f64]) -> f64 {
    args[0].atan()
}
fn native_atan2(args: &[f64]) -> f64 {
    args[0].atan2(args[1])
}
fn native_sinh(args: &[f64]) -> f64 {
    args[0].sinh()
}
fn native_cosh(args: &[f64]) -> f64 {
    args[0].cosh()
}
fn native_tanh(args: &[f64]) -> f64 {
    args[0].tanh()
}
fn native_exp(args: &[f64]) -> f64 {
    args[0].exp()
}
fn native_log(args: &[f64]) -> f64 {
    args[0].ln()
}
fn native_log10(args: &[f64]) -> f64 {
    args[0].log10()
}
fn native_pow(args: &[f64]) -> f64 {
    args[0].powf(args[1])
}
fn native_sqrt(args: &[f64]) -> f64 {
    args[0].sqrt()
}
fn native_fabs(args: &[f64]) -> f64 {
    args[0].abs()
}
fn native_floor(args: &[f64]) -> f64 {
    args[0].floor()
}
fn native_ceil(args: &[f64]) -> f64 {
    args[0].ceil()
}
fn native_round(args: &[f64]) -> f64 {
    args[0].round()
}
fn native_fmod(args: &[f64]) -> f64 {
    args[0] % args[1]
}
fn native_hypot(args: &[f64]) -> f64 {
    args[0].hypot(args[1])
}

/// The full library, in the order the help view lists it
pub const BUILTINS: &[Builtin] = &[
    Builtin { name: "sin", arity: 1, native: native_sin },
    Builtin { name: "cos", arity: 1, native: native_cos },
    Builtin { name: "tan", arity: 1, native: native_tan },
    Builtin { name: "asin", arity: 1, native: native_asin },
    Builtin { name: "acos", arity: 1, native: native_acos },
    Builtin { name: "atan", arity: 1, native: native_atan },
    Builtin { name: "atan2", arity: 2, native: native_atan2 },
    Builtin { name: "sinh", arity: 1, native: native_sinh },
    Builtin { name: "cosh", arity: 1, native: native_cosh },
    Builtin { name: "tanh", arity: 1, native: native_tanh },
    Builtin { name: "exp", arity: 1, native: native_exp },
    Builtin { name: "log", arity: 1, native: native_log },
    Builtin { name: "log10", arity: 1, native: native_log10 },
    Builtin { name: "pow", arity: 2, native: native_pow },
    Builtin { name: "sqrt", arity: 1, native: native_sqrt },
    Builtin { name: "fabs", arity: 1, native: native_fabs },
    Builtin { name: "floor", arity: 1, native: native_floor },
    Builtin { name: "ceil", arity: 1, native: native_ceil },
    Builtin { name: "round", arity: 1, native: native_round },
    Builtin { name: "fmod", arity: 2, native: native_fmod },
    Builtin { name: "hypot", arity: 2, native: native_hypot },
];

/// Predefined math constants, visible as read-only globals in user source
pub const CONSTANTS: &[(&str, f64)] = &[
    ("M_PI", std::f64::consts::PI),
    ("M_E", std::f64::consts::E),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Every builtin plus the constants as `(name, signature)` pairs, so the
/// host can key entries by name when it lists them
pub fn catalog() -> Vec<(&'static str, String)> {
    let mut entries: Vec<(&'static str, String)> =
        BUILTINS.iter().map(|b| (b.name, b.signature())).collect();
    for &(name, _) in CONSTANTS {
        entries.push((name, format!("double {}", name)));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_every_builtin() {
        for builtin in BUILTINS {
            let found = lookup(builtin.name).unwrap();
            assert_eq!(found.arity, builtin.arity);
        }
        assert!(lookup("printf").is_none());
    }

    #[test]
    fn natives_compute_expected_values() {
        let sin = lookup("sin").unwrap();
        assert!(((sin.native)(&[std::f64::consts::FRAC_PI_2]) - 1.0).abs() < 1e-12);
        let pow = lookup("pow").unwrap();
        assert_eq!((pow.native)(&[2.0, 10.0]), 1024.0);
        let fmod = lookup("fmod").unwrap();
        assert!(((fmod.native)(&[7.5, 2.0]) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn signatures_render_c_style() {
        assert_eq!(lookup("sqrt").unwrap().signature(), "double sqrt(double)");
        assert_eq!(
            lookup("atan2").unwrap().signature(),
            "double atan2(double, double)"
        );
    }

    #[test]
    fn catalog_keys_entries_by_name() {
        let entries = catalog();
        assert_eq!(entries.len(), BUILTINS.len() + CONSTANTS.len());
        assert!(entries
            .iter()
            .any(|(name, sig)| *name == "atan2" && sig == "double atan2(double, double)"));
        assert!(entries.iter().any(|(name, _)| *name == "M_PI"));
    }
}
