//! Plot domain and coordinate modes
//!
//! The domain is the rectangular window of the plane being plotted. It is
//! part of every sampling snapshot: the worker reads it once per pass and
//! spaces its samples across it.

/// How user source maps to geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateMode {
    /// `y = f(x)` over the domain's x range
    #[default]
    Cartesian,
    /// `r = f(theta)`, theta sweeping one full turn
    Polar,
    /// `z = f(x, y)` over a grid covering the domain
    Surface,
}

impl CoordinateMode {
    /// Starter program shown when switching into this mode
    pub fn default_source(&self) -> &'static str {
        match self {
            CoordinateMode::Cartesian | CoordinateMode::Polar => {
                "double main(double x)\n{\n    return x;\n}\n"
            }
            CoordinateMode::Surface => {
                "double main(double x, double y)\n{\n    return fabs(sin(x * 0.5));\n}\n"
            }
        }
    }

    /// The mode after this one in the cycle order
    pub fn next(&self) -> CoordinateMode {
        match self {
            CoordinateMode::Cartesian => CoordinateMode::Polar,
            CoordinateMode::Polar => CoordinateMode::Surface,
            CoordinateMode::Surface => CoordinateMode::Cartesian,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoordinateMode::Cartesian => "cartesian",
            CoordinateMode::Polar => "polar",
            CoordinateMode::Surface => "surface",
        }
    }
}

/// Rectangular window of the plane: lower-left corner plus extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub origin: (f64, f64),
    pub extent: (f64, f64),
}

impl Default for Domain {
    fn default() -> Self {
        Domain {
            origin: (-10.0, -10.0),
            extent: (20.0, 20.0),
        }
    }
}

impl Domain {
    pub fn x_range(&self) -> (f64, f64) {
        (self.origin.0, self.origin.0 + self.extent.0)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.origin.1, self.origin.1 + self.extent.1)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.origin.0 + self.extent.0 / 2.0,
            self.origin.1 + self.extent.1 / 2.0,
        )
    }

    /// Scale the window about its center; factors below one zoom in
    pub fn zoom(&mut self, factor: f64) {
        let center = self.center();
        self.extent.0 *= factor;
        self.extent.1 *= factor;
        self.origin.0 = center.0 - self.extent.0 / 2.0;
        self.origin.1 = center.1 - self.extent.1 / 2.0;
    }

    /// Shift the window by fractions of its own extent
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.origin.0 += dx * self.extent.0;
        self.origin.1 += dy * self.extent.1;
    }

    /// The i-th of n evenly spaced x samples, endpoints included
    pub fn sample_x(&self, i: usize, n: usize) -> f64 {
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        self.origin.0 + t * self.extent.0
    }

    /// The i-th of n evenly spaced y samples, endpoints included
    pub fn sample_y(&self, i: usize, n: usize) -> f64 {
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        self.origin.1 + t * self.extent.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_centered_on_origin() {
        let domain = Domain::default();
        assert_eq!(domain.x_range(), (-10.0, 10.0));
        assert_eq!(domain.y_range(), (-10.0, 10.0));
        assert_eq!(domain.center(), (0.0, 0.0));
    }

    #[test]
    fn zoom_preserves_center() {
        let mut domain = Domain::default();
        domain.pan(0.5, 0.0);
        let center = domain.center();
        domain.zoom(0.5);
        assert_eq!(domain.center(), center);
        assert_eq!(domain.extent, (10.0, 10.0));
    }

    #[test]
    fn samples_cover_endpoints() {
        let domain = Domain::default();
        assert_eq!(domain.sample_x(0, 5), -10.0);
        assert_eq!(domain.sample_x(4, 5), 10.0);
        assert_eq!(domain.sample_y(2, 5), 0.0);
    }

    #[test]
    fn mode_cycle_visits_all_three() {
        let start = CoordinateMode::Cartesian;
        assert_eq!(start.next().next().next(), start);
    }
}
