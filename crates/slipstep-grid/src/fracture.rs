//! Fracture geometry descriptions and the fracture-list input format.
//!
//! A fracture list is a CSV-like text with one elliptic fracture per line:
//!
//! ```text
//! # cx, cy, cz, major, minor, major_angle, strike, dip[, num_points]
//! 50, 50, 50, 20, 10, 0.0, 0.0, 0.0, 16
//! ```
//!
//! Angles are in radians. Blank lines and `#` comments are ignored.

use log::debug;

use crate::error::GridError;
use crate::geometry::{add, dot, normalize, rotate_about, scale, sub, Vec3};

/// Default number of polygon vertices used to discretize an ellipse.
pub const DEFAULT_NUM_POINTS: usize = 16;

/// Axis-aligned domain box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Lower corner.
    pub min: Vec3,
    /// Upper corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Build a box, rejecting non-finite or inverted extents.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self, GridError> {
        for axis in 0..3 {
            if !min[axis].is_finite() || !max[axis].is_finite() || max[axis] <= min[axis] {
                return Err(GridError::MeshGeneration {
                    reason: format!(
                        "domain extent along axis {axis} is [{}, {}]",
                        min[axis], max[axis]
                    ),
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Edge lengths of the box.
    pub fn lengths(&self) -> Vec3 {
        sub(self.max, self.min)
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }
}

/// A planar elliptic fracture.
///
/// The ellipse is first laid in the horizontal plane with its major
/// axis rotated by `major_axis_angle` about the vertical, then tilted by
/// `dip_angle` about the horizontal strike direction at `strike_angle`.
#[derive(Clone, Debug, PartialEq)]
pub struct EllipticFracture {
    /// Centre point.
    pub center: Vec3,
    /// Semi-major axis length.
    pub major_axis: f64,
    /// Semi-minor axis length.
    pub minor_axis: f64,
    /// In-plane rotation of the major axis, radians.
    pub major_axis_angle: f64,
    /// Strike direction, radians from the x axis.
    pub strike_angle: f64,
    /// Dip about the strike direction, radians.
    pub dip_angle: f64,
    /// Vertices used when the ellipse is discretized as a polygon.
    pub num_points: usize,
}

impl EllipticFracture {
    /// Build and validate a fracture.
    pub fn new(
        center: Vec3,
        major_axis: f64,
        minor_axis: f64,
        major_axis_angle: f64,
        strike_angle: f64,
        dip_angle: f64,
        num_points: usize,
    ) -> Result<Self, GridError> {
        let frac = Self {
            center,
            major_axis,
            minor_axis,
            major_axis_angle,
            strike_angle,
            dip_angle,
            num_points,
        };
        frac.validate()?;
        Ok(frac)
    }

    /// Check for degenerate or non-finite geometry.
    pub fn validate(&self) -> Result<(), GridError> {
        let finite = self.center.iter().all(|v| v.is_finite())
            && [
                self.major_axis,
                self.minor_axis,
                self.major_axis_angle,
                self.strike_angle,
                self.dip_angle,
            ]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GridError::MeshGeneration {
                reason: "fracture has non-finite parameters".to_string(),
            });
        }
        if self.major_axis <= 0.0 || self.minor_axis <= 0.0 {
            return Err(GridError::MeshGeneration {
                reason: format!(
                    "fracture axes must be positive, got {} and {}",
                    self.major_axis, self.minor_axis
                ),
            });
        }
        if self.num_points < 3 {
            return Err(GridError::MeshGeneration {
                reason: format!(
                    "fracture polygon needs at least 3 points, got {}",
                    self.num_points
                ),
            });
        }
        Ok(())
    }

    fn strike_axis(&self) -> Vec3 {
        let (s, c) = self.strike_angle.sin_cos();
        [c, s, 0.0]
    }

    fn tilt(&self, v: Vec3) -> Vec3 {
        rotate_about(v, self.strike_axis(), self.dip_angle)
    }

    /// Unit direction of the major axis.
    pub fn major_direction(&self) -> Vec3 {
        let (s, c) = self.major_axis_angle.sin_cos();
        self.tilt([c, s, 0.0])
    }

    /// Unit direction of the minor axis.
    pub fn minor_direction(&self) -> Vec3 {
        let (s, c) = self.major_axis_angle.sin_cos();
        self.tilt([-s, c, 0.0])
    }

    /// Unit normal of the fracture plane.
    pub fn normal(&self) -> Vec3 {
        self.tilt([0.0, 0.0, 1.0])
    }

    /// Vertices of the polygonal approximation, counter-clockwise.
    pub fn polygon(&self) -> Vec<Vec3> {
        let u = self.major_direction();
        let v = self.minor_direction();
        (0..self.num_points)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / self.num_points as f64;
                let (s, c) = theta.sin_cos();
                add(
                    self.center,
                    add(scale(u, self.major_axis * c), scale(v, self.minor_axis * s)),
                )
            })
            .collect()
    }

    /// Exact area of the ellipse.
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.major_axis * self.minor_axis
    }

    /// Whether `p` projects inside the ellipse and lies within `tol` of its plane.
    pub fn contains(&self, p: Vec3, tol: f64) -> bool {
        let d = sub(p, self.center);
        if dot(d, self.normal()).abs() > tol {
            return false;
        }
        let x = dot(d, self.major_direction()) / self.major_axis;
        let y = dot(d, self.minor_direction()) / self.minor_axis;
        x * x + y * y <= 1.0
    }

    /// Whether the fracture plane is horizontal to within `tol` radians.
    pub fn is_horizontal(&self, tol: f64) -> bool {
        normalize(self.normal()).is_some_and(|n| n[2].abs() >= tol.cos())
    }
}

/// An ordered list of fractures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FractureSet {
    fractures: Vec<EllipticFracture>,
}

impl FractureSet {
    /// Wrap already-validated fractures.
    pub fn new(fractures: Vec<EllipticFracture>) -> Self {
        Self { fractures }
    }

    /// Parse a fracture list; see the module docs for the format.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut fractures = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != 8 && fields.len() != 9 {
                return Err(GridError::MeshGeneration {
                    reason: format!(
                        "line {}: expected 8 or 9 values, found {}",
                        lineno + 1,
                        fields.len()
                    ),
                });
            }
            let mut values = [0.0; 8];
            for (slot, text) in values.iter_mut().zip(&fields) {
                *slot = text.parse().map_err(|_| GridError::MeshGeneration {
                    reason: format!("line {}: '{text}' is not a number", lineno + 1),
                })?;
            }
            let num_points = match fields.get(8) {
                Some(text) => text.parse().map_err(|_| GridError::MeshGeneration {
                    reason: format!("line {}: '{text}' is not a point count", lineno + 1),
                })?,
                None => DEFAULT_NUM_POINTS,
            };
            let frac = EllipticFracture::new(
                [values[0], values[1], values[2]],
                values[3],
                values[4],
                values[5],
                values[6],
                values[7],
                num_points,
            )
            .map_err(|e| match e {
                GridError::MeshGeneration { reason } => GridError::MeshGeneration {
                    reason: format!("line {}: {reason}", lineno + 1),
                },
                other => other,
            })?;
            fractures.push(frac);
        }
        debug!("parsed {} fractures", fractures.len());
        Ok(Self { fractures })
    }

    /// Check that every fracture centre lies inside `domain`.
    pub fn check_inside(&self, domain: &BoundingBox) -> Result<(), GridError> {
        for (i, f) in self.fractures.iter().enumerate() {
            if !domain.contains(f.center) {
                return Err(GridError::MeshGeneration {
                    reason: format!("fracture {i} centre {:?} lies outside the domain", f.center),
                });
            }
        }
        Ok(())
    }

    /// Number of fractures.
    pub fn len(&self) -> usize {
        self.fractures.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fractures.is_empty()
    }

    /// The fractures in input order.
    pub fn fractures(&self) -> &[EllipticFracture] {
        &self.fractures
    }
}
