//! Reserved field names shared by the controller and the solvers.

/// Fluid pressure per cell, written after every flow solve.
pub const PRESSURE: &str = "pressure";

/// Current fracture aperture per fracture cell.
pub const APERTURE: &str = "aperture";

/// Accumulated slip-induced aperture change per fracture cell.
pub const APERTURE_CHANGE: &str = "aperture_change";

/// Traction vector (3 components) per host face.
pub const TRACTION: &str = "traction";

/// Accumulated slip vector (3 components) per host face.
pub const SLIP_DISTANCE: &str = "slip_distance";

/// Slip flag per host face, stored as `0.0` / `1.0`.
pub const IS_SLIPPING: &str = "is_slipping";

/// Matrix/fracture exchange flux per incidence pair of an edge.
pub const INTERFACE_FLUX: &str = "interface_flux";

/// Prefix marking a host-face projection of a fracture cell field.
pub const FACE_PREFIX: &str = "face_";

/// Name of the host-face projection of `name`.
///
/// ```
/// assert_eq!(slipstep_core::names::face_field_name("pressure"), "face_pressure");
/// ```
pub fn face_field_name(name: &str) -> String {
    format!("{FACE_PREFIX}{name}")
}
