//! SI prefixes and unit conversion factors.
//!
//! All quantities inside slipstep are SI. Multiply a value in the named
//! unit by the constant to convert it, e.g. `5.0 * MEGA * PASCAL` or
//! `2.0 * DAY`.

/// 10⁻⁶.
pub const MICRO: f64 = 1e-6;
/// 10⁻³.
pub const MILLI: f64 = 1e-3;
/// 10⁻².
pub const CENTI: f64 = 1e-2;
/// 10³.
pub const KILO: f64 = 1e3;
/// 10⁶.
pub const MEGA: f64 = 1e6;
/// 10⁹.
pub const GIGA: f64 = 1e9;

/// One second.
pub const SECOND: f64 = 1.0;
/// One minute in seconds.
pub const MINUTE: f64 = 60.0 * SECOND;
/// One hour in seconds.
pub const HOUR: f64 = 60.0 * MINUTE;
/// One day in seconds.
pub const DAY: f64 = 24.0 * HOUR;
/// One (365-day) year in seconds.
pub const YEAR: f64 = 365.0 * DAY;

/// One metre.
pub const METER: f64 = 1.0;
/// One kilogram.
pub const KILOGRAM: f64 = 1.0;

/// One pascal.
pub const PASCAL: f64 = 1.0;
/// One bar in pascal.
pub const BAR: f64 = 1e5 * PASCAL;
/// One atmosphere in pascal.
pub const ATMOSPHERIC_PRESSURE: f64 = 101_325.0 * PASCAL;

/// One darcy in m².
pub const DARCY: f64 = 9.869_233e-13;
/// One millidarcy in m².
pub const MILLIDARCY: f64 = MILLI * DARCY;

/// One centipoise in Pa·s.
pub const CENTIPOISE: f64 = MILLI * PASCAL * SECOND;

/// Convert degrees to radians.
pub fn degrees(angle: f64) -> f64 {
    angle.to_radians()
}
