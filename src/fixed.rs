//! Deterministic numeric types shared by every actor system.
//!
//! The simulation never touches floating point for state: positions, speeds
//! and hit points are 16.16 fixed point ([`Fixed`]), headings are 14-bit
//! binary angles ([`Angle`], 16384 units per turn) and time is counted in
//! whole [`Tick`]s at [`TICKS_PER_SECOND`]. Trigonometry goes through an
//! integer sine table, so headings come out the same on every platform.
//!
//! Coordinates follow the level format: `x`/`z` span the floor plan and `y`
//! is height, growing upwards. Heading `0` faces `+z` and grows towards `+x`.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Discrete simulation time unit.
pub type Tick = u32;

/// Sentinel meaning "do not run again until re-armed".
pub const TICK_NEVER: Tick = Tick::MAX;

/// Simulation rate.
pub const TICKS_PER_SECOND: u32 = 145;

/// Signed 16.16 fixed-point number.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const FRAC_BITS: u32 = 16;
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << 16);
    pub const HALF: Fixed = Fixed(1 << 15);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    /// `FIXED(n)`: an integer lifted into fixed point.
    pub const fn from_int(n: i32) -> Self {
        Fixed(n << Self::FRAC_BITS)
    }

    /// `num / den` as fixed point. A zero denominator yields zero.
    pub const fn from_ratio(num: i32, den: i32) -> Self {
        if den == 0 {
            return Fixed::ZERO;
        }
        Fixed((((num as i64) << Self::FRAC_BITS) / den as i64) as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 65536.0
    }

    /// Integer part, rounded towards negative infinity.
    pub const fn floor(self) -> i32 {
        self.0 >> Self::FRAC_BITS
    }

    pub const fn round(self) -> i32 {
        ((self.0 as i64 + (1 << 15)) >> Self::FRAC_BITS) as i32
    }

    pub const fn abs(self) -> Self {
        Fixed(self.0.saturating_abs())
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn half(self) -> Self {
        Fixed(self.0 >> 1)
    }

    pub fn mul_int(self, n: i32) -> Self {
        Fixed(self.0.saturating_mul(n))
    }

    pub fn div_int(self, n: i32) -> Self {
        if n == 0 {
            return self;
        }
        Fixed(self.0 / n)
    }

    /// Clamp the magnitude to `limit` while keeping the sign.
    pub fn clamp_abs(self, limit: Fixed) -> Fixed {
        let limit = limit.abs();
        if self > limit {
            limit
        } else if self < -limit {
            -limit
        } else {
            self
        }
    }

    /// Elapsed seconds for a number of ticks.
    pub fn from_ticks(ticks: u32) -> Fixed {
        Fixed::from_ratio(ticks as i32, TICKS_PER_SECOND as i32)
    }

    /// Treat `self` as a per-second rate and integrate it over `ticks`.
    pub fn per_ticks(self, ticks: u32) -> Fixed {
        let raw = (i64::from(self.0) * i64::from(ticks)) / i64::from(TICKS_PER_SECOND);
        Fixed(saturate(raw))
    }

    /// Scale by the ratio `num / den` without losing precision.
    pub fn scale(self, num: Fixed, den: Fixed) -> Fixed {
        if den.0 == 0 {
            return self;
        }
        Fixed(saturate(i64::from(self.0) * i64::from(num.0) / i64::from(den.0)))
    }
}

fn saturate(raw: i64) -> i32 {
    raw.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:.4})", self.to_f64())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(self.0.saturating_neg())
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(saturate((i64::from(self.0) * i64::from(rhs.0)) >> Fixed::FRAC_BITS))
    }
}

impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            return if self.0 >= 0 { Fixed::MAX } else { Fixed::MIN };
        }
        Fixed(saturate((i64::from(self.0) << Fixed::FRAC_BITS) / i64::from(rhs.0)))
    }
}

/// 14-bit binary angle; 16384 units per full turn, always kept in range.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(i32);

impl Angle {
    pub const FULL: i32 = 16384;
    pub const HALF: i32 = 8192;
    pub const QUARTER: i32 = 4096;
    pub const MASK: i32 = 16383;
    pub const ZERO: Angle = Angle(0);

    pub const fn new(units: i32) -> Self {
        Angle(units & Self::MASK)
    }

    pub fn from_degrees(degrees: i32) -> Self {
        Angle::new(degrees * Self::FULL / 360)
    }

    pub const fn units(self) -> i32 {
        self.0
    }

    pub const fn offset(self, units: i32) -> Angle {
        Angle::new(self.0 + units)
    }

    /// Shortest signed turn from `self` to `target`, in `[-8192, 8191]`.
    pub const fn delta_to(self, target: Angle) -> i32 {
        let d = (target.0 - self.0) & Self::MASK;
        if d >= Self::HALF { d - Self::FULL } else { d }
    }

    /// Turn towards `target` by at most `max_step` units.
    pub fn step_toward(self, target: Angle, max_step: i32) -> Angle {
        let delta = self.delta_to(target);
        let max_step = max_step.max(0);
        if delta.abs() <= max_step {
            target
        } else {
            self.offset(max_step * delta.signum())
        }
    }

    pub fn sin_cos(self) -> (Fixed, Fixed) {
        let i = (self.0 & (Self::QUARTER - 1)) as usize;
        let (a, b) = (Fixed(SINE[i]), Fixed(SINE[QUARTER_UNITS - i]));
        match self.0 / Self::QUARTER {
            0 => (a, b),
            1 => (b, -a),
            2 => (-a, -b),
            _ => (-b, a),
        }
    }
}

const QUARTER_UNITS: usize = Angle::QUARTER as usize;

/// `sin` over the first quarter turn, 16.16, one entry per angle unit.
static SINE: [i32; QUARTER_UNITS + 1] = sine_table();

/// Taylor series in 4.60 fixed point, rounded to 16.16. Integer only, so
/// every platform gets the same table.
const fn sine_table() -> [i32; QUARTER_UNITS + 1] {
    const HALF_PI: i128 = 1_811_004_864_519_280_711;
    const SHIFT: u32 = 60;
    let mut table = [0; QUARTER_UNITS + 1];
    let mut i = 0;
    while i <= QUARTER_UNITS {
        let x = HALF_PI * i as i128 / QUARTER_UNITS as i128;
        let x2 = (x * x) >> SHIFT;
        let mut term = x;
        let mut sum = x;
        let mut k = 1;
        while k < 13 {
            term = ((term * x2) >> SHIFT) / ((2 * k) * (2 * k + 1));
            sum = if k % 2 == 1 { sum - term } else { sum + term };
            k += 1;
        }
        table[i] = ((sum + (1 << (SHIFT - 17))) >> (SHIFT - 16)) as i32;
        i += 1;
    }
    table
}

/// Angle in `[0, QUARTER / 2]` whose tangent is nearest `small / large`,
/// for `0 <= small <= large`, `large > 0`.
fn octant_angle(small: i128, large: i128) -> i32 {
    let sin = |a: usize| i128::from(SINE[a]);
    let cos = |a: usize| i128::from(SINE[QUARTER_UNITS - a]);
    let (mut lo, mut hi) = (0, QUARTER_UNITS / 2);
    while lo < hi {
        let mid = (lo + hi) / 2;
        if large * sin(mid) >= small * cos(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    // Both residuals are proportional to the sine of the angle error.
    if lo > 0 && small * cos(lo - 1) - large * sin(lo - 1) < large * sin(lo) - small * cos(lo) {
        lo -= 1;
    }
    lo as i32
}

/// `atan2` on raw integers, as a heading: `0` along `+dz`, growing
/// towards `+dx`.
pub(crate) fn atan2_units(dx: i64, dz: i64) -> Angle {
    if dx == 0 && dz == 0 {
        return Angle::ZERO;
    }
    let (ax, az) = (i128::from(dx).abs(), i128::from(dz).abs());
    let base = if ax <= az {
        octant_angle(ax, az)
    } else {
        Angle::QUARTER - octant_angle(az, ax)
    };
    Angle::new(match (dx >= 0, dz >= 0) {
        (true, true) => base,
        (false, true) => -base,
        (true, false) => Angle::HALF - base,
        (false, false) => Angle::HALF + base,
    })
}

/// Heading that looks along `(dx, dz)`.
pub fn vec2_to_angle(dx: Fixed, dz: Fixed) -> Angle {
    atan2_units(i64::from(dx.0), i64::from(dz.0))
}

/// Unit direction `(x, z)` for a heading.
pub fn angle_dir(angle: Angle) -> (Fixed, Fixed) {
    angle.sin_cos()
}

/// Octagonal distance estimate: `max + min / 2`.
pub fn dist_approx(dx: Fixed, dz: Fixed) -> Fixed {
    let ax = dx.abs();
    let az = dz.abs();
    if ax > az { ax + az.half() } else { az + ax.half() }
}

/// Fixed-point 3D vector. `y` is height.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FixedVec3 {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl FixedVec3 {
    pub const ZERO: FixedVec3 = FixedVec3 {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Whole-unit coordinates, mostly for tests and level data.
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
            z: Fixed::from_int(z),
        }
    }

    pub fn scale(self, factor: Fixed) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn per_ticks(self, ticks: u32) -> Self {
        Self {
            x: self.x.per_ticks(ticks),
            y: self.y.per_ticks(ticks),
            z: self.z.per_ticks(ticks),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Horizontal distance estimate to `other`.
    pub fn dist_xz(&self, other: &FixedVec3) -> Fixed {
        dist_approx(other.x - self.x, other.z - self.z)
    }

    /// Heading from `self` towards `other`.
    pub fn angle_to(&self, other: &FixedVec3) -> Angle {
        vec2_to_angle(other.x - self.x, other.z - self.z)
    }
}

impl Add for FixedVec3 {
    type Output = FixedVec3;
    fn add(self, rhs: FixedVec3) -> FixedVec3 {
        FixedVec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for FixedVec3 {
    fn add_assign(&mut self, rhs: FixedVec3) {
        *self = *self + rhs;
    }
}

impl Sub for FixedVec3 {
    type Output = FixedVec3;
    fn sub(self, rhs: FixedVec3) -> FixedVec3 {
        FixedVec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for FixedVec3 {
    type Output = FixedVec3;
    fn neg(self) -> FixedVec3 {
        FixedVec3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_int_round_trip() {
        assert_eq!(Fixed::from_int(5).floor(), 5);
        assert_eq!(Fixed::from_int(-3).floor(), -3);
        assert_eq!(Fixed::from_ratio(3, 2).round(), 2);
    }

    #[test]
    fn fixed_mul_and_div() {
        let a = Fixed::from_int(6);
        let b = Fixed::from_ratio(1, 2);
        assert_eq!(a * b, Fixed::from_int(3));
        assert_eq!(a / Fixed::from_int(3), Fixed::from_int(2));
    }

    #[test]
    fn fixed_div_by_zero_saturates() {
        assert_eq!(Fixed::ONE / Fixed::ZERO, Fixed::MAX);
        assert_eq!(-Fixed::ONE / Fixed::ZERO, Fixed::MIN);
    }

    #[test]
    fn per_ticks_integrates_one_second() {
        let speed = Fixed::from_int(10);
        assert_eq!(speed.per_ticks(TICKS_PER_SECOND), Fixed::from_int(10));
        assert_eq!(speed.per_ticks(0), Fixed::ZERO);
    }

    #[test]
    fn clamp_abs_keeps_sign() {
        let limit = Fixed::from_int(2);
        assert_eq!(Fixed::from_int(5).clamp_abs(limit), limit);
        assert_eq!(Fixed::from_int(-5).clamp_abs(limit), -limit);
        assert_eq!(Fixed::ONE.clamp_abs(limit), Fixed::ONE);
    }

    #[test]
    fn angle_wraps_and_measures_shortest_turn() {
        assert_eq!(Angle::new(Angle::FULL + 5).units(), 5);
        assert_eq!(Angle::new(-1).units(), Angle::MASK);
        assert_eq!(Angle::new(100).delta_to(Angle::new(16300)), -184);
        assert_eq!(Angle::new(16300).delta_to(Angle::new(100)), 184);
    }

    #[test]
    fn angle_step_toward_never_overshoots() {
        let from = Angle::new(0);
        let to = Angle::new(1000);
        assert_eq!(from.step_toward(to, 300).units(), 300);
        assert_eq!(from.step_toward(to, 5000), to);
    }

    #[test]
    fn fov_default_is_about_210_degrees() {
        assert_eq!(Angle::from_degrees(210).units(), 9557);
    }

    #[test]
    fn heading_convention() {
        let z = vec2_to_angle(Fixed::ZERO, Fixed::ONE);
        let x = vec2_to_angle(Fixed::ONE, Fixed::ZERO);
        assert_eq!(z.units(), 0);
        assert_eq!(x.units(), Angle::QUARTER);
        let (s, c) = angle_dir(x);
        assert_eq!(s, Fixed::ONE);
        assert!(c.abs() < Fixed(4));
    }

    #[test]
    fn sine_table_hits_the_exact_points() {
        assert_eq!(SINE[0], 0);
        assert_eq!(SINE[QUARTER_UNITS], Fixed::ONE.0);
        assert_eq!(SINE[QUARTER_UNITS / 2], 46341);
        assert!(SINE.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sin_cos_follows_the_quadrants() {
        let half = Angle::new(Angle::HALF).sin_cos();
        assert_eq!(half, (Fixed::ZERO, -Fixed::ONE));
        let three_quarters = Angle::new(3 * Angle::QUARTER).sin_cos();
        assert_eq!(three_quarters, (-Fixed::ONE, Fixed::ZERO));
        let (s, c) = Angle::new(Angle::HALF + Angle::QUARTER / 2).sin_cos();
        assert_eq!((s.0, c.0), (-46341, -46341));
    }

    #[test]
    fn heading_covers_every_quadrant() {
        let one = Fixed::ONE;
        assert_eq!(vec2_to_angle(Fixed::ZERO, -one).units(), Angle::HALF);
        assert_eq!(vec2_to_angle(-one, Fixed::ZERO).units(), 3 * Angle::QUARTER);
        assert_eq!(vec2_to_angle(one, one).units(), Angle::QUARTER / 2);
        assert_eq!(vec2_to_angle(-one, -one).units(), Angle::HALF + Angle::QUARTER / 2);
        assert_eq!(vec2_to_angle(Fixed::ZERO, Fixed::ZERO), Angle::ZERO);
    }

    #[test]
    fn heading_inverts_the_direction_table() {
        for units in (0..Angle::FULL).step_by(97) {
            let angle = Angle::new(units);
            let (s, c) = angle.sin_cos();
            let back = vec2_to_angle(s.mul_int(1000), c.mul_int(1000));
            assert!(angle.delta_to(back).abs() <= 1, "{units} came back as {}", back.units());
        }
    }

    #[test]
    fn dist_approx_is_octagonal() {
        let d = dist_approx(Fixed::from_int(4), Fixed::from_int(-2));
        assert_eq!(d, Fixed::from_int(5));
    }
}
