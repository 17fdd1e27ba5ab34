use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Three-component vector used for positions, velocities and steering forces.
///
/// Every operation is total: NaN and infinities propagate through the
/// arithmetic without being guarded. The only special case is the zero
/// vector, which `normalize` and `div` leave untouched instead of producing
/// NaN. In-place arithmetic goes through the assign operators (`+=`, `-=`,
/// `*=`); `Vec3::sum` / `Vec3::diff` and the binary operators allocate.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Allocating sum, `a + b`.
    #[inline]
    #[must_use]
    pub fn sum(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
    }

    /// Allocating difference, `a - b`.
    #[inline]
    #[must_use]
    pub fn diff(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
    }

    #[inline]
    pub fn mult(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
        self.z *= scalar;
    }

    /// Divides in place. Division by zero is a no-op.
    #[inline]
    pub fn div(&mut self, scalar: f64) {
        if scalar != 0.0 {
            self.x /= scalar;
            self.y /= scalar;
            self.z /= scalar;
        }
    }

    #[inline]
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    #[inline]
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Scales to unit length. The zero vector stays zero.
    #[inline]
    pub fn normalize(&mut self) {
        let mag = self.magnitude();
        if mag != 0.0 && mag != 1.0 {
            self.div(mag);
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(mut self) -> Vec3 {
        self.normalize();
        self
    }

    /// Rescales to `max` only when the magnitude exceeds it.
    #[inline]
    pub fn limit(&mut self, max: f64) {
        if self.magnitude() > max {
            self.normalize();
            self.mult(max);
        }
    }

    #[inline]
    #[must_use]
    pub fn limited(mut self, max: f64) -> Vec3 {
        self.limit(max);
        self
    }

    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: Vec3) -> f64 {
        Vec3::diff(*self, other).magnitude()
    }

    #[inline]
    #[must_use]
    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Heading angle on the horizontal (x/z) plane, in radians.
    #[must_use]
    pub fn heading(&self) -> f64 {
        self.x.atan2(self.z)
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::sum(self, rhs)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::diff(self, rhs)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl MulAssign<f64> for Vec3 {
    fn mul_assign(&mut self, rhs: f64) {
        self.mult(rhs);
    }
}
