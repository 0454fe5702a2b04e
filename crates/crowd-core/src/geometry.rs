//! Geometry primitives for a 2.5-D world.
//!
//! The world is y-up: positions carry a vertical coordinate, but all steering,
//! neighbour, and obstacle geometry is projected onto the horizontal x–z
//! plane.  Every 2-D operation here (determinants, left-of tests, ray
//! intersections) therefore reads only `x` and `z`.
//!
//! # Orientation convention
//!
//! `det(a, b) = a.x·b.z − a.z·b.x`, and `left_of(a, b, c) > 0` means point
//! `c` lies to the *left* of the directed line a→b.  Consequently the right
//! side of a forward vector `f` in the plane is `(f.z, 0, −f.x)`.

/// Tolerance used by the degenerate-geometry guards (parallel rays,
/// zero-length segments).
pub const GEOM_EPSILON: f32 = 1e-5;

// ── Vector ────────────────────────────────────────────────────────────────────

/// A 3-D vector with single-precision components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `ZERO` when the input has
    /// (near-)zero length.
    #[inline]
    pub fn normalized(self) -> Vector {
        let len = self.length();
        if len <= GEOM_EPSILON {
            Vector::ZERO
        } else {
            self / len
        }
    }

    /// Clamp the magnitude to `max_len`, preserving direction.
    #[inline]
    pub fn clamped(self, max_len: f32) -> Vector {
        let len_sq = self.length_squared();
        if len_sq > max_len * max_len {
            self * (max_len / len_sq.sqrt())
        } else {
            self
        }
    }

    #[inline]
    pub fn dot(self, other: Vector) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The unit right-hand side of a forward vector, projected onto the
    /// horizontal plane.  `right_side` of +x is −z.
    #[inline]
    pub fn right_side_xz(self) -> Vector {
        Vector::new(self.z, 0.0, -self.x)
    }

    /// Project onto the horizontal plane (zero the vertical component).
    #[inline]
    pub fn flattened(self) -> Vector {
        Vector::new(self.x, 0.0, self.z)
    }
}

/// 2-D determinant on the horizontal plane.
///
/// Rows are the x–z projections of `a` and `b`.
#[inline]
pub fn det(a: Vector, b: Vector) -> f32 {
    a.x * b.z - a.z * b.x
}

/// Signed area test: positive when `c` lies to the left of the directed
/// line a→b (horizontal plane).
#[inline]
pub fn left_of(a: Point, b: Point, c: Point) -> f32 {
    det(a - c, b - a)
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// A position in the 2.5-D world.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Shorthand for a point on the ground plane.
    #[inline]
    pub fn on_ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    #[inline]
    pub fn distance_squared(self, other: Point) -> f32 {
        (other - self).length_squared()
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }
}

// ── Operator impls ────────────────────────────────────────────────────────────

impl std::ops::Add<Vector> for Point {
    type Output = Point;
    #[inline]
    fn add(self, v: Vector) -> Point {
        Point::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl std::ops::Sub<Vector> for Point {
    type Output = Point;
    #[inline]
    fn sub(self, v: Vector) -> Point {
        Point::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl std::ops::Sub for Point {
    type Output = Vector;
    #[inline]
    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Add for Vector {
    type Output = Vector;
    #[inline]
    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vector {
    type Output = Vector;
    #[inline]
    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Neg for Vector {
    type Output = Vector;
    #[inline]
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f32> for Vector {
    type Output = Vector;
    #[inline]
    fn mul(self, s: f32) -> Vector {
        Vector::new(self.x * s, self.y * s, self.z * s)
    }
}

impl std::ops::Mul<Vector> for f32 {
    type Output = Vector;
    #[inline]
    fn mul(self, v: Vector) -> Vector {
        v * self
    }
}

impl std::ops::Div<f32> for Vector {
    type Output = Vector;
    #[inline]
    fn div(self, s: f32) -> Vector {
        Vector::new(self.x / s, self.y / s, self.z / s)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:.3}, {:.3}, {:.3}>", self.x, self.y, self.z)
    }
}

// ── AxisAlignedBox ────────────────────────────────────────────────────────────

/// An axis-aligned box.  The vertical extent is carried but most tests only
/// consult the horizontal footprint.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisAlignedBox {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
    pub zmin: f32,
    pub zmax: f32,
}

impl AxisAlignedBox {
    pub fn new(xmin: f32, xmax: f32, ymin: f32, ymax: f32, zmin: f32, zmax: f32) -> Self {
        Self { xmin, xmax, ymin, ymax, zmin, zmax }
    }

    /// A flat box on the ground plane from its horizontal extents.
    pub fn flat(xmin: f32, xmax: f32, zmin: f32, zmax: f32) -> Self {
        Self { xmin, xmax, ymin: 0.0, ymax: 0.0, zmin, zmax }
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.xmin + self.xmax),
            0.5 * (self.ymin + self.ymax),
            0.5 * (self.zmin + self.zmax),
        )
    }

    /// Horizontal containment test.
    #[inline]
    pub fn contains_xz(&self, p: Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.z >= self.zmin && p.z <= self.zmax
    }

    /// The four corners of the horizontal footprint, wound so the interior
    /// lies to the left of each directed edge (the obstacle winding the BSP
    /// expects: agents outside the polygon sit on the right of near edges).
    pub fn footprint_ccw(&self) -> [Point; 4] {
        [
            Point::on_ground(self.xmin, self.zmin),
            Point::on_ground(self.xmax, self.zmin),
            Point::on_ground(self.xmax, self.zmax),
            Point::on_ground(self.xmin, self.zmax),
        ]
    }
}

/// True when the horizontal footprint of a box overlaps a disc.
#[inline]
pub fn box_overlaps_circle_2d(
    xmin: f32,
    xmax: f32,
    zmin: f32,
    zmax: f32,
    center: Point,
    radius: f32,
) -> bool {
    let nearest_x = center.x.clamp(xmin, xmax);
    let nearest_z = center.z.clamp(zmin, zmax);
    let dx = center.x - nearest_x;
    let dz = center.z - nearest_z;
    dx * dx + dz * dz <= radius * radius
}

/// Depth by which a disc at `p` penetrates the box footprint; 0 when clear.
pub fn box_circle_penetration_2d(b: &AxisAlignedBox, p: Point, radius: f32) -> f32 {
    let nearest_x = p.x.clamp(b.xmin, b.xmax);
    let nearest_z = p.z.clamp(b.zmin, b.zmax);
    let dx = p.x - nearest_x;
    let dz = p.z - nearest_z;
    let dist = (dx * dx + dz * dz).sqrt();
    (radius - dist).max(0.0)
}

// ── Ray ───────────────────────────────────────────────────────────────────────

/// A bounded ray on the horizontal plane: `pos + t·dir` for `t ∈ [mint, maxt]`.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub pos: Point,
    pub dir: Vector,
    pub mint: f32,
    pub maxt: f32,
}

impl Ray {
    /// Ray whose parameter runs over `[0, 1]` along the (unnormalised)
    /// direction vector — `eval(1.0)` is `pos + dir`.
    pub fn with_unit_interval(pos: Point, dir: Vector) -> Self {
        Self { pos, dir, mint: 0.0, maxt: 1.0 }
    }

    /// Ray with a unit direction whose parameter is metric distance; the
    /// length of `dir` becomes `maxt`.
    pub fn with_length_interval(pos: Point, dir: Vector) -> Self {
        let len = dir.length();
        if len <= GEOM_EPSILON {
            // Degenerate feeler; keep it valid but inert.
            Self { pos, dir: Vector::ZERO, mint: 0.0, maxt: 0.0 }
        } else {
            Self { pos, dir: dir / len, mint: 0.0, maxt: len }
        }
    }

    #[inline]
    pub fn eval(&self, t: f32) -> Point {
        self.pos + self.dir * t
    }
}

// ── Intersection helpers ──────────────────────────────────────────────────────

/// Squared distance from point `c` to the segment a–b (horizontal plane).
pub fn dist_sq_point_segment(a: Point, b: Point, c: Point) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= GEOM_EPSILON * GEOM_EPSILON {
        // Zero-length segment: fall back to point distance.
        return (c - a).length_squared();
    }
    let r = (c - a).dot(ab) / len_sq;
    if r < 0.0 {
        (c - a).length_squared()
    } else if r > 1.0 {
        (c - b).length_squared()
    } else {
        (c - (a + ab * r)).length_squared()
    }
}

/// Intersect two parametric rays on the horizontal plane.
///
/// Returns `(t1, t2)` such that `p1 + t1·d1 == p2 + t2·d2`, or `None` when
/// the directions are (near-)parallel — parallel lines are treated as
/// non-intersecting per the degenerate-geometry policy.
pub fn intersect_two_rays_2d(p1: Point, d1: Vector, p2: Point, d2: Vector) -> Option<(f32, f32)> {
    let denom = det(d1, d2);
    if denom.abs() <= GEOM_EPSILON {
        return None;
    }
    let diff = p2 - p1;
    let t1 = det(diff, d2) / denom;
    let t2 = det(diff, d1) / denom;
    Some((t1, t2))
}

/// First intersection of `ray` with the segment a–b, if any, as the ray
/// parameter `t ∈ [ray.mint, ray.maxt]`.
pub fn ray_segment_intersection(ray: &Ray, a: Point, b: Point) -> Option<f32> {
    let seg = b - a;
    let (t, s) = intersect_two_rays_2d(ray.pos, ray.dir, a, seg)?;
    if s >= 0.0 && s <= 1.0 && t >= ray.mint && t <= ray.maxt {
        Some(t)
    } else {
        None
    }
}

/// First intersection of `ray` with a disc of radius `r` at `center`, if
/// any, as the ray parameter `t ∈ [ray.mint, ray.maxt]`.
pub fn ray_circle_intersection(ray: &Ray, center: Point, r: f32) -> Option<f32> {
    let to_center = (ray.pos - center).flattened();
    let d = ray.dir.flattened();
    let a = d.length_squared();
    if a <= GEOM_EPSILON * GEOM_EPSILON {
        return None;
    }
    let b = 2.0 * d.dot(to_center);
    let c = to_center.length_squared() - r * r;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let inv_2a = 0.5 / a;
    let t_near = (-b - sqrt_d) * inv_2a;
    let t_far = (-b + sqrt_d) * inv_2a;
    if t_near >= ray.mint && t_near <= ray.maxt {
        Some(t_near)
    } else if t_far >= ray.mint && t_far <= ray.maxt {
        // Ray origin inside the disc.
        Some(t_far)
    } else {
        None
    }
}

/// Depth by which two discs interpenetrate; 0 when clear.
#[inline]
pub fn circle_penetration_2d(a: Point, ra: f32, b: Point, rb: f32) -> f32 {
    let dist = (a - b).flattened().length();
    (ra + rb - dist).max(0.0)
}
