use glam::DVec3;
use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh is not configured: {0}")]
    NotConfigured(&'static str),
    #[error("degenerate bounds along {axis:?}: origin {origin} must lie below extrema {extrema}")]
    DegenerateBounds {
        axis: Axis,
        origin: f64,
        extrema: f64,
    },
    #[error("vector length {len} does not match mesh size {expected}")]
    ShapeMismatch { len: usize, expected: usize },
}

/// Coordinate axis of the Cartesian grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn component(self, v: DVec3) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

}

/// Which side of a point a neighbor sits on, along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Minus,
    Plus,
}

/// Classification of a mesh point relative to the embedded domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Interior,
    Border,
    Exterior,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim {
    One,
    Two,
    Three,
}

/// Index-based reference to an adjacent point.
///
/// `distance` is the physical separation, which differs from the grid spacing
/// next to an inserted border point. `wrap` marks the periodic image link that
/// closes an axis (last point back to first).
#[derive(Clone, Copy, Debug)]
pub struct Neighbor {
    pub index: usize,
    pub axis: Axis,
    pub side: Side,
    pub distance: f64,
    pub wrap: bool,
}

/// A single mesh point: immutable coordinates plus the classification and
/// neighbor list maintained during construction and border insertion.
#[derive(Clone, Debug)]
pub struct Point {
    coords: DVec3,
    index: usize,
    location: Location,
    neighbors: Vec<Neighbor>,
}

impl Point {
    fn new(coords: DVec3, index: usize, location: Location) -> Self {
        Self {
            coords,
            index,
            location,
            neighbors: Vec::new(),
        }
    }

    #[inline]
    pub fn coords(&self) -> DVec3 {
        self.coords
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.coords.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.coords.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.coords.z
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.coords - self.coords).length()
    }

    pub fn neighbors(&self) -> &[Neighbor] {
        &self.neighbors
    }

    /// First neighbor on the given axis and side, if any.
    pub fn neighbor(&self, axis: Axis, side: Side) -> Option<&Neighbor> {
        self.neighbors
            .iter()
            .find(|n| n.axis == axis && n.side == side)
    }
}

/// Structured Cartesian grid with an embedded-domain classification.
///
/// Grid points are stored first, in row-major `(i, j, k)` order; border points
/// inserted by level-set detection are appended behind them. Vectors and
/// matrices over the mesh share this index space.
pub struct Mesh {
    origin: DVec3,
    extrema: DVec3,
    nx: usize,
    ny: usize,
    nz: usize,
    hx: f64,
    hy: f64,
    hz: f64,
    dim: Dim,
    points: Vec<Point>,
    n_grid: usize,
    border: Vec<usize>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// An unconfigured mesh: zeroed bounds and counts, no points.
    pub fn new() -> Self {
        Self {
            origin: DVec3::ZERO,
            extrema: DVec3::ZERO,
            nx: 0,
            ny: 0,
            nz: 0,
            hx: 0.0,
            hy: 0.0,
            hz: 0.0,
            dim: Dim::One,
            points: Vec::new(),
            n_grid: 0,
            border: Vec::new(),
        }
    }

    pub fn set_bounds(&mut self, origin: DVec3, extrema: DVec3) {
        self.origin = origin;
        self.extrema = extrema;
    }

    pub fn set_nx(&mut self, nx: usize) {
        self.nx = nx;
    }

    pub fn set_ny(&mut self, ny: usize) {
        self.ny = ny;
    }

    pub fn set_nz(&mut self, nz: usize) {
        self.nz = nz;
    }

    /// Shift both bounds by `d`. Configuration-time helper; does not move
    /// already-built points.
    pub fn translate(&mut self, d: DVec3) {
        self.origin += d;
        self.extrema += d;
    }

    /// Scale both bounds about the coordinate origin. Configuration-time
    /// helper; does not move already-built points.
    pub fn scale(&mut self, s: f64) {
        self.origin *= s;
        self.extrema *= s;
    }

    /// Materialize the grid from the configured bounds and counts.
    ///
    /// Every point starts `Interior` with axis-neighbor links at the uniform
    /// spacing, plus one wrap link per active axis closing last to first.
    /// Building again reconstructs from scratch and invalidates any point
    /// indices held outside the mesh.
    pub fn build(&mut self) -> Result<(), MeshError> {
        if self.nx < 2 {
            return Err(MeshError::NotConfigured("Nx must be at least 2"));
        }
        // An unset count means the axis is inactive: a single layer of points.
        self.ny = self.ny.max(1);
        self.nz = self.nz.max(1);

        self.dim = if self.nz > 1 {
            Dim::Three
        } else if self.ny > 1 {
            Dim::Two
        } else {
            Dim::One
        };

        for &axis in self.active_axes() {
            let o = axis.component(self.origin);
            let e = axis.component(self.extrema);
            if e <= o {
                return Err(MeshError::DegenerateBounds {
                    axis,
                    origin: o,
                    extrema: e,
                });
            }
        }

        let span = self.extrema - self.origin;
        self.hx = span.x / (self.nx - 1) as f64;
        self.hy = if self.ny > 1 {
            span.y / (self.ny - 1) as f64
        } else {
            0.0
        };
        self.hz = if self.nz > 1 {
            span.z / (self.nz - 1) as f64
        } else {
            0.0
        };

        self.n_grid = self.nx * self.ny * self.nz;
        self.points = Vec::with_capacity(self.n_grid);
        self.border = Vec::new();

        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let coords = self.origin
                        + DVec3::new(i as f64 * self.hx, j as f64 * self.hy, k as f64 * self.hz);
                    let index = self.points.len();
                    debug_assert_eq!(index, self.index(i, j, k));
                    self.points
                        .push(Point::new(coords, index, Location::Interior));
                }
            }
        }

        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let neighbors = self.grid_neighbors(i, j, k);
                    let index = self.index(i, j, k);
                    self.points[index].neighbors = neighbors;
                }
            }
        }

        Ok(())
    }

    fn grid_neighbors(&self, i: usize, j: usize, k: usize) -> Vec<Neighbor> {
        let mut out = Vec::with_capacity(2 * self.active_axes().len());
        for &axis in self.active_axes() {
            let (pos, n, h) = match axis {
                Axis::X => (i, self.nx, self.hx),
                Axis::Y => (j, self.ny, self.hy),
                Axis::Z => (k, self.nz, self.hz),
            };
            let at = |p: usize| match axis {
                Axis::X => self.index(p, j, k),
                Axis::Y => self.index(i, p, k),
                Axis::Z => self.index(i, j, p),
            };
            let (minus, wrap_minus) = if pos > 0 { (pos - 1, false) } else { (n - 1, true) };
            let (plus, wrap_plus) = if pos < n - 1 { (pos + 1, false) } else { (0, true) };
            out.push(Neighbor {
                index: at(minus),
                axis,
                side: Side::Minus,
                distance: h,
                wrap: wrap_minus,
            });
            out.push(Neighbor {
                index: at(plus),
                axis,
                side: Side::Plus,
                distance: h,
                wrap: wrap_plus,
            });
        }
        out
    }

    /// Canonical row-major linear index of grid node `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.nx * (j + self.ny * k)
    }

    /// Inverse of [`Mesh::index`] over the Cartesian part of the arena.
    #[inline]
    pub fn unravel(&self, index: usize) -> (usize, usize, usize) {
        let i = index % self.nx;
        let j = (index / self.nx) % self.ny;
        let k = index / (self.nx * self.ny);
        (i, j, k)
    }

    #[inline]
    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    #[inline]
    pub fn point_at(&self, i: usize, j: usize, k: usize) -> &Point {
        &self.points[self.index(i, j, k)]
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Number of Cartesian grid points, excluding inserted border points.
    #[inline]
    pub fn num_grid_points(&self) -> usize {
        self.n_grid
    }

    /// Total number of points, including inserted border points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn bounds(&self) -> (DVec3, DVec3) {
        (self.origin, self.extrema)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    pub fn hx(&self) -> f64 {
        self.hx
    }

    pub fn hy(&self) -> f64 {
        self.hy
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }

    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn active_axes(&self) -> &'static [Axis] {
        match self.dim {
            Dim::One => &[Axis::X],
            Dim::Two => &[Axis::X, Axis::Y],
            Dim::Three => &[Axis::X, Axis::Y, Axis::Z],
        }
    }

    /// Volume of one grid cell: the product of the active spacings.
    pub fn cell_measure(&self) -> f64 {
        let mut m = self.hx;
        if self.ny > 1 {
            m *= self.hy;
        }
        if self.nz > 1 {
            m *= self.hz;
        }
        m
    }

    /// Indices of every point classified `Border`, in insertion order.
    pub fn border_indices(&self) -> &[usize] {
        &self.border
    }

    pub fn set_location(&mut self, index: usize, location: Location) {
        let old = self.points[index].location;
        self.points[index].location = location;
        if location == Location::Border && old != Location::Border {
            self.border.push(index);
        } else if old == Location::Border && location != Location::Border {
            self.border.retain(|&b| b != index);
        }
    }

    /// Append a free-standing point classified `Border`.
    pub fn add_point_on_border(&mut self, coords: DVec3) -> usize {
        let index = self.points.len();
        self.points.push(Point::new(coords, index, Location::Border));
        self.border.push(index);
        index
    }

    /// Append a free-standing point classified `Interior`.
    pub fn add_point_on_domain(&mut self, coords: DVec3) -> usize {
        let index = self.points.len();
        self.points
            .push(Point::new(coords, index, Location::Interior));
        index
    }

    /// Insert a border point between axis-adjacent points `p` and `q`,
    /// splicing it into both neighbor lists in place of their direct link.
    /// `p` must be the minus-side point of the pair.
    pub(crate) fn splice_border_point(
        &mut self,
        p: usize,
        q: usize,
        axis: Axis,
        coords: DVec3,
    ) -> usize {
        let b = self.add_point_on_border(coords);
        // A crossing can land on a grid point to rounding; the clamp keeps
        // both stencil distances strictly positive.
        let link = self.points[p].distance_to(&self.points[q]);
        let min_d = link * 1e-12;
        let d_p = (coords - self.points[p].coords).length().max(min_d);
        let d_q = (self.points[q].coords - coords).length().max(min_d);

        for n in &mut self.points[p].neighbors {
            if n.axis == axis && n.side == Side::Plus && n.index == q {
                n.index = b;
                n.distance = d_p;
                n.wrap = false;
            }
        }
        for n in &mut self.points[q].neighbors {
            if n.axis == axis && n.side == Side::Minus && n.index == p {
                n.index = b;
                n.distance = d_q;
                n.wrap = false;
            }
        }
        self.points[b].neighbors = vec![
            Neighbor {
                index: p,
                axis,
                side: Side::Minus,
                distance: d_p,
                wrap: false,
            },
            Neighbor {
                index: q,
                axis,
                side: Side::Plus,
                distance: d_q,
                wrap: false,
            },
        ];
        b
    }

    /// Zero every vector entry whose point is classified `Exterior`, so that
    /// only the embedded domain contributes to error norms.
    pub fn zero_exterior_in(&self, v: &mut DVector<f64>) -> Result<(), MeshError> {
        if v.len() != self.num_points() {
            return Err(MeshError::ShapeMismatch {
                len: v.len(),
                expected: self.num_points(),
            });
        }
        for p in &self.points {
            if p.location == Location::Exterior {
                v[p.index] = 0.0;
            }
        }
        Ok(())
    }
}
