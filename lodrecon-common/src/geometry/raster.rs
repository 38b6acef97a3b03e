/// A single-band, geo-referenced raster (`spec.md` §4.1 `ImageMap`): a
/// mapping from a band name to a 2D grid of floats, with an origin, a
/// cell size, and a no-data sentinel.
#[derive(Debug, Clone)]
pub struct ImageMap {
    pub band: String,
    pub width: usize,
    pub height: usize,
    /// Lower-left corner of the raster, in the working coordinate system
    /// (`spec.md` §3 invariant: "origin is the bounding box's lower-left").
    pub origin: [f64; 2],
    pub cell_size: f64,
    pub nodata: f32,
    data: Vec<f32>,
}

impl ImageMap {
    pub fn new(
        band: impl Into<String>,
        width: usize,
        height: usize,
        origin: [f64; 2],
        cell_size: f64,
        nodata: f32,
    ) -> Self {
        ImageMap {
            band: band.into(),
            width,
            height,
            origin,
            cell_size,
            nodata,
            data: vec![nodata; width * height],
        }
    }

    #[inline]
    fn index(&self, col: usize, row: usize) -> usize {
        debug_assert!(col < self.width && row < self.height);
        row * self.width + col
    }

    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.data[self.index(col, row)]
    }

    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        let idx = self.index(col, row);
        self.data[idx] = value;
    }

    pub fn is_nodata(&self, col: usize, row: usize) -> bool {
        self.get(col, row) == self.nodata
    }

    pub fn cell_center(&self, col: usize, row: usize) -> [f64; 2] {
        [
            self.origin[0] + (col as f64 + 0.5) * self.cell_size,
            self.origin[1] + (row as f64 + 0.5) * self.cell_size,
        ]
    }

    /// The (col, row) of the cell containing `p`, or `None` if outside
    /// the raster extent.
    pub fn cell_of(&self, p: [f64; 2]) -> Option<(usize, usize)> {
        let fx = (p[0] - self.origin[0]) / self.cell_size;
        let fy = (p[1] - self.origin[1]) / self.cell_size;
        if fx < 0.0 || fy < 0.0 {
            return None;
        }
        let col = fx as usize;
        let row = fy as usize;
        if col >= self.width || row >= self.height {
            return None;
        }
        Some((col, row))
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| (col, row)))
    }

    /// `raster.origin + (width, height) * cellsize`, used by the alignment
    /// invariant test in `spec.md` §8.
    pub fn extent_max(&self) -> [f64; 2] {
        [
            self.origin[0] + self.width as f64 * self.cell_size,
            self.origin[1] + self.height as f64 * self.cell_size,
        ]
    }
}
