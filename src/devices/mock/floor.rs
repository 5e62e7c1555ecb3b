//! Reflectance model of a tiled floor with dark grid lines

/// Grid lines run along every multiple of `tile_size` in both axes.
#[derive(Debug, Clone)]
pub struct FloorModel {
    tile_size: f64,
    half_width: f64,
    floor: f64,
    line: f64,
}

impl FloorModel {
    pub fn new(tile_size: f64, line_width: f64, floor: f64, line: f64) -> Self {
        Self {
            tile_size,
            half_width: 0.5 * line_width,
            floor,
            line,
        }
    }

    /// True if (x, y) lies on a grid line
    pub fn on_line(&self, x: f64, y: f64) -> bool {
        self.line_distance(x) <= self.half_width || self.line_distance(y) <= self.half_width
    }

    /// Noise-free reflectance at (x, y)
    pub fn intensity_at(&self, x: f64, y: f64) -> f64 {
        if self.on_line(x, y) { self.line } else { self.floor }
    }

    fn line_distance(&self, coord: f64) -> f64 {
        let nearest = (coord / self.tile_size).round() * self.tile_size;
        (coord - nearest).abs()
    }
}
