// src/heatmap/grid.rs

use crate::math::error::{HeatmapError, HeatmapResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Interpoliertes Skalarfeld, ein Wert pro Ausgabepixel.
///
/// `NaN` markiert Pixel, für die kein Wert bestimmt werden konnte.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl ScalarGrid {
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    /// Erstellt ein Raster aus Spalten, indiziert als `columns[x][y]`.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> HeatmapResult<Self> {
        let width = columns.len();
        let height = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|column| column.len() != height) {
            return Err(HeatmapError::InvalidConfiguration {
                message: "all grid columns must have the same length".to_string(),
            });
        }
        Ok(Self::from_fn(width, height, |x, y| columns[x][y]))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.values[y * self.width + x])
        } else {
            None
        }
    }

    /// Zeilenweise (y außen, x innen)
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iteriert über `(x, y, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (i % self.width, i / self.width, *v))
    }

    pub fn nan_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Raster, das während der Interpolation von vielen Workern gleichzeitig
/// beschrieben wird. Jede Zelle gehört genau einem Task, daher genügt
/// ein atomarer Store ohne Lock.
#[derive(Debug)]
pub struct SharedGrid {
    width: usize,
    height: usize,
    cells: Vec<AtomicU64>,
}

impl SharedGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let cells = (0..width * height)
            .map(|_| AtomicU64::new(f64::NAN.to_bits()))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set(&self, x: usize, y: usize, value: f64) {
        self.cells[y * self.width + x].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        f64::from_bits(self.cells[y * self.width + x].load(Ordering::Relaxed))
    }

    /// Kopiert den aktuellen Stand in ein unveränderliches Raster.
    /// Aufrufer müssen vorher auf alle Worker gewartet haben.
    pub fn snapshot(&self) -> ScalarGrid {
        ScalarGrid {
            width: self.width,
            height: self.height,
            values: self
                .cells
                .iter()
                .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_uses_x_major_layout() {
        let grid = ScalarGrid::from_columns(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(grid.get(0, 0), Some(1.0));
        assert_eq!(grid.get(0, 1), Some(2.0));
        assert_eq!(grid.get(1, 0), Some(3.0));
        assert_eq!(grid.get(1, 1), Some(4.0));
        assert_eq!(grid.get(2, 0), None);
        assert!(ScalarGrid::from_columns(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_shared_grid_starts_as_nan_and_freezes() {
        let shared = SharedGrid::new(3, 2);
        assert!(shared.get(2, 1).is_nan());
        shared.set(2, 1, 7.5);
        shared.set(0, 0, -1.0);
        let grid = shared.snapshot();
        assert_eq!(grid.get(2, 1), Some(7.5));
        assert_eq!(grid.get(0, 0), Some(-1.0));
        assert_eq!(grid.nan_count(), 4);
    }

    #[test]
    fn test_iter_yields_coordinates() {
        let grid = ScalarGrid::from_fn(2, 3, |x, y| (x * 10 + y) as f64);
        let collected: Vec<_> = grid.iter().collect();
        assert_eq!(collected.len(), 6);
        assert!(collected.contains(&(1, 2, 12.0)));
    }
}
