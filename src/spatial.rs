//! Spatial indexing for fast position-to-hole lookups
//!
//! This module is only available with the `spatial-index` feature.

#[cfg(feature = "spatial-index")]
use glam::DVec2;
#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

/// Wrapper around a KD-tree for collar position queries
///
/// Converts a 2D plan position (from a canvas click, a snap tool, an
/// import preview) into the index of the nearest hole in O(log n).
#[cfg(feature = "spatial-index")]
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
}

#[cfg(feature = "spatial-index")]
impl SpatialIndex {
    /// Build the index from collar positions
    ///
    /// Built once per engine invocation over the immutable hole snapshot.
    ///
    /// # Example
    ///
    /// ```
    /// use blast_geometry::SpatialIndex;
    /// use glam::DVec2;
    ///
    /// let collars = vec![
    ///     DVec2::new(0.0, 0.0),
    ///     DVec2::new(3.0, 0.0),
    ///     DVec2::new(6.0, 0.0),
    /// ];
    /// let index = SpatialIndex::new(&collars);
    /// assert_eq!(index.find_nearest(DVec2::new(3.2, 0.4)), 1);
    /// ```
    pub fn new(collars: &[DVec2]) -> Self {
        let points: Vec<[f64; 2]> = collars.iter().map(|c| [c.x, c.y]).collect();
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        }
    }

    /// Index of the hole whose collar is nearest to `position`
    pub fn find_nearest(&self, position: DVec2) -> usize {
        let query = [position.x, position.y];
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query);
        result.item
    }
}

#[cfg(test)]
#[cfg(feature = "spatial-index")]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_collar() {
        let collars = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(0.0, 3.5),
            DVec2::new(3.0, 3.5),
        ];
        let index = SpatialIndex::new(&collars);

        assert_eq!(index.find_nearest(DVec2::new(0.1, 0.2)), 0);
        assert_eq!(index.find_nearest(DVec2::new(2.8, 3.3)), 3);
    }

    #[test]
    fn test_exact_match() {
        let collars = vec![DVec2::new(10.0, 20.0), DVec2::new(-5.0, 7.0)];
        let index = SpatialIndex::new(&collars);
        assert_eq!(index.find_nearest(collars[1]), 1);
    }
}
