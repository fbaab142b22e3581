use ndarray::Array2;
use tracing::trace;

use super::{error::FitError, types::SegmentId};

/// Frozen nearest-centroid segment assignment. The clustering itself runs
/// upstream; this only carries the fitted centroid matrix, one row per
/// segment.
#[derive(Debug, Clone)]
pub struct SegmentModel {
  centroids: Array2<f32>,
}

impl SegmentModel {
  pub fn new(centroids: Array2<f32>) -> Result<Self, FitError> {
    if centroids.nrows() == 0 || centroids.ncols() == 0 {
      return Err(FitError::NoCentroids);
    }
    Ok(Self { centroids })
  }

  /// Number of segments the model was fit with.
  pub fn segments(&self) -> usize {
    self.centroids.nrows()
  }

  /// Nearest centroid by squared Euclidean distance. Ties resolve to the
  /// lower segment id.
  pub fn assign(&self, features: &[f32]) -> Result<SegmentId, FitError> {
    if features.len() != self.centroids.ncols() {
      return Err(FitError::DimensionMismatch {
        expected: self.centroids.ncols(),
        got: features.len(),
      });
    }
    let mut best = 0usize;
    let mut best_distance = f32::INFINITY;
    for (segment, centroid) in self.centroids.rows().into_iter().enumerate() {
      let distance: f32 = centroid.iter()
        .zip(features.iter())
        .map(|(center, feature)| (center - feature).powi(2))
        .sum();
      if distance < best_distance {
        best = segment;
        best_distance = distance;
      }
    }
    trace!(segment = best, "assigned guest to segment");
    Ok(SegmentId(best as u16))
  }
}
