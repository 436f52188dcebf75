//! Sequence-weighted density clustering of hole collars
//!
//! Rows of a drill pattern are near-linear chains, so plain distance-based
//! clustering merges adjacent rows whenever burden and spacing are similar.
//! The trick here is to weight the pairwise distance matrix before linkage:
//! a pair aligned with a candidate chain axis counts as closer than the
//! same distance across rows. Single-linkage merging with a cut relative to
//! the median weighted nearest-neighbour distance then separates rows even
//! on square patterns.
//!
//! The chain axis cannot be read off nearest-neighbour headings alone: on
//! the common bench geometry (spacing larger than burden) every hole's
//! nearest neighbour sits in the adjacent row, perpendicular to the actual
//! rows. Both the voted axis and its normal are therefore clustered as
//! candidates, and the outcome whose clusters form longer, axis-aligned
//! chains wins.

use glam::DVec2;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::geometry::principal_axis;

/// Minimum mean alignment between intra-cluster nearest-neighbour headings
/// and the candidate axis for the outcome to count as chain-shaped
const MIN_AXIS_ALIGNMENT: f64 = 0.7;

/// Knobs forwarded from the engine configuration
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClusterParams {
    /// Discount applied to fully chain-aligned pairs, `[0, 1)`
    pub chain_affinity: f64,
    /// Linkage cut as a multiple of the median weighted NN distance
    pub cluster_scale: f64,
}

/// One clustering outcome for a candidate chain axis
struct AxisOutcome {
    labels: Vec<Option<usize>>,
    cluster_count: usize,
    /// Mean `|heading · axis|` over intra-cluster nearest-neighbour pairs;
    /// `None` when no cluster has two distinct points
    alignment: Option<f64>,
}

impl AxisOutcome {
    /// Whether the clusters actually chain along the candidate axis
    fn chain_shaped(&self) -> bool {
        self.alignment.map_or(true, |a| a >= MIN_AXIS_ALIGNMENT)
    }
}

/// Cluster points into rows
///
/// Returns one label per point: `Some(cluster)` with clusters numbered by
/// first appearance, or `None` for noise points that no multi-point cluster
/// absorbed (the caller force-assigns those). If linkage produces only
/// singletons, every point becomes its own cluster instead of noise.
///
/// Requires `points.len() >= 2`; terminates on any input, including
/// duplicate and collinear points.
pub(crate) fn cluster_points(
    points: &[DVec2],
    params: &ClusterParams,
    cancel: Option<&CancelToken>,
) -> Result<Vec<Option<usize>>> {
    debug_assert!(points.len() >= 2);

    let dist = distance_matrix(points, cancel)?;
    let voted = dominant_axis(points, &dist);
    let normal = fold_axis(voted + std::f64::consts::FRAC_PI_2);

    let first = cluster_along_axis(points, &dist, voted, params, cancel)?;
    let second = cluster_along_axis(points, &dist, normal, params, cancel)?;

    // Rows run along the axis giving the longer chains; an outcome whose
    // clusters lie across its own axis is no row structure at all
    let take_second = match (first.chain_shaped(), second.chain_shaped()) {
        (true, true) => second.cluster_count < first.cluster_count,
        (false, true) => true,
        _ => false,
    };
    Ok(if take_second { second.labels } else { first.labels })
}

/// Full pairwise distance matrix, row-major
fn distance_matrix(points: &[DVec2], cancel: Option<&CancelToken>) -> Result<Vec<f64>> {
    let n = points.len();
    let mut dist = vec![0.0; n * n];
    for i in 0..n {
        if let Some(token) = cancel {
            token.check()?;
        }
        for j in (i + 1)..n {
            let d = points[i].distance(points[j]);
            dist[i * n + j] = d;
            dist[j * n + i] = d;
        }
    }
    Ok(dist)
}

/// Fold an angle to an axis in `[0, π)`
fn fold_axis(angle: f64) -> f64 {
    let folded = angle.rem_euclid(std::f64::consts::PI);
    if folded == std::f64::consts::PI {
        0.0
    } else {
        folded
    }
}

/// Voted chain axis of the pattern, radians in `[0, π)`
///
/// Each point votes with the heading towards its nearest neighbour, folded
/// to an axis by angle doubling. A decisive resultant wins; an ambiguous
/// one (perfectly square patterns, heavy duplication) falls back to the
/// principal axis of the whole point cloud, which stays deterministic.
fn dominant_axis(points: &[DVec2], dist: &[f64]) -> f64 {
    let n = points.len();
    let mut resultant = DVec2::ZERO;
    let mut votes = 0usize;

    for i in 0..n {
        let mut best = usize::MAX;
        let mut best_d = f64::INFINITY;
        for j in 0..n {
            if j != i && dist[i * n + j] < best_d {
                best_d = dist[i * n + j];
                best = j;
            }
        }
        if best == usize::MAX || best_d < f64::EPSILON {
            continue; // coincident points have no heading
        }
        let heading = points[best] - points[i];
        let theta = heading.y.atan2(heading.x);
        resultant += DVec2::new((2.0 * theta).cos(), (2.0 * theta).sin());
        votes += 1;
    }

    if votes > 0 && resultant.length() > 0.5 * votes as f64 {
        fold_axis(0.5 * resultant.y.atan2(resultant.x))
    } else {
        principal_axis(points)
    }
}

/// Run the weighted single-linkage clustering for one candidate axis
fn cluster_along_axis(
    points: &[DVec2],
    dist: &[f64],
    axis: f64,
    params: &ClusterParams,
    cancel: Option<&CancelToken>,
) -> Result<AxisOutcome> {
    let n = points.len();
    let u = DVec2::new(axis.cos(), axis.sin());
    let weighted = weighted_distances(points, dist, u, params.chain_affinity, cancel)?;

    // Median nearest-neighbour distance sets the linkage scale
    let mut nearest: Vec<f64> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| weighted[i * n + j])
                .fold(f64::INFINITY, f64::min)
        })
        .collect();
    nearest.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let cut = params.cluster_scale * nearest[n / 2];

    // Single-linkage: union every pair within the cut
    let mut dsu = DisjointSet::new(n);
    for i in 0..n {
        if let Some(token) = cancel {
            token.check()?;
        }
        for j in (i + 1)..n {
            if weighted[i * n + j] <= cut {
                dsu.union(i, j);
            }
        }
    }

    let labels = labels_from_components(&mut dsu, n);
    let cluster_count = labels
        .iter()
        .flatten()
        .max()
        .map_or(0, |&m| m + 1);
    let alignment = axis_alignment(points, dist, &labels, u);

    Ok(AxisOutcome {
        labels,
        cluster_count,
        alignment,
    })
}

/// Pairwise distances discounted by alignment with the candidate axis
fn weighted_distances(
    points: &[DVec2],
    dist: &[f64],
    u: DVec2,
    chain_affinity: f64,
    cancel: Option<&CancelToken>,
) -> Result<Vec<f64>> {
    let n = points.len();
    let mut weighted = vec![0.0; n * n];
    for i in 0..n {
        if let Some(token) = cancel {
            token.check()?;
        }
        for j in (i + 1)..n {
            let d = dist[i * n + j];
            let w = if d < f64::EPSILON {
                0.0
            } else {
                let align = ((points[j] - points[i]) / d).dot(u).abs();
                d * (1.0 - chain_affinity * align)
            };
            weighted[i * n + j] = w;
            weighted[j * n + i] = w;
        }
    }
    Ok(weighted)
}

/// Mean alignment between intra-cluster nearest-neighbour headings and `u`
fn axis_alignment(
    points: &[DVec2],
    dist: &[f64],
    labels: &[Option<usize>],
    u: DVec2,
) -> Option<f64> {
    let n = points.len();
    let mut sum = 0.0;
    let mut count = 0usize;

    for i in 0..n {
        let Some(label) = labels[i] else { continue };
        let mut best = usize::MAX;
        let mut best_d = f64::INFINITY;
        for j in 0..n {
            if j != i && labels[j] == Some(label) && dist[i * n + j] < best_d {
                best_d = dist[i * n + j];
                best = j;
            }
        }
        if best == usize::MAX || best_d < f64::EPSILON {
            continue;
        }
        sum += ((points[best] - points[i]) / best_d).dot(u).abs();
        count += 1;
    }

    (count > 0).then(|| sum / count as f64)
}

/// Component ids, with singleton components demoted to noise when any
/// multi-point cluster exists
fn labels_from_components(dsu: &mut DisjointSet, n: usize) -> Vec<Option<usize>> {
    let mut sizes = vec![0usize; n];
    for i in 0..n {
        sizes[dsu.find(i)] += 1;
    }
    let has_multi = sizes.iter().any(|&s| s >= 2);

    let mut labels = vec![None; n];
    let mut next = 0usize;
    let mut root_label = vec![usize::MAX; n];
    for i in 0..n {
        let root = dsu.find(i);
        if has_multi && sizes[root] < 2 {
            continue; // noise, force-assigned by the caller
        }
        if root_label[root] == usize::MAX {
            root_label[root] = next;
            next += 1;
        }
        labels[i] = Some(root_label[root]);
    }
    labels
}

/// Union-find with path halving
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Attach the larger root index under the smaller for stable ids
            if ra < rb {
                self.parent[rb] = ra;
            } else {
                self.parent[ra] = rb;
            }
        }
    }
}
