use crate::types::{FeatureStack, HsResult, HypersegError, LabelGrid};
use ndarray::Array2;
use std::collections::VecDeque;

/// Tuning for the SLIC clustering passes
#[derive(Debug, Clone)]
pub struct SlicParams {
    /// Fixed bound on assignment/update iterations
    pub max_iterations: usize,
    /// Re-label connected components and absorb fragments afterwards
    pub enforce_connectivity: bool,
    /// Components smaller than this fraction of the nominal segment size
    /// are merged into a neighbor
    pub min_size_factor: f64,
    /// Preferred ceiling on a merged segment, as a fraction of the nominal
    /// segment size
    pub max_size_factor: f64,
}

impl Default for SlicParams {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            enforce_connectivity: true,
            min_size_factor: 0.5,
            max_size_factor: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cluster {
    y: f64,
    x: f64,
    features: Vec<f64>,
}

/// SLIC superpixel clustering over an (H, W, C) feature stack.
///
/// Clusters are seeded on a regular grid sized from `n_segments`, refined
/// with windowed k-means iterations, and optionally post-processed so every
/// label is one connected component. Labels are 1-based over the whole
/// grid; the target count is a hint, not a guarantee.
///
/// Distance between a pixel and a cluster:
/// `d^2 = d_features^2 + (d_spatial / spacing)^2 * compactness^2`,
/// so larger compactness favors spatially tight, regular superpixels.
pub fn slic(
    features: &FeatureStack,
    n_segments: usize,
    compactness: f64,
    params: &SlicParams,
) -> HsResult<LabelGrid> {
    let (h, w, c) = features.dim();
    if h == 0 || w == 0 {
        return Err(HypersegError::Processing(
            "Cannot segment an empty grid".to_string(),
        ));
    }
    if compactness < 0.0 || !compactness.is_finite() {
        return Err(HypersegError::InvalidParameter(format!(
            "Compactness must be finite and non-negative, got {}",
            compactness
        )));
    }

    let n_pixels = h * w;
    let target = n_segments.clamp(1, n_pixels);
    let spacing = ((n_pixels as f64) / (target as f64)).sqrt().max(1.0);

    // Regular seeding grid; its cell count approximates the target
    let grid_rows = ((h as f64 / spacing).round() as usize).clamp(1, h);
    let grid_cols = ((w as f64 / spacing).round() as usize).clamp(1, w);
    let n_clusters = grid_rows * grid_cols;

    log::debug!(
        "SLIC: {}x{}x{} features, target {} -> {} seeds, spacing {:.2}, compactness {:.4}",
        h,
        w,
        c,
        target,
        n_clusters,
        spacing,
        compactness
    );

    let mut clusters = Vec::with_capacity(n_clusters);
    for gi in 0..grid_rows {
        for gj in 0..grid_cols {
            let cy = (gi as f64 + 0.5) * h as f64 / grid_rows as f64;
            let cx = (gj as f64 + 0.5) * w as f64 / grid_cols as f64;
            let py = (cy as usize).min(h - 1);
            let px = (cx as usize).min(w - 1);
            let feat: Vec<f64> = (0..c).map(|ch| features[[py, px, ch]]).collect();
            clusters.push(Cluster {
                y: cy,
                x: cx,
                features: feat,
            });
        }
    }

    // Full initial assignment by grid cell keeps every pixel labeled even
    // when a moved window later fails to reach it
    let mut assign = Array2::from_shape_fn((h, w), |(y, x)| {
        let gi = (y * grid_rows / h).min(grid_rows - 1);
        let gj = (x * grid_cols / w).min(grid_cols - 1);
        (gi * grid_cols + gj) as u32
    });

    let mut dist = Array2::<f64>::from_elem((h, w), f64::INFINITY);
    let reach = 2.0 * spacing;

    for iteration in 0..params.max_iterations {
        dist.fill(f64::INFINITY);

        for (ci, cluster) in clusters.iter().enumerate() {
            let y0 = (cluster.y - reach).floor().max(0.0) as usize;
            let y1 = ((cluster.y + reach).ceil() as usize).min(h);
            let x0 = (cluster.x - reach).floor().max(0.0) as usize;
            let x1 = ((cluster.x + reach).ceil() as usize).min(w);

            for y in y0..y1 {
                for x in x0..x1 {
                    let mut d = 0.0;
                    for ch in 0..c {
                        let diff = features[[y, x, ch]] - cluster.features[ch];
                        d += diff * diff;
                    }
                    let dy = (y as f64 - cluster.y) / spacing;
                    let dx = (x as f64 - cluster.x) / spacing;
                    d += (dy * dy + dx * dx) * compactness * compactness;

                    if d < dist[[y, x]] {
                        dist[[y, x]] = d;
                        assign[[y, x]] = ci as u32;
                    }
                }
            }
        }

        // Recompute centroids from the new assignment
        let mut counts = vec![0usize; n_clusters];
        let mut sum_y = vec![0.0f64; n_clusters];
        let mut sum_x = vec![0.0f64; n_clusters];
        let mut sum_feat = vec![0.0f64; n_clusters * c];
        for y in 0..h {
            for x in 0..w {
                let ci = assign[[y, x]] as usize;
                counts[ci] += 1;
                sum_y[ci] += y as f64;
                sum_x[ci] += x as f64;
                for ch in 0..c {
                    sum_feat[ci * c + ch] += features[[y, x, ch]];
                }
            }
        }
        for (ci, cluster) in clusters.iter_mut().enumerate() {
            if counts[ci] == 0 {
                continue;
            }
            let n = counts[ci] as f64;
            cluster.y = sum_y[ci] / n;
            cluster.x = sum_x[ci] / n;
            for ch in 0..c {
                cluster.features[ch] = sum_feat[ci * c + ch] / n;
            }
        }

        log::trace!("SLIC iteration {} done", iteration);
    }

    let labels = assign.mapv(|ci| ci + 1);

    if params.enforce_connectivity {
        let segment_size = n_pixels as f64 / target as f64;
        let min_size = ((params.min_size_factor * segment_size).round() as usize).max(1);
        let max_size = ((params.max_size_factor * segment_size).round() as usize).max(min_size);
        Ok(enforce_connectivity(&labels, min_size, max_size))
    } else {
        Ok(labels)
    }
}

/// Re-label so every output label is a single 4-connected component, merging
/// components smaller than `min_size` into an adjacent segment. Merge
/// targets below `max_size` are preferred; an oversized neighbor is still
/// used before keeping a fragment. Output labels are dense starting at 1.
fn enforce_connectivity(labels: &LabelGrid, min_size: usize, max_size: usize) -> LabelGrid {
    let (h, w) = labels.dim();
    let mut out = LabelGrid::zeros((h, w));
    let mut sizes: Vec<usize> = vec![0]; // indexed by output label
    let mut next = 1u32;

    let mut queue = VecDeque::new();
    let mut component = Vec::new();
    let mut adjacent = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            if out[[sy, sx]] != 0 {
                continue;
            }

            let source = labels[[sy, sx]];
            component.clear();
            adjacent.clear();
            queue.push_back((sy, sx));
            out[[sy, sx]] = next;

            while let Some((y, x)) = queue.pop_front() {
                component.push((y, x));
                for (ny, nx) in neighbors4(y, x, h, w) {
                    let seen = out[[ny, nx]];
                    if seen == 0 {
                        if labels[[ny, nx]] == source {
                            out[[ny, nx]] = next;
                            queue.push_back((ny, nx));
                        }
                    } else if seen != next && !adjacent.contains(&seen) {
                        adjacent.push(seen);
                    }
                }
            }

            let too_small = component.len() < min_size;
            let merge_target = if too_small {
                adjacent
                    .iter()
                    .copied()
                    .find(|&a| sizes[a as usize] + component.len() <= max_size)
                    .or_else(|| adjacent.first().copied())
            } else {
                None
            };

            match merge_target {
                Some(target) => {
                    for &(y, x) in &component {
                        out[[y, x]] = target;
                    }
                    sizes[target as usize] += component.len();
                }
                None => {
                    sizes.push(component.len());
                    next += 1;
                }
            }
        }
    }

    out
}

fn neighbors4(y: usize, x: usize, h: usize, w: usize) -> impl Iterator<Item = (usize, usize)> {
    let mut out = [(0usize, 0usize); 4];
    let mut n = 0;
    if y > 0 {
        out[n] = (y - 1, x);
        n += 1;
    }
    if y + 1 < h {
        out[n] = (y + 1, x);
        n += 1;
    }
    if x > 0 {
        out[n] = (y, x - 1);
        n += 1;
    }
    if x + 1 < w {
        out[n] = (y, x + 1);
        n += 1;
    }
    out.into_iter().take(n)
}
