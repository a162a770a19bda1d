//! Temporally constrained agglomerative segmentation
//!
//! Partitions a sequence of feature frames into contiguous segments by
//! repeatedly merging the pair of *adjacent* clusters with the smallest Ward
//! linkage cost until the requested number of clusters remains.
//!
//! Merge candidates live in a min-heap with lazy invalidation: every merge bumps
//! the surviving cluster's version, and stale heap entries are skipped on pop.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::dsp::{MfccFrame, N_MFCC};

/// Default number of clusters requested from the segmenter
pub const DEFAULT_SEGMENT_COUNT: usize = 10;

struct Cluster {
    sum: [f64; N_MFCC],
    count: usize,
    prev: Option<usize>,
    next: Option<usize>,
    alive: bool,
    version: u32,
}

impl Cluster {
    fn centroid_distance_sq(&self, other: &Cluster) -> f64 {
        let (na, nb) = (self.count as f64, other.count as f64);
        self.sum
            .iter()
            .zip(&other.sum)
            .map(|(a, b)| (a / na - b / nb).powi(2))
            .sum()
    }

    fn ward_cost(&self, other: &Cluster) -> f64 {
        let (na, nb) = (self.count as f64, other.count as f64);
        na * nb / (na + nb) * self.centroid_distance_sq(other)
    }
}

#[derive(Debug)]
struct MergeCandidate {
    cost: f64,
    left: usize,
    right: usize,
    left_version: u32,
    right_version: u32,
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    // Reversed: BinaryHeap is a max-heap, we want the cheapest (then earliest) merge first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.left.cmp(&self.left))
    }
}

/// Assign each frame a segment label
///
/// Labels are contiguous runs numbered 0, 1, 2, ... in temporal order. The
/// result has `min(n_segments, frames.len())` distinct labels (at least one
/// when `frames` is non-empty).
pub fn segment_frames(frames: &[MfccFrame], n_segments: usize) -> Vec<usize> {
    let n = frames.len();
    if n == 0 {
        return Vec::new();
    }
    let target = n_segments.max(1);

    let mut clusters: Vec<Cluster> = frames
        .iter()
        .enumerate()
        .map(|(i, frame)| Cluster {
            sum: *frame,
            count: 1,
            prev: i.checked_sub(1),
            next: (i + 1 < n).then_some(i + 1),
            alive: true,
            version: 0,
        })
        .collect();

    let mut heap = BinaryHeap::with_capacity(n);
    for i in 0..n.saturating_sub(1) {
        heap.push(candidate(&clusters, i, i + 1));
    }

    let mut remaining = n;
    while remaining > target {
        let Some(merge) = heap.pop() else { break };

        let (left, right) = (&clusters[merge.left], &clusters[merge.right]);
        let stale = !left.alive
            || !right.alive
            || left.version != merge.left_version
            || right.version != merge.right_version
            || left.next != Some(merge.right);
        if stale {
            continue;
        }

        let absorbed_sum = clusters[merge.right].sum;
        let absorbed_count = clusters[merge.right].count;
        let absorbed_next = clusters[merge.right].next;
        clusters[merge.right].alive = false;

        let survivor = &mut clusters[merge.left];
        for (acc, value) in survivor.sum.iter_mut().zip(absorbed_sum) {
            *acc += value;
        }
        survivor.count += absorbed_count;
        survivor.next = absorbed_next;
        survivor.version += 1;

        if let Some(next) = absorbed_next {
            clusters[next].prev = Some(merge.left);
        }
        remaining -= 1;

        if let Some(prev) = clusters[merge.left].prev {
            heap.push(candidate(&clusters, prev, merge.left));
        }
        if let Some(next) = clusters[merge.left].next {
            heap.push(candidate(&clusters, merge.left, next));
        }
    }

    // Frame 0 always heads the first cluster since merges keep the left side
    let mut labels = vec![0usize; n];
    let mut label = 0usize;
    let mut head = Some(0usize);
    while let Some(start) = head {
        let end = clusters[start].next.unwrap_or(n);
        labels[start..end].fill(label);
        label += 1;
        head = clusters[start].next;
    }
    labels
}

/// Number of distinct labels in a labeling
pub fn distinct_segments(labels: &[usize]) -> usize {
    let mut seen: Vec<usize> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

fn candidate(clusters: &[Cluster], left: usize, right: usize) -> MergeCandidate {
    MergeCandidate {
        cost: clusters[left].ward_cost(&clusters[right]),
        left,
        right,
        left_version: clusters[left].version,
        right_version: clusters[right].version,
    }
}
