use crate::shared::detection::Detection;

/// Merges raw cascade windows that cover the same face.
///
/// Each detection not yet absorbed seeds a cluster, which takes the seed
/// itself and every later detection whose IoU with the seed is strictly
/// above `iou_threshold`. Overlap is measured against the seed only, so a
/// chain of windows does not join faces that never overlap directly. A
/// later window may be counted by more than one seed. Each cluster becomes
/// one detection whose position and scale are the integer mean of its
/// members and whose score is the sum of member scores. Clusters are
/// emitted in seed order.
pub fn cluster_detections(detections: &[Detection], iou_threshold: f64) -> Vec<Detection> {
    let mut absorbed = vec![false; detections.len()];
    let mut clusters = Vec::new();
    for (i, seed) in detections.iter().enumerate() {
        if absorbed[i] {
            continue;
        }
        let mut members = Vec::new();
        for (j, other) in detections.iter().enumerate().skip(i) {
            if seed.iou(other) > iou_threshold {
                absorbed[j] = true;
                members.push(j);
            }
        }
        if !members.is_empty() {
            clusters.push(merge(detections, &members));
        }
    }
    clusters
}

fn merge(detections: &[Detection], members: &[usize]) -> Detection {
    let n = members.len() as i64;
    let (mut row, mut col, mut scale, mut score) = (0i64, 0i64, 0i64, 0.0f64);
    for &i in members {
        let d = &detections[i];
        row += d.row as i64;
        col += d.col as i64;
        scale += d.scale as i64;
        score += d.score;
    }
    Detection::new((row / n) as i32, (col / n) as i32, (scale / n) as i32, score)
}
