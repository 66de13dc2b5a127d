use crate::tools::Frame;
use rayon::prelude::*;
use std::borrow::Borrow;

/// 依亮度排序的結果，`indices` 與 `scores` 一一對應
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedFrames {
    pub indices: Vec<usize>,
    pub scores: Vec<f64>,
}

impl RankedFrames {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// BT.601 灰階權重（R, G, B）
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// 影格亮度：以 BT.601 權重換算灰階後所有像素的平均值
#[must_use]
pub fn frame_brightness(frame: &Frame) -> f64 {
    let pixel_count = u64::from(frame.width()) * u64::from(frame.height());
    if pixel_count == 0 {
        return 0.0;
    }

    let total: f64 = frame
        .pixels()
        .map(|p| {
            LUMA_WEIGHTS[0] * f64::from(p[0])
                + LUMA_WEIGHTS[1] * f64::from(p[1])
                + LUMA_WEIGHTS[2] * f64::from(p[2])
        })
        .sum();
    total / pixel_count as f64
}

/// 選出最亮的 `min(n, 影格數)` 張，依亮度由高到低
///
/// 亮度相同時保留擷取順序（索引小的在前）。
pub fn rank_by_brightness<F>(frames: &[F], n: usize) -> RankedFrames
where
    F: Borrow<Frame> + Sync,
{
    let scores: Vec<f64> = frames
        .par_iter()
        .map(|frame| frame_brightness(frame.borrow()))
        .collect();

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order.truncate(n.min(scores.len()));

    RankedFrames {
        scores: order.iter().map(|&i| scores[i]).collect(),
        indices: order,
    }
}
