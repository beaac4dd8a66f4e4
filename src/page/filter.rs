// 信頼度フィルタ: 閾値以下のOCR領域を除外する

use super::region::TextRegion;

/// Regions must score strictly above this to reach the overlay.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// 信頼度が閾値を「超える」領域のみを元の順序で返す。
///
/// 閾値ちょうどの領域は除外される (`>` 比較)。NaN も除外される。
pub fn filter_regions(regions: Vec<TextRegion>, threshold: f32) -> Vec<TextRegion> {
    regions
        .into_iter()
        .filter(|r| r.confidence > threshold)
        .collect()
}
