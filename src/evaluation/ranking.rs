//! Join comparison scores back to the caller's images and rank them.
use super::types::{ComparisonResponse, ComparisonResult, UploadedImage};

/// Ranks target images by score, highest first; ties keep input order.
///
/// `targets` must be the images the comparison was built from, in the same
/// order. Results whose index has no matching target are dropped.
pub fn rank_results(
    response: &ComparisonResponse,
    targets: &[&UploadedImage],
) -> Vec<ComparisonResult> {
    let mut scored: Vec<_> = response
        .results
        .iter()
        .filter_map(|r| targets.get(r.image_index).map(|img| (img, r)))
        .collect();
    scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    scored
        .into_iter()
        .enumerate()
        .map(|(pos, (img, r))| ComparisonResult {
            image_id: img.id.clone(),
            score: r.score,
            rank: Some(pos + 1),
            analysis: r.analysis.clone(),
        })
        .collect()
}
