//! Request and response shapes for image evaluation and comparison.
//!
//! Field names serialize in camelCase to match the JSON the web front end
//! already consumes (`imageIndex`, `targetImages`, ...).
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::image::codec::{self, ImageResource};

/// A score clamped to the closed range 0..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn clamped(value: i64) -> Self {
        Score(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// An image the user picked, held by the caller for as long as it is displayed.
#[derive(Clone, Debug)]
pub struct UploadedImage {
    pub id: String,
    pub resource: ImageResource,
    /// Display URL; an inline data URL for images read from disk.
    pub url: String,
    pub is_base: bool,
}

impl UploadedImage {
    pub fn new(resource: ImageResource, is_base: bool) -> Self {
        let url = codec::to_data_url(&codec::encode(&resource));
        UploadedImage { id: Uuid::new_v4().to_string(), resource, url, is_base }
    }
}

/// Pairwise evaluation: two raw images plus optional instructions.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    pub context: Option<String>,
    pub image1: ImageResource,
    pub image2: ImageResource,
}

/// One base image compared against N targets, all pre-encoded as base64.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub base_image: String,
    pub target_images: Vec<String>,
}

impl ComparisonRequest {
    /// Build from the caller's selection: the image flagged `is_base` (or the
    /// first one when none is) becomes the base, the rest are targets in order.
    pub fn from_uploaded(images: &[UploadedImage], context: Option<String>) -> Option<Self> {
        let base_pos = images.iter().position(|i| i.is_base).unwrap_or(0);
        let base = images.get(base_pos)?;
        let target_images = images
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos != base_pos)
            .map(|(_, img)| codec::encode(&img.resource))
            .collect();
        Some(ComparisonRequest {
            context,
            base_image: codec::encode(&base.resource),
            target_images,
        })
    }
}

/// The request variants the workflow invoker understands.
#[derive(Clone, Debug)]
pub enum WorkflowRequest {
    PairwiseEvaluation(EvaluationRequest),
    Comparison(ComparisonRequest),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub text: EvaluationText,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationText {
    pub score: Score,
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EvaluationDetails>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetails {
    /// RFC 3339 instant at which the response was normalized.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub results: Vec<ImageScore>,
}

/// Score for one target image, addressed by its 0-based input position.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageScore {
    pub image_index: usize,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

/// A score joined back to the caller's image, with its place in the ranking.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub image_id: String,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_is_clamped() {
        assert_eq!(Score::clamped(-5).value(), 0);
        assert_eq!(Score::clamped(73).value(), 73);
        assert_eq!(Score::clamped(1000).value(), 100);
    }

    #[test]
    fn comparison_request_uses_camel_case() {
        let req: ComparisonRequest = serde_json::from_value(json!({
            "baseImage": "AAAA",
            "targetImages": ["BBBB", "CCCC"]
        }))
        .unwrap();
        assert_eq!(req.base_image, "AAAA");
        assert_eq!(req.target_images.len(), 2);
        assert!(req.context.is_none());
    }

    #[test]
    fn image_score_serializes_image_index() {
        let score = ImageScore { image_index: 1, score: Score::clamped(40), analysis: None };
        let v = serde_json::to_value(score).unwrap();
        assert_eq!(v, json!({"imageIndex": 1, "score": 40}));
    }

    #[test]
    fn from_uploaded_splits_base_and_targets() {
        let a = UploadedImage::new(ImageResource::from_bytes("a.png", b"aaa".to_vec()), false);
        let b = UploadedImage::new(ImageResource::from_bytes("b.png", b"bbb".to_vec()), true);
        let c = UploadedImage::new(ImageResource::from_bytes("c.png", b"ccc".to_vec()), false);
        let req = ComparisonRequest::from_uploaded(&[a, b, c], Some("sharpness".into())).unwrap();
        assert_eq!(req.base_image, codec::encode(&ImageResource::from_bytes("b", b"bbb".to_vec())));
        assert_eq!(req.target_images, vec!["YWFh".to_string(), "Y2Nj".to_string()]);
        assert_eq!(req.context.as_deref(), Some("sharpness"));
    }

    #[test]
    fn from_uploaded_defaults_base_to_first() {
        let a = UploadedImage::new(ImageResource::from_bytes("a.png", b"aaa".to_vec()), false);
        let b = UploadedImage::new(ImageResource::from_bytes("b.png", b"bbb".to_vec()), false);
        let req = ComparisonRequest::from_uploaded(&[a, b], None).unwrap();
        assert_eq!(req.base_image, "YWFh");
        assert_eq!(req.target_images, vec!["YmJi".to_string()]);
        assert!(ComparisonRequest::from_uploaded(&[], None).is_none());
    }

    #[test]
    fn uploaded_image_gets_unique_id_and_data_url() {
        let img = UploadedImage::new(ImageResource::from_bytes("a.png", b"aaa".to_vec()), true);
        let other = UploadedImage::new(ImageResource::from_bytes("a.png", b"aaa".to_vec()), true);
        assert_ne!(img.id, other.id);
        assert_eq!(img.url, "data:image/jpeg;base64,YWFh");
    }
}
