//! Maps raw workflow output into the stable local response types.
//!
//! STAND-IN: the remote workflow's output schema is not wired in yet, so the
//! score and analysis below are placeholders. Replacing the bodies of
//! `normalize_evaluation` / `normalize_comparison` is the only change needed
//! once the real mapping is known; nothing else reads `raw` beyond the run id.
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::types::{
    ComparisonRequest, ComparisonResponse, EvaluationDetails, EvaluationRequest,
    EvaluationResponse, EvaluationText, ImageScore, Score, WorkflowRequest,
};

pub const PLACEHOLDER_SCORE: i64 = 50;
pub const PLACEHOLDER_ANALYSIS: &str = "Analysis pending workflow configuration";

#[derive(Clone, Debug)]
pub enum WorkflowResponse {
    Evaluation(EvaluationResponse),
    Comparison(ComparisonResponse),
}

pub fn normalize(raw: &Value, request: &WorkflowRequest) -> WorkflowResponse {
    match request {
        WorkflowRequest::PairwiseEvaluation(r) => {
            WorkflowResponse::Evaluation(normalize_evaluation(raw, r))
        }
        WorkflowRequest::Comparison(r) => {
            WorkflowResponse::Comparison(normalize_comparison(raw, r))
        }
    }
}

pub fn normalize_evaluation(raw: &Value, request: &EvaluationRequest) -> EvaluationResponse {
    let (left, right) = (&request.image1.name, &request.image2.name);
    let analysis = match request.context.as_deref() {
        Some(ctx) if !ctx.trim().is_empty() => format!(
            "Evaluated '{}' against '{}' for: {}. {}",
            left, right, ctx, PLACEHOLDER_ANALYSIS
        ),
        _ => format!("Evaluated '{}' against '{}'. {}", left, right, PLACEHOLDER_ANALYSIS),
    };
    EvaluationResponse {
        text: EvaluationText {
            score: Score::clamped(PLACEHOLDER_SCORE),
            analysis,
            details: Some(EvaluationDetails {
                timestamp: now_rfc3339(),
                context: request.context.clone(),
                workflow_run_id: workflow_run_id(raw),
            }),
        },
    }
}

/// One entry per target image, in input order.
pub fn normalize_comparison(_raw: &Value, request: &ComparisonRequest) -> ComparisonResponse {
    let results = request
        .target_images
        .iter()
        .enumerate()
        .map(|(image_index, _)| ImageScore {
            image_index,
            score: Score::clamped(PLACEHOLDER_SCORE),
            analysis: Some(PLACEHOLDER_ANALYSIS.to_string()),
        })
        .collect();
    ComparisonResponse { results }
}

fn workflow_run_id(raw: &Value) -> Option<String> {
    raw.get("workflow_run_id").and_then(Value::as_str).map(str::to_string)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::codec::ImageResource;
    use chrono::DateTime;
    use serde_json::json;

    fn evaluation(context: Option<&str>) -> EvaluationRequest {
        EvaluationRequest {
            context: context.map(str::to_string),
            image1: ImageResource::from_bytes("left.png", b"left".to_vec()),
            image2: ImageResource::from_bytes("right.png", b"right".to_vec()),
        }
    }

    #[test]
    fn analysis_echoes_context() {
        let resp = normalize_evaluation(&json!({}), &evaluation(Some("clarity")));
        assert!(resp.text.analysis.contains("clarity"));
        let details = resp.text.details.unwrap();
        assert_eq!(details.context.as_deref(), Some("clarity"));
        assert!(resp.text.score.value() <= 100);
    }

    #[test]
    fn timestamp_is_taken_at_normalization() {
        let before = Utc::now();
        let resp = normalize_evaluation(&json!({}), &evaluation(None));
        let after = Utc::now();
        let ts = DateTime::parse_from_rfc3339(&resp.text.details.unwrap().timestamp)
            .unwrap()
            .with_timezone(&Utc);
        // Serialized with microsecond precision.
        let slack = chrono::Duration::microseconds(1);
        assert!(ts >= before - slack && ts <= after);
    }

    #[test]
    fn run_id_is_carried_when_present() {
        let raw = json!({"workflow_run_id": "run-7", "data": {"status": "succeeded"}});
        let resp = normalize_evaluation(&raw, &evaluation(None));
        assert_eq!(resp.text.details.unwrap().workflow_run_id.as_deref(), Some("run-7"));
    }

    #[test]
    fn comparison_has_one_entry_per_target_in_order() {
        let req = ComparisonRequest {
            context: None,
            base_image: "b64a".into(),
            target_images: vec!["b64b".into(), "b64c".into()],
        };
        let resp = normalize_comparison(&json!({}), &req);
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[0].image_index, 0);
        assert_eq!(resp.results[1].image_index, 1);
        assert!(resp.results.iter().all(|r| r.score.value() <= 100));
    }

    #[test]
    fn normalize_dispatches_on_variant() {
        let req = WorkflowRequest::Comparison(ComparisonRequest {
            context: None,
            base_image: "b64a".into(),
            target_images: vec![],
        });
        match normalize(&json!({}), &req) {
            WorkflowResponse::Comparison(c) => assert!(c.results.is_empty()),
            other => panic!("expected comparison, got {:?}", other),
        }
    }
}
