//! Workflow invoker: turns an evaluation or comparison request into a single
//! `/workflows/run` call.
//!
//! Pairwise evaluations upload both images concurrently and reference the
//! returned handles; comparisons embed every target inline as a data URL and
//! skip the upload step. Either way exactly one workflow call is made.
use serde_json::{json, Map, Value};

use crate::dify::client::{DifyClient, FileHandle};
use crate::error::AppResult;
use crate::image::codec;

use super::normalizer::{self, WorkflowResponse};
use super::types::{
    ComparisonRequest, ComparisonResponse, EvaluationRequest, EvaluationResponse, WorkflowRequest,
};

pub const RESPONSE_MODE: &str = "blocking";

#[derive(Clone)]
pub struct Evaluator {
    client: DifyClient,
}

impl Evaluator {
    pub fn new(client: DifyClient) -> Self {
        Evaluator { client }
    }

    /// Send the request to the workflow and return the raw, unnormalized result.
    pub async fn invoke(&self, request: &WorkflowRequest) -> AppResult<Value> {
        match request {
            WorkflowRequest::PairwiseEvaluation(r) => self.invoke_pairwise(r).await,
            WorkflowRequest::Comparison(r) => self.invoke_comparison(r).await,
        }
    }

    /// `invoke` followed by normalization.
    pub async fn run(&self, request: &WorkflowRequest) -> AppResult<WorkflowResponse> {
        let raw = self.invoke(request).await?;
        Ok(normalizer::normalize(&raw, request))
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> AppResult<EvaluationResponse> {
        let raw = self.invoke_pairwise(request).await?;
        Ok(normalizer::normalize_evaluation(&raw, request))
    }

    pub async fn compare(&self, request: &ComparisonRequest) -> AppResult<ComparisonResponse> {
        let raw = self.invoke_comparison(request).await?;
        Ok(normalizer::normalize_comparison(&raw, request))
    }

    async fn invoke_pairwise(&self, request: &EvaluationRequest) -> AppResult<Value> {
        self.client.ensure_configured()?;
        tracing::info!(
            "Evaluating '{}' against '{}'",
            request.image1.name,
            request.image2.name
        );
        // Both uploads must finish before the workflow call; the first failure aborts.
        let (first, second) = tokio::try_join!(
            self.client.upload_file(&request.image1),
            self.client.upload_file(&request.image2),
        )?;

        let mut inputs = context_inputs(request.context.as_deref());
        inputs.insert("image1".to_string(), uploaded_file_ref(&first));
        inputs.insert("image2".to_string(), uploaded_file_ref(&second));
        self.client.run_workflow(&self.payload(inputs)).await
    }

    async fn invoke_comparison(&self, request: &ComparisonRequest) -> AppResult<Value> {
        self.client.ensure_configured()?;
        tracing::info!("Comparing {} target image(s) against base", request.target_images.len());

        let images: Vec<Value> = request
            .target_images
            .iter()
            .map(|encoded| inline_image_ref(encoded))
            .collect();
        let mut inputs = context_inputs(request.context.as_deref());
        inputs.insert("image".to_string(), Value::Array(images));
        self.client.run_workflow(&self.payload(inputs)).await
    }

    fn payload(&self, inputs: Map<String, Value>) -> Value {
        json!({
            "inputs": inputs,
            "response_mode": RESPONSE_MODE,
            "user": self.client.user_tag(),
        })
    }
}

fn context_inputs(context: Option<&str>) -> Map<String, Value> {
    let mut inputs = Map::new();
    if let Some(ctx) = context {
        inputs.insert("context".to_string(), Value::String(ctx.to_string()));
    }
    inputs
}

fn uploaded_file_ref(handle: &FileHandle) -> Value {
    json!({
        "type": "image",
        "transfer_method": "local_file",
        "upload_file_id": handle.as_str(),
    })
}

fn inline_image_ref(encoded: &str) -> Value {
    json!({
        "type": "image",
        "transfer_method": "remote_url",
        "url": codec::to_data_url(encoded),
    })
}
