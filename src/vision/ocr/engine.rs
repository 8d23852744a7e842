// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference engine seam for the detection model
//!
//! The pipeline only needs "tensor in, tensor out". `OnnxDetectionEngine`
//! provides that with ONNX Runtime; tests substitute their own engines.

use anyhow::{anyhow, Context};
use ndarray::{Array4, ArrayD, Ix4};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::errors::DetectionError;

/// Intra-op threads used by the ONNX session
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// Runs the segmentation model on a preprocessed tensor
pub trait DetectionEngine: Send + Sync {
    /// Map a `[1, 3, H, W]` input tensor to a `[1, 1, H', W']` probability tensor
    fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>, DetectionError>;
}

impl<E: DetectionEngine + ?Sized> DetectionEngine for Arc<E> {
    fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>, DetectionError> {
        (**self).run(input)
    }
}

impl<E: DetectionEngine + ?Sized> DetectionEngine for Box<E> {
    fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>, DetectionError> {
        (**self).run(input)
    }
}

/// DB text detection model backed by ONNX Runtime
///
/// Runs on CPU. The session sits behind a mutex, so concurrent callers
/// are serialized; clones share the same session.
#[derive(Clone)]
pub struct OnnxDetectionEngine {
    /// ONNX Runtime session, `None` after shutdown
    session: Arc<Mutex<Option<Session>>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for OnnxDetectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetectionEngine")
            .field("input_name", &self.input_name)
            .field("is_ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl OnnxDetectionEngine {
    /// Load the detection model from a file
    ///
    /// # Arguments
    /// - `model_path`: Path to the ONNX model file (det.onnx)
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found (`ModelNotFound`)
    /// - ONNX Runtime cannot build a session from it (`ModelLoad`)
    pub fn from_file<P: AsRef<Path>>(model_path: P) -> Result<Self, DetectionError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(DetectionError::ModelNotFound(
                model_path.display().to_string(),
            ));
        }

        info!("Loading text detection model from {}", model_path.display());

        let session = session_builder()
            .and_then(|builder| {
                builder.commit_from_file(model_path).with_context(|| {
                    format!("Failed to load detection model from {}", model_path.display())
                })
            })
            .map_err(|e| DetectionError::ModelLoad(format!("{:#}", e)))?;

        Ok(Self::from_session(session))
    }

    /// Build the detection model from a serialized ONNX blob
    pub fn from_bytes(model: &[u8]) -> Result<Self, DetectionError> {
        if model.is_empty() {
            return Err(DetectionError::ModelLoad("model blob is empty".to_string()));
        }

        info!("Loading text detection model from {} byte blob", model.len());

        let session = session_builder()
            .and_then(|builder| {
                builder
                    .commit_from_memory(model)
                    .context("Failed to load detection model from memory")
            })
            .map_err(|e| DetectionError::ModelLoad(format!("{:#}", e)))?;

        Ok(Self::from_session(session))
    }

    fn from_session(session: Session) -> Self {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input {}: {:?}", input_name, input.input_type);
        }

        info!("✅ Text detection model loaded (CPU-only)");

        Self {
            session: Arc::new(Mutex::new(Some(session))),
            input_name,
        }
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Check if the model is ready for inference
    pub fn is_ready(&self) -> bool {
        self.session
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Release the ONNX session
    ///
    /// Later calls to `run` fail with `Inference`. Clones share the session,
    /// so shutting down one handle shuts down all of them.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.session.lock() {
            if guard.take().is_some() {
                info!("Text detection model released");
            }
        }
    }

    fn infer(&self, input: &Array4<f32>) -> anyhow::Result<ArrayD<f32>> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| anyhow!("detection session lock poisoned"))?;
        let session = guard
            .as_mut()
            .context("detection engine has been shut down")?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        Ok(output.to_owned())
    }
}

impl DetectionEngine for OnnxDetectionEngine {
    fn run(&self, input: &Array4<f32>) -> Result<Array4<f32>, DetectionError> {
        let shape = input.shape();
        if shape[0] != 1 || shape[1] != 3 {
            return Err(DetectionError::InvalidInput(format!(
                "input shape {:?}, expected [1, 3, H, W]",
                shape
            )));
        }

        let output = self
            .infer(input)
            .map_err(|e| DetectionError::Inference(format!("{:#}", e)))?;

        let actual = output.shape().to_vec();
        debug!("Detection output shape: {:?}", actual);

        output
            .into_dimensionality::<Ix4>()
            .map_err(|_| DetectionError::UnexpectedOutputShape { actual })
    }
}

/// Load ONNX model with CPU-only execution
fn session_builder() -> anyhow::Result<SessionBuilder> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(DEFAULT_INTRA_THREADS)
        .context("Failed to set intra threads")
}
