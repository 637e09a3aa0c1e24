//! Model inference boundary
//!
//! The recognizer only needs "tensor in, logits out"; [`LineEncoder`] is that
//! seam. [`OnnxLineEncoder`] is the ONNX Runtime implementation.

use crate::config::OcrConfig;
use crate::error::Result;
use crate::onnx_utils::create_session;
use ndarray::Array4;
use ort::session::{Session, SessionOutputs};
use ort::value::TensorRef;
use tracing::{debug, info, warn};

/// A tensor copied out of the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RawTensor {
    /// Model output the tensor was read from
    pub name: String,
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// Named outputs of one encoder call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncoderOutput {
    /// CTC logits, expected `[1, T, K]`; `None` when the model has no such output
    pub logits: Option<RawTensor>,
    /// Optional embedding output, passed through unused
    pub embedding: Option<RawTensor>,
}

/// Runs the line encoder on a `(1, 1, H, W)` image tensor
pub trait LineEncoder {
    fn encode(&mut self, input: &Array4<f32>) -> Result<EncoderOutput>;

    /// Names the logits output is looked up by, for error reporting
    fn logits_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Output names the model declares, for error reporting
    fn available_outputs(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Pick the first alias the model declares
fn resolve_output(aliases: &[String], declared: &[String]) -> Option<String> {
    aliases.iter().find(|alias| declared.contains(alias)).cloned()
}

/// ONNX Runtime backed encoder
///
/// Output names are resolved once against the session's declared outputs.
pub struct OnnxLineEncoder {
    session: Session,
    input_name: String,
    logits_aliases: Vec<String>,
    declared_outputs: Vec<String>,
    logits_output: Option<String>,
    embedding_output: Option<String>,
}

impl OnnxLineEncoder {
    /// Load the model named in `config`
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        info!("Loading line encoder from {}", config.model_path.display());
        let session = create_session(&config.model_path, &config.execution)?;
        Ok(Self::with_session(session, config))
    }

    /// Wrap an existing session
    #[must_use]
    pub fn with_session(session: Session, config: &OcrConfig) -> Self {
        let declared_outputs: Vec<String> =
            session.outputs.iter().map(|o| o.name.clone()).collect();

        let mut logits_output = resolve_output(&config.logits_outputs, &declared_outputs);
        if logits_output.is_none() && config.fallback_to_first_output {
            logits_output = declared_outputs.first().cloned();
            if let Some(name) = &logits_output {
                warn!(
                    "None of {:?} declared by model, using first output {:?} as logits",
                    config.logits_outputs, name
                );
            }
        }
        let embedding_output = resolve_output(&config.embedding_outputs, &declared_outputs)
            .filter(|name| Some(name) != logits_output.as_ref());

        debug!(
            "Encoder outputs: declared={:?}, logits={:?}, embedding={:?}",
            declared_outputs, logits_output, embedding_output
        );

        Self {
            session,
            input_name: config.input_name.clone(),
            logits_aliases: config.logits_outputs.clone(),
            declared_outputs,
            logits_output,
            embedding_output,
        }
    }

    fn extract(outputs: &SessionOutputs<'_>, name: Option<&str>) -> Result<Option<RawTensor>> {
        let Some((name, value)) = name.and_then(|n| outputs.get(n).map(|v| (n, v))) else {
            return Ok(None);
        };
        let (shape, data) = value.try_extract_tensor::<f32>()?;
        Ok(Some(RawTensor {
            name: name.to_string(),
            shape: shape.to_vec(),
            data: data.to_vec(),
        }))
    }
}

impl LineEncoder for OnnxLineEncoder {
    fn encode(&mut self, input: &Array4<f32>) -> Result<EncoderOutput> {
        let tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])?;

        let logits = Self::extract(&outputs, self.logits_output.as_deref())?;
        let embedding = Self::extract(&outputs, self.embedding_output.as_deref())?;

        Ok(EncoderOutput { logits, embedding })
    }

    fn logits_names(&self) -> Vec<String> {
        self.logits_aliases.clone()
    }

    fn available_outputs(&self) -> Vec<String> {
        self.declared_outputs.clone()
    }
}
