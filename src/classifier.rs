use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxError(#[from] ort::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid feature size: expected {expected}, got {actual}")]
    InvalidFeatureSize { expected: usize, actual: usize },

    #[error("No output tensor found")]
    NoOutputTensor,

    #[error("Missing ONNX {kind}")]
    MissingIo { kind: &'static str },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("Classifier session lock poisoned")]
    Poisoned,
}

/// Clasificador ya entrenado: devuelve una puntuación (logit) por clase.
/// Solo lectura tras la carga; compartible entre hilos.
pub trait Classifier: Send + Sync {
    /// Número de características que espera a la entrada
    fn input_size(&self) -> usize;

    fn scores(&self, input: &[f64]) -> Result<Vec<f32>, ClassifierError>;
}

/// Carga el clasificador eligiendo backend por extensión (.onnx / .json)
pub fn load_classifier(
    path: impl AsRef<Path>,
    input_size: usize,
) -> Result<Box<dyn Classifier>, ClassifierError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Ok(Box::new(MlpClassifier::load(path)?)),
        #[cfg(feature = "onnx")]
        "onnx" => Ok(Box::new(OnnxClassifier::new(path, input_size)?)),
        _ => {
            let _ = input_size;
            Err(ClassifierError::UnsupportedFormat(path.display().to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct LayerJson {
    /// Matriz [salidas][entradas], igual que nn.Linear.weight
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct MlpJson {
    layers: Vec<LayerJson>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl DenseLayer {
    fn input_size(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn output_size(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect()
    }
}

/// Red densa (Linear + ReLU ... + Linear) exportada a JSON.
/// Topología de referencia: 12 -> 64 -> 32 -> 5.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    layers: Vec<DenseLayer>,
}

impl MlpClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ClassifierError> {
        let data: MlpJson = serde_json::from_str(content)?;
        let layers = data
            .layers
            .into_iter()
            .map(|layer| DenseLayer {
                weights: layer.weights,
                bias: layer.bias,
            })
            .collect();
        Self::new(layers)
    }

    fn new(layers: Vec<DenseLayer>) -> Result<Self, ClassifierError> {
        if layers.is_empty() {
            return Err(ClassifierError::InvalidModel("no layers".into()));
        }

        for (idx, layer) in layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() || layer.bias.is_empty() {
                return Err(ClassifierError::InvalidModel(format!(
                    "layer {}: {} weight rows but {} biases",
                    idx,
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            let width = layer.input_size();
            if width == 0 || layer.weights.iter().any(|row| row.len() != width) {
                return Err(ClassifierError::InvalidModel(format!(
                    "layer {}: ragged or empty weight matrix",
                    idx
                )));
            }
            if idx > 0 && layers[idx - 1].output_size() != width {
                return Err(ClassifierError::InvalidModel(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    idx,
                    width,
                    idx - 1,
                    layers[idx - 1].output_size()
                )));
            }
        }

        Ok(Self { layers })
    }

    pub fn num_classes(&self) -> usize {
        self.layers.last().map(DenseLayer::output_size).unwrap_or(0)
    }
}

impl Classifier for MlpClassifier {
    fn input_size(&self) -> usize {
        self.layers.first().map(DenseLayer::input_size).unwrap_or(0)
    }

    fn scores(&self, input: &[f64]) -> Result<Vec<f32>, ClassifierError> {
        if input.len() != self.input_size() {
            return Err(ClassifierError::InvalidFeatureSize {
                expected: self.input_size(),
                actual: input.len(),
            });
        }

        let mut activations: Vec<f32> = input.iter().map(|&x| x as f32).collect();
        let last = self.layers.len() - 1;
        for (idx, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);
            if idx < last {
                activations.iter_mut().for_each(|a| *a = a.max(0.0));
            }
        }

        Ok(activations)
    }
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::{Classifier, ClassifierError};
    use ort::session::Session;
    use ort::tensor::TensorElementType;
    use ort::value::ValueType;
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::info;

    /// Clasificador exportado a ONNX: entrada [1, N] float32, salida [1, C] float32
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        input_name: String,
        output_name: String,
        input_size: usize,
    }

    impl OnnxClassifier {
        pub fn new(model_path: impl AsRef<Path>, input_size: usize) -> Result<Self, ClassifierError> {
            let model_path = model_path.as_ref();
            let session = Session::builder()?.commit_from_file(model_path)?;

            let input_name = session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or(ClassifierError::MissingIo { kind: "input" })?;

            let output_name = session
                .outputs
                .iter()
                .find(|output| {
                    matches!(
                        output.output_type,
                        ValueType::Tensor {
                            ty: TensorElementType::Float32,
                            ..
                        }
                    )
                })
                .or_else(|| session.outputs.first())
                .map(|output| output.name.clone())
                .ok_or(ClassifierError::MissingIo { kind: "output" })?;

            info!(
                "[ONNX] Modelo cargado: {} (input: {}, output: {})",
                model_path.display(),
                input_name,
                output_name
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                output_name,
                input_size,
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn input_size(&self) -> usize {
            self.input_size
        }

        fn scores(&self, input: &[f64]) -> Result<Vec<f32>, ClassifierError> {
            if input.len() != self.input_size {
                return Err(ClassifierError::InvalidFeatureSize {
                    expected: self.input_size,
                    actual: input.len(),
                });
            }

            // Tensor [1, N] a partir de la tupla (shape, data)
            let input_data: Vec<f32> = input.iter().map(|&x| x as f32).collect();
            let shape_vec = vec![1_usize, self.input_size];
            let input_value = ort::value::Value::from_array((shape_vec, input_data))?;

            let mut session = self.session.lock().map_err(|_| ClassifierError::Poisoned)?;
            let outputs = session.run(ort::inputs![
                self.input_name.as_str() => &input_value,
            ])?;

            let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

            let num_classes = shape.last().copied().unwrap_or(0).max(0) as usize;
            if num_classes == 0 || data.len() < num_classes {
                return Err(ClassifierError::NoOutputTensor);
            }

            Ok(data[..num_classes].to_vec())
        }
    }
}
