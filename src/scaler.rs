use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid scaler parameters: {0}")]
    InvalidParameters(String),

    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Parámetros exportados del StandardScaler ajustado en entrenamiento
#[derive(Debug, Deserialize)]
struct ScalerJson {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Estandarización por componente: (x - media) / escala
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ScalerError> {
        if mean.is_empty() {
            return Err(ScalerError::InvalidParameters("empty mean vector".into()));
        }
        if mean.len() != scale.len() {
            return Err(ScalerError::InvalidParameters(format!(
                "mean has {} components but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err(ScalerError::InvalidParameters(
                "non-finite value in mean/scale".into(),
            ));
        }

        // Una escala 0 corresponde a una característica constante en entrenamiento
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Carga los parámetros desde `{"mean": [...], "scale": [...]}`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScalerError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ScalerError> {
        let data: ScalerJson = serde_json::from_str(content)?;
        Self::new(data.mean, data.scale)
    }

    /// Identidad de dimensión `n` (media 0, escala 1)
    pub fn identity(n: usize) -> Self {
        Self {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>, ScalerError> {
        if input.len() != self.dim() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.dim(),
                actual: input.len(),
            });
        }

        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}
