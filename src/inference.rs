use crate::classifier::{load_classifier, Classifier, ClassifierError};
use crate::scaler::{ScalerError, StandardScaler};
use crate::types::{FeatureVector, Prediction, NUM_FEATURES};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Fallo al clasificar una ventana concreta (no fatal para el proceso)
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Scaler error: {0}")]
    Scaler(#[from] ScalerError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Classifier returned no scores")]
    EmptyScores,

    #[error("Classifier returned non-finite scores")]
    NonFiniteScores,
}

/// Fallo al preparar el modelo antes de entrar en el bucle de mensajes (fatal)
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Model file {0} not found")]
    ModelNotFound(String),

    #[error("Scaler file {0} not found")]
    ScalerNotFound(String),

    #[error("Error loading model: {0}")]
    Model(#[source] ClassifierError),

    #[error("Error loading scaler: {0}")]
    Scaler(#[source] ScalerError),

    #[error("Model/scaler mismatch: {0}")]
    Mismatch(String),

    #[error("Model dry run failed: {0}")]
    DryRun(#[source] InferenceError),
}

/// Capacidad de predicción: vector de características -> etiqueta de clase
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        (**self).predict(features)
    }
}

/// Escalador + clasificador cargados una única vez al arrancar
pub struct InferenceAdapter {
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl InferenceAdapter {
    pub fn new(scaler: StandardScaler, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }

    /// Carga y valida modelo y escalador. Cualquier error aquí impide arrancar.
    pub fn load(
        model_path: impl AsRef<Path>,
        scaler_path: impl AsRef<Path>,
        num_classes: usize,
    ) -> Result<Self, StartupError> {
        let model_path = model_path.as_ref();
        let scaler_path = scaler_path.as_ref();

        if !model_path.exists() {
            return Err(StartupError::ModelNotFound(model_path.display().to_string()));
        }
        let classifier = load_classifier(model_path, NUM_FEATURES).map_err(StartupError::Model)?;
        info!("Modelo cargado: {}", model_path.display());

        if !scaler_path.exists() {
            return Err(StartupError::ScalerNotFound(scaler_path.display().to_string()));
        }
        let scaler = StandardScaler::load(scaler_path).map_err(StartupError::Scaler)?;
        info!("Escalador cargado: {}", scaler_path.display());

        let adapter = Self::new(scaler, classifier);
        adapter.validate(num_classes)?;
        Ok(adapter)
    }

    /// Comprueba dimensiones y hace una inferencia en seco sobre un vector nulo
    pub fn validate(&self, num_classes: usize) -> Result<(), StartupError> {
        if self.scaler.dim() != NUM_FEATURES {
            return Err(StartupError::Mismatch(format!(
                "scaler expects {} features, pipeline produces {}",
                self.scaler.dim(),
                NUM_FEATURES
            )));
        }
        if self.classifier.input_size() != NUM_FEATURES {
            return Err(StartupError::Mismatch(format!(
                "classifier expects {} features, pipeline produces {}",
                self.classifier.input_size(),
                NUM_FEATURES
            )));
        }

        let scaled = self
            .scaler
            .transform(&[0.0; NUM_FEATURES])
            .map_err(|e| StartupError::DryRun(e.into()))?;
        let scores = self
            .classifier
            .scores(&scaled)
            .map_err(|e| StartupError::DryRun(e.into()))?;
        if scores.len() != num_classes {
            return Err(StartupError::Mismatch(format!(
                "classifier produces {} classes, expected {}",
                scores.len(),
                num_classes
            )));
        }

        Ok(())
    }
}

impl Predictor for InferenceAdapter {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let scaled = self.scaler.transform(features.as_slice())?;
        let scores = self.classifier.scores(&scaled)?;
        argmax(&scores).map(Prediction)
    }
}

/// Índice de la puntuación máxima; en empate gana el índice más bajo
pub fn argmax(scores: &[f32]) -> Result<usize, InferenceError> {
    if scores.is_empty() {
        return Err(InferenceError::EmptyScores);
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(InferenceError::NonFiniteScores);
    }

    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = idx;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MlpClassifier;

    /// Clasificador de prueba que devuelve siempre las mismas puntuaciones
    struct FixedScores(Vec<f32>);

    impl Classifier for FixedScores {
        fn input_size(&self) -> usize {
            NUM_FEATURES
        }

        fn scores(&self, input: &[f64]) -> Result<Vec<f32>, ClassifierError> {
            if input.len() != NUM_FEATURES {
                return Err(ClassifierError::InvalidFeatureSize {
                    expected: NUM_FEATURES,
                    actual: input.len(),
                });
            }
            Ok(self.0.clone())
        }
    }

    fn features() -> FeatureVector {
        FeatureVector([0.0; NUM_FEATURES])
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.1, 0.9, 0.9, 0.2]).unwrap(), 1);
        assert_eq!(argmax(&[3.0, 3.0]).unwrap(), 0);
        assert_eq!(argmax(&[-5.0, -1.0, -3.0]).unwrap(), 1);
    }

    #[test]
    fn test_argmax_errors() {
        assert!(matches!(argmax(&[]), Err(InferenceError::EmptyScores)));
        assert!(matches!(
            argmax(&[0.0, f32::NAN]),
            Err(InferenceError::NonFiniteScores)
        ));
    }

    #[test]
    fn test_predict_selects_best_class() {
        let adapter = InferenceAdapter::new(
            StandardScaler::identity(NUM_FEATURES),
            Box::new(FixedScores(vec![0.0, 0.1, 2.0, -1.0, 1.9])),
        );
        assert_eq!(adapter.predict(&features()).unwrap(), Prediction(2));
    }

    #[test]
    fn test_predict_reports_dimension_mismatch() {
        let adapter = InferenceAdapter::new(
            StandardScaler::identity(NUM_FEATURES - 1),
            Box::new(FixedScores(vec![1.0])),
        );
        assert!(matches!(
            adapter.predict(&features()),
            Err(InferenceError::Scaler(ScalerError::DimensionMismatch { .. }))
        ));
    }

    #[test]
    fn test_predict_applies_scaler_before_classifier() {
        // Una sola capa: puntuación de la clase i = característica escalada i
        let mut weights = vec![vec![0.0f32; NUM_FEATURES]; 2];
        weights[0][0] = 1.0;
        weights[1][1] = 1.0;
        let model = serde_json::json!({
            "layers": [{"weights": weights, "bias": [0.0, 0.0]}]
        });
        let classifier = MlpClassifier::from_json(&model.to_string()).unwrap();

        let mut mean = vec![0.0; NUM_FEATURES];
        mean[0] = 10.0;
        let scaler = StandardScaler::new(mean, vec![1.0; NUM_FEATURES]).unwrap();
        let adapter = InferenceAdapter::new(scaler, Box::new(classifier));

        let mut raw = [0.0; NUM_FEATURES];
        raw[0] = 5.0;
        raw[1] = 1.0;
        // sin escalar ganaría la clase 0; escalado: [-5, 1] -> clase 1
        assert_eq!(adapter.predict(&FeatureVector(raw)).unwrap(), Prediction(1));
    }

    #[test]
    fn test_validate_detects_class_count_mismatch() {
        let adapter = InferenceAdapter::new(
            StandardScaler::identity(NUM_FEATURES),
            Box::new(FixedScores(vec![0.0; 3])),
        );
        assert!(adapter.validate(3).is_ok());
        assert!(matches!(adapter.validate(5), Err(StartupError::Mismatch(_))));
    }

    #[test]
    fn test_validate_detects_scaler_width() {
        let adapter = InferenceAdapter::new(
            StandardScaler::identity(4),
            Box::new(FixedScores(vec![0.0; 5])),
        );
        assert!(matches!(adapter.validate(5), Err(StartupError::Mismatch(_))));
    }

    #[test]
    fn test_load_missing_model_is_fatal() {
        assert!(matches!(
            InferenceAdapter::load("/nonexistent/model.json", "/nonexistent/scaler.json", 5),
            Err(StartupError::ModelNotFound(_))
        ));
    }
}
