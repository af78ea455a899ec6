use crate::decoder::{decode, DecodeError};
use crate::feature_extractor::FeatureExtractor;
use crate::inference::Predictor;
use crate::transport::Publisher;
use crate::types::Prediction;
use crate::window_buffer::{WindowBuffer, WindowState};
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};

/// Contadores del coordinador
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub messages: u64,
    pub invalid_format: u64,
    pub invalid_length: u64,
    pub windows: u64,
    pub inference_failures: u64,
    pub published: u64,
    pub publish_failures: u64,
}

/// Dueño único de la ventana en curso.
///
/// Cada mensaje recorre decode -> append -> (si se llena) drain -> extract ->
/// predict. La ventana queda vacía tras completarse, falle o no la predicción.
pub struct StreamCoordinator<P: Predictor> {
    buffer: WindowBuffer,
    extractor: FeatureExtractor,
    predictor: P,
    stats: CoordinatorStats,
}

impl<P: Predictor> StreamCoordinator<P> {
    pub fn new(predictor: P) -> Self {
        Self {
            buffer: WindowBuffer::new(),
            extractor: FeatureExtractor::new(),
            predictor,
            stats: CoordinatorStats::default(),
        }
    }

    /// Procesa un payload. Devuelve la predicción solo cuando el mensaje completa
    /// una ventana y la clasificación tiene éxito.
    pub fn handle(&mut self, payload: &[u8]) -> Option<Prediction> {
        self.stats.messages += 1;

        let sample = match decode(payload) {
            Ok(sample) => sample,
            Err(e) => {
                match e {
                    DecodeError::InvalidFormat { .. } => self.stats.invalid_format += 1,
                    DecodeError::InvalidLength { .. } => self.stats.invalid_length += 1,
                }
                warn!("Mensaje descartado ({}): {}", e.kind(), e);
                return None;
            }
        };

        match self.buffer.append(sample) {
            WindowState::Accumulating(_) => None,
            WindowState::Full => self.complete_window(),
        }
    }

    /// Drena la ventana llena y la clasifica. El drain ocurre antes de cualquier
    /// paso que pueda fallar, así que el buffer nunca se queda bloqueado lleno.
    fn complete_window(&mut self) -> Option<Prediction> {
        let window = self.buffer.drain();
        self.stats.windows += 1;

        let prediction = match self.extractor.extract(&window) {
            Ok(features) => match self.predictor.predict(&features) {
                Ok(prediction) => Some(prediction),
                Err(e) => {
                    error!("❌ Error clasificando ventana: {}", e);
                    None
                }
            },
            Err(e) => {
                error!("❌ Error extrayendo características: {}", e);
                None
            }
        };

        if prediction.is_none() {
            self.stats.inference_failures += 1;
        }
        debug!("Ventana {} completada. Estadísticas: {:?}", self.stats.windows, self.stats);
        prediction
    }

    /// Procesa un payload y publica la predicción resultante, si la hay
    pub fn handle_and_publish(
        &mut self,
        payload: &[u8],
        publisher: &mut impl Publisher,
        output_topic: &str,
    ) -> Option<Prediction> {
        let prediction = self.handle(payload)?;
        info!("Clase predicha: {}", prediction);

        match publisher.publish(output_topic, &prediction.to_string()) {
            Ok(()) => self.stats.published += 1,
            Err(e) => {
                self.stats.publish_failures += 1;
                error!("❌ Error publicando en {}: {}", output_topic, e);
            }
        }

        Some(prediction)
    }

    /// Bucle principal: consume payloads en orden hasta que el transporte cierra el canal
    pub fn run(&mut self, rx: Receiver<Vec<u8>>, publisher: &mut impl Publisher, output_topic: &str) {
        for payload in rx.iter() {
            self.handle_and_publish(&payload, publisher, output_topic);
        }

        info!(
            "Canal de entrada cerrado. Descartando {} muestras pendientes. Estadísticas: {:?}",
            self.buffer.len(),
            self.stats
        );
    }

    /// Número de muestras en la ventana en curso
    pub fn window_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &CoordinatorStats {
        &self.stats
    }
}
