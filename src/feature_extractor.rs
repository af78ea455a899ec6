use crate::types::{FeatureVector, Sample, AXES, NUM_FEATURES, WINDOW_SIZE};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Invalid window size: expected {expected}, got {actual}")]
    InvalidWindowSize { expected: usize, actual: usize },
}

/// Calcula las 12 características por ventana:
/// media y desviación típica (poblacional) por eje de acelerómetro y giroscopio.
pub struct FeatureExtractor {
    window_size: usize,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            window_size: WINDOW_SIZE,
        }
    }

    /// Extrae el vector [media acc, std acc, media gyro, std gyro] de una ventana [50x6]
    pub fn extract(&self, window: &[Sample]) -> Result<FeatureVector, FeatureError> {
        if window.len() != self.window_size {
            return Err(FeatureError::InvalidWindowSize {
                expected: self.window_size,
                actual: window.len(),
            });
        }

        let (accel, gyro) = self.split_channels(window);

        let mut features = [0.0f64; NUM_FEATURES];
        for axis in 0..AXES {
            features[axis] = mean(&accel[axis]);
            features[AXES + axis] = std(&accel[axis]);
            features[2 * AXES + axis] = mean(&gyro[axis]);
            features[3 * AXES + axis] = std(&gyro[axis]);
        }

        Ok(FeatureVector(features))
    }

    /// Separa la ventana en series por eje: (acc [x, y, z], gyro [x, y, z])
    fn split_channels(&self, window: &[Sample]) -> ([Vec<f64>; AXES], [Vec<f64>; AXES]) {
        let mut accel: [Vec<f64>; AXES] = std::array::from_fn(|_| Vec::with_capacity(window.len()));
        let mut gyro: [Vec<f64>; AXES] = std::array::from_fn(|_| Vec::with_capacity(window.len()));

        for sample in window {
            let a = sample.accel();
            let g = sample.gyro();
            for axis in 0..AXES {
                accel[axis].push(a[axis]);
                gyro[axis].push(g[axis]);
            }
        }

        (accel, gyro)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Funciones estadísticas ==========

/// Media desplazada respecto al primer valor: una serie constante da exactamente ese valor
fn mean(data: &[f64]) -> f64 {
    let Some(&pivot) = data.first() else {
        return 0.0;
    };
    let offset: f64 = data.iter().map(|x| x - pivot).sum();
    pivot + offset / data.len() as f64
}

/// Desviación típica poblacional (divisor N)
fn std(data: &[f64]) -> f64 {
    if data.len() <= 1 {
        return 0.0;
    }
    let mean = mean(data);
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_window(values: [f64; 6]) -> Vec<Sample> {
        vec![Sample::new(values); WINDOW_SIZE]
    }

    #[test]
    fn test_identical_samples_have_zero_std() {
        let values = [0.1, -9.81, 0.3, 1e-7, 250.0, -0.7];
        let features = FeatureExtractor::new()
            .extract(&constant_window(values))
            .unwrap();

        assert_eq!(features.accel_mean(), &values[0..3]);
        assert_eq!(features.gyro_mean(), &values[3..6]);
        for &s in features.accel_std().iter().chain(features.gyro_std()) {
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn test_feature_layout() {
        let features = FeatureExtractor::new()
            .extract(&constant_window([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
            .unwrap();

        let mut expected = [0.0; NUM_FEATURES];
        expected[0] = 1.0;
        assert_eq!(features.0, expected);
    }

    #[test]
    fn test_population_std() {
        // ax alterna 0 y 2: media 1, std poblacional exactamente 1 (muestral sería > 1)
        let window: Vec<Sample> = (0..WINDOW_SIZE)
            .map(|i| {
                let ax = if i % 2 == 0 { 0.0 } else { 2.0 };
                Sample::new([ax, 0.0, 0.0, 0.0, 0.0, 3.0])
            })
            .collect();

        let features = FeatureExtractor::new().extract(&window).unwrap();
        assert_eq!(features.0[0], 1.0);
        assert_eq!(features.0[3], 1.0);
        assert_eq!(features.0[8], 3.0);
        assert_eq!(features.0[11], 0.0);
    }

    #[test]
    fn test_gyro_and_accel_are_separated() {
        let window: Vec<Sample> = (0..WINDOW_SIZE)
            .map(|i| Sample::new([0.0, 0.0, 0.0, i as f64, 0.0, 0.0]))
            .collect();

        let features = FeatureExtractor::new().extract(&window).unwrap();
        assert_eq!(features.accel_mean(), &[0.0, 0.0, 0.0]);
        assert_eq!(features.accel_std(), &[0.0, 0.0, 0.0]);
        assert!((features.gyro_mean()[0] - 24.5).abs() < 1e-12);
        // std poblacional de 0..50 = sqrt((50^2 - 1) / 12)
        let expected = ((50.0f64 * 50.0 - 1.0) / 12.0).sqrt();
        assert!((features.gyro_std()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_window_size() {
        let window = vec![Sample::default(); WINDOW_SIZE - 1];
        assert_eq!(
            FeatureExtractor::new().extract(&window),
            Err(FeatureError::InvalidWindowSize {
                expected: WINDOW_SIZE,
                actual: WINDOW_SIZE - 1
            })
        );
    }

    #[test]
    fn test_mean_and_std_helpers() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std(&[5.0]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert!((std(&[1.0, 2.0, 3.0, 4.0]) - 1.25f64.sqrt()).abs() < 1e-12);
    }
}
