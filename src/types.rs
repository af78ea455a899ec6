use std::fmt;

/// Lectura cruda de la IMU: [ax, ay, az, gx, gy, gz]
pub type SensorData = [f64; NUM_CHANNELS];

/// Una muestra decodificada del MPU6050 (acelerómetro + giroscopio)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    values: SensorData,
}

impl Sample {
    pub fn new(values: SensorData) -> Self {
        Self { values }
    }

    /// Canales en orden de llegada: ax, ay, az, gx, gy, gz
    pub fn values(&self) -> &SensorData {
        &self.values
    }

    /// Triple del acelerómetro (primeros 3 canales)
    pub fn accel(&self) -> [f64; AXES] {
        [self.values[0], self.values[1], self.values[2]]
    }

    /// Triple del giroscopio (últimos 3 canales)
    pub fn gyro(&self) -> [f64; AXES] {
        [self.values[3], self.values[4], self.values[5]]
    }
}

/// Vector de características de una ventana completa.
/// Layout: [media acc (3), std acc (3), media gyro (3), std gyro (3)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn accel_mean(&self) -> &[f64] {
        &self.0[0..3]
    }

    pub fn accel_std(&self) -> &[f64] {
        &self.0[3..6]
    }

    pub fn gyro_mean(&self) -> &[f64] {
        &self.0[6..9]
    }

    pub fn gyro_std(&self) -> &[f64] {
        &self.0[9..12]
    }
}

/// Etiqueta de clase predicha para una ventana
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prediction(pub usize);

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Una ventana drenada del buffer, en orden de llegada
pub type Window = Vec<Sample>;

/// Constantes del sistema
pub const WINDOW_SIZE: usize = 50;
pub const AXES: usize = 3;
pub const NUM_CHANNELS: usize = 6; // ax, ay, az, gx, gy, gz
pub const NUM_FEATURES: usize = 12; // (media + std) x (acc + gyro) x 3 ejes
pub const NUM_CLASSES: usize = 5;
