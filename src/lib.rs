//! Clasificación de envíos en tiempo real a partir de lecturas IMU (MPU6050).
//!
//! Flujo: MQTT -> [`decoder`] -> [`window_buffer`] -> (ventana llena)
//! [`feature_extractor`] -> [`inference`] -> MQTT.

pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod csv_loader;
pub mod decoder;
pub mod feature_extractor;
pub mod inference;
pub mod scaler;
pub mod transport;
pub mod types;
pub mod window_buffer;
