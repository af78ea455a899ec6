use clap::Parser;
use rumqttc::{MqttOptions, QoS};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::NUM_CLASSES;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "shipmon",
    version,
    about = "Clasifica ventanas IMU recibidas por MQTT y publica la clase predicha"
)]
pub struct Config {
    /// Host del broker MQTT
    #[arg(long, env = "SHIPMON_BROKER_HOST", default_value = "broker.hivemq.com")]
    pub broker_host: String,

    /// Puerto del broker MQTT
    #[arg(long, env = "SHIPMON_BROKER_PORT", default_value_t = 1883)]
    pub broker_port: u16,

    #[arg(long, env = "SHIPMON_CLIENT_ID", default_value = "shipmon")]
    pub client_id: String,

    /// Keep-alive MQTT en segundos
    #[arg(long, env = "SHIPMON_KEEP_ALIVE_SECS", default_value_t = 60)]
    pub keep_alive_secs: u64,

    /// Topic con las lecturas "ax,ay,az,gx,gy,gz"
    #[arg(long, env = "SHIPMON_INPUT_TOPIC", default_value = "sensor/mpu6050/data")]
    pub input_topic: String,

    /// Topic donde se publica la clase predicha
    #[arg(
        long,
        env = "SHIPMON_OUTPUT_TOPIC",
        default_value = "sensor/mpu6050/prediction"
    )]
    pub output_topic: String,

    /// QoS de suscripción y publicación (0, 1 o 2)
    #[arg(
        long,
        env = "SHIPMON_QOS",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub qos: u8,

    /// Modelo entrenado (.onnx o .json)
    #[arg(long, env = "SHIPMON_MODEL", default_value = "shipment_model.onnx")]
    pub model: PathBuf,

    /// Parámetros del StandardScaler (JSON con mean/scale)
    #[arg(long, env = "SHIPMON_SCALER", default_value = "scaler.json")]
    pub scaler: PathBuf,

    /// Número de clases que debe producir el modelo
    #[arg(long, env = "SHIPMON_NUM_CLASSES", default_value_t = NUM_CLASSES)]
    pub num_classes: usize,

    /// Capacidad de la cola entre el hilo MQTT y el coordinador
    #[arg(long, env = "SHIPMON_CHANNEL_CAPACITY", default_value_t = 100)]
    pub channel_capacity: usize,

    /// Tiempo máximo para recibir el CONNACK inicial
    #[arg(long, env = "SHIPMON_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,
}

impl Config {
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        // rumqttc exige keep-alive >= 1s
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs.max(1)));
        options.set_clean_session(true);
        options
    }

    pub fn qos(&self) -> QoS {
        match self.qos {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = Config::try_parse_from(["shipmon"]).unwrap();
        assert_eq!(config.broker_host, "broker.hivemq.com");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.input_topic, "sensor/mpu6050/data");
        assert_eq!(config.output_topic, "sensor/mpu6050/prediction");
        assert_eq!(config.num_classes, 5);
        assert_eq!(config.qos(), QoS::AtMostOnce);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::try_parse_from([
            "shipmon",
            "--broker-host",
            "localhost",
            "--broker-port",
            "1884",
            "--qos",
            "1",
            "--model",
            "model.json",
        ])
        .unwrap();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1884);
        assert_eq!(config.qos(), QoS::AtLeastOnce);
        assert_eq!(config.model, PathBuf::from("model.json"));

        let options = config.mqtt_options();
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1884));
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_qos_is_rejected() {
        assert!(Config::try_parse_from(["shipmon", "--qos", "3"]).is_err());
    }
}
