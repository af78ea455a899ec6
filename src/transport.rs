use crate::config::Config;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rumqttc::{Client, Connection, Event, Packet, QoS};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("No CONNACK from broker within {0:?}")]
    ConnectTimeout(Duration),

    #[error("MQTT event loop stopped before connecting")]
    Disconnected,

    #[error("Invalid MQTT topic {0:?}")]
    InvalidTopic(String),
}

/// Salida de predicciones hacia el broker
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;
}

/// Publica con el QoS configurado, sin retain
pub struct MqttPublisher {
    client: Client,
    qos: QoS,
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.client
            .publish(topic, self.qos, false, payload.as_bytes().to_vec())?;
        Ok(())
    }
}

/// Conecta al broker, se suscribe al topic de entrada y lanza el hilo de red.
///
/// Devuelve el publicador y el canal por el que llegan los payloads, en orden de
/// entrega. No retorna hasta recibir el primer CONNACK: un rechazo, un error de red
/// o agotar `connect_timeout_secs` antes de ese momento es un error de arranque.
pub fn connect(config: &Config) -> Result<(MqttPublisher, Receiver<Vec<u8>>), TransportError> {
    if !rumqttc::valid_filter(&config.input_topic) {
        return Err(TransportError::InvalidTopic(config.input_topic.clone()));
    }
    if !rumqttc::valid_topic(&config.output_topic) {
        return Err(TransportError::InvalidTopic(config.output_topic.clone()));
    }

    let (client, connection) = Client::new(config.mqtt_options(), 10);
    let (tx, rx) = bounded::<Vec<u8>>(config.channel_capacity.max(1));
    let (ready_tx, ready_rx) = bounded::<Result<(), TransportError>>(1);

    info!(
        "Conectando a mqtt://{}:{} como '{}'",
        config.broker_host, config.broker_port, config.client_id
    );

    let event_client = client.clone();
    let input_topic = config.input_topic.clone();
    let qos = config.qos();
    std::thread::Builder::new()
        .name("mqtt-events".into())
        .spawn(move || run_event_loop(connection, event_client, input_topic, qos, tx, ready_tx))
        .map_err(|_| TransportError::Disconnected)?;

    let timeout = Duration::from_secs(config.connect_timeout_secs);
    match ready_rx.recv_timeout(timeout) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(RecvTimeoutError::Timeout) => return Err(TransportError::ConnectTimeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
    }

    Ok((MqttPublisher { client, qos }, rx))
}

/// El topic de un PUBLISH entrante encaja con el filtro suscrito (admite `+` y `#`)
fn accepts_topic(topic: &str, filter: &str) -> bool {
    rumqttc::matches(topic, filter)
}

/// Bucle del hilo de red: reenvía los PUBLISH del topic de entrada al canal.
/// Tras el primer CONNACK los errores de conexión solo se registran y rumqttc
/// reconecta en la siguiente iteración. Una suscripción fallida en el primer
/// CONNACK es un error de arranque; en reconexiones se reintenta con cada evento.
fn run_event_loop(
    mut connection: Connection,
    mut client: Client,
    input_topic: String,
    qos: QoS,
    tx: Sender<Vec<u8>>,
    ready_tx: Sender<Result<(), TransportError>>,
) {
    let mut connected_once = false;
    let mut subscribe_pending = false;

    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!("CONNACK: {:?}", ack);
                // Sesión limpia: hay que renovar la suscripción en cada conexión.
                // try_subscribe no bloquea este hilo, que es quien vacía la cola.
                if let Err(e) = client.try_subscribe(input_topic.as_str(), qos) {
                    if !connected_once {
                        let _ = ready_tx.send(Err(TransportError::Client(e)));
                        return;
                    }
                    error!("No se pudo suscribir a {}: {}. Reintentando", input_topic, e);
                    subscribe_pending = true;
                } else {
                    info!("📡 Suscrito a {}", input_topic);
                    subscribe_pending = false;
                }

                if !connected_once {
                    connected_once = true;
                    let _ = ready_tx.send(Ok(()));
                } else {
                    info!("Reconectado al broker");
                }
                continue;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if !accepts_topic(&publish.topic, &input_topic) {
                    debug!("Ignorando mensaje en topic {}", publish.topic);
                    continue;
                }
                // Bloquea si el coordinador va por detrás (backpressure)
                if tx.send(publish.payload.to_vec()).is_err() {
                    info!("Coordinador detenido, cerrando hilo MQTT");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                if !connected_once {
                    let _ = ready_tx.send(Err(TransportError::Connection(e)));
                    return;
                }
                warn!("Error de conexión MQTT: {}. Reintentando en {:?}", e, RECONNECT_DELAY);
                std::thread::sleep(RECONNECT_DELAY);
                continue;
            }
        }

        if subscribe_pending {
            match client.try_subscribe(input_topic.as_str(), qos) {
                Ok(()) => {
                    info!("📡 Suscrito a {}", input_topic);
                    subscribe_pending = false;
                }
                Err(e) => warn!("Suscripción a {} pendiente: {}", input_topic, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_accepts_exact_and_wildcard_filters() {
        assert!(accepts_topic("sensor/mpu6050/data", "sensor/mpu6050/data"));
        assert!(accepts_topic("sensor/mpu6050/data", "sensor/+/data"));
        assert!(accepts_topic("sensor/mpu6050/data", "sensor/#"));
        assert!(!accepts_topic("sensor/mpu6050/prediction", "sensor/+/data"));
        assert!(!accepts_topic("other/mpu6050/data", "sensor/mpu6050/data"));
    }

    #[test]
    fn test_connection_refused_is_startup_error() {
        let config = Config::try_parse_from([
            "shipmon",
            "--broker-host",
            "127.0.0.1",
            "--broker-port",
            "1",
            "--connect-timeout-secs",
            "5",
        ])
        .unwrap();

        assert!(matches!(
            connect(&config),
            Err(TransportError::Connection(_))
        ));
    }

    #[test]
    fn test_invalid_topics_rejected_before_connecting() {
        let config =
            Config::try_parse_from(["shipmon", "--input-topic", "sensor/#/data"]).unwrap();
        assert!(matches!(
            connect(&config),
            Err(TransportError::InvalidTopic(topic)) if topic == "sensor/#/data"
        ));

        let config =
            Config::try_parse_from(["shipmon", "--output-topic", "sensor/+/prediction"]).unwrap();
        assert!(matches!(
            connect(&config),
            Err(TransportError::InvalidTopic(_))
        ));
    }
}
