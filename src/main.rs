/*
Clasificación de envíos en tiempo real - Rust + MQTT

Sistema que:
1. Recibe lecturas del MPU6050 ("ax,ay,az,gx,gy,gz") por MQTT
2. Acumula ventanas de 50 muestras
3. Extrae media y desviación típica por eje (12 características)
4. Clasifica con el modelo entrenado (ONNX o MLP exportado a JSON)
5. Publica la clase predicha en el topic de salida

Para ejecutar:
    RUST_LOG=shipmon=debug ./target/release/shipmon \
        --model shipment_model.onnx --scaler scaler.json
*/

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipmon::config::Config;
use shipmon::coordinator::StreamCoordinator;
use shipmon::inference::InferenceAdapter;
use shipmon::transport;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipmon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    info!("🚚 Shipment monitor - Rust + MQTT");

    // Modelo y escalador se validan antes de tocar la red
    info!("🔧 Cargando modelo y escalador...");
    let adapter = InferenceAdapter::load(&config.model, &config.scaler, config.num_classes)
        .context("No se pudo inicializar el clasificador")?;
    info!("✅ Clasificador cargado");

    let (mut publisher, rx) = transport::connect(&config).with_context(|| {
        format!(
            "No se pudo conectar a {}:{}",
            config.broker_host, config.broker_port
        )
    })?;
    info!("✅ Conectado al broker");

    info!(
        "🎬 Escuchando {} -> publicando en {}",
        config.input_topic, config.output_topic
    );
    let mut coordinator = StreamCoordinator::new(adapter);
    coordinator.run(rx, &mut publisher, &config.output_topic);

    Ok(())
}
