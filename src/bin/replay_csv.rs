use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shipmon::coordinator::StreamCoordinator;
use shipmon::csv_loader::load_payloads_from_csv;
use shipmon::inference::InferenceAdapter;
use shipmon::types::{NUM_CLASSES, WINDOW_SIZE};

/// Reproduce un CSV de muestras a través del mismo pipeline que el daemon
#[derive(Parser, Debug)]
#[command(name = "replay_csv", version)]
struct ReplayOptions {
    /// CSV con filas ax,ay,az,gx,gy,gz
    csv: PathBuf,

    #[arg(long, env = "SHIPMON_MODEL", default_value = "shipment_model.onnx")]
    model: PathBuf,

    #[arg(long, env = "SHIPMON_SCALER", default_value = "scaler.json")]
    scaler: PathBuf,

    #[arg(long, default_value_t = NUM_CLASSES)]
    num_classes: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipmon=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opts = ReplayOptions::parse();
    println!("🎞️  Reproduciendo muestras desde {:?}", opts.csv);

    let payloads = load_payloads_from_csv(&opts.csv)?;
    if payloads.len() < WINDOW_SIZE {
        bail!(
            "El CSV tiene {} filas; se necesitan al menos {} para una ventana",
            payloads.len(),
            WINDOW_SIZE
        );
    }

    let adapter = InferenceAdapter::load(&opts.model, &opts.scaler, opts.num_classes)
        .context("No se pudo inicializar el clasificador")?;
    let mut coordinator = StreamCoordinator::new(adapter);

    let mut window_idx = 0;
    for (row, payload) in payloads.iter().enumerate() {
        if let Some(prediction) = coordinator.handle(payload.as_bytes()) {
            println!(
                "  ventana {:>3} (hasta fila {:>5}): clase {}",
                window_idx,
                row + 1,
                prediction
            );
            window_idx += 1;
        }
    }

    let stats = coordinator.stats();
    println!(
        "\n📊 {} filas, {} ventanas, {} formato inválido, {} longitud inválida, {} fallos de inferencia",
        stats.messages,
        stats.windows,
        stats.invalid_format,
        stats.invalid_length,
        stats.inference_failures
    );
    if coordinator.window_len() > 0 {
        println!("ℹ️  {} muestras finales sin completar ventana", coordinator.window_len());
    }

    Ok(())
}
