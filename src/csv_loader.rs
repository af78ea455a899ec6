use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

/// Carga las filas de un CSV `ax,ay,az,gx,gy,gz` como payloads de texto,
/// listos para pasar por el decodificador igual que un mensaje MQTT.
/// Las filas con columnas de más o de menos se conservan: el decodificador las rechaza.
pub fn load_payloads_from_csv(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;
    load_payloads_from_reader(file).with_context(|| format!("CSV inválido: {:?}", path))
}

/// Igual que `load_payloads_from_csv` sobre cualquier lector.
/// Una primera fila no numérica se interpreta como cabecera y se omite.
pub fn load_payloads_from_reader(reader: impl Read) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut payloads = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Fila {} inválida", row_idx + 1))?;

        if row_idx == 0 && is_header(&record) {
            continue;
        }
        if record.iter().all(str::is_empty) {
            continue;
        }

        payloads.push(record.iter().collect::<Vec<_>>().join(","));
    }

    Ok(payloads)
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .iter()
        .any(|field| !field.is_empty() && field.parse::<f64>().is_err())
}
