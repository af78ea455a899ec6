use crate::types::{Sample, SensorData, NUM_CHANNELS};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid data format: field {index} is not a number")]
    InvalidFormat { index: usize },

    #[error("Invalid data length: expected {expected} fields, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl DecodeError {
    /// Nombre corto para contadores y logs
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::InvalidFormat { .. } => "invalid_format",
            DecodeError::InvalidLength { .. } => "invalid_length",
        }
    }
}

/// Decodifica un payload `v1,v2,v3,v4,v5,v6` en una muestra.
///
/// El texto se interpreta como UTF-8 (bytes inválidos se reemplazan, y el campo
/// afectado deja de ser numérico), se recortan espacios en los extremos y se parte
/// por comas. Todos los campos se parsean antes de comprobar el número de campos,
/// de modo que un campo no numérico siempre es `InvalidFormat`.
pub fn decode(payload: &[u8]) -> Result<Sample, DecodeError> {
    let text = String::from_utf8_lossy(payload);

    let values = text
        .trim()
        .split(',')
        .enumerate()
        .map(|(index, field)| parse_field(field).ok_or(DecodeError::InvalidFormat { index }))
        .collect::<Result<Vec<f64>, _>>()?;

    let data: SensorData = values
        .as_slice()
        .try_into()
        .map_err(|_| DecodeError::InvalidLength {
            expected: NUM_CHANNELS,
            actual: values.len(),
        })?;

    Ok(Sample::new(data))
}

fn parse_field(field: &str) -> Option<f64> {
    // float() tolera espacios alrededor de cada campo ("1.0, 2.0")
    field.trim().parse::<f64>().ok()
}
