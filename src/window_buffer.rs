use crate::types::{Sample, Window, WINDOW_SIZE};

/// Estado del buffer tras añadir una muestra
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Acumulando muestras (número de muestras actuales)
    Accumulating(usize),
    /// La ventana alcanzó WINDOW_SIZE y debe drenarse antes del siguiente append
    Full,
}

/// Buffer acotado que acumula muestras hasta completar una ventana de 50
pub struct WindowBuffer {
    buffer: Vec<Sample>,
    window_size: usize,
}

impl WindowBuffer {
    /// Crea un buffer vacío con el tamaño de ventana por defecto
    pub fn new() -> Self {
        Self::with_window_size(WINDOW_SIZE)
    }

    pub fn with_window_size(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            buffer: Vec::with_capacity(window_size),
            window_size,
        }
    }

    /// Añade una muestra al final de la ventana.
    ///
    /// Si el buffer ya estaba lleno (el llamador no drenó), la muestra se descarta
    /// y se devuelve `Full` sin crecer más allá de la capacidad.
    pub fn append(&mut self, sample: Sample) -> WindowState {
        if self.is_full() {
            return WindowState::Full;
        }

        self.buffer.push(sample);

        if self.is_full() {
            WindowState::Full
        } else {
            WindowState::Accumulating(self.buffer.len())
        }
    }

    /// true si y solo si hay exactamente `window_size` muestras
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.window_size
    }

    /// Extrae todas las muestras en orden de llegada y deja el buffer vacío.
    /// Sobre un buffer que no está lleno devuelve una ventana vacía y no lo toca.
    pub fn drain(&mut self) -> Window {
        if !self.is_full() {
            return Vec::new();
        }

        std::mem::replace(&mut self.buffer, Vec::with_capacity(self.window_size))
    }

    /// Obtiene el número de muestras acumuladas
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}
