// [libs/core/chronoflake/src/options.rs]
/*!
 * =================================================================
 * APARATO: CHRONOFLAKE OPTIONS (V2.0 - VALIDATED SHAPE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: PARÁMETROS NOMINALES DE LA FORJA DE IDENTIFICADORES
 * =================================================================
 */

use crate::clock::ClockSource;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// Bits de secuencia por defecto (4096 identificadores por milisegundo).
pub const DEFAULT_SEQUENCE_BITS: u32 = 12;

/// Tolerancia de deriva virtual por defecto, en milisegundos.
pub const DEFAULT_MAX_DRIFT_MS: u64 = 2_000;

/// Época por defecto de la forja: 2024-01-01T00:00:00Z.
pub const DEFAULT_EPOCH_UNIX_MS: i64 = 1_704_067_200_000;

/// Parámetros nominales de un generador Chronoflake.
///
/// La validación de dominio ocurre al construir el generador
/// ([`crate::generator::ChronoflakeGenerator::new`]), no aquí.
#[derive(Clone)]
pub struct ChronoflakeOptions {
    /// Instante absoluto de referencia; debe ser ≤ ahora.
    pub epoch: DateTime<Utc>,
    /// Identificador de nodo, en `[0, 2^(22 − sequence_bits))`.
    pub node_id: u64,
    /// Bits destinados a la secuencia intra-milisegundo, en [1, 22].
    pub sequence_bits: u32,
    /// Deriva virtual máxima tolerada antes de pausar la emisión.
    pub max_drift_ms: u64,
    /// Fuente de tiempo inyectada; `None` activa el ancla monotónica.
    pub clock_source: Option<Arc<dyn ClockSource>>,
}

impl Default for ChronoflakeOptions {
    fn default() -> Self {
        Self {
            epoch: Utc
                .timestamp_millis_opt(DEFAULT_EPOCH_UNIX_MS)
                .single()
                .unwrap_or_else(Utc::now),
            node_id: 0,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            max_drift_ms: DEFAULT_MAX_DRIFT_MS,
            clock_source: None,
        }
    }
}

impl ChronoflakeOptions {
    /// Fija el identificador de nodo.
    #[must_use]
    pub fn with_node_id(mut self, node_id: u64) -> Self {
        self.node_id = node_id;
        self
    }

    /// Fija los bits de secuencia.
    #[must_use]
    pub fn with_sequence_bits(mut self, sequence_bits: u32) -> Self {
        self.sequence_bits = sequence_bits;
        self
    }

    /// Fija la tolerancia de deriva virtual.
    #[must_use]
    pub fn with_max_drift_ms(mut self, max_drift_ms: u64) -> Self {
        self.max_drift_ms = max_drift_ms;
        self
    }

    /// Fija la época de referencia.
    #[must_use]
    pub fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = epoch;
        self
    }

    /// Inyecta una fuente de tiempo sintética (Proving Grounds).
    #[must_use]
    pub fn with_clock_source(mut self, clock_source: Arc<dyn ClockSource>) -> Self {
        self.clock_source = Some(clock_source);
        self
    }
}

impl std::fmt::Debug for ChronoflakeOptions {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ChronoflakeOptions")
            .field("epoch", &self.epoch)
            .field("node_id", &self.node_id)
            .field("sequence_bits", &self.sequence_bits)
            .field("max_drift_ms", &self.max_drift_ms)
            .field("injected_clock", &self.clock_source.is_some())
            .finish()
    }
}
