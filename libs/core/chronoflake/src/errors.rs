// libs/core/chronoflake/src/errors.rs
// =================================================================
// APARATO: CHRONOFLAKE ERRORS
// RESPONSABILIDAD: CATÁLOGO DE FALLOS DE CONFIGURACIÓN DE LA FORJA
// ESTADO: ELITE COMPLIANCE (FULL RUSTDOC)
// =================================================================

use thiserror::Error;

/// Define los errores posibles al construir o reconfigurar la forja.
///
/// Todos los fallos pertenecen a la fase de construcción: `next_id` nunca
/// falla ni suspende una vez que el generador existe.
#[derive(Error, Debug)]
pub enum ChronoflakeError {
    /// El identificador de nodo excede el rango que permite la partición.
    ///
    /// El rango válido es `[0, 2^(22 − sequence_bits))`.
    #[error("node_id {node_id} fuera de rango (máximo {maximum} con {sequence_bits} bits de secuencia)")]
    NodeIdOutOfRange {
        /// Identificador de nodo solicitado.
        node_id: u64,
        /// Máximo admisible bajo la partición vigente (exclusivo).
        maximum: u64,
        /// Bits de secuencia configurados.
        sequence_bits: u32,
    },

    /// La época configurada está en el futuro respecto al reloj activo.
    #[error("la época configurada ({epoch_ms} ms) es posterior al instante actual ({now_ms} ms)")]
    EpochInFuture {
        /// Época solicitada en milisegundos Unix.
        epoch_ms: i64,
        /// Instante observado en milisegundos Unix.
        now_ms: i64,
    },

    /// Los bits de secuencia deben pertenecer al intervalo [1, 22].
    #[error("sequence_bits {0} fuera del intervalo [1, 22]")]
    InvalidSequenceBits(u32),

    /// El conteo de franjas debe ser una potencia de dos mayor que cero.
    #[error("stripe_count {0} debe ser potencia de dos (≥ 1)")]
    InvalidStripeCount(usize),

    /// La concatenación (nodo base, franja) desborda el espacio de nodo.
    ///
    /// El nodo derivado de la franja más alta,
    /// `(base << stripe_bits) | (stripe_count − 1)`, debe caber en el rango
    /// de nodo configurado.
    #[error("el nodo base {base_node_id} con {stripe_count} franjas desborda el espacio de nodo (máximo {maximum})")]
    StripeNodeSpaceExhausted {
        /// Nodo base solicitado.
        base_node_id: u64,
        /// Franjas solicitadas.
        stripe_count: usize,
        /// Máximo admisible para el nodo derivado (exclusivo).
        maximum: u64,
    },
}
