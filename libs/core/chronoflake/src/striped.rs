// [libs/core/chronoflake/src/striped.rs]
/*!
 * =================================================================
 * APARATO: STRIPED CHRONOFLAKE DISPATCHER (V2.3 - CONTENTION DILUTER)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: FRANJAS DE FORJA CON SUB-RANGOS DE NODO DISJUNTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NODE PARTITION: Cada franja i recibe el nodo derivado
 *    `(base << log2(S)) | i`; los sub-rangos son disjuntos, por lo que
 *    los identificadores jamás colisionan entre franjas.
 * 2. THREAD DISPATCH: La franja se elige con el ordinal del hilo
 *    llamador enmascarado por `S − 1`, diluyendo la contención CAS.
 * 3. UNIFORM DECODE: Todas las franjas comparten época y partición de
 *    bits; cualquier identificador se descompone contra cualquier franja.
 * 4. K-SORTED OUTPUT: La salida agregada es monótona por franja y
 *    k-ordenada globalmente, con k acotado por el conteo de franjas.
 * =================================================================
 */

use crate::errors::ChronoflakeError;
use crate::generator::{ChronoflakeGenerator, DecomposedChronoflake};
use crate::options::ChronoflakeOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Bits totales compartidos entre nodo y secuencia bajo el timestamp.
const NODE_AND_SEQUENCE_BITS: u32 = 22;

/// Contador global de ordinales de hilo para el despacho por franjas.
static NEXT_THREAD_ORDINAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Ordinal estable del hilo actual, asignado en el primer despacho.
    static THREAD_STRIPE_ORDINAL: usize =
        NEXT_THREAD_ORDINAL.fetch_add(1, Ordering::Relaxed);
}

/// Envoltorio de forja por franjas para cargas multinúcleo.
pub struct StripedChronoflake {
    stripe_engines: Vec<ChronoflakeGenerator>,
    stripe_mask: usize,
}

impl StripedChronoflake {
    /**
     * Construye `stripe_count` forjas con sub-rangos de nodo disjuntos.
     *
     * # Errors:
     * - [`ChronoflakeError::InvalidStripeCount`] si el conteo no es una
     *   potencia de dos mayor que cero.
     * - [`ChronoflakeError::StripeNodeSpaceExhausted`] si el nodo derivado
     *   de la franja más alta no cabe en el espacio de nodo configurado.
     * - Cualquier fallo de validación de la forja subyacente.
     */
    pub fn new(
        base_options: ChronoflakeOptions,
        stripe_count: usize,
    ) -> Result<Self, ChronoflakeError> {
        if stripe_count == 0 || !stripe_count.is_power_of_two() {
            return Err(ChronoflakeError::InvalidStripeCount(stripe_count));
        }

        let stripe_bits = stripe_count.trailing_zeros();
        let node_bits = NODE_AND_SEQUENCE_BITS
            .checked_sub(base_options.sequence_bits)
            .ok_or(ChronoflakeError::InvalidSequenceBits(
                base_options.sequence_bits,
            ))?;
        let node_capacity = 1u64 << node_bits;

        let highest_derived_node =
            (base_options.node_id << stripe_bits) | (stripe_count as u64 - 1);
        if highest_derived_node >= node_capacity {
            return Err(ChronoflakeError::StripeNodeSpaceExhausted {
                base_node_id: base_options.node_id,
                stripe_count,
                maximum: node_capacity,
            });
        }

        debug!(
            "❄️  [STRIPED_GENESIS]: {} stripes over base node {}.",
            stripe_count, base_options.node_id
        );

        let mut stripe_engines = Vec::with_capacity(stripe_count);
        for stripe_index in 0..stripe_count as u64 {
            let derived_node_id = (base_options.node_id << stripe_bits) | stripe_index;
            let stripe_options = base_options.clone().with_node_id(derived_node_id);
            stripe_engines.push(ChronoflakeGenerator::new(stripe_options)?);
        }

        Ok(Self {
            stripe_engines,
            stripe_mask: stripe_count - 1,
        })
    }

    /// Conteo de franjas activas.
    #[must_use]
    pub fn stripe_count(&self) -> usize {
        self.stripe_engines.len()
    }

    /**
     * Emite el siguiente identificador desde la franja del hilo llamador.
     *
     * El despacho es `ordinal_del_hilo & (S − 1)`: un mismo hilo golpea
     * siempre la misma franja, acotando la contención CAS a los hilos que
     * comparten ordinal módulo S.
     */
    #[inline]
    pub fn next_id(&self) -> i64 {
        let stripe_index = THREAD_STRIPE_ORDINAL.with(|ordinal| *ordinal) & self.stripe_mask;
        self.stripe_engines[stripe_index].next_id()
    }

    /// Descompone un identificador; la partición es uniforme entre franjas.
    #[must_use]
    pub fn decompose(&self, identifier: i64) -> DecomposedChronoflake {
        self.stripe_engines[0].decompose(identifier)
    }
}

impl std::fmt::Debug for StripedChronoflake {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StripedChronoflake")
            .field("stripe_count", &self.stripe_engines.len())
            .finish()
    }
}
