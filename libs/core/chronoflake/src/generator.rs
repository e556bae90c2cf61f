// [libs/core/chronoflake/src/generator.rs]
/*!
 * =================================================================
 * APARATO: CHRONOFLAKE GENERATOR (V4.1 - CAS SOVEREIGN)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: EMISIÓN LOCK-FREE DE IDENTIFICADORES DE 64 BITS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE-WORD STATE: Todo el estado mutable vive en una palabra
 *    atómica `(timestamp_virtual_ms << sequence_bits) | secuencia`,
 *    actualizada vía compare-exchange con insinuación de spin.
 * 2. CACHE-LINE ISOLATION: La palabra caliente reside sola en su línea
 *    de caché (`#[repr(align(128))]`), separada de la configuración de
 *    solo lectura para erradicar el false sharing.
 * 3. VIRTUAL TIME SHIELD: El desborde de secuencia toma prestado un
 *    milisegundo del futuro virtual; la deuda se acota con
 *    'max_drift_ms' pausando la emisión hasta que el reloj real alcance.
 * 4. DRIFT IMMUNITY: Con reloj de sistema, el ancla monotónica congela
 *    los retrocesos NTP fuera del camino de emisión.
 *
 * # Mathematical Proof (Strict Monotonicity):
 * Cada CAS exitoso publica un empacado estrictamente mayor que el
 * previo (timestamp crece, o timestamp igual y secuencia crece), y el
 * identificador es una función estrictamente creciente del empacado
 * para un nodo fijo; por tanto la emisión es estrictamente monótona.
 * =================================================================
 */

use crate::clock::TimeAuthority;
use crate::errors::ChronoflakeError;
use crate::options::ChronoflakeOptions;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Desplazamiento del delta de timestamp dentro del identificador.
const ID_TIMESTAMP_SHIFT: u32 = 22;

/// Bits compartidos entre nodo y secuencia bajo el timestamp.
const NODE_AND_SEQUENCE_BITS: u32 = 22;

/// Línea de caché dedicada para la palabra de estado empacada.
///
/// La alineación a 128 bytes cubre el prefetch adyacente de las
/// microarquitecturas x86 modernas; los campos de configuración que la
/// siguen quedan fuera de la línea caliente.
#[repr(align(128))]
struct PackedHotState {
    packed_word: AtomicU64,
}

/// Generador individual de identificadores ordenados por tiempo.
pub struct ChronoflakeGenerator {
    hot_state: PackedHotState,
    epoch_unix_ms: i64,
    node_id: u64,
    sequence_bits: u32,
    sequence_mask: u64,
    node_id_mask: u64,
    max_drift_ms: u64,
    time_authority: TimeAuthority,
}

impl ChronoflakeGenerator {
    /**
     * Construye la forja validando el dominio completo de las opciones.
     *
     * # Errors:
     * - [`ChronoflakeError::InvalidSequenceBits`] fuera de [1, 22].
     * - [`ChronoflakeError::NodeIdOutOfRange`] si el nodo no cabe en
     *   `22 − sequence_bits` bits.
     * - [`ChronoflakeError::EpochInFuture`] si la época supera el ahora.
     */
    pub fn new(options: ChronoflakeOptions) -> Result<Self, ChronoflakeError> {
        let sequence_bits = options.sequence_bits;
        if !(1..=NODE_AND_SEQUENCE_BITS).contains(&sequence_bits) {
            return Err(ChronoflakeError::InvalidSequenceBits(sequence_bits));
        }

        let node_bits = NODE_AND_SEQUENCE_BITS - sequence_bits;
        let node_capacity = 1u64 << node_bits;
        if options.node_id >= node_capacity {
            return Err(ChronoflakeError::NodeIdOutOfRange {
                node_id: options.node_id,
                maximum: node_capacity,
                sequence_bits,
            });
        }

        let time_authority = match options.clock_source {
            Some(clock_source) => TimeAuthority::Injected(clock_source),
            None => TimeAuthority::anchored_now(),
        };

        let epoch_unix_ms = options.epoch.timestamp_millis();
        let now_unix_ms = time_authority.now_unix_ms();
        if epoch_unix_ms > now_unix_ms {
            return Err(ChronoflakeError::EpochInFuture {
                epoch_ms: epoch_unix_ms,
                now_ms: now_unix_ms,
            });
        }

        let sequence_mask = (1u64 << sequence_bits) - 1;

        // Estado inicial: (ahora − 1) con la secuencia saturada, de modo
        // que la primera emisión transicione limpiamente a (ahora, 0).
        let initial_packed = (((now_unix_ms - 1) as u64) << sequence_bits) | sequence_mask;

        debug!(
            "❄️  [FORGE_GENESIS]: node={} sequence_bits={} drift_ms={}.",
            options.node_id, sequence_bits, options.max_drift_ms
        );

        Ok(Self {
            hot_state: PackedHotState {
                packed_word: AtomicU64::new(initial_packed),
            },
            epoch_unix_ms,
            node_id: options.node_id,
            sequence_bits,
            sequence_mask,
            node_id_mask: node_capacity - 1,
            max_drift_ms: options.max_drift_ms,
            time_authority,
        })
    }

    /**
     * Emite el siguiente identificador; estrictamente mayor que el previo.
     *
     * # Logic (bucle CAS):
     * 1. Lee el empacado actual y extrae `(ts_virtual, secuencia)`.
     * 2. Observa el ahora según la autoridad de tiempo.
     * 3. Selección sin ramas costosas: avanzar al ahora, tomar prestado un
     *    milisegundo ante el desborde de secuencia, o incrementar la
     *    secuencia dentro del milisegundo vigente.
     * 4. Si la deuda virtual supera 'max_drift_ms', insinúa spin y
     *    reintenta hasta que el reloj real alcance.
     * 5. Publica vía compare-exchange; la derrota implica reintento.
     *
     * Nunca suspende ni falla: el costo en el peor caso es el spin
     * acotado por la deriva configurada.
     */
    #[inline]
    pub fn next_id(&self) -> i64 {
        loop {
            let current_packed = self.hot_state.packed_word.load(Ordering::Acquire);
            let current_virtual_ts = (current_packed >> self.sequence_bits) as i64;
            let current_sequence = current_packed & self.sequence_mask;

            let now_unix_ms = self.time_authority.now_unix_ms();
            let candidate_sequence = (current_sequence + 1) & self.sequence_mask;

            let (next_virtual_ts, next_sequence) = if now_unix_ms > current_virtual_ts {
                (now_unix_ms, 0)
            } else if candidate_sequence == 0 {
                (current_virtual_ts + 1, 0)
            } else {
                (current_virtual_ts, candidate_sequence)
            };

            if next_virtual_ts.saturating_sub(now_unix_ms) as u64 > self.max_drift_ms {
                std::hint::spin_loop();
                continue;
            }

            let next_packed = ((next_virtual_ts as u64) << self.sequence_bits) | next_sequence;
            match self.hot_state.packed_word.compare_exchange_weak(
                current_packed,
                next_packed,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return self.compose(next_virtual_ts, self.node_id, next_sequence);
                }
                Err(_) => std::hint::spin_loop(),
            }
        }
    }

    /**
     * Ensambla un identificador a partir de sus componentes absolutos.
     *
     * Expuesto para certificar el ciclo componer → descomponer; el camino
     * caliente lo reutiliza tras cada CAS exitoso.
     */
    #[must_use]
    #[inline]
    pub fn compose(&self, timestamp_unix_ms: i64, node_id: u64, sequence: u64) -> i64 {
        let timestamp_delta = (timestamp_unix_ms - self.epoch_unix_ms) as u64;
        ((timestamp_delta << ID_TIMESTAMP_SHIFT)
            | (node_id << self.sequence_bits)
            | (sequence & self.sequence_mask)) as i64
    }

    /// Descompone un identificador bajo la partición de esta forja.
    #[must_use]
    pub fn decompose(&self, identifier: i64) -> DecomposedChronoflake {
        let raw_identifier = identifier as u64;
        let timestamp_delta = raw_identifier >> ID_TIMESTAMP_SHIFT;

        DecomposedChronoflake {
            identifier,
            timestamp_unix_ms: self.epoch_unix_ms + timestamp_delta as i64,
            node_id: (raw_identifier >> self.sequence_bits) & self.node_id_mask,
            sequence: raw_identifier & self.sequence_mask,
        }
    }

    /// Identificador de nodo de esta forja.
    #[must_use]
    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Bits de secuencia de la partición vigente.
    #[must_use]
    pub fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Época de referencia en milisegundos Unix.
    #[must_use]
    pub fn epoch_unix_ms(&self) -> i64 {
        self.epoch_unix_ms
    }
}

impl std::fmt::Debug for ChronoflakeGenerator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ChronoflakeGenerator")
            .field("node_id", &self.node_id)
            .field("sequence_bits", &self.sequence_bits)
            .field("epoch_unix_ms", &self.epoch_unix_ms)
            .finish()
    }
}

/// Huella desempacada de un identificador Chronoflake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecomposedChronoflake {
    /// Identificador original de 64 bits.
    pub identifier: i64,
    /// Instante absoluto de emisión en milisegundos Unix.
    pub timestamp_unix_ms: i64,
    /// Nodo emisor.
    pub node_id: u64,
    /// Secuencia intra-milisegundo.
    pub sequence: u64,
}

impl std::fmt::Display for DecomposedChronoflake {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{} (ts={} node={} seq={})",
            self.identifier, self.timestamp_unix_ms, self.node_id, self.sequence
        )
    }
}
