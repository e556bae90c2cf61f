// [libs/core/probabilistic/src/bit_matrix.rs]
#![allow(unsafe_code)] // Autorizado exclusivamente para el aliasing palabra↔byte del streaming

/*!
 * =================================================================
 * APARATO: ATOMIC BIT MATRIX (V3.1 - ZERO COPY STREAMING)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: ALMACÉN ATÓMICO DE BITS CON CHECKSUM Y STREAMING
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LOST-UPDATE IMMUNITY: El encendido de bits usa 'fetch_or' sobre
 *    palabras de 64 bits; el valor previo decide si el bit realmente
 *    transicionó 0→1, inmune a carreras entre hilos escritores.
 * 2. MEMORY SOBERANEITY: El volcado y la hidratación observan el mismo
 *    almacén de palabras como bytes (aliasing), erradicando copias
 *    intermedias al serializar matrices de cientos de megabytes.
 * 3. TAIL DISCIPLINE: Los bits de relleno más allá de 'm' jamás se
 *    encienden, por lo que ni el pop-count ni el checksum los observan.
 * 4. BINARY PARITY: El prefijo activo persiste en orden de palabra
 *    Little-Endian, idéntico entre volcado e hidratación.
 *
 * # Mathematical Proof (Atomicity):
 * Para T hilos encendiendo bits disjuntos, fetch_or garantiza que el
 * pop-count final es exactamente el cardinal de posiciones tocadas:
 * ninguna actualización se pierde por solapamiento de palabras.
 * =================================================================
 */

use crate::errors::FilterError;
use crate::signal::CancellationSignal;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use xxhash_rust::xxh3::xxh3_64;

/// Granularidad de las ráfagas de lectura durante la hidratación.
const HYDRATION_CHUNK_LENGTH_BYTES: usize = 64 * 1024;

/// Matriz de bits de longitud fija respaldada por palabras atómicas de 64 bits.
///
/// La propiedad es exclusiva del filtro dueño: las operaciones de bit son
/// seguras bajo lectores y escritores concurrentes; las operaciones masivas
/// (checksum, streaming) exigen que el dueño serialice la recarga/volcado.
pub struct AtomicBitMatrix {
    word_strata: Box<[AtomicU64]>,
    length_in_bits: u64,
}

impl AtomicBitMatrix {
    /// Construye una matriz de `length_in_bits` bits, todos apagados.
    #[must_use]
    pub fn new(length_in_bits: u64) -> Self {
        let word_count = length_in_bits.div_ceil(64) as usize;
        let mut word_storage = Vec::with_capacity(word_count);
        word_storage.resize_with(word_count, || AtomicU64::new(0));

        Self {
            word_strata: word_storage.into_boxed_slice(),
            length_in_bits,
        }
    }

    /// Longitud lógica de la matriz en bits (m).
    #[must_use]
    #[inline]
    pub fn length_in_bits(&self) -> u64 {
        self.length_in_bits
    }

    /// Bytes del prefijo activo persistible: `ceil(m / 8)`.
    #[must_use]
    #[inline]
    pub fn active_byte_count(&self) -> usize {
        self.length_in_bits.div_ceil(8) as usize
    }

    /**
     * Enciende el bit `bit_index` si estaba apagado.
     *
     * # Logic:
     * 1. Lectura volátil de la palabra: si el bit ya está encendido,
     *    retorna `false` sin emitir tráfico de escritura (fast path).
     * 2. OR atómico de la máscara; el valor previo decide si este hilo
     *    fue quien realmente encendió el bit.
     *
     * # Returns:
     * `true` únicamente si el bit transicionó 0→1 en esta invocación.
     */
    #[inline]
    pub fn set(&self, bit_index: u64) -> bool {
        debug_assert!(bit_index < self.length_in_bits, "bit fuera de rango");

        let target_word = &self.word_strata[(bit_index / 64) as usize];
        let bit_mask = 1u64 << (bit_index % 64);

        if target_word.load(Ordering::Acquire) & bit_mask != 0 {
            return false;
        }
        target_word.fetch_or(bit_mask, Ordering::AcqRel) & bit_mask == 0
    }

    /// Lectura volátil del bit `bit_index`.
    #[must_use]
    #[inline]
    pub fn get(&self, bit_index: u64) -> bool {
        debug_assert!(bit_index < self.length_in_bits, "bit fuera de rango");

        let target_word = &self.word_strata[(bit_index / 64) as usize];
        target_word.load(Ordering::Acquire) & (1u64 << (bit_index % 64)) != 0
    }

    /// Suma de pop-counts de hardware sobre las palabras activas.
    #[must_use]
    pub fn population_count(&self) -> u64 {
        self.word_strata
            .iter()
            .map(|word| u64::from(word.load(Ordering::Acquire).count_ones()))
            .sum()
    }

    /**
     * Calcula el checksum XXH3-64 del prefijo de bytes activo.
     *
     * Debe invocarse con la matriz quiescente (bajo el cerrojo de escritor
     * del dueño); los bits de relleno del último byte son siempre cero y
     * no perturban el resultado.
     */
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        xxh3_64(self.active_prefix_as_bytes())
    }

    /**
     * Vuelca el prefijo activo exacto hacia `destination` sin copias.
     *
     * # Errors:
     * Propaga cualquier fallo de escritura del destino.
     */
    pub fn write_active_prefix<W: Write>(&self, destination: &mut W) -> std::io::Result<()> {
        destination.write_all(self.active_prefix_as_bytes())
    }

    /**
     * Hidrata el prefijo activo desde `source` en ráfagas acotadas.
     *
     * Lee hasta completar `ceil(m/8)` bytes o encontrar EOF, consultando la
     * señal de cancelación entre ráfagas para garantizar abortos acotados.
     *
     * # Returns:
     * El checksum XXH3-64 de los bytes efectivamente leídos; un stream
     * truncado produce por tanto un checksum divergente del declarado.
     *
     * # Errors:
     * [`FilterError::Cancelled`] ante la señal de apagado;
     * [`FilterError::Io`] ante fallos del stream de origen.
     */
    pub fn fill_from_reader<R: Read>(
        &mut self,
        source: &mut R,
        signal: &CancellationSignal,
    ) -> Result<u64, FilterError> {
        let destination_prefix = self.active_prefix_as_bytes_mut();
        let total_length = destination_prefix.len();
        let mut filled_length = 0usize;

        while filled_length < total_length {
            signal.ensure_active()?;

            let burst_end = (filled_length + HYDRATION_CHUNK_LENGTH_BYTES).min(total_length);
            let bytes_read = source.read(&mut destination_prefix[filled_length..burst_end])?;
            if bytes_read == 0 {
                break;
            }
            filled_length += bytes_read;
        }

        Ok(xxh3_64(&destination_prefix[..filled_length]))
    }

    /**
     * Observa el almacén de palabras como un prefijo de bytes inmutable.
     *
     * # Safety:
     * 1. `AtomicU64` tiene exactamente la representación en memoria de `u64`,
     *    por lo que el puntero base es válido para `ceil(m/8)` bytes.
     * 2. El contrato del dueño exige quiescencia (cerrojo de escritor) durante
     *    las operaciones masivas, de modo que no hay escritores concurrentes
     *    mientras el prefijo se observa como bytes.
     */
    fn active_prefix_as_bytes(&self) -> &[u8] {
        // SAFETY: ver bloque de contrato arriba; longitud acotada por el
        // almacén de palabras (ceil(m/8) ≤ words * 8).
        unsafe {
            std::slice::from_raw_parts(
                self.word_strata.as_ptr().cast::<u8>(),
                self.active_byte_count(),
            )
        }
    }

    /**
     * Observa el almacén como bytes mutables para la hidratación.
     *
     * # Safety:
     * La recepción por `&mut self` garantiza acceso exclusivo: ningún otro
     * hilo puede observar ni mutar las palabras durante el llenado.
     */
    fn active_prefix_as_bytes_mut(&mut self) -> &mut [u8] {
        let byte_length = self.active_byte_count();
        // SAFETY: exclusividad garantizada por &mut self; misma aritmética
        // de longitud que la vista inmutable.
        unsafe {
            std::slice::from_raw_parts_mut(
                self.word_strata.as_mut_ptr().cast::<u8>(),
                byte_length,
            )
        }
    }
}

impl std::fmt::Debug for AtomicBitMatrix {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AtomicBitMatrix")
            .field("length_in_bits", &self.length_in_bits)
            .field("population", &self.population_count())
            .finish()
    }
}
