// [libs/core/probabilistic/src/dispersion.rs]
/*!
 * =================================================================
 * APARATO: KIRSCH-MITZENMACHER DISPERSION ENGINE (V2.0 - FAST RANGE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: DERIVACIÓN DE LAS k POSICIONES DESDE UN HASH ÚNICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE-HASH ECONOMY: Un único XXH3-64 con semilla alimenta las k
 *    sondas vía h1 + i·h2, erradicando k invocaciones de hash por ítem.
 * 2. FAST RANGE: La reducción al rango [0, m) usa la palabra alta del
 *    producto de 128 bits en lugar del módulo, sin sesgo observable
 *    para m ≪ 2^64.
 * 3. LANE PARITY: El recorrido pareado (dos sondas por iteración) es
 *    bit-idéntico a la secuencia escalar canónica; ambos caminos se
 *    certifican en el Proving Grounds.
 *
 * # Mathematical Proof (Double Hashing):
 * Kirsch & Mitzenmacher demuestran que g_i(x) = h1(x) + i·h2(x) preserva
 * la tasa asintótica de falsos positivos del filtro con k hashes
 * independientes; h2 se obtiene rotando h1 32 bits (intercambio de
 * mitades), suficiente para decorrelacionar las sondas.
 * =================================================================
 */

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Calcula el hash de dispersión de 64 bits de un ítem bajo la semilla global.
#[must_use]
#[inline]
pub fn hash_item(payload: &[u8], hash_seed: u64) -> u64 {
    xxh3_64_with_seed(payload, hash_seed)
}

/// Par de hashes base que genera la secuencia completa de sondas de un ítem.
#[derive(Clone, Copy, Debug)]
pub struct ProbeSequence {
    dispersion_h1: u64,
    dispersion_h2: u64,
}

impl ProbeSequence {
    /// Deriva el par (h1, h2) desde el hash único del ítem.
    ///
    /// `h2` es `h1` con sus mitades de 32 bits intercambiadas.
    #[must_use]
    #[inline]
    pub fn from_item_hash(item_hash: u64) -> Self {
        Self {
            dispersion_h1: item_hash,
            dispersion_h2: item_hash.rotate_left(32),
        }
    }

    /**
     * Posición de la sonda `probe_index` dentro de una matriz de `m` bits.
     *
     * # Mathematical Proof (Fast Range):
     * `((h as u128 * m as u128) >> 64)` mapea uniformemente el espacio de
     * 64 bits sobre [0, m) tomando la palabra alta del producto, con un
     * sesgo máximo de m/2^64 — despreciable frente a la tasa de error.
     */
    #[must_use]
    #[inline]
    pub fn position(&self, probe_index: u32, size_in_bits: u64) -> u64 {
        let combined_hash = self
            .dispersion_h1
            .wrapping_add(u64::from(probe_index).wrapping_mul(self.dispersion_h2));
        ((u128::from(combined_hash) * u128::from(size_in_bits)) >> 64) as u64
    }
}
