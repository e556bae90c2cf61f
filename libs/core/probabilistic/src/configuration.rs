// [libs/core/probabilistic/src/configuration.rs]
/*!
 * =================================================================
 * APARATO: FILTER CONFIGURATION FORGE (V2.4 - DETERMINISTIC SHAPE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: DERIVACIÓN DE PARÁMETROS (m, k) Y HUELLA DE FORMA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CANONICAL FORMULAS: m = ceil(−n·ln(p)/(ln 2)²) y k = round((m/n)·ln 2),
 *    ambos acotados a un mínimo de 1 para degradar con gracia.
 * 2. SHAPE FINGERPRINT: Huella XXH3-64 determinista sobre los campos
 *    (m, k, seed, shard_count) empacados en Little-Endian, utilizada para
 *    detectar blobs persistidos con una forma incompatible.
 * 3. SHARD SYMMETRY: Cada fragmento hereda la semilla y la tasa de error
 *    del agregado, con capacidad ceil(n/S) y nombre '<name>_s<i>'.
 * =================================================================
 */

use crate::errors::FilterError;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Longitud del material empacado que alimenta la huella de forma.
const FINGERPRINT_MATERIAL_LENGTH_BYTES: usize = 24;

/// Forma completa y validada de un filtro de membresía.
///
/// Se construye exclusivamente vía [`FilterConfiguration::derive`], que
/// valida el dominio de entrada y calcula los parámetros derivados.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    /// Identificador único del filtro dentro del catálogo.
    pub filter_name: String,
    /// Volumen nominal de elementos esperados (n).
    pub expected_items: u64,
    /// Tasa de falsos positivos objetivo (p), en el intervalo abierto (0, 1).
    pub error_rate: f64,
    /// Semilla de 64 bits inyectada en toda la dispersión XXH3.
    pub hash_seed: u64,
    /// Longitud derivada de la matriz en bits (m).
    pub size_in_bits: u64,
    /// Conteo derivado de funciones de dispersión (k).
    pub hash_count: u32,
    /// Particiones del filtro; siempre una potencia de dos (≥ 1).
    pub shard_count: u32,
}

impl FilterConfiguration {
    /**
     * Deriva una configuración completa a partir de los parámetros nominales.
     *
     * # Errors:
     * Retorna [`FilterError::InvalidConfiguration`] si `expected_items` es
     * cero, si `error_rate` cae fuera de (0, 1) o si `shard_count` no es una
     * potencia de dos.
     */
    pub fn derive(
        filter_name: impl Into<String>,
        expected_items: u64,
        error_rate: f64,
        hash_seed: u64,
        shard_count: u32,
    ) -> Result<Self, FilterError> {
        let filter_name = filter_name.into();

        if expected_items == 0 {
            return Err(FilterError::InvalidConfiguration(format!(
                "'{filter_name}': expected_items debe ser positivo"
            )));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(FilterError::InvalidConfiguration(format!(
                "'{filter_name}': error_rate {error_rate} fuera del intervalo (0, 1)"
            )));
        }
        if shard_count == 0 || !shard_count.is_power_of_two() {
            return Err(FilterError::InvalidConfiguration(format!(
                "'{filter_name}': shard_count {shard_count} debe ser potencia de dos (≥ 1)"
            )));
        }

        let (size_in_bits, hash_count) = derive_shape(expected_items, error_rate);

        Ok(Self {
            filter_name,
            expected_items,
            error_rate,
            hash_seed,
            size_in_bits,
            hash_count,
            shard_count,
        })
    }

    /// Longitud del payload persistido: `ceil(m / 8)` bytes.
    #[must_use]
    pub fn payload_length_bytes(&self) -> u64 {
        self.size_in_bits.div_ceil(8)
    }

    /**
     * Calcula la huella determinista de 64 bits sobre la forma del filtro.
     *
     * # Mathematical Proof (Shape Identity):
     * La huella cubre exactamente (m, k, seed, shard_count) empacados en
     * Little-Endian, por lo que dos procesos con la misma forma producen
     * el mismo valor en cualquier arquitectura y ejecución.
     */
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut packed_material = [0u8; FINGERPRINT_MATERIAL_LENGTH_BYTES];
        packed_material[0..8].copy_from_slice(&self.size_in_bits.to_le_bytes());
        packed_material[8..12].copy_from_slice(&self.hash_count.to_le_bytes());
        packed_material[12..20].copy_from_slice(&self.hash_seed.to_le_bytes());
        packed_material[20..24].copy_from_slice(&self.shard_count.to_le_bytes());
        xxh3_64(&packed_material)
    }

    /**
     * Deriva la configuración de un fragmento individual del agregado.
     *
     * Cada shard recibe capacidad `ceil(n / S)` a la misma tasa de error,
     * nombre `<name>_s<i>` y conteo de shards 1 (es un filtro residente).
     */
    pub fn shard_configuration(&self, shard_index: u32) -> Result<Self, FilterError> {
        let per_shard_capacity = self
            .expected_items
            .div_ceil(u64::from(self.shard_count))
            .max(1);

        Self::derive(
            format!("{}_s{}", self.filter_name, shard_index),
            per_shard_capacity,
            self.error_rate,
            self.hash_seed,
            1,
        )
    }
}

/**
 * Aplica las fórmulas canónicas de dimensionamiento de Bloom.
 *
 * Ambos resultados se acotan a un mínimo de 1 para que configuraciones
 * degeneradas (n minúsculo, p cercano a 1) sigan siendo operativas.
 */
fn derive_shape(expected_items: u64, error_rate: f64) -> (u64, u32) {
    let items = expected_items as f64;
    let ln2 = std::f64::consts::LN_2;

    let raw_bits = (-items * error_rate.ln()) / (ln2 * ln2);
    let size_in_bits = (raw_bits.ceil() as u64).max(1);

    let raw_hashes = (size_in_bits as f64 / items) * ln2;
    let hash_count = (raw_hashes.round() as u32).max(1);

    (size_in_bits, hash_count)
}
