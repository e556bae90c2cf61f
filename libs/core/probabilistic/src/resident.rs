// [libs/core/probabilistic/src/resident.rs]
/*!
 * =================================================================
 * APARATO: RESIDENT MEMBERSHIP FILTER (V4.6 - MEMBRANE GOLD)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: FILTRO DE BLOOM RESIDENTE CON PERSISTENCIA WBF1
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HOT-PATH SOVEREIGNTY: 'add' y 'contains' operan bajo el cerrojo de
 *    lector; las palabras atómicas de la matriz absorben la concurrencia
 *    de escritores sin exclusión mutua.
 * 2. SNAPSHOT DISCIPLINE: 'save' congela checksum + cabecera + payload en
 *    un buffer de memoria bajo el cerrojo de escritor y libera el cerrojo
 *    ANTES del I/O físico, manteniendo la membresía reactiva durante
 *    volcados de cientos de megabytes.
 * 3. ATOMIC SWAP: 'reload' hidrata una matriz NUEVA fuera de todo cerrojo
 *    y la intercambia bajo el cerrojo de escritor; la cancelación jamás
 *    deja el filtro a medio hidratar.
 * 4. SATURATION WATCH: El reporte de salud marca el filtro como no sano
 *    por encima del 55% de ocupación.
 * =================================================================
 */

use crate::bit_matrix::AtomicBitMatrix;
use crate::configuration::FilterConfiguration;
use crate::dispersion::{hash_item, ProbeSequence};
use crate::errors::FilterError;
use crate::header::{FilterBlobHeader, BLOB_HEADER_LENGTH_BYTES};
use crate::signal::CancellationSignal;
use crate::storage::BlobStorageDriver;
use chrono::{DateTime, TimeZone, Utc};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

/// Ocupación a partir de la cual se emite la advertencia de saturación.
const SATURATION_WARNING_RATIO: f64 = 0.5;
/// Ocupación a partir de la cual el filtro se reporta como no sano.
const SATURATION_UNHEALTHY_RATIO: f64 = 0.55;

/// Política de hidratación frente a blobs legados o incompatibles.
#[derive(Clone, Copy, Debug)]
pub struct HydrationPolicy {
    /// Si es `true`, cabecera/checksum/huella/tamaño inválidos son fatales.
    pub enable_integrity_check: bool,
    /// Si es `true`, una huella o tamaño incompatible re-inicializa la
    /// matriz a ceros en lugar de fallar la recarga.
    pub auto_reset_on_mismatch: bool,
}

impl Default for HydrationPolicy {
    fn default() -> Self {
        Self {
            enable_integrity_check: true,
            auto_reset_on_mismatch: false,
        }
    }
}

/// Instantánea de salud y saturación de un filtro.
#[derive(Clone, Debug)]
pub struct FilterHealthReport {
    /// Nombre del filtro auditado.
    pub filter_name: String,
    /// Longitud lógica de la matriz en bits.
    pub size_in_bits: u64,
    /// Bits encendidos en el momento de la instantánea.
    pub population: u64,
    /// Fracción de ocupación `population / size_in_bits`.
    pub fill_ratio: f64,
    /// `false` cuando la ocupación supera el umbral de saturación (0.55).
    pub is_healthy: bool,
}

/// Filtro de Bloom residente en memoria con persistencia opcional.
///
/// La disciplina de cerrojos separa los caminos calientes de los fríos:
/// - `io_gate` (Mutex): un único save/reload simultáneo.
/// - `bit_strata` (RwLock): lectores = add/contains/pop-count; escritor =
///   instantánea de save e intercambio de reload.
pub struct ResidentFilter {
    configuration: FilterConfiguration,
    bit_strata: RwLock<AtomicBitMatrix>,
    io_gate: Mutex<()>,
    dirty_flag: AtomicBool,
    disposed_flag: AtomicBool,
    last_crystallized_epoch_ms: AtomicI64,
    storage_driver: Option<Arc<dyn BlobStorageDriver>>,
    hydration_policy: HydrationPolicy,
}

impl ResidentFilter {
    /// Construye un filtro vacío con la forma indicada.
    #[must_use]
    pub fn new(
        configuration: FilterConfiguration,
        storage_driver: Option<Arc<dyn BlobStorageDriver>>,
        hydration_policy: HydrationPolicy,
    ) -> Self {
        let bit_matrix = AtomicBitMatrix::new(configuration.size_in_bits);
        debug!(
            "🧠 [FILTER_GENESIS]: '{}' synthesized ({} bits, k={}).",
            configuration.filter_name, configuration.size_in_bits, configuration.hash_count
        );

        Self {
            configuration,
            bit_strata: RwLock::new(bit_matrix),
            io_gate: Mutex::new(()),
            dirty_flag: AtomicBool::new(false),
            disposed_flag: AtomicBool::new(false),
            last_crystallized_epoch_ms: AtomicI64::new(0),
            storage_driver,
            hydration_policy,
        }
    }

    /// Forma activa del filtro.
    #[must_use]
    pub fn configuration(&self) -> &FilterConfiguration {
        &self.configuration
    }

    /// `true` si existen mutaciones no persistidas.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty_flag.load(Ordering::Acquire)
    }

    /// Marca temporal de la última cristalización exitosa, si la hubo.
    #[must_use]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        match self.last_crystallized_epoch_ms.load(Ordering::Acquire) {
            0 => None,
            epoch_ms => Utc.timestamp_millis_opt(epoch_ms).single(),
        }
    }

    /**
     * Inserta un ítem (forma de bytes) en la matriz de membresía.
     *
     * # Returns:
     * `true` si al menos un bit transicionó 0→1 (el filtro queda sucio).
     *
     * # Errors:
     * [`FilterError::Disposed`] sobre un filtro ya desechado.
     */
    #[inline]
    pub fn add_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        self.add_hashed(hash_item(payload, self.configuration.hash_seed))
    }

    /// Consulta de membresía de un ítem (forma de bytes).
    #[inline]
    pub fn contains_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        self.contains_hashed(hash_item(payload, self.configuration.hash_seed))
    }

    /**
     * Inserta un ítem textual.
     *
     * El texto se observa exactamente como su forma de bytes UTF-8, por lo
     * que `add_text(s)` y `add_bytes(s.as_bytes())` son equivalentes.
     */
    #[inline]
    pub fn add_text(&self, text: &str) -> Result<bool, FilterError> {
        self.add_bytes(text.as_bytes())
    }

    /// Consulta de membresía de un ítem textual (equivalencia UTF-8).
    #[inline]
    pub fn contains_text(&self, text: &str) -> Result<bool, FilterError> {
        self.contains_bytes(text.as_bytes())
    }

    /**
     * Inserta un ítem ya dispersado (hash de 64 bits pre-calculado).
     *
     * Camino compartido con el orquestador fragmentado, que dispersa una
     * única vez para rutear y sondear.
     *
     * # Logic:
     * Recorre las k sondas en pares (dos por iteración, cola escalar);
     * la secuencia de posiciones es bit-idéntica al recorrido escalar
     * canónico `h1 + i·h2`.
     */
    pub fn add_hashed(&self, item_hash: u64) -> Result<bool, FilterError> {
        self.ensure_not_disposed()?;

        let strata_guard = self.read_strata();
        let probe_sequence = ProbeSequence::from_item_hash(item_hash);
        let size_in_bits = self.configuration.size_in_bits;
        let hash_count = self.configuration.hash_count;

        let mut any_bit_flipped = false;
        let mut probe_index = 0u32;

        while probe_index + 1 < hash_count {
            let first_position = probe_sequence.position(probe_index, size_in_bits);
            let second_position = probe_sequence.position(probe_index + 1, size_in_bits);
            any_bit_flipped |= strata_guard.set(first_position);
            any_bit_flipped |= strata_guard.set(second_position);
            probe_index += 2;
        }
        if probe_index < hash_count {
            any_bit_flipped |= strata_guard.set(probe_sequence.position(probe_index, size_in_bits));
        }

        if any_bit_flipped {
            self.dirty_flag.store(true, Ordering::Release);
        }
        Ok(any_bit_flipped)
    }

    /// Consulta de membresía de un ítem ya dispersado.
    pub fn contains_hashed(&self, item_hash: u64) -> Result<bool, FilterError> {
        self.ensure_not_disposed()?;

        let strata_guard = self.read_strata();
        let probe_sequence = ProbeSequence::from_item_hash(item_hash);
        let size_in_bits = self.configuration.size_in_bits;
        let hash_count = self.configuration.hash_count;

        let mut probe_index = 0u32;
        while probe_index + 1 < hash_count {
            let first_present =
                strata_guard.get(probe_sequence.position(probe_index, size_in_bits));
            let second_present =
                strata_guard.get(probe_sequence.position(probe_index + 1, size_in_bits));
            if !(first_present && second_present) {
                return Ok(false);
            }
            probe_index += 2;
        }
        if probe_index < hash_count
            && !strata_guard.get(probe_sequence.position(probe_index, size_in_bits))
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Conteo de bits encendidos bajo el cerrojo de lector.
    pub fn population_count(&self) -> Result<u64, FilterError> {
        self.ensure_not_disposed()?;
        Ok(self.read_strata().population_count())
    }

    /**
     * Produce la instantánea de salud y saturación del filtro.
     *
     * Emite una advertencia de diagnóstico por encima del 50% de ocupación;
     * por encima del 55% la instantánea reporta `is_healthy = false`.
     */
    pub fn health_snapshot(&self) -> Result<FilterHealthReport, FilterError> {
        let population = self.population_count()?;
        let size_in_bits = self.configuration.size_in_bits;
        let fill_ratio = population as f64 / size_in_bits as f64;

        if fill_ratio > SATURATION_WARNING_RATIO {
            warn!(
                "⚠️  [SATURATION_WATCH]: '{}' at {:.1}% occupancy. False-positive rate degrading.",
                self.configuration.filter_name,
                fill_ratio * 100.0
            );
        }

        Ok(FilterHealthReport {
            filter_name: self.configuration.filter_name.clone(),
            size_in_bits,
            population,
            fill_ratio,
            is_healthy: fill_ratio <= SATURATION_UNHEALTHY_RATIO,
        })
    }

    /**
     * Cristaliza la matriz hacia el conductor de almacenamiento.
     *
     * # Logic:
     * 1. Sin mutaciones pendientes o sin conductor: no-op (`Ok(false)`).
     * 2. Adquiere el gate de I/O (un save/reload a la vez).
     * 3. Bajo el cerrojo de escritor: checksum, cabecera WBF1 y payload
     *    hacia un buffer de memoria; limpia la bandera de suciedad.
     * 4. Libera el cerrojo y transmite el buffer al conductor.
     *
     * Un fallo del conductor se propaga SIN restaurar la bandera de
     * suciedad: la instantánea en memoria es la verdad comprometida y la
     * política de reintento pertenece al llamador.
     *
     * # Returns:
     * `true` si se escribió un blob; `false` si la operación fue un no-op.
     */
    #[instrument(level = "debug", skip(self, signal), fields(filter = %self.configuration.filter_name))]
    pub fn save(&self, signal: &CancellationSignal) -> Result<bool, FilterError> {
        self.ensure_not_disposed()?;

        let Some(storage_driver) = self.storage_driver.as_ref() else {
            return Ok(false);
        };
        if !self.is_dirty() {
            return Ok(false);
        }

        let _io_guard = self.lock_io_gate();
        signal.ensure_active()?;

        // Re-verificación bajo el gate: otro save pudo habernos adelantado.
        if !self.is_dirty() {
            return Ok(false);
        }

        let snapshot_buffer = {
            let strata_guard = self.write_strata();
            let payload_checksum = strata_guard.compute_checksum();

            let blob_header = FilterBlobHeader {
                checksum: payload_checksum,
                size_in_bits: self.configuration.size_in_bits as i64,
                hash_count: self.configuration.hash_count as i32,
                fingerprint: self.configuration.fingerprint(),
            };

            let mut buffer =
                Vec::with_capacity(BLOB_HEADER_LENGTH_BYTES + strata_guard.active_byte_count());
            blob_header.encode_into(&mut buffer)?;
            strata_guard.write_active_prefix(&mut buffer)?;

            self.dirty_flag.store(false, Ordering::Release);
            buffer
        };

        storage_driver.save_blob(
            &self.configuration.filter_name,
            &self.configuration,
            &snapshot_buffer,
            signal,
        )?;

        self.last_crystallized_epoch_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
        info!(
            "💾 [FILTER_SYNC]: '{}' crystallized ({} bytes).",
            self.configuration.filter_name,
            snapshot_buffer.len()
        );
        Ok(true)
    }

    /**
     * Re-hidrata la matriz desde el conductor de almacenamiento.
     *
     * # Logic:
     * 1. Sin conductor o sin blob persistido: no-op (el filtro queda vacío).
     * 2. Decodifica la cabecera WBF1; con la verificación de integridad
     *    deshabilitada, una cabecera inválida degrada a lectura de payload
     *    crudo (formato legado).
     * 3. Verifica huella, tamaño y conteo de dispersión contra la
     *    configuración activa; con 'auto_reset_on_mismatch' la matriz se
     *    re-inicializa a ceros en lugar de fallar.
     * 4. Hidrata una matriz NUEVA fuera de los cerrojos, verifica checksum
     *    y la intercambia bajo el cerrojo de escritor.
     *
     * # Errors:
     * Fallos de integridad según la política; [`FilterError::Cancelled`]
     * aborta dejando la matriz previa intacta.
     */
    #[instrument(level = "debug", skip(self, signal), fields(filter = %self.configuration.filter_name))]
    pub fn reload(&self, signal: &CancellationSignal) -> Result<(), FilterError> {
        self.ensure_not_disposed()?;

        let Some(storage_driver) = self.storage_driver.as_ref() else {
            return Ok(());
        };

        let _io_guard = self.lock_io_gate();
        signal.ensure_active()?;

        let Some(mut blob_stream) =
            storage_driver.open_blob_stream(&self.configuration.filter_name, signal)?
        else {
            debug!(
                "🌫️  [HYDRATION_SKIP]: No persisted blob for '{}'.",
                self.configuration.filter_name
            );
            return Ok(());
        };

        let mut header_prefix = [0u8; BLOB_HEADER_LENGTH_BYTES];
        let prefix_length = read_until_full(&mut blob_stream, &mut header_prefix)?;
        let decoded_header = FilterBlobHeader::decode(&header_prefix[..prefix_length]);

        let mut fresh_matrix = AtomicBitMatrix::new(self.configuration.size_in_bits);

        match decoded_header {
            Some(blob_header) => {
                if let Some(mismatch) = self.shape_mismatch(&blob_header) {
                    if self.hydration_policy.auto_reset_on_mismatch {
                        warn!(
                            "🧹 [SHAPE_RESET]: '{}' blob shape diverged; matrix re-zeroed. ({})",
                            self.configuration.filter_name, mismatch
                        );
                        self.swap_in_matrix(fresh_matrix);
                        return Ok(());
                    }
                    return Err(mismatch);
                }

                let observed_checksum = fresh_matrix.fill_from_reader(&mut blob_stream, signal)?;
                if self.hydration_policy.enable_integrity_check
                    && observed_checksum != blob_header.checksum
                {
                    return Err(FilterError::ChecksumMismatch {
                        declared: blob_header.checksum,
                        computed: observed_checksum,
                    });
                }
            }
            None => {
                if self.hydration_policy.enable_integrity_check {
                    return Err(FilterError::HeaderRejected(
                        "magia/versión inválida o stream truncado",
                    ));
                }
                // Formato legado: el prefijo leído ES el inicio del payload.
                warn!(
                    "🐢 [LEGACY_HYDRATION]: '{}' carries no WBF1 header; raw payload assumed.",
                    self.configuration.filter_name
                );
                let mut chained_stream =
                    Cursor::new(header_prefix[..prefix_length].to_vec()).chain(blob_stream);
                fresh_matrix.fill_from_reader(&mut chained_stream, signal)?;
            }
        }

        self.swap_in_matrix(fresh_matrix);
        info!(
            "🚀 [FILTER_HYDRATED]: '{}' rebuilt from persisted strata.",
            self.configuration.filter_name
        );
        Ok(())
    }

    /// Sella el filtro; toda operación posterior falla con `Disposed`.
    pub fn dispose(&self) {
        if !self.disposed_flag.swap(true, Ordering::AcqRel) {
            debug!(
                "🔚 [FILTER_DISPOSED]: '{}' sealed.",
                self.configuration.filter_name
            );
        }
    }

    // --- DISCIPLINA INTERNA DE CERROJOS Y VERIFICACIONES ---

    fn ensure_not_disposed(&self) -> Result<(), FilterError> {
        if self.disposed_flag.load(Ordering::Acquire) {
            return Err(FilterError::Disposed);
        }
        Ok(())
    }

    /// Compara la forma declarada por la cabecera contra la configuración.
    fn shape_mismatch(&self, blob_header: &FilterBlobHeader) -> Option<FilterError> {
        let expected_fingerprint = self.configuration.fingerprint();
        if blob_header.fingerprint != expected_fingerprint {
            return Some(FilterError::FingerprintMismatch {
                expected: expected_fingerprint,
                found: blob_header.fingerprint,
            });
        }
        if blob_header.size_in_bits != self.configuration.size_in_bits as i64 {
            return Some(FilterError::SizeMismatch {
                expected: self.configuration.size_in_bits as i64,
                found: blob_header.size_in_bits,
            });
        }
        if blob_header.hash_count != self.configuration.hash_count as i32 {
            return Some(FilterError::HashCountMismatch {
                expected: self.configuration.hash_count as i32,
                found: blob_header.hash_count,
            });
        }
        None
    }

    /// Intercambio atómico de la matriz bajo el cerrojo de escritor.
    fn swap_in_matrix(&self, fresh_matrix: AtomicBitMatrix) {
        let mut strata_guard = self.write_strata();
        *strata_guard = fresh_matrix;
        drop(strata_guard);
        self.dirty_flag.store(false, Ordering::Release);
    }

    fn read_strata(&self) -> RwLockReadGuard<'_, AtomicBitMatrix> {
        self.bit_strata.read().unwrap_or_else(|poisoned| {
            warn!(
                "⚠️  [LOCK_POISONED]: '{}' reader recovered from panic residue.",
                self.configuration.filter_name
            );
            poisoned.into_inner()
        })
    }

    fn write_strata(&self) -> RwLockWriteGuard<'_, AtomicBitMatrix> {
        self.bit_strata.write().unwrap_or_else(|poisoned| {
            warn!(
                "⚠️  [LOCK_POISONED]: '{}' writer recovered from panic residue.",
                self.configuration.filter_name
            );
            poisoned.into_inner()
        })
    }

    fn lock_io_gate(&self) -> MutexGuard<'_, ()> {
        self.io_gate.lock().unwrap_or_else(|poisoned| {
            warn!(
                "⚠️  [LOCK_POISONED]: '{}' I/O gate recovered from panic residue.",
                self.configuration.filter_name
            );
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for ResidentFilter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResidentFilter")
            .field("filter_name", &self.configuration.filter_name)
            .field("size_in_bits", &self.configuration.size_in_bits)
            .field("hash_count", &self.configuration.hash_count)
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// Lee hasta llenar `buffer` o encontrar EOF; retorna los bytes leídos.
fn read_until_full<R: Read>(source: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled_length = 0usize;
    while filled_length < buffer.len() {
        let bytes_read = source.read(&mut buffer[filled_length..])?;
        if bytes_read == 0 {
            break;
        }
        filled_length += bytes_read;
    }
    Ok(filled_length)
}
