// [libs/core/probabilistic/src/lib.rs]

#![deny(missing_docs)]
// Autorizamos el uso de código inseguro a nivel de crate raíz para permitir
// que la matriz de bits observe sus palabras atómicas como bytes (aliasing).
#![allow(unsafe_code)]

//! # APARATO: PROBABILISTIC STRATUM ROOT (V3.2 - MEMBRANE GOLD)
//! CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
//! RESPONSABILIDAD: ORQUESTACIÓN Y EXPOSICIÓN DEL MOTOR DE MEMBRESÍA
//!
//! ## Visión Holística 2026
//! Actúa como la autoridad suprema del servicio de membresía probabilística.
//! Esta versión sella la integración entre la matriz de bits atómica, el
//! códec binario WBF1 y el orquestador fragmentado (Sharding), garantizando
//! que los estratos superiores operen sobre una base determinista, durable
//! y de ultra-bajo consumo de memoria.
//!
//! ## Características de Élite
//! 1. **Atomic Membrane:** Inserciones 0→1 sin pérdida bajo contención multihilo.
//! 2. **Binary Parity:** Formato WBF1 con checksum XXH3 y huella de configuración.
//! 3. **Deterministic Sharding:** Ruteo por máscara de potencia de dos.
//! 4. **Poison Shielding:** Resiliencia de cerrojos (locks) ante pánicos de hilo.

/// Definiciones de errores semánticos para el triaje programático de fallos.
pub mod errors;

/// Señal cooperativa de cancelación compartida entre estratos de I/O.
pub mod signal;

/// Derivación de parámetros (m, k) y huella determinista de configuración.
pub mod configuration;

/// Matriz de bits atómica con checksum y streaming sin copias.
pub mod bit_matrix;

/// Códec de la cabecera binaria WBF1 (36 bytes, Little-Endian).
pub mod header;

/// Dispersión Kirsch–Mitzenmacher sobre XXH3-64 con semilla.
pub mod dispersion;

/// Filtro residente en memoria con persistencia y re-hidratación atómica.
pub mod resident;

/// Orquestador de fragmentación determinista para cargas masivas.
pub mod sharded;

/// Fachada de variantes etiquetadas (residente / fragmentado).
pub mod facade;

/// Contrato del conductor de almacenamiento de blobs opacos.
pub mod storage;

/**
 * RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS)
 *
 * Centralizamos los tipos fundamentales para eliminar el ruido de importación
 * en los estratos superiores (Infra-Storage e Infra-Lifecycle).
 */

pub use crate::bit_matrix::AtomicBitMatrix;
pub use crate::configuration::FilterConfiguration;
pub use crate::errors::FilterError;
pub use crate::facade::FilterEngine;
pub use crate::header::FilterBlobHeader;
pub use crate::resident::{FilterHealthReport, HydrationPolicy, ResidentFilter};
pub use crate::sharded::ShardedFilter;
pub use crate::signal::CancellationSignal;
pub use crate::storage::BlobStorageDriver;

/**
 * PRELUDIO PROBABILÍSTICO
 *
 * Colección de tipos de alta frecuencia para inyección directa en motores.
 */
pub mod prelude {
    pub use crate::configuration::FilterConfiguration;
    pub use crate::errors::FilterError;
    pub use crate::facade::FilterEngine;
    pub use crate::resident::{HydrationPolicy, ResidentFilter};
    pub use crate::sharded::ShardedFilter;
    pub use crate::signal::CancellationSignal;
    pub use crate::storage::BlobStorageDriver;
}
