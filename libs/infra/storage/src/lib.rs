// [libs/infra/storage/src/lib.rs]

#![deny(missing_docs)]

//! # APARATO: STORAGE STRATUM ROOT (V2.0 - VAULT SOVEREIGN)
//! CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L2)
//! RESPONSABILIDAD: PERSISTENCIA FÍSICA DE BLOBS DE FILTRO
//!
//! Implementación concreta del contrato
//! [`centinela_core_probabilistic::storage::BlobStorageDriver`] sobre un
//! directorio del sistema de archivos, con compresión gzip opcional,
//! commit atómico (temporal + renombre) y cerrojos cooperativos por nombre.

/// Bóveda de blobs sobre sistema de archivos.
pub mod vault;

pub use crate::vault::{FileSystemBlobVault, VaultSettings};
