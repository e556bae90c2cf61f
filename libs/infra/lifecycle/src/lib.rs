// [libs/infra/lifecycle/src/lib.rs]

#![deny(missing_docs)]

//! # APARATO: LIFECYCLE STRATUM ROOT (V3.1 - SINGLE FLIGHT)
//! CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L3)
//! RESPONSABILIDAD: CICLO DE VIDA COMPLETO DE LOS FILTROS DE MEMBRESÍA
//!
//! ## Visión Holística 2026
//! El proveedor materializa filtros bajo demanda con ejecución de fábrica
//! de vuelo único por nombre, los hidrata desde la bóveda, recupera blobs
//! corruptos (purga + re-sembrado automático), cristaliza los sucios en
//! lote y orquesta el apagado cooperativo de todo el estrato.

/// Superficie de opciones reconocidas del motor.
pub mod options;

/// Contrato de sembradores y adaptadores de clausura.
pub mod seeding;

/// Proveedor/registro de filtros con hidratación perezosa.
pub mod provider;

pub use crate::options::{
    EngineOptions, FilterProvisioning, LifecycleOptions, PerformanceOptions, StorageOptions,
};
pub use crate::provider::FilterProvider;
pub use crate::seeding::{seeder_fn, FilterSeeder};
