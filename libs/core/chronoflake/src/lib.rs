// [libs/core/chronoflake/src/lib.rs]

#![deny(missing_docs)]

//! # APARATO: CHRONOFLAKE STRATUM ROOT (V3.0 - LOCK-FREE FORGE)
//! CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
//! RESPONSABILIDAD: FORJA DE IDENTIFICADORES DISTRIBUIDOS DE 64 BITS
//!
//! ## Visión Holística 2026
//! Produce identificadores ordenados por tiempo empacando
//! `(delta_de_timestamp | nodo | secuencia)` en 63 bits útiles. El estado
//! caliente vive en una única palabra atómica bajo CAS, aislada en su
//! propia línea de caché; el ancla monotónica blinda la generación contra
//! retrocesos del reloj de pared.
//!
//! ## Características de Élite
//! 1. **Lock-Free Core:** Bucle CAS con insinuación de spin; jamás suspende.
//! 2. **Monotonic Anchor:** Tiempo virtual no decreciente acotado por deriva.
//! 3. **Striped Dispatch:** Franjas con sub-rangos de nodo disjuntos para
//!    diluir la contención CAS en cargas multinúcleo.
//! 4. **Process Singleton:** Generador por defecto reconfigurable en caliente.

/// Catálogo de fallos de configuración de la forja.
pub mod errors;

/// Fuentes de tiempo: reloj de pared, ancla monotónica e inyección.
pub mod clock;

/// Opciones validables de la forja (época, nodo, bits de secuencia, deriva).
pub mod options;

/// Generador individual con estado empacado bajo CAS.
pub mod generator;

/// Envoltorio por franjas con particionado del espacio de nodo.
pub mod striped;

/// Generador soberano a nivel de proceso con reconfiguración atómica.
pub mod global;

pub use crate::clock::{ClockSource, SystemWallClock};
pub use crate::errors::ChronoflakeError;
pub use crate::generator::{ChronoflakeGenerator, DecomposedChronoflake};
pub use crate::global::{next_process_id, process_generator, reconfigure_process_generator};
pub use crate::options::ChronoflakeOptions;
pub use crate::striped::StripedChronoflake;
