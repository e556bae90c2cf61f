// [libs/core/chronoflake/src/global.rs]
/*!
 * =================================================================
 * APARATO: PROCESS-WIDE FORGE SINGLETON (V1.4 - HOT RECONFIGURE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: FORJA POR DEFECTO DEL PROCESO CON RECAMBIO ATÓMICO
 *
 * La reconfiguración construye una forja nueva y la intercambia bajo el
 * cerrojo de escritor; las emisiones en vuelo observan la forja previa o
 * la nueva, jamás un estado parcialmente actualizado.
 * =================================================================
 */

use crate::errors::ChronoflakeError;
use crate::generator::ChronoflakeGenerator;
use crate::options::ChronoflakeOptions;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Forja soberana del proceso, inicializada con las opciones por defecto.
static PROCESS_FORGE: Lazy<RwLock<Arc<ChronoflakeGenerator>>> = Lazy::new(|| {
    let default_forge = ChronoflakeGenerator::new(ChronoflakeOptions::default())
        .unwrap_or_else(|_| unreachable!("las opciones por defecto son estáticamente válidas"));
    RwLock::new(Arc::new(default_forge))
});

/// Emite el siguiente identificador desde la forja del proceso.
#[must_use]
pub fn next_process_id() -> i64 {
    process_generator().next_id()
}

/// Obtiene una referencia compartida a la forja vigente del proceso.
#[must_use]
pub fn process_generator() -> Arc<ChronoflakeGenerator> {
    PROCESS_FORGE
        .read()
        .unwrap_or_else(|poisoned| {
            warn!("⚠️  [LOCK_POISONED]: Process forge reader recovered.");
            poisoned.into_inner()
        })
        .clone()
}

/**
 * Reemplaza atómicamente la forja del proceso.
 *
 * Las emisiones concurrentes observan la forja previa o la nueva; la
 * monotonía por generador se preserva dentro de cada una.
 *
 * # Errors:
 * Propaga los fallos de validación de [`ChronoflakeGenerator::new`]; ante
 * opciones inválidas la forja vigente permanece intacta.
 */
pub fn reconfigure_process_generator(
    options: ChronoflakeOptions,
) -> Result<(), ChronoflakeError> {
    let replacement_forge = Arc::new(ChronoflakeGenerator::new(options)?);

    let mut forge_slot = PROCESS_FORGE.write().unwrap_or_else(|poisoned| {
        warn!("⚠️  [LOCK_POISONED]: Process forge writer recovered.");
        poisoned.into_inner()
    });
    *forge_slot = replacement_forge;

    info!("❄️  [FORGE_RECONFIGURED]: Process-wide generator replaced.");
    Ok(())
}
