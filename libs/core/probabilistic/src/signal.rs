// [libs/core/probabilistic/src/signal.rs]
/*!
 * =================================================================
 * APARATO: COOPERATIVE CANCELLATION SIGNAL (V1.3 - SWARM READY)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: PROPAGACIÓN DE LA ORDEN DE APAGADO ENTRE ESTRATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOUNDED ABORT: Los bucles de I/O consultan la señal entre ráfagas,
 *    garantizando un aborto acotado tras la orden de apagado.
 * 2. ZERO POISON: La cancelación jamás deja un filtro a medio hidratar;
 *    el portador descarta el estado parcial y conserva la matriz previa.
 * 3. CLONE SEMANTICS: Clonar la señal comparte la misma bandera atómica,
 *    permitiendo enlazarla desde el proveedor hacia cada sembrador.
 * =================================================================
 */

use crate::errors::FilterError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Señal cooperativa de cancelación compartida entre hilos y tareas.
///
/// Internamente es una bandera atómica bajo `Arc`: clonar la señal produce
/// una vista enlazada sobre el mismo estado de apagado.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    shutdown_flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Crea una señal nueva en estado operativo (no cancelada).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emite la orden de apagado para todos los portadores enlazados.
    pub fn cancel(&self) {
        self.shutdown_flag.store(true, Ordering::Release);
    }

    /// Consulta no destructiva del estado de la señal.
    #[must_use]
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.shutdown_flag.load(Ordering::Acquire)
    }

    /// Punto de corte cooperativo para bucles de I/O.
    ///
    /// # Errors:
    /// Retorna [`FilterError::Cancelled`] si la orden de apagado ya fue emitida.
    #[inline]
    pub fn ensure_active(&self) -> Result<(), FilterError> {
        if self.is_cancelled() {
            return Err(FilterError::Cancelled);
        }
        Ok(())
    }
}
