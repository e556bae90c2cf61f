// [libs/core/chronoflake/src/clock.rs]
/*!
 * =================================================================
 * APARATO: TIME AUTHORITY (V2.2 - MONOTONIC ANCHOR)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: FUENTES DE TIEMPO DE LA FORJA DE IDENTIFICADORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ANCHOR PROTOCOL: Sobre el reloj de pared del sistema, la forja
 *    establece un ancla (muestra de pared + muestra monotónica) una única
 *    vez; el "ahora" se deriva sumando el avance monotónico al ancla,
 *    aislando la generación de retrocesos NTP.
 * 2. INJECTION SEAM: El contrato 'ClockSource' permite inyectar relojes
 *    sintéticos en el Proving Grounds (congelados, con retrocesos).
 * =================================================================
 */

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Contrato de una fuente de tiempo en milisegundos Unix.
pub trait ClockSource: Send + Sync {
    /// Instante actual en milisegundos desde la época Unix.
    fn now_unix_ms(&self) -> i64;
}

/// Reloj de pared del sistema (UTC).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemWallClock;

impl ClockSource for SystemWallClock {
    #[inline]
    fn now_unix_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Autoridad de tiempo interna de un generador.
///
/// La variante anclada es la forma operativa sobre el reloj del sistema;
/// la inyectada delega en el reloj sintético del llamador.
pub(crate) enum TimeAuthority {
    /// Ancla monotónica: pared muestreada una vez + avance de `Instant`.
    MonotonicAnchor {
        /// Milisegundos Unix del instante de anclaje.
        anchor_wall_epoch_ms: i64,
        /// Muestra monotónica tomada en el mismo instante.
        anchor_instant: Instant,
    },
    /// Reloj inyectado por el llamador.
    Injected(Arc<dyn ClockSource>),
}

impl TimeAuthority {
    /// Establece la autoridad anclada sobre el reloj de pared del sistema.
    pub(crate) fn anchored_now() -> Self {
        Self::MonotonicAnchor {
            anchor_wall_epoch_ms: SystemWallClock.now_unix_ms(),
            anchor_instant: Instant::now(),
        }
    }

    /// Instante actual según la autoridad configurada.
    #[inline]
    pub(crate) fn now_unix_ms(&self) -> i64 {
        match self {
            Self::MonotonicAnchor {
                anchor_wall_epoch_ms,
                anchor_instant,
            } => anchor_wall_epoch_ms + anchor_instant.elapsed().as_millis() as i64,
            Self::Injected(clock_source) => clock_source.now_unix_ms(),
        }
    }
}
