// [libs/core/probabilistic/src/facade.rs]
/*!
 * =================================================================
 * APARATO: FILTER ENGINE FACADE (V2.1 - TAGGED VARIANTS)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: CAPACIDAD UNIFICADA RESIDENTE / FRAGMENTADA
 *
 * Los dos motores comparten el mismo conjunto de capacidades
 * {add, contains, pop_count, save, reload, is_dirty, configuration};
 * la fachada los expone como variantes etiquetadas para que el estrato
 * de ciclo de vida opere sin conocer la forma física subyacente.
 * =================================================================
 */

use crate::configuration::FilterConfiguration;
use crate::errors::FilterError;
use crate::resident::{FilterHealthReport, HydrationPolicy, ResidentFilter};
use crate::sharded::ShardedFilter;
use crate::signal::CancellationSignal;
use crate::storage::BlobStorageDriver;
use std::sync::Arc;

/// Motor de membresía unificado: residente único o matriz fragmentada.
#[derive(Debug)]
pub enum FilterEngine {
    /// Filtro único residente en memoria.
    Resident(ResidentFilter),
    /// Matriz fragmentada con ruteo determinista.
    Sharded(ShardedFilter),
}

impl FilterEngine {
    /**
     * Aprovisiona el motor adecuado según la forma configurada.
     *
     * `shard_count == 1` produce un filtro residente; cualquier potencia de
     * dos mayor produce la matriz fragmentada.
     */
    pub fn provision(
        configuration: FilterConfiguration,
        storage_driver: Option<Arc<dyn BlobStorageDriver>>,
        hydration_policy: HydrationPolicy,
    ) -> Result<Self, FilterError> {
        if configuration.shard_count <= 1 {
            Ok(Self::Resident(ResidentFilter::new(
                configuration,
                storage_driver,
                hydration_policy,
            )))
        } else {
            Ok(Self::Sharded(ShardedFilter::new(
                configuration,
                storage_driver,
                hydration_policy,
            )?))
        }
    }

    /// Forma activa del motor (la configuración agregada).
    #[must_use]
    pub fn configuration(&self) -> &FilterConfiguration {
        match self {
            Self::Resident(filter) => filter.configuration(),
            Self::Sharded(filter) => filter.configuration(),
        }
    }

    /// Inserta un ítem (forma de bytes); `true` si algún bit transicionó.
    pub fn add_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        match self {
            Self::Resident(filter) => filter.add_bytes(payload),
            Self::Sharded(filter) => filter.add_bytes(payload),
        }
    }

    /// Consulta de membresía (forma de bytes).
    pub fn contains_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        match self {
            Self::Resident(filter) => filter.contains_bytes(payload),
            Self::Sharded(filter) => filter.contains_bytes(payload),
        }
    }

    /// Inserta un ítem textual; equivalente exacto a su forma UTF-8.
    pub fn add_text(&self, text: &str) -> Result<bool, FilterError> {
        self.add_bytes(text.as_bytes())
    }

    /// Consulta de membresía textual (equivalencia UTF-8).
    pub fn contains_text(&self, text: &str) -> Result<bool, FilterError> {
        self.contains_bytes(text.as_bytes())
    }

    /// Conteo global de bits encendidos.
    pub fn population_count(&self) -> Result<u64, FilterError> {
        match self {
            Self::Resident(filter) => filter.population_count(),
            Self::Sharded(filter) => filter.population_count(),
        }
    }

    /// `true` si existen mutaciones no persistidas en algún estrato.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match self {
            Self::Resident(filter) => filter.is_dirty(),
            Self::Sharded(filter) => filter.is_dirty(),
        }
    }

    /// Cristaliza los estratos sucios; retorna los blobs escritos.
    pub fn save(&self, signal: &CancellationSignal) -> Result<usize, FilterError> {
        match self {
            Self::Resident(filter) => Ok(usize::from(filter.save(signal)?)),
            Self::Sharded(filter) => filter.save(signal),
        }
    }

    /// Re-hidrata todos los estratos desde el almacenamiento.
    pub fn reload(&self, signal: &CancellationSignal) -> Result<(), FilterError> {
        match self {
            Self::Resident(filter) => filter.reload(signal),
            Self::Sharded(filter) => filter.reload(signal),
        }
    }

    /// Instantánea de salud y saturación del motor completo.
    pub fn health_snapshot(&self) -> Result<FilterHealthReport, FilterError> {
        match self {
            Self::Resident(filter) => filter.health_snapshot(),
            Self::Sharded(filter) => filter.health_snapshot(),
        }
    }

    /// Sella el motor; toda operación posterior falla con `Disposed`.
    pub fn dispose(&self) {
        match self {
            Self::Resident(filter) => filter.dispose(),
            Self::Sharded(filter) => filter.dispose(),
        }
    }
}
