// [libs/core/probabilistic/src/sharded.rs]
/*!
 * =================================================================
 * APARATO: SHARDED MEMBERSHIP ORCHESTRATOR (V4.3 - MASK ROUTED)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: COORDINACIÓN DE FRAGMENTOS PROBABILÍSTICOS PARALELOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MASK ROUTING: El fragmento destino es 'hash & (S−1)'; al ser S una
 *    potencia de dos, la máscara equivale al módulo con coste O(1).
 * 2. SINGLE DISPERSION: El ítem se dispersa UNA vez; el mismo hash de 64
 *    bits rutea el fragmento y alimenta las k sondas internas.
 * 3. STRIPED I/O: Cada fragmento posee su propio gate de I/O, formando el
 *    conjunto de cerrojos por franja: saves del mismo fragmento se
 *    serializan, fragmentos distintos cristalizan en paralelo vía Rayon.
 * 4. CAPACITY SPLIT: Cada fragmento se dimensiona para ceil(n/S) ítems a
 *    la misma tasa de error; un ítem aterriza en exactamente un fragmento,
 *    preservando la tasa de falsos positivos del agregado.
 * =================================================================
 */
use crate::configuration::FilterConfiguration;
use crate::dispersion::hash_item;
use crate::errors::FilterError;
use crate::resident::{FilterHealthReport, HydrationPolicy, ResidentFilter};
use crate::signal::CancellationSignal;
use crate::storage::BlobStorageDriver;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Orquestador de alta densidad para matrices de membresía fragmentadas.
pub struct ShardedFilter {
    aggregate_configuration: FilterConfiguration,
    shard_routing_mask: u64,
    shard_strata: Vec<ResidentFilter>,
}

impl ShardedFilter {
    /**
     * Construye la matriz fragmentada a partir de la configuración agregada.
     *
     * # Errors:
     * [`FilterError::InvalidConfiguration`] si el conteo de fragmentos de la
     * configuración no es una potencia de dos mayor que cero.
     */
    pub fn new(
        aggregate_configuration: FilterConfiguration,
        storage_driver: Option<Arc<dyn BlobStorageDriver>>,
        hydration_policy: HydrationPolicy,
    ) -> Result<Self, FilterError> {
        let shard_count = aggregate_configuration.shard_count;
        if shard_count == 0 || !shard_count.is_power_of_two() {
            return Err(FilterError::InvalidConfiguration(format!(
                "'{}': shard_count {} debe ser potencia de dos",
                aggregate_configuration.filter_name, shard_count
            )));
        }

        debug!(
            "⚙️  [SHARDED_GENESIS]: Partitioning '{}' into {} shards.",
            aggregate_configuration.filter_name, shard_count
        );

        let mut shard_strata = Vec::with_capacity(shard_count as usize);
        for shard_index in 0..shard_count {
            let shard_configuration = aggregate_configuration.shard_configuration(shard_index)?;
            shard_strata.push(ResidentFilter::new(
                shard_configuration,
                storage_driver.clone(),
                hydration_policy,
            ));
        }

        Ok(Self {
            shard_routing_mask: u64::from(shard_count - 1),
            aggregate_configuration,
            shard_strata,
        })
    }

    /// Configuración agregada (la forma del filtro completo).
    #[must_use]
    pub fn configuration(&self) -> &FilterConfiguration {
        &self.aggregate_configuration
    }

    /// Conteo de fragmentos activos.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_strata.len()
    }

    /// Calcula el índice del fragmento destino de forma determinista.
    #[inline]
    fn route(&self, item_hash: u64) -> usize {
        (item_hash & self.shard_routing_mask) as usize
    }

    /// Inserta un ítem (forma de bytes) en su fragmento determinista.
    #[inline]
    pub fn add_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        let item_hash = hash_item(payload, self.aggregate_configuration.hash_seed);
        self.shard_strata[self.route(item_hash)].add_hashed(item_hash)
    }

    /// Consulta de membresía de un ítem (forma de bytes).
    #[inline]
    pub fn contains_bytes(&self, payload: &[u8]) -> Result<bool, FilterError> {
        let item_hash = hash_item(payload, self.aggregate_configuration.hash_seed);
        self.shard_strata[self.route(item_hash)].contains_hashed(item_hash)
    }

    /// Inserta un ítem textual; equivalente exacto a su forma de bytes UTF-8.
    #[inline]
    pub fn add_text(&self, text: &str) -> Result<bool, FilterError> {
        self.add_bytes(text.as_bytes())
    }

    /// Consulta de membresía de un ítem textual (equivalencia UTF-8).
    #[inline]
    pub fn contains_text(&self, text: &str) -> Result<bool, FilterError> {
        self.contains_bytes(text.as_bytes())
    }

    /// Suma de pop-counts sobre todos los fragmentos.
    pub fn population_count(&self) -> Result<u64, FilterError> {
        self.shard_strata
            .iter()
            .map(ResidentFilter::population_count)
            .sum()
    }

    /// El agregado está sucio si y solo si algún fragmento lo está.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shard_strata.iter().any(ResidentFilter::is_dirty)
    }

    /**
     * Cristaliza en paralelo los fragmentos sucios.
     *
     * Cada fragmento persiste su propio blob `<name>_s<i>` bajo su gate de
     * I/O; los fragmentos limpios son no-ops.
     *
     * # Returns:
     * Conteo de fragmentos que efectivamente escribieron un blob.
     */
    #[instrument(level = "debug", skip(self, signal), fields(filter = %self.aggregate_configuration.filter_name))]
    pub fn save(&self, signal: &CancellationSignal) -> Result<usize, FilterError> {
        let crystallized_flags: Vec<bool> = self
            .shard_strata
            .par_iter()
            .map(|shard_filter| shard_filter.save(signal))
            .collect::<Result<_, _>>()?;

        let crystallized_count = crystallized_flags.into_iter().filter(|saved| *saved).count();
        if crystallized_count > 0 {
            info!(
                "💾 [SHARDED_SYNC]: '{}' crystallized {} dirty shard(s).",
                self.aggregate_configuration.filter_name, crystallized_count
            );
        }
        Ok(crystallized_count)
    }

    /**
     * Re-hidrata todos los fragmentos en paralelo desde el almacenamiento.
     */
    #[instrument(level = "debug", skip(self, signal), fields(filter = %self.aggregate_configuration.filter_name))]
    pub fn reload(&self, signal: &CancellationSignal) -> Result<(), FilterError> {
        info!(
            "🌊 [SHARDED_HYDRATION]: Rebuilding {} shard(s) of '{}'...",
            self.shard_strata.len(),
            self.aggregate_configuration.filter_name
        );
        self.shard_strata
            .par_iter()
            .try_for_each(|shard_filter| shard_filter.reload(signal))
    }

    /// Instantánea agregada de salud (población y ocupación globales).
    pub fn health_snapshot(&self) -> Result<FilterHealthReport, FilterError> {
        let mut aggregate_population = 0u64;
        let mut aggregate_bits = 0u64;
        let mut all_healthy = true;

        for shard_filter in &self.shard_strata {
            let shard_report = shard_filter.health_snapshot()?;
            aggregate_population += shard_report.population;
            aggregate_bits += shard_report.size_in_bits;
            all_healthy &= shard_report.is_healthy;
        }

        let fill_ratio = if aggregate_bits == 0 {
            0.0
        } else {
            aggregate_population as f64 / aggregate_bits as f64
        };

        Ok(FilterHealthReport {
            filter_name: self.aggregate_configuration.filter_name.clone(),
            size_in_bits: aggregate_bits,
            population: aggregate_population,
            fill_ratio,
            is_healthy: all_healthy,
        })
    }

    /// Sella todos los fragmentos; toda operación posterior falla.
    pub fn dispose(&self) {
        for shard_filter in &self.shard_strata {
            shard_filter.dispose();
        }
    }
}

impl std::fmt::Debug for ShardedFilter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ShardedFilter")
            .field("filter_name", &self.aggregate_configuration.filter_name)
            .field("shard_count", &self.shard_strata.len())
            .finish()
    }
}
