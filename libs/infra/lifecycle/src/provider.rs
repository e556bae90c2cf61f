// [libs/infra/lifecycle/src/provider.rs]
/*!
 * =================================================================
 * APARATO: FILTER LIFECYCLE PROVIDER (V4.4 - SINGLE FLIGHT)
 * CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO, HIDRATACIÓN Y APAGADO DE LOS FILTROS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE FLIGHT: Cada nombre posee una celda asíncrona de ejecución
 *    única; el primer llamador materializa, el resto espera el resultado.
 * 2. CORRUPTION TRIAGE: Una hidratación fallida purga los blobs del
 *    filtro y, con el re-sembrado automático activo, programa la campaña
 *    de re-poblado en segundo plano; el llamador recibe el filtro vacío
 *    de inmediato, jamás un bloqueo.
 * 3. BLOCKING DISCIPLINE: El I/O síncrono del núcleo (reload/save) viaja
 *    al pool bloqueante de Tokio; el reactor nunca se congela.
 * 4. FAILURE ISOLATION: 'save_all_dirty' registra y continúa ante fallos
 *    por filtro; el apagado absorbe toda excepción de disposición.
 * =================================================================
 */

use crate::options::EngineOptions;
use crate::seeding::FilterSeeder;
use centinela_core_probabilistic::errors::FilterError;
use centinela_core_probabilistic::facade::FilterEngine;
use centinela_core_probabilistic::signal::CancellationSignal;
use centinela_core_probabilistic::storage::BlobStorageDriver;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Celda de vuelo único que materializa un filtro por nombre.
type MaterializationCell = Arc<OnceCell<Arc<FilterEngine>>>;

/// Proveedor/registro del ciclo de vida de los filtros de membresía.
pub struct FilterProvider {
    engine_options: EngineOptions,
    storage_driver: Arc<dyn BlobStorageDriver>,
    seeders: Vec<Arc<dyn FilterSeeder>>,
    materialization_registry: DashMap<String, MaterializationCell>,
    shutdown_signal: CancellationSignal,
    disposed_flag: AtomicBool,
}

impl FilterProvider {
    /// Construye el proveedor sobre las opciones y el conductor indicados.
    #[must_use]
    pub fn new(
        engine_options: EngineOptions,
        storage_driver: Arc<dyn BlobStorageDriver>,
        seeders: Vec<Arc<dyn FilterSeeder>>,
    ) -> Self {
        Self {
            engine_options,
            storage_driver,
            seeders,
            materialization_registry: DashMap::new(),
            shutdown_signal: CancellationSignal::new(),
            disposed_flag: AtomicBool::new(false),
        }
    }

    /// Señal de apagado compartida con hidrataciones y sembradores.
    #[must_use]
    pub fn shutdown_signal(&self) -> &CancellationSignal {
        &self.shutdown_signal
    }

    /**
     * Obtiene (materializando si es necesario) el filtro del nombre dado.
     *
     * La primera invocación por nombre deriva la configuración, construye
     * el motor (residente o fragmentado según el umbral), lo hidrata desde
     * la bóveda y lo publica; las invocaciones concurrentes esperan esa
     * única ejecución de fábrica.
     *
     * # Errors:
     * - [`FilterError::Disposed`] tras el apagado del proveedor.
     * - [`FilterError::UnknownFilter`] para nombres fuera del catálogo.
     * - [`FilterError::Cancelled`] si el apagado interrumpe la fábrica.
     *
     * Los fallos de hidratación NO se propagan: el blob corrupto se purga,
     * el re-sembrado se programa (si está activo) y el filtro vacío se
     * entrega de inmediato.
     */
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, filter_name: &str) -> Result<Arc<FilterEngine>, FilterError> {
        self.ensure_not_disposed()?;

        let materialization_cell: MaterializationCell = self
            .materialization_registry
            .entry(filter_name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        materialization_cell
            .get_or_try_init(|| self.materialize(filter_name))
            .await
            .cloned()
    }

    /// Ejecución de fábrica: derivar forma, construir, hidratar, triar.
    async fn materialize(&self, filter_name: &str) -> Result<Arc<FilterEngine>, FilterError> {
        let configuration = self.engine_options.derive_configuration(filter_name)?;
        debug!(
            "🏭 [MATERIALIZE]: '{}' → {} bits, k={}, shards={}.",
            filter_name,
            configuration.size_in_bits,
            configuration.hash_count,
            configuration.shard_count
        );

        let engine = Arc::new(FilterEngine::provision(
            configuration,
            Some(self.storage_driver.clone()),
            self.engine_options.hydration_policy(),
        )?);

        let hydration_engine = Arc::clone(&engine);
        let hydration_signal = self.shutdown_signal.clone();
        let hydration_outcome =
            tokio::task::spawn_blocking(move || hydration_engine.reload(&hydration_signal)).await;

        match hydration_outcome {
            Ok(Ok(())) => Ok(engine),
            Ok(Err(FilterError::Cancelled)) => {
                engine.dispose();
                Err(FilterError::Cancelled)
            }
            Ok(Err(hydration_fault)) => {
                error!(
                    "❌ [HYDRATION_FAULT]: '{}' failed to rebuild: {}. Purging blob(s).",
                    filter_name, hydration_fault
                );
                self.purge_engine_blobs(&engine).await;

                if self.engine_options.lifecycle.auto_reseed {
                    self.schedule_reseed_campaign(filter_name, Arc::clone(&engine));
                }
                Ok(engine)
            }
            Err(join_fault) => {
                engine.dispose();
                Err(FilterError::Io(std::io::Error::other(format!(
                    "la tarea de hidratación colapsó: {join_fault}"
                ))))
            }
        }
    }

    /// Purga los blobs persistidos del motor (agregado o por fragmento).
    async fn purge_engine_blobs(&self, engine: &Arc<FilterEngine>) {
        let storage_driver = Arc::clone(&self.storage_driver);
        let purge_signal = self.shutdown_signal.clone();
        let blob_names = persisted_blob_names(engine);

        let purge_outcome = tokio::task::spawn_blocking(move || {
            for blob_name in &blob_names {
                if let Err(purge_fault) = storage_driver.delete_blob(blob_name, &purge_signal) {
                    warn!(
                        "⚠️  [PURGE_PARTIAL]: blob '{}' survived deletion: {}",
                        blob_name, purge_fault
                    );
                }
            }
        })
        .await;

        if let Err(join_fault) = purge_outcome {
            warn!("⚠️  [PURGE_COLLAPSE]: purge task aborted: {}", join_fault);
        }
    }

    /// Programa la campaña de re-sembrado en segundo plano.
    fn schedule_reseed_campaign(&self, filter_name: &str, engine: Arc<FilterEngine>) {
        let matching_seeders: Vec<Arc<dyn FilterSeeder>> = self
            .seeders
            .iter()
            .filter(|seeder| seeder.target_filter_name() == filter_name)
            .cloned()
            .collect();

        if matching_seeders.is_empty() {
            debug!(
                "🌫️  [RESEED_SKIP]: No seeders registered for '{}'.",
                filter_name
            );
            return;
        }

        info!(
            "🌱 [RESEED_SCHEDULED]: '{}' replenishing via {} seeder(s).",
            filter_name,
            matching_seeders.len()
        );
        let campaign_signal = self.shutdown_signal.clone();
        tokio::spawn(run_reseed_campaign(engine, matching_seeders, campaign_signal));
    }

    /**
     * Cristaliza todos los filtros ya materializados que estén sucios.
     *
     * Los fallos se registran por filtro y no detienen el lote.
     *
     * # Returns:
     * Conteo de filtros que cristalizaron al menos un blob.
     *
     * # Errors:
     * [`FilterError::Disposed`] tras el apagado del proveedor.
     */
    #[instrument(level = "debug", skip(self))]
    pub async fn save_all_dirty(&self) -> Result<usize, FilterError> {
        self.ensure_not_disposed()?;

        let mut crystallization_tasks: JoinSet<(String, Result<usize, FilterError>)> =
            JoinSet::new();

        for registry_entry in self.materialization_registry.iter() {
            let Some(engine) = registry_entry.value().get() else {
                continue;
            };
            if !engine.is_dirty() {
                continue;
            }

            let task_engine = Arc::clone(engine);
            let task_signal = self.shutdown_signal.clone();
            let task_name = registry_entry.key().clone();
            crystallization_tasks.spawn(async move {
                let outcome =
                    tokio::task::spawn_blocking(move || task_engine.save(&task_signal)).await;
                match outcome {
                    Ok(save_result) => (task_name, save_result),
                    Err(join_fault) => (
                        task_name,
                        Err(FilterError::Io(std::io::Error::other(join_fault.to_string()))),
                    ),
                }
            });
        }

        let mut crystallized_filters = 0usize;
        while let Some(joined) = crystallization_tasks.join_next().await {
            match joined {
                Ok((filter_name, Ok(blob_count))) => {
                    if blob_count > 0 {
                        crystallized_filters += 1;
                    }
                    debug!(
                        "💾 [BATCH_SYNC]: '{}' wrote {} blob(s).",
                        filter_name, blob_count
                    );
                }
                Ok((filter_name, Err(save_fault))) => {
                    error!(
                        "❌ [BATCH_SYNC_FAULT]: '{}' failed to crystallize: {}",
                        filter_name, save_fault
                    );
                }
                Err(join_fault) => {
                    error!("❌ [BATCH_SYNC_COLLAPSE]: task aborted: {}", join_fault);
                }
            }
        }

        Ok(crystallized_filters)
    }

    /**
     * Apagado cooperativo del estrato completo.
     *
     * Emite la señal compartida (cancelando hidrataciones y sembradores en
     * vuelo), sella todos los filtros materializados y absorbe cualquier
     * fallo individual para que nada bloquee el apagado.
     */
    #[instrument(level = "info", skip(self))]
    pub async fn shutdown(&self) {
        if self.disposed_flag.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("🔻 [LIFECYCLE_SHUTDOWN]: Cancelling in-flight work and sealing filters.");
        self.shutdown_signal.cancel();

        for registry_entry in self.materialization_registry.iter() {
            if let Some(engine) = registry_entry.value().get() {
                engine.dispose();
            }
        }
    }

    fn ensure_not_disposed(&self) -> Result<(), FilterError> {
        if self.disposed_flag.load(Ordering::Acquire) {
            return Err(FilterError::Disposed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for FilterProvider {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FilterProvider")
            .field("catalog_size", &self.engine_options.filters.len())
            .field("materialized", &self.materialization_registry.len())
            .finish()
    }
}

/// Nombres de blob persistidos por un motor (agregado o por fragmento).
fn persisted_blob_names(engine: &Arc<FilterEngine>) -> Vec<String> {
    let configuration = engine.configuration();
    if configuration.shard_count <= 1 {
        vec![configuration.filter_name.clone()]
    } else {
        (0..configuration.shard_count)
            .map(|shard_index| format!("{}_s{}", configuration.filter_name, shard_index))
            .collect()
    }
}

/**
 * Campaña de re-sembrado: sembradores en paralelo, cristalización final.
 *
 * Las inserciones del filtro son thread-safe, por lo que los sembradores
 * corren concurrentemente; los caídos se registran y los supervivientes
 * conservan sus contribuciones. Al drenar la campaña, el filtro se
 * cristaliza para que el re-poblado sobreviva al proceso.
 */
async fn run_reseed_campaign(
    engine: Arc<FilterEngine>,
    seeders: Vec<Arc<dyn FilterSeeder>>,
    signal: CancellationSignal,
) {
    let filter_name = engine.configuration().filter_name.clone();
    let mut seeding_tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    for seeder in seeders {
        let task_engine = Arc::clone(&engine);
        let task_signal = signal.clone();
        seeding_tasks.spawn_blocking(move || seeder.seed(&task_engine, &task_signal));
    }

    let mut surviving_seeders = 0usize;
    while let Some(joined) = seeding_tasks.join_next().await {
        match joined {
            Ok(Ok(())) => surviving_seeders += 1,
            Ok(Err(seed_fault)) => {
                error!(
                    "❌ [RESEED_FAULT]: A seeder for '{}' collapsed: {}",
                    filter_name, seed_fault
                );
            }
            Err(join_fault) => {
                error!(
                    "❌ [RESEED_COLLAPSE]: Seeding task for '{}' aborted: {}",
                    filter_name, join_fault
                );
            }
        }
    }

    if signal.is_cancelled() {
        warn!(
            "🔻 [RESEED_CANCELLED]: '{}' campaign interrupted by shutdown.",
            filter_name
        );
        return;
    }

    let crystallization_engine = Arc::clone(&engine);
    let crystallization_signal = signal.clone();
    let save_outcome =
        tokio::task::spawn_blocking(move || crystallization_engine.save(&crystallization_signal))
            .await;

    match save_outcome {
        Ok(Ok(blob_count)) => {
            info!(
                "🌱 [RESEED_COMPLETE]: '{}' replenished by {} seeder(s); {} blob(s) written.",
                filter_name, surviving_seeders, blob_count
            );
        }
        Ok(Err(save_fault)) => {
            error!(
                "❌ [RESEED_SYNC_FAULT]: '{}' replenished but failed to crystallize: {}",
                filter_name, save_fault
            );
        }
        Err(join_fault) => {
            error!(
                "❌ [RESEED_SYNC_COLLAPSE]: '{}' save task aborted: {}",
                filter_name, join_fault
            );
        }
    }
}
