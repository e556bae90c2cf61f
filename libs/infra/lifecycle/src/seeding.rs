// [libs/infra/lifecycle/src/seeding.rs]
/*!
 * =================================================================
 * APARATO: FILTER SEEDING CONTRACT (V1.2 - PARALLEL REPLENISH)
 * CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L3)
 * RESPONSABILIDAD: RE-POBLADO DE FILTROS TRAS PÉRDIDA DEL BLOB
 *
 * Los sembradores registrados ante el proveedor re-pueblan un filtro
 * vacío tras la purga de un blob corrupto. Las inserciones del filtro
 * son thread-safe, por lo que múltiples sembradores del mismo nombre
 * corren en paralelo; un sembrador caído no invalida las contribuciones
 * de los supervivientes.
 * =================================================================
 */

use centinela_core_probabilistic::facade::FilterEngine;
use centinela_core_probabilistic::signal::CancellationSignal;
use std::sync::Arc;

/// Contrato de un re-poblador de filtros.
pub trait FilterSeeder: Send + Sync {
    /// Nombre del filtro que este sembrador sabe re-poblar.
    fn target_filter_name(&self) -> &str;

    /**
     * Re-puebla el filtro indicado.
     *
     * La implementación debe consultar la señal con la frecuencia
     * suficiente para abortar en tiempo acotado tras el apagado.
     *
     * # Errors:
     * Cualquier fallo del origen de datos del sembrador; el proveedor lo
     * registra sin revertir las inserciones ya aplicadas.
     */
    fn seed(&self, filter: &FilterEngine, signal: &CancellationSignal) -> anyhow::Result<()>;
}

/// Adaptador de clausura → sembrador, para registros ligeros.
struct ClosureSeeder<SeedBody> {
    target_name: String,
    seed_body: SeedBody,
}

impl<SeedBody> FilterSeeder for ClosureSeeder<SeedBody>
where
    SeedBody: Fn(&FilterEngine, &CancellationSignal) -> anyhow::Result<()> + Send + Sync,
{
    fn target_filter_name(&self) -> &str {
        &self.target_name
    }

    fn seed(&self, filter: &FilterEngine, signal: &CancellationSignal) -> anyhow::Result<()> {
        (self.seed_body)(filter, signal)
    }
}

/// Construye un sembrador a partir de una clausura.
pub fn seeder_fn<SeedBody>(
    target_filter_name: impl Into<String>,
    seed_body: SeedBody,
) -> Arc<dyn FilterSeeder>
where
    SeedBody: Fn(&FilterEngine, &CancellationSignal) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(ClosureSeeder {
        target_name: target_filter_name.into(),
        seed_body,
    })
}
