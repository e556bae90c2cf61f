// [apps/workbench/src/audit.rs]
/*!
 * =================================================================
 * APARATO: MEMBERSHIP FIELD AUDIT (V2.0 - END TO END)
 * CLASIFICACIÓN: OPERATIONS TOOLING (ESTRATO L5)
 * RESPONSABILIDAD: CICLO COMPLETO HIDRATAR→INSERTAR→CONSULTAR→CRISTALIZAR
 * =================================================================
 */

use anyhow::Context;
use centinela_infra_lifecycle::{seeder_fn, EngineOptions, FilterProvider};
use centinela_infra_storage::FileSystemBlobVault;
use clap::Args;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Nombre del filtro de campo del banco de trabajo.
const AUDIT_FILTER_NAME: &str = "workbench_census";

/// Parámetros de la auditoría de membresía.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Directorio de la bóveda de blobs.
    #[arg(long, default_value = "centinela-data")]
    pub vault_path: PathBuf,

    /// Elementos esperados del filtro de campo.
    #[arg(long, default_value_t = 100_000)]
    pub expected_items: u64,

    /// Tasa de falsos positivos objetivo.
    #[arg(long, default_value_t = 0.01)]
    pub error_rate: f64,

    /// Volumen de inserciones de la ráfaga.
    #[arg(long, default_value_t = 10_000)]
    pub insert_count: u64,

    /// Activa la compresión gzip de los blobs.
    #[arg(long, default_value_t = false)]
    pub compress: bool,

    /// Umbral de fragmentación en bytes.
    #[arg(long, default_value_t = 8 * 1024 * 1024)]
    pub sharding_threshold_bytes: u64,
}

/// Ejecuta la auditoría de membresía de extremo a extremo.
pub async fn run(arguments: AuditArgs, operational_flag: Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut engine_options = EngineOptions::default().with_filter(
        AUDIT_FILTER_NAME,
        arguments.expected_items,
        arguments.error_rate,
    );
    engine_options.storage.path = arguments.vault_path.clone();
    engine_options.storage.enable_compression = arguments.compress;
    engine_options.lifecycle.sharding_threshold_bytes = arguments.sharding_threshold_bytes;

    let vault = Arc::new(FileSystemBlobVault::new(engine_options.vault_settings()));
    let baseline_seeder = seeder_fn(AUDIT_FILTER_NAME, |filter, signal| {
        signal.ensure_active()?;
        filter.add_text("workbench_baseline_vector")?;
        Ok(())
    });

    let provider = FilterProvider::new(engine_options, vault, vec![baseline_seeder]);

    // --- FASE 1: MATERIALIZACIÓN E HIDRATACIÓN ---
    let hydration_timer = Instant::now();
    let filter = provider
        .get(AUDIT_FILTER_NAME)
        .await
        .context("materialización del filtro de campo")?;
    info!(
        "🌊 [AUDIT]: '{}' ready ({} bits, {} shard(s)). Hydration: {:?}.",
        AUDIT_FILTER_NAME,
        filter.configuration().size_in_bits,
        filter.configuration().shard_count,
        hydration_timer.elapsed()
    );

    // --- FASE 2: RÁFAGA DE INSERCIÓN ---
    let insertion_timer = Instant::now();
    let mut inserted_count = 0u64;
    for item_index in 0..arguments.insert_count {
        if !operational_flag.load(Ordering::SeqCst) {
            warn!("🔻 [AUDIT]: Operator abort; insertion burst truncated.");
            break;
        }
        filter.add_text(&format!("field_vector_{item_index}"))?;
        inserted_count += 1;
    }
    info!(
        "🧪 [AUDIT]: {} vector(s) injected in {:?}.",
        inserted_count,
        insertion_timer.elapsed()
    );

    // --- FASE 3: VERIFICACIÓN DE MEMBRESÍA ---
    let mut missing_count = 0u64;
    for item_index in 0..inserted_count {
        if !filter.contains_text(&format!("field_vector_{item_index}"))? {
            missing_count += 1;
        }
    }
    anyhow::ensure!(
        missing_count == 0,
        "falsos negativos detectados: {missing_count} (violación del contrato)"
    );

    let phantom_present = filter.contains_text("phantom_vector_never_inserted")?;
    info!(
        "🔍 [AUDIT]: Zero false negatives. Phantom probe positive: {}.",
        phantom_present
    );

    // --- FASE 4: SALUD Y CRISTALIZACIÓN ---
    let health_report = filter.health_snapshot()?;
    info!(
        "📊 [AUDIT]: population={} fill={:.4}% healthy={}.",
        health_report.population,
        health_report.fill_ratio * 100.0,
        health_report.is_healthy
    );

    let crystallized_filters = provider.save_all_dirty().await?;
    info!(
        "💾 [AUDIT]: Batch sync crystallized {} filter(s).",
        crystallized_filters
    );

    provider.shutdown().await;
    info!("🏁 [AUDIT]: Mission complete.");
    Ok(())
}
