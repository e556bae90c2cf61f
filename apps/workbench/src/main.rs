// [apps/workbench/src/main.rs]
/*!
 * =================================================================
 * APARATO: CENTINELA WORKBENCH (V2.2 - FIELD PROVING)
 * CLASIFICACIÓN: OPERATIONS TOOLING (ESTRATO L5)
 * RESPONSABILIDAD: EJERCICIO DE CAMPO DEL MOTOR COMPLETO
 *
 * Dos misiones operativas:
 * - 'audit': ciclo completo de membresía (hidratar → insertar → consultar
 *   → cristalizar) contra una bóveda física real.
 * - 'forge': ráfaga multihilo de identificadores con verificación de
 *   monotonía y reporte de caudal.
 * =================================================================
 */

mod audit;
mod forge;

use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Banco de trabajo operativo del motor Centinela.
#[derive(Parser, Debug)]
#[command(name = "centinela-workbench", version, about)]
struct WorkbenchCli {
    #[command(subcommand)]
    mission: WorkbenchMission,
}

#[derive(Subcommand, Debug)]
enum WorkbenchMission {
    /// Auditoría de membresía de extremo a extremo contra la bóveda.
    Audit(audit::AuditArgs),
    /// Ráfaga de forja de identificadores con verificación de monotonía.
    Forge(forge::ForgeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    centinela_shared_atalaya::init_tracing("centinela_workbench");

    // Señal operativa enlazada a Ctrl-C para abortos limpios de campo.
    let operational_flag = Arc::new(AtomicBool::new(true));
    let ctrlc_flag = Arc::clone(&operational_flag);
    ctrlc::set_handler(move || {
        ctrlc_flag.store(false, Ordering::SeqCst);
    })?;

    let cli = WorkbenchCli::parse();
    info!("🚀 [WORKBENCH]: Mission accepted: {:?}.", cli.mission);

    let mission_outcome = match cli.mission {
        WorkbenchMission::Audit(arguments) => audit::run(arguments, operational_flag).await,
        WorkbenchMission::Forge(arguments) => forge::run(arguments, operational_flag),
    };

    if let Err(mission_fault) = &mission_outcome {
        error!("❌ [MISSION_FAULT]: {mission_fault:#}");
    }
    mission_outcome
}
