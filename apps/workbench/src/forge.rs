// [apps/workbench/src/forge.rs]
/*!
 * =================================================================
 * APARATO: IDENTIFIER FORGE BURST (V2.0 - THROUGHPUT PROOF)
 * CLASIFICACIÓN: OPERATIONS TOOLING (ESTRATO L5)
 * RESPONSABILIDAD: RÁFAGA MULTIHILO CON VERIFICACIÓN DE MONOTONÍA
 * =================================================================
 */

use centinela_core_chronoflake::{ChronoflakeOptions, StripedChronoflake};
use clap::Args;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Parámetros de la ráfaga de forja.
#[derive(Args, Debug)]
pub struct ForgeArgs {
    /// Nodo base de la forja.
    #[arg(long, default_value_t = 1)]
    pub node_id: u64,

    /// Franjas de despacho (potencia de dos).
    #[arg(long, default_value_t = 4)]
    pub stripe_count: usize,

    /// Identificadores a emitir por hilo.
    #[arg(long, default_value_t = 250_000)]
    pub ids_per_thread: u64,

    /// Hilos emisores; por defecto, los núcleos físicos disponibles.
    #[arg(long)]
    pub thread_count: Option<usize>,
}

/// Ejecuta la ráfaga de forja con verificación de monotonía por hilo.
pub fn run(arguments: ForgeArgs, operational_flag: Arc<AtomicBool>) -> anyhow::Result<()> {
    let thread_count = arguments.thread_count.unwrap_or_else(num_cpus::get).max(1);
    let dispatcher = Arc::new(StripedChronoflake::new(
        ChronoflakeOptions::default().with_node_id(arguments.node_id),
        arguments.stripe_count,
    )?);

    info!(
        "❄️  [FORGE]: Burst begins: {} thread(s) × {} id(s) over {} stripe(s).",
        thread_count, arguments.ids_per_thread, arguments.stripe_count
    );

    let burst_timer = Instant::now();
    let mut emission_threads = Vec::with_capacity(thread_count);

    for thread_ordinal in 0..thread_count {
        let thread_dispatcher = Arc::clone(&dispatcher);
        let thread_flag = Arc::clone(&operational_flag);
        let per_thread_target = arguments.ids_per_thread;

        emission_threads.push(std::thread::spawn(move || -> anyhow::Result<u64> {
            let mut previous_identifier = i64::MIN;
            let mut emitted_count = 0u64;

            for _ in 0..per_thread_target {
                if !thread_flag.load(Ordering::SeqCst) {
                    break;
                }
                let identifier = thread_dispatcher.next_id();
                anyhow::ensure!(
                    identifier > previous_identifier,
                    "regresión de monotonía en el hilo {thread_ordinal}: {identifier} ≤ {previous_identifier}"
                );
                previous_identifier = identifier;
                emitted_count += 1;
            }
            Ok(emitted_count)
        }));
    }

    let mut total_emitted = 0u64;
    for emission_thread in emission_threads {
        total_emitted += emission_thread
            .join()
            .map_err(|_| anyhow::anyhow!("hilo de emisión colapsado"))??;
    }

    let burst_elapsed = burst_timer.elapsed();
    let throughput = total_emitted as f64 / burst_elapsed.as_secs_f64();

    let sample_fingerprint = dispatcher.decompose(dispatcher.next_id());
    info!(
        "🏁 [FORGE]: {} id(s) in {:?} ({:.0} id/s). Sample fingerprint: {}.",
        total_emitted, burst_elapsed, throughput, sample_fingerprint
    );
    Ok(())
}
