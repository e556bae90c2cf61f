// [tests/mirror/libs/core/probabilistic/bit_matrix_atomicity.test.rs]
/**
 * =================================================================
 * APARATO: BIT MATRIX ATOMICITY CERTIFIER (V3.0 - LOST UPDATE PROOF)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-PROBABILISTIC
 * RESPONSABILIDAD: CERTIFICACIÓN DE ATOMICIDAD BAJO CONTENCIÓN MULTIHILO
 *
 * # Mathematical Proof (No Lost Updates):
 * T hilos encendiendo conjuntos disjuntos de bits deben producir un
 * pop-count final exactamente igual al cardinal de la unión: cualquier
 * actualización perdida por solapamiento de palabras rompería la igualdad.
 * =================================================================
 */

use centinela_core_probabilistic::bit_matrix::AtomicBitMatrix;
use centinela_core_probabilistic::signal::CancellationSignal;
use std::sync::Arc;

#[test]
fn certify_no_lost_updates_under_contention() {
    println!("\n🧬 [PROVING_GROUNDS]: Initiating Bit Matrix Atomicity Audit...");

    // 1. SETUP: matriz compartida y particiones disjuntas por hilo
    let thread_count = 8u64;
    let bits_per_thread = 4_096u64;
    let matrix = Arc::new(AtomicBitMatrix::new(thread_count * bits_per_thread));

    // 2. FASE: RÁFAGA CONCURRENTE (bits entrelazados por módulo)
    println!("   🧪 Phase 1: Launching {} contention threads...", thread_count);
    let mut contention_threads = Vec::new();
    for thread_ordinal in 0..thread_count {
        let thread_matrix = Arc::clone(&matrix);
        contention_threads.push(std::thread::spawn(move || {
            let mut flipped_count = 0u64;
            // Los bits de cada hilo se entrelazan para maximizar el
            // solapamiento de palabras entre hilos vecinos.
            for step in 0..bits_per_thread {
                let bit_index = step * thread_count + thread_ordinal;
                if thread_matrix.set(bit_index) {
                    flipped_count += 1;
                }
            }
            flipped_count
        }));
    }

    let total_flipped: u64 = contention_threads
        .into_iter()
        .map(|handle| handle.join().expect("THREAD_FAULT: contention worker collapsed."))
        .sum();

    // 3. VALIDACIÓN DE VERDAD (conservación exacta)
    let expected_population = thread_count * bits_per_thread;
    assert_eq!(
        total_flipped, expected_population,
        "INTEGRITY_COLLAPSE: transition count drifted under contention."
    );
    assert_eq!(
        matrix.population_count(),
        expected_population,
        "INTEGRITY_COLLAPSE: lost update detected in final pop-count."
    );

    println!("   ✅ [SUCCESS]: {} transitions conserved bit-perfectly.", total_flipped);
    println!("🏁 [COMPLETE]: Atomicity audit finalized.\n");
}

#[test]
fn certify_double_set_reports_false() {
    let matrix = AtomicBitMatrix::new(256);
    assert!(matrix.set(128), "SIGNAL_LOSS: first transition must flip.");
    assert!(!matrix.set(128), "PHANTOM_FLIP: second set must observe the bit.");
    assert_eq!(matrix.population_count(), 1);
}

#[test]
fn certify_tail_bits_never_contribute() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing irregular tail discipline...");

    // m = 100: ni múltiplo de 8 ni de 64.
    let matrix = AtomicBitMatrix::new(100);
    for bit_index in 0..100 {
        matrix.set(bit_index);
    }

    assert_eq!(
        matrix.population_count(),
        100,
        "TAIL_LEAK: padding bits contributed to pop-count."
    );
    assert_eq!(matrix.active_byte_count(), 13);

    // El checksum debe ser una función exclusiva del prefijo activo:
    // dos matrices con los mismos 100 bits deben coincidir.
    let twin_matrix = AtomicBitMatrix::new(100);
    for bit_index in 0..100 {
        twin_matrix.set(bit_index);
    }
    assert_eq!(
        matrix.compute_checksum(),
        twin_matrix.compute_checksum(),
        "CHECKSUM_DRIFT: identical prefixes diverged."
    );

    println!("   ✅ [SUCCESS]: Tail discipline certified.\n");
}

#[test]
fn certify_stream_hydration_parity() {
    let matrix = AtomicBitMatrix::new(777);
    for bit_index in (0..777).step_by(13) {
        matrix.set(bit_index);
    }

    let mut crystallized_bytes = Vec::new();
    matrix
        .write_active_prefix(&mut crystallized_bytes)
        .expect("STRATA_FAULT: prefix dump failed.");
    assert_eq!(crystallized_bytes.len(), 98);

    let mut hydrated_matrix = AtomicBitMatrix::new(777);
    let observed_checksum = hydrated_matrix
        .fill_from_reader(&mut crystallized_bytes.as_slice(), &CancellationSignal::new())
        .expect("HYDRATION_FAULT: stream fill collapsed.");

    assert_eq!(observed_checksum, matrix.compute_checksum());
    assert_eq!(hydrated_matrix.population_count(), matrix.population_count());
}
