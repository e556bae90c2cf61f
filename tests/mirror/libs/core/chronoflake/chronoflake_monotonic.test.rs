// [tests/mirror/libs/core/chronoflake/chronoflake_monotonic.test.rs]
/**
 * =================================================================
 * APARATO: CHRONOFLAKE MONOTONICITY CERTIFIER (V4.0 - CAS TORTURE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CHRONOFLAKE
 * RESPONSABILIDAD: MONOTONÍA ESTRICTA, UNICIDAD MULTIHILO Y DISCIPLINA
 *                  DE TIEMPO VIRTUAL BAJO RELOJES ADVERSOS
 * =================================================================
 */

use centinela_core_chronoflake::{
    ChronoflakeError, ChronoflakeGenerator, ChronoflakeOptions, ClockSource,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Reloj sintético gobernado por el Proving Grounds.
struct ScriptedClock {
    scripted_now_ms: AtomicI64,
    advance_per_call_ms: i64,
}

impl ScriptedClock {
    fn frozen_at(now_ms: i64) -> Self {
        Self {
            scripted_now_ms: AtomicI64::new(now_ms),
            advance_per_call_ms: 0,
        }
    }

    fn creeping_from(now_ms: i64, advance_per_call_ms: i64) -> Self {
        Self {
            scripted_now_ms: AtomicI64::new(now_ms),
            advance_per_call_ms,
        }
    }

    fn jump_to(&self, now_ms: i64) {
        self.scripted_now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl ClockSource for ScriptedClock {
    fn now_unix_ms(&self) -> i64 {
        self.scripted_now_ms
            .fetch_add(self.advance_per_call_ms, Ordering::SeqCst)
    }
}

/// Época de referencia de los guiones: 2024-01-01T00:00:00Z.
const SCRIPT_EPOCH_MS: i64 = 1_704_067_200_000;

#[test]
fn certify_uniqueness_and_per_thread_monotonicity_under_load() {
    println!("\n🧬 [PROVING_GROUNDS]: Initiating CAS Torture (8 threads × 25k ids)...");

    let forge = Arc::new(
        ChronoflakeGenerator::new(ChronoflakeOptions::default().with_node_id(1))
            .expect("GENESIS_FAULT"),
    );

    let thread_count = 8usize;
    let ids_per_thread = 25_000usize;
    let mut emission_threads = Vec::new();

    for thread_ordinal in 0..thread_count {
        let thread_forge = Arc::clone(&forge);
        emission_threads.push(std::thread::spawn(move || {
            let mut emitted_identifiers = Vec::with_capacity(ids_per_thread);
            let mut previous_identifier = i64::MIN;

            for _ in 0..ids_per_thread {
                let identifier = thread_forge.next_id();
                assert!(
                    identifier > previous_identifier,
                    "MONOTONY_COLLAPSE: thread {thread_ordinal} observed regression."
                );
                previous_identifier = identifier;
                emitted_identifiers.push(identifier);
            }
            emitted_identifiers
        }));
    }

    let mut unique_identifiers: HashSet<i64> =
        HashSet::with_capacity(thread_count * ids_per_thread);
    for emission_thread in emission_threads {
        for identifier in emission_thread.join().expect("THREAD_FAULT") {
            assert!(
                unique_identifiers.insert(identifier),
                "UNIQUENESS_COLLAPSE: duplicate identifier {identifier}."
            );
        }
    }
    assert_eq!(unique_identifiers.len(), thread_count * ids_per_thread);

    println!("   ✅ [SUCCESS]: {} unique, per-thread monotonic ids.", unique_identifiers.len());
    println!("🏁 [COMPLETE]: CAS torture finalized.\n");
}

#[test]
fn certify_decompose_roundtrip_identity() {
    let forge = ChronoflakeGenerator::new(
        ChronoflakeOptions::default()
            .with_node_id(3)
            .with_sequence_bits(10),
    )
    .expect("GENESIS_FAULT");

    // Barrido de entradas legales: (delta, nodo, secuencia).
    for timestamp_delta in [0i64, 1, 999, 1 << 20, (1 << 41) - 1] {
        for node_id in [0u64, 1, 4095] {
            for sequence in [0u64, 1, 1023] {
                let identifier =
                    forge.compose(SCRIPT_EPOCH_MS + timestamp_delta, node_id, sequence);
                let fingerprint = forge.decompose(identifier);
                assert_eq!(fingerprint.timestamp_unix_ms, SCRIPT_EPOCH_MS + timestamp_delta);
                assert_eq!(fingerprint.node_id, node_id);
                assert_eq!(fingerprint.sequence, sequence);
            }
        }
    }
}

#[test]
fn certify_sequence_overflow_borrows_virtual_millisecond() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing virtual-time borrow on overflow...");

    // Reloj congelado: la única vía de avance es el préstamo virtual.
    let frozen_clock = Arc::new(ScriptedClock::frozen_at(SCRIPT_EPOCH_MS + 10_000));
    let forge = ChronoflakeGenerator::new(
        ChronoflakeOptions::default()
            .with_node_id(1)
            .with_sequence_bits(4) // 16 ids por milisegundo
            .with_max_drift_ms(1_000)
            .with_clock_source(frozen_clock),
    )
    .expect("GENESIS_FAULT");

    let first_fingerprint = forge.decompose(forge.next_id());
    let mut last_fingerprint = first_fingerprint;

    // 3 ventanas completas de secuencia: el timestamp virtual debe
    // avanzar exactamente al agotar cada ventana de 16.
    for _ in 0..48 {
        let fingerprint = forge.decompose(forge.next_id());
        assert!(
            fingerprint.timestamp_unix_ms >= last_fingerprint.timestamp_unix_ms,
            "VIRTUAL_REGRESSION: timestamp stepped back under frozen clock."
        );
        last_fingerprint = fingerprint;
    }

    assert!(
        last_fingerprint.timestamp_unix_ms >= first_fingerprint.timestamp_unix_ms + 3,
        "BORROW_FAULT: sequence overflow failed to advance virtual time."
    );

    println!("   ✅ [SUCCESS]: Virtual millisecond borrow certified.\n");
}

#[test]
fn certify_rollback_within_tolerance_holds_the_line() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing clock rollback within tolerance...");

    let scripted_clock = Arc::new(ScriptedClock::frozen_at(SCRIPT_EPOCH_MS + 60_000));
    let forge = ChronoflakeGenerator::new(
        ChronoflakeOptions::default()
            .with_node_id(2)
            .with_max_drift_ms(5_000)
            .with_clock_source(scripted_clock.clone()),
    )
    .expect("GENESIS_FAULT");

    let before_rollback = forge.decompose(forge.next_id());

    // Retroceso de 3 s, dentro de la tolerancia de 5 s.
    scripted_clock.jump_to(SCRIPT_EPOCH_MS + 57_000);
    let after_rollback = forge.decompose(forge.next_id());

    assert!(
        after_rollback.timestamp_unix_ms >= before_rollback.timestamp_unix_ms,
        "ROLLBACK_LEAK: virtual time regressed with the wall clock."
    );
    assert!(after_rollback.identifier > before_rollback.identifier);

    println!("   ✅ [SUCCESS]: Virtual time held the line.\n");
}

#[test]
fn certify_rollback_beyond_tolerance_spins_until_recovery() {
    // Retroceso mayor que la deriva tolerada: la forja debe pausar la
    // emisión (spin) hasta que el reloj real recupere el terreno. El
    // reloj guionizado avanza 1 ms por consulta, por lo que la espera
    // es finita y acotada.
    let scripted_clock = Arc::new(ScriptedClock::creeping_from(SCRIPT_EPOCH_MS + 30_000, 1));
    let forge = ChronoflakeGenerator::new(
        ChronoflakeOptions::default()
            .with_node_id(2)
            .with_max_drift_ms(50)
            .with_clock_source(scripted_clock.clone()),
    )
    .expect("GENESIS_FAULT");

    let anchor_fingerprint = forge.decompose(forge.next_id());

    // Retroceso de 500 ms, diez veces la tolerancia.
    scripted_clock.jump_to(anchor_fingerprint.timestamp_unix_ms - 500);
    let recovered_fingerprint = forge.decompose(forge.next_id());

    assert!(
        recovered_fingerprint.timestamp_unix_ms >= anchor_fingerprint.timestamp_unix_ms,
        "DRIFT_BREACH: emission resumed before real time caught up."
    );
}

#[test]
fn reject_invalid_forge_configurations() {
    // node_id fuera del rango de 10 bits (sequence_bits = 12).
    assert!(matches!(
        ChronoflakeGenerator::new(ChronoflakeOptions::default().with_node_id(1024)),
        Err(ChronoflakeError::NodeIdOutOfRange { .. })
    ));

    // sequence_bits fuera de [1, 22].
    assert!(matches!(
        ChronoflakeGenerator::new(ChronoflakeOptions::default().with_sequence_bits(0)),
        Err(ChronoflakeError::InvalidSequenceBits(0))
    ));
    assert!(matches!(
        ChronoflakeGenerator::new(ChronoflakeOptions::default().with_sequence_bits(23)),
        Err(ChronoflakeError::InvalidSequenceBits(23))
    ));

    // Época futura respecto al reloj inyectado.
    let past_clock = Arc::new(ScriptedClock::frozen_at(SCRIPT_EPOCH_MS - 1));
    assert!(matches!(
        ChronoflakeGenerator::new(ChronoflakeOptions::default().with_clock_source(past_clock)),
        Err(ChronoflakeError::EpochInFuture { .. })
    ));
}
