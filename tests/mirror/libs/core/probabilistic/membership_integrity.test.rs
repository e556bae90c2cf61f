// [tests/mirror/libs/core/probabilistic/membership_integrity.test.rs]
/**
 * =================================================================
 * APARATO: MEMBERSHIP INTEGRITY CERTIFIER (V4.2 - ZERO FALSE NEGATIVES)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-PROBABILISTIC
 * RESPONSABILIDAD: CERTIFICACIÓN DEL CONTRATO DE MEMBRESÍA
 *
 * # Mathematical Proof (No False Negatives):
 * Todo x insertado debe responder positivo en cualquier consulta
 * posterior: la disciplina escritor-enciende → lector-observa hace
 * imposible el falso negativo por construcción.
 * =================================================================
 */

use centinela_core_probabilistic::configuration::FilterConfiguration;
use centinela_core_probabilistic::dispersion::{hash_item, ProbeSequence};
use centinela_core_probabilistic::resident::{HydrationPolicy, ResidentFilter};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};

/// Forma manual con (m, k) exactos para auditorías de frontera.
fn manual_shape(size_in_bits: u64, hash_count: u32, hash_seed: u64) -> FilterConfiguration {
    FilterConfiguration {
        filter_name: "manual_shape".to_string(),
        expected_items: 100,
        error_rate: 0.01,
        hash_seed,
        size_in_bits,
        hash_count,
        shard_count: 1,
    }
}

#[test]
fn certify_basic_membership_scenario() {
    println!("\n🧬 [PROVING_GROUNDS]: Initiating Basic Membership Audit (m=1024, k=7)...");

    let filter = ResidentFilter::new(manual_shape(1024, 7, 0), None, HydrationPolicy::default());

    assert!(
        filter.add_text("hello").expect("ADD_FAULT"),
        "SIGNAL_LOSS: first insertion must flip bits."
    );
    assert!(
        filter.contains_text("hello").expect("QUERY_FAULT"),
        "FALSE_NEGATIVE: inserted item vanished."
    );
    assert!(
        !filter.contains_text("world").expect("QUERY_FAULT"),
        "PHANTOM_SIGNAL: empty spectrum answered positive."
    );

    println!("   ✅ [SUCCESS]: Membership contract certified.\n");
}

#[test]
fn certify_scalar_and_paired_lane_parity() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing probe lane parity (scalar vs paired)...");

    // Para k impar y par, los bits encendidos deben ser EXACTAMENTE las
    // posiciones de la secuencia escalar canónica h1 + i·h2.
    for hash_count in [1u32, 2, 5, 8, 11] {
        let size_in_bits = 4096u64;
        let filter = ResidentFilter::new(
            manual_shape(size_in_bits, hash_count, 42),
            None,
            HydrationPolicy::default(),
        );

        let payload = format!("lane_parity_vector_k{hash_count}");
        filter.add_bytes(payload.as_bytes()).expect("ADD_FAULT");

        let probe_sequence = ProbeSequence::from_item_hash(hash_item(payload.as_bytes(), 42));
        let expected_positions: std::collections::BTreeSet<u64> = (0..hash_count)
            .map(|probe_index| probe_sequence.position(probe_index, size_in_bits))
            .collect();

        assert_eq!(
            filter.population_count().expect("COUNT_FAULT"),
            expected_positions.len() as u64,
            "LANE_DRIFT: paired walk touched foreign positions (k={hash_count})."
        );
        assert!(
            filter.contains_bytes(payload.as_bytes()).expect("QUERY_FAULT"),
            "FALSE_NEGATIVE: k={hash_count}"
        );
    }

    println!("   ✅ [SUCCESS]: Paired walk is bit-identical to the scalar sequence.\n");
}

#[test]
fn certify_utf8_byte_equivalence() {
    let filter = ResidentFilter::new(manual_shape(8192, 5, 7), None, HydrationPolicy::default());

    filter.add_text("membresía_λ_センチネル").expect("ADD_FAULT");

    // La forma textual y su codificación UTF-8 deben ser indistinguibles.
    assert!(filter
        .contains_bytes("membresía_λ_センチネル".as_bytes())
        .expect("QUERY_FAULT"));

    filter.add_bytes("ruta_inversa".as_bytes()).expect("ADD_FAULT");
    assert!(filter.contains_text("ruta_inversa").expect("QUERY_FAULT"));
}

#[test]
fn certify_false_positive_rate_envelope() {
    println!("\n🧬 [PROVING_GROUNDS]: Sampling false-positive envelope (n=1000, p=0.01)...");

    // Forma canónica para n=1000, p=0.01.
    let configuration =
        FilterConfiguration::derive("fp_envelope", 1000, 0.01, 1234, 1).expect("shape");
    let filter = ResidentFilter::new(configuration, None, HydrationPolicy::default());

    for item_index in 0..1000u64 {
        filter
            .add_bytes(&item_index.to_le_bytes())
            .expect("ADD_FAULT");
    }

    // Espectro disjunto de consulta: claves desplazadas fuera del censo.
    let mut random_source = rand::rngs::StdRng::seed_from_u64(99);
    let mut phantom_hits = 0u64;
    let probe_volume = 20_000u64;
    for _ in 0..probe_volume {
        let absent_key: u64 = random_source.gen_range(1_000_000..u64::MAX);
        if filter
            .contains_bytes(&absent_key.to_le_bytes())
            .expect("QUERY_FAULT")
        {
            phantom_hits += 1;
        }
    }

    let observed_rate = phantom_hits as f64 / probe_volume as f64;
    println!("   📊 Observed FP rate: {:.5}", observed_rate);
    assert!(
        observed_rate < 0.03,
        "FP_EXPLOSION: observed rate {observed_rate} far above the 0.01 design point."
    );

    println!("   ✅ [SUCCESS]: False-positive envelope holds.\n");
}

#[test]
fn certify_concurrent_add_then_contains() {
    println!("\n🧬 [PROVING_GROUNDS]: Concurrent membership (8 writers)...");

    let configuration =
        FilterConfiguration::derive("concurrent", 50_000, 0.001, 5, 1).expect("shape");
    let filter = std::sync::Arc::new(ResidentFilter::new(
        configuration,
        None,
        HydrationPolicy::default(),
    ));

    let mut writer_threads = Vec::new();
    for thread_ordinal in 0..8u64 {
        let thread_filter = std::sync::Arc::clone(&filter);
        writer_threads.push(std::thread::spawn(move || {
            for item_index in 0..2_000u64 {
                let payload = format!("w{thread_ordinal}_item{item_index}");
                thread_filter.add_text(&payload).expect("ADD_FAULT");
            }
        }));
    }
    for writer in writer_threads {
        writer.join().expect("THREAD_FAULT");
    }

    for thread_ordinal in 0..8u64 {
        for item_index in 0..2_000u64 {
            let payload = format!("w{thread_ordinal}_item{item_index}");
            assert!(
                filter.contains_text(&payload).expect("QUERY_FAULT"),
                "FALSE_NEGATIVE: {payload} lost under concurrency."
            );
        }
    }
    assert!(filter.is_dirty(), "DIRTY_DRIFT: mutations left no trace.");

    println!("   ✅ [SUCCESS]: add(x) happens-before contains(x) certified.\n");
}

proptest! {
    /// Propiedad: ningún conjunto de vectores insertados produce falsos negativos.
    #[test]
    fn property_no_false_negatives(
        item_vectors in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64),
            1..200
        )
    ) {
        let configuration =
            FilterConfiguration::derive("property", 500, 0.01, 77, 1).expect("shape");
        let filter = ResidentFilter::new(configuration, None, HydrationPolicy::default());

        for item in &item_vectors {
            filter.add_bytes(item).expect("ADD_FAULT");
        }
        for item in &item_vectors {
            prop_assert!(filter.contains_bytes(item).expect("QUERY_FAULT"));
        }
    }
}
