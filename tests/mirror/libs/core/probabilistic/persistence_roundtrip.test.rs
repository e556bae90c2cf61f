// [tests/mirror/libs/core/probabilistic/persistence_roundtrip.test.rs]
/**
 * =================================================================
 * APARATO: PERSISTENCE ROUNDTRIP CERTIFIER (V4.0 - BIT PERFECT)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-PROBABILISTIC
 * RESPONSABILIDAD: CERTIFICACIÓN DEL CICLO SAVE → RELOAD → PARIDAD
 *
 * # Mathematical Proof (Binary Consistency):
 * El estado de saturación del filtro debe preservarse bit a bit entre el
 * volcado WBF1 y la re-hidratación: pop-count, checksum y membresía de
 * cada vector insertado son invariantes del ciclo.
 * =================================================================
 */

use centinela_core_probabilistic::configuration::FilterConfiguration;
use centinela_core_probabilistic::errors::FilterError;
use centinela_core_probabilistic::header::{FilterBlobHeader, BLOB_HEADER_LENGTH_BYTES};
use centinela_core_probabilistic::resident::{HydrationPolicy, ResidentFilter};
use centinela_core_probabilistic::signal::CancellationSignal;
use centinela_core_probabilistic::storage::{BlobReadStream, BlobStorageDriver};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use xxhash_rust::xxh3::xxh3_64;

/// Bóveda volátil en memoria para el Proving Grounds.
#[derive(Default)]
struct VolatileVault {
    blob_shelf: Mutex<HashMap<String, Vec<u8>>>,
}

impl VolatileVault {
    fn stored_blob(&self, filter_name: &str) -> Option<Vec<u8>> {
        self.blob_shelf
            .lock()
            .expect("SHELF_FAULT")
            .get(filter_name)
            .cloned()
    }

    fn plant_blob(&self, filter_name: &str, raw_bytes: Vec<u8>) {
        self.blob_shelf
            .lock()
            .expect("SHELF_FAULT")
            .insert(filter_name.to_string(), raw_bytes);
    }
}

impl BlobStorageDriver for VolatileVault {
    fn save_blob(
        &self,
        filter_name: &str,
        _configuration: &FilterConfiguration,
        blob: &[u8],
        signal: &CancellationSignal,
    ) -> Result<(), FilterError> {
        signal.ensure_active()?;
        self.plant_blob(filter_name, blob.to_vec());
        Ok(())
    }

    fn open_blob_stream(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<Option<BlobReadStream>, FilterError> {
        signal.ensure_active()?;
        Ok(self
            .stored_blob(filter_name)
            .map(|raw_bytes| Box::new(std::io::Cursor::new(raw_bytes)) as BlobReadStream))
    }

    fn delete_blob(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<(), FilterError> {
        signal.ensure_active()?;
        self.blob_shelf
            .lock()
            .expect("SHELF_FAULT")
            .remove(filter_name);
        Ok(())
    }
}

/// Forma de referencia del escenario: m = 16384, k = 11.
fn roundtrip_shape(hash_seed: u64) -> FilterConfiguration {
    FilterConfiguration {
        filter_name: "roundtrip_census".to_string(),
        expected_items: 1_000,
        error_rate: 0.001,
        hash_seed,
        size_in_bits: 16_384,
        hash_count: 11,
        shard_count: 1,
    }
}

#[test]
fn certify_save_reload_bit_parity() {
    println!("\n🧬 [PROVING_GROUNDS]: Initiating Persistence Roundtrip Audit...");

    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let signal = CancellationSignal::new();

    // 1. FASE: POBLADO Y CRISTALIZACIÓN
    println!("   🧪 Phase 1: Injecting 1000 vectors and crystallizing...");
    let source_filter = ResidentFilter::new(
        roundtrip_shape(7),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    for item_index in 0..1_000u64 {
        source_filter
            .add_bytes(&item_index.to_le_bytes())
            .expect("ADD_FAULT");
    }
    let source_population = source_filter.population_count().expect("COUNT_FAULT");

    assert!(source_filter.is_dirty(), "DIRTY_DRIFT: population left no trace.");
    assert!(source_filter.save(&signal).expect("SAVE_FAULT"));
    assert!(!source_filter.is_dirty(), "DIRTY_DRIFT: save must clear the flag.");
    assert!(source_filter.last_saved_at().is_some());

    // 2. FASE: AUDITORÍA DEL BLOB (checksum declarado vs payload real)
    println!("   🧪 Phase 2: Auditing WBF1 artifact integrity...");
    let crystallized_blob = vault
        .stored_blob("roundtrip_census")
        .expect("STRATA_FAULT: blob missing after save.");
    let declared_header = FilterBlobHeader::decode(&crystallized_blob[..BLOB_HEADER_LENGTH_BYTES])
        .expect("CODEC_FAULT: header rejected.");

    assert_eq!(declared_header.size_in_bits, 16_384);
    assert_eq!(declared_header.hash_count, 11);
    assert_eq!(
        crystallized_blob.len(),
        BLOB_HEADER_LENGTH_BYTES + 2_048,
        "LAYOUT_DRIFT: payload must be exactly ceil(m/8) bytes."
    );
    assert_eq!(
        declared_header.checksum,
        xxh3_64(&crystallized_blob[BLOB_HEADER_LENGTH_BYTES..]),
        "CHECKSUM_DRIFT: declared checksum diverges from payload."
    );
    assert_eq!(
        declared_header.fingerprint,
        roundtrip_shape(7).fingerprint(),
        "FINGERPRINT_DRIFT: shape identity corrupted."
    );

    // 3. FASE: RE-HIDRATACIÓN EN UN FILTRO GEMELO
    println!("   🧪 Phase 3: Hydrating twin filter and proving parity...");
    let twin_filter = ResidentFilter::new(
        roundtrip_shape(7),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    twin_filter.reload(&signal).expect("HYDRATION_FAULT");

    for item_index in 0..1_000u64 {
        assert!(
            twin_filter
                .contains_bytes(&item_index.to_le_bytes())
                .expect("QUERY_FAULT"),
            "FALSE_NEGATIVE: vector {item_index} vanished across the roundtrip."
        );
    }
    assert_eq!(
        twin_filter.population_count().expect("COUNT_FAULT"),
        source_population,
        "INTEGRITY_COLLAPSE: pop-count drifted across the roundtrip."
    );
    assert!(!twin_filter.is_dirty(), "DIRTY_DRIFT: hydration must land clean.");

    println!("   ✅ [SUCCESS]: Bit-perfect persistence certified.");
    println!("🏁 [COMPLETE]: Roundtrip audit finalized.\n");
}

#[test]
fn certify_clean_save_is_noop() {
    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let filter = ResidentFilter::new(
        roundtrip_shape(1),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );

    // Filtro limpio: ninguna escritura debe alcanzar la bóveda.
    assert!(!filter.save(&CancellationSignal::new()).expect("SAVE_FAULT"));
    assert!(vault.stored_blob("roundtrip_census").is_none());
}

#[test]
fn certify_reload_without_blob_stays_empty() {
    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let filter = ResidentFilter::new(
        roundtrip_shape(1),
        Some(vault as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );

    filter.reload(&CancellationSignal::new()).expect("HYDRATION_FAULT");
    assert_eq!(filter.population_count().expect("COUNT_FAULT"), 0);
}

#[test]
fn certify_fingerprint_mismatch_policies() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing shape-mismatch policies...");

    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let signal = CancellationSignal::new();

    // Blob sembrado con semilla 1 → huella distinta a la semilla 2.
    let foreign_filter = ResidentFilter::new(
        roundtrip_shape(1),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    foreign_filter.add_text("foreign_vector").expect("ADD_FAULT");
    foreign_filter.save(&signal).expect("SAVE_FAULT");

    // 1. Política estricta: la huella divergente es fatal.
    let strict_filter = ResidentFilter::new(
        roundtrip_shape(2),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    assert!(
        matches!(
            strict_filter.reload(&signal),
            Err(FilterError::FingerprintMismatch { .. })
        ),
        "POLICY_DRIFT: strict reload accepted a foreign shape."
    );

    // 2. Auto-reset: la matriz queda en ceros y la recarga prospera.
    let resetting_filter = ResidentFilter::new(
        roundtrip_shape(2),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy {
            enable_integrity_check: true,
            auto_reset_on_mismatch: true,
        },
    );
    resetting_filter.reload(&signal).expect("HYDRATION_FAULT");
    assert_eq!(resetting_filter.population_count().expect("COUNT_FAULT"), 0);

    println!("   ✅ [SUCCESS]: Mismatch policies certified.\n");
}

#[test]
fn certify_corrupted_payload_detection() {
    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let signal = CancellationSignal::new();

    let source_filter = ResidentFilter::new(
        roundtrip_shape(5),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    source_filter.add_text("vector").expect("ADD_FAULT");
    source_filter.save(&signal).expect("SAVE_FAULT");

    // Mutilación de un byte del payload → checksum divergente.
    let mut tampered_blob = vault.stored_blob("roundtrip_census").expect("STRATA_FAULT");
    let tamper_offset = BLOB_HEADER_LENGTH_BYTES + 100;
    tampered_blob[tamper_offset] ^= 0xFF;
    vault.plant_blob("roundtrip_census", tampered_blob);

    let victim_filter = ResidentFilter::new(
        roundtrip_shape(5),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    assert!(
        matches!(
            victim_filter.reload(&signal),
            Err(FilterError::ChecksumMismatch { .. })
        ),
        "INTEGRITY_HOLE: tampered payload slipped through."
    );
}

#[test]
fn certify_header_rejection_and_legacy_degradation() {
    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let signal = CancellationSignal::new();

    // Blob bogus sin cabecera WBF1 ("XXXX").
    vault.plant_blob("roundtrip_census", b"XXXX".to_vec());

    // 1. Con verificación de integridad: rechazo frontal.
    let strict_filter = ResidentFilter::new(
        roundtrip_shape(3),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    assert!(matches!(
        strict_filter.reload(&signal),
        Err(FilterError::HeaderRejected(_))
    ));

    // 2. Sin verificación: degradación a payload crudo (formato legado).
    let legacy_filter = ResidentFilter::new(
        roundtrip_shape(3),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy {
            enable_integrity_check: false,
            auto_reset_on_mismatch: false,
        },
    );
    legacy_filter.reload(&signal).expect("HYDRATION_FAULT");
    // "XXXX" = 4 bytes de payload crudo → bits de esos bytes encendidos.
    assert_eq!(
        legacy_filter.population_count().expect("COUNT_FAULT"),
        (b'X'.count_ones() as u64) * 4
    );
}

#[test]
fn certify_cancellation_preserves_previous_matrix() {
    let vault: Arc<VolatileVault> = Arc::new(VolatileVault::default());
    let active_signal = CancellationSignal::new();

    let filter = ResidentFilter::new(
        roundtrip_shape(4),
        Some(vault.clone() as Arc<dyn BlobStorageDriver>),
        HydrationPolicy::default(),
    );
    filter.add_text("resident_vector").expect("ADD_FAULT");
    filter.save(&active_signal).expect("SAVE_FAULT");
    filter.add_text("second_vector").expect("ADD_FAULT");
    let population_before = filter.population_count().expect("COUNT_FAULT");

    // Señal ya cancelada: la recarga aborta sin tocar la matriz vigente.
    let cancelled_signal = CancellationSignal::new();
    cancelled_signal.cancel();
    assert!(matches!(
        filter.reload(&cancelled_signal),
        Err(FilterError::Cancelled)
    ));
    assert_eq!(
        filter.population_count().expect("COUNT_FAULT"),
        population_before,
        "POISONED_STATE: cancellation mutated the resident matrix."
    );
}

#[test]
fn certify_disposed_access_fails_fast() {
    let filter = ResidentFilter::new(roundtrip_shape(6), None, HydrationPolicy::default());
    filter.dispose();

    assert!(matches!(filter.add_text("x"), Err(FilterError::Disposed)));
    assert!(matches!(filter.contains_text("x"), Err(FilterError::Disposed)));
    assert!(matches!(
        filter.save(&CancellationSignal::new()),
        Err(FilterError::Disposed)
    ));
}
