// [tests/mirror/libs/core/probabilistic/header_codec_roundtrip.test.rs]
/**
 * =================================================================
 * APARATO: WBF1 HEADER CODEC CERTIFIER (V1.1 - LAYOUT SEALED)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-PROBABILISTIC
 * RESPONSABILIDAD: CERTIFICACIÓN DEL REGISTRO FIJO DE 36 BYTES
 * =================================================================
 */

use centinela_core_probabilistic::header::{
    FilterBlobHeader, BLOB_FORMAT_VERSION, BLOB_HEADER_LENGTH_BYTES, BLOB_MAGIC,
};

#[test]
fn certify_header_roundtrip_identity() {
    println!("\n🧬 [PROVING_GROUNDS]: Initiating WBF1 Codec Audit...");

    let header_samples = [
        FilterBlobHeader {
            checksum: 0,
            size_in_bits: 1,
            hash_count: 1,
            fingerprint: 0,
        },
        FilterBlobHeader {
            checksum: u64::MAX,
            size_in_bits: i64::MAX,
            hash_count: i32::MAX,
            fingerprint: u64::MAX,
        },
        FilterBlobHeader {
            checksum: 0xCAFE_BABE_DEAD_BEEF,
            size_in_bits: 95_850_584,
            hash_count: 7,
            fingerprint: 0x1234_5678_9ABC_DEF0,
        },
    ];

    for original_header in header_samples {
        let encoded = original_header.encode();
        let decoded = FilterBlobHeader::decode(&encoded)
            .expect("CODEC_FAULT: valid header rejected on decode.");
        assert_eq!(decoded, original_header, "INTEGRITY_COLLAPSE: roundtrip drift.");
    }

    println!("   ✅ [SUCCESS]: decode(encode(h)) = h for all samples.\n");
}

#[test]
fn certify_exact_binary_layout() {
    // Paridad bit a bit contra el layout documentado (Little-Endian).
    let reference_header = FilterBlobHeader {
        checksum: 0x0807_0605_0403_0201,
        size_in_bits: 0x1817_1615_1413_1211,
        hash_count: 0x2423_2221,
        fingerprint: 0x3837_3635_3433_3231,
    };

    let encoded = reference_header.encode();
    assert_eq!(encoded.len(), BLOB_HEADER_LENGTH_BYTES);
    assert_eq!(&encoded[0..4], &BLOB_MAGIC, "MAGIC_DRIFT: signature corrupted.");
    assert_eq!(
        u32::from_le_bytes(encoded[4..8].try_into().expect("ancho fijo")),
        BLOB_FORMAT_VERSION
    );
    assert_eq!(&encoded[8..16], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    assert_eq!(&encoded[16..24], &[0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18]);
    assert_eq!(&encoded[24..28], &[0x21, 0x22, 0x23, 0x24]);
    assert_eq!(&encoded[28..36], &[0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38]);
}

#[test]
fn reject_corrupted_prefixes() {
    println!("\n🧬 [PROVING_GROUNDS]: Auditing codec rejection paths...");

    let reference_header = FilterBlobHeader {
        checksum: 9,
        size_in_bits: 512,
        hash_count: 3,
        fingerprint: 77,
    };
    let encoded = reference_header.encode();

    // 1. Prefijo más corto que la cabecera
    assert!(FilterBlobHeader::decode(&[]).is_none());
    assert!(FilterBlobHeader::decode(&encoded[..BLOB_HEADER_LENGTH_BYTES - 1]).is_none());

    // 2. Magia ajena ("XXXX" del escenario de corrupción)
    let mut bogus_magic = encoded;
    bogus_magic[0..4].copy_from_slice(b"XXXX");
    assert!(FilterBlobHeader::decode(&bogus_magic).is_none());

    // 3. Versión desconocida
    let mut future_version = encoded;
    future_version[4..8].copy_from_slice(&2u32.to_le_bytes());
    assert!(FilterBlobHeader::decode(&future_version).is_none());

    println!("   ✅ [SUCCESS]: All corruption vectors rejected.\n");
}
