// [libs/core/probabilistic/src/header.rs]
/*!
 * =================================================================
 * APARATO: WBF1 BINARY HEADER CODEC (V1.2 - LITTLE ENDIAN SEALED)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: CODIFICACIÓN DEL REGISTRO FIJO QUE ANTECEDE AL PAYLOAD
 *
 * # Binary Layout (36 bytes, Little-Endian):
 * | Off | Len | Campo                         |
 * |-----|-----|-------------------------------|
 * |  0  |  4  | Magia ASCII "WBF1"            |
 * |  4  |  4  | Versión = 1 (u32)             |
 * |  8  |  8  | Checksum del payload (u64)    |
 * | 16  |  8  | Tamaño en bits (i64)          |
 * | 24  |  4  | Conteo de dispersión (i32)    |
 * | 28  |  8  | Huella de configuración (u64) |
 * =================================================================
 */

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

/// Firma mágica que identifica un blob de filtro persistido.
pub const BLOB_MAGIC: [u8; 4] = *b"WBF1";

/// Versión vigente del formato binario.
pub const BLOB_FORMAT_VERSION: u32 = 1;

/// Longitud fija del registro de cabecera.
pub const BLOB_HEADER_LENGTH_BYTES: usize = 36;

/// Registro fijo antepuesto a todo payload de matriz persistido.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterBlobHeader {
    /// Checksum XXH3-64 del payload que sigue a la cabecera.
    pub checksum: u64,
    /// Longitud lógica de la matriz en bits.
    pub size_in_bits: i64,
    /// Conteo de funciones de dispersión con el que se pobló la matriz.
    pub hash_count: i32,
    /// Huella determinista de la forma `(m, k, seed, shard_count)`.
    pub fingerprint: u64,
}

impl FilterBlobHeader {
    /**
     * Serializa la cabecera hacia `destination` en orden Little-Endian.
     *
     * # Errors:
     * Propaga cualquier fallo de escritura del destino.
     */
    pub fn encode_into<W: Write>(&self, destination: &mut W) -> std::io::Result<()> {
        destination.write_all(&BLOB_MAGIC)?;
        destination.write_u32::<LittleEndian>(BLOB_FORMAT_VERSION)?;
        destination.write_u64::<LittleEndian>(self.checksum)?;
        destination.write_i64::<LittleEndian>(self.size_in_bits)?;
        destination.write_i32::<LittleEndian>(self.hash_count)?;
        destination.write_u64::<LittleEndian>(self.fingerprint)?;
        Ok(())
    }

    /// Serializa la cabecera hacia un buffer propio de longitud exacta.
    #[must_use]
    pub fn encode(&self) -> [u8; BLOB_HEADER_LENGTH_BYTES] {
        let mut encoded = [0u8; BLOB_HEADER_LENGTH_BYTES];
        let mut write_cursor = Cursor::new(encoded.as_mut_slice());
        self.encode_into(&mut write_cursor)
            .unwrap_or_else(|_| unreachable!("buffer fijo de 36 bytes"));
        encoded
    }

    /**
     * Intenta decodificar una cabecera desde un prefijo de bytes crudo.
     *
     * # Returns:
     * `None` si el prefijo es más corto que 36 bytes, si la magia no es
     * `WBF1` o si la versión difiere de 1. Los consumidores con la
     * verificación de integridad deshabilitada degradan entonces a la
     * lectura del payload crudo (formato legado).
     */
    #[must_use]
    pub fn decode(raw_prefix: &[u8]) -> Option<Self> {
        if raw_prefix.len() < BLOB_HEADER_LENGTH_BYTES {
            return None;
        }
        if raw_prefix[0..4] != BLOB_MAGIC {
            return None;
        }

        let mut read_cursor = Cursor::new(&raw_prefix[4..BLOB_HEADER_LENGTH_BYTES]);
        let declared_version = read_cursor.read_u32::<LittleEndian>().ok()?;
        if declared_version != BLOB_FORMAT_VERSION {
            return None;
        }

        Some(Self {
            checksum: read_cursor.read_u64::<LittleEndian>().ok()?,
            size_in_bits: read_cursor.read_i64::<LittleEndian>().ok()?,
            hash_count: read_cursor.read_i32::<LittleEndian>().ok()?,
            fingerprint: read_cursor.read_u64::<LittleEndian>().ok()?,
        })
    }
}
