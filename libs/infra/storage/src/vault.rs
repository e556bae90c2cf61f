// [libs/infra/storage/src/vault.rs]
/*!
 * =================================================================
 * APARATO: FILE SYSTEM BLOB VAULT (V3.2 - ATOMIC COMMIT)
 * CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L2)
 * RESPONSABILIDAD: CRISTALIZACIÓN FÍSICA DE BLOBS DE FILTRO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATOMIC COMMIT: Toda escritura aterriza en '<name>.wbf.tmp' y se
 *    promueve al destino final con un renombre del sistema de archivos;
 *    un proceso caído jamás deja un blob a medio escribir como vigente.
 * 2. COOPERATIVE LOCKING: El archivo '<name>.wbf.lock' serializa a los
 *    escritores concurrentes del mismo nombre con mejor esfuerzo; los
 *    cerrojos huérfanos (>30 s) se recuperan como residuo de un proceso
 *    caído.
 * 3. TRANSPARENT GZIP: La compresión escribe el blob completo (cabecera
 *    + payload) a través de un stream gzip; la lectura olfatea la firma
 *    0x1F 0x8B y descomprime sin intervención del llamador.
 * 4. FAULT ABSORPTION: Con 'ignore_errors', los fallos de I/O en
 *    save/delete se registran y absorben; en carga degradan a "ausente"
 *    para que el estrato de ciclo de vida re-siembre.
 * =================================================================
 */

use centinela_core_probabilistic::configuration::FilterConfiguration;
use centinela_core_probabilistic::errors::FilterError;
use centinela_core_probabilistic::signal::CancellationSignal;
use centinela_core_probabilistic::storage::{BlobReadStream, BlobStorageDriver};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Extensión canónica de los blobs de filtro persistidos.
const BLOB_FILE_EXTENSION: &str = "wbf";
/// Sufijo del artefacto temporal previo al commit.
const TEMP_FILE_SUFFIX: &str = "tmp";
/// Sufijo del cerrojo cooperativo por nombre.
const LOCK_FILE_SUFFIX: &str = "lock";
/// Firma de un stream gzip (RFC 1952).
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
/// Edad a partir de la cual un cerrojo se considera huérfano.
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);
/// Pausa entre reintentos de adquisición del cerrojo.
const LOCK_RETRY_PAUSE: Duration = Duration::from_millis(10);
/// Reintentos máximos antes de declarar contención irresoluble.
const LOCK_RETRY_LIMIT: u32 = 500;
/// Granularidad de las ráfagas de escritura entre cortes de cancelación.
const WRITE_BURST_LENGTH_BYTES: usize = 256 * 1024;

/// Parámetros operativos de la bóveda.
#[derive(Clone, Debug)]
pub struct VaultSettings {
    /// Directorio raíz donde aterrizan los blobs.
    pub root_directory: PathBuf,
    /// Activa la envoltura gzip de los blobs completos.
    pub enable_compression: bool,
    /// Capacidad de los buffers de lectura/escritura.
    pub buffer_size_bytes: usize,
    /// Absorbe y registra los fallos de I/O en save/delete.
    pub ignore_errors: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("centinela-data"),
            enable_compression: false,
            buffer_size_bytes: 64 * 1024,
            ignore_errors: false,
        }
    }
}

/// Bóveda de blobs de filtro sobre un directorio del sistema de archivos.
pub struct FileSystemBlobVault {
    settings: VaultSettings,
}

impl FileSystemBlobVault {
    /// Construye la bóveda sobre los parámetros indicados.
    #[must_use]
    pub fn new(settings: VaultSettings) -> Self {
        Self { settings }
    }

    /// Parámetros operativos vigentes.
    #[must_use]
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    fn blob_path(&self, filter_name: &str) -> PathBuf {
        self.settings
            .root_directory
            .join(format!("{filter_name}.{BLOB_FILE_EXTENSION}"))
    }

    fn temp_path(&self, filter_name: &str) -> PathBuf {
        self.settings
            .root_directory
            .join(format!("{filter_name}.{BLOB_FILE_EXTENSION}.{TEMP_FILE_SUFFIX}"))
    }

    fn lock_path(&self, filter_name: &str) -> PathBuf {
        self.settings
            .root_directory
            .join(format!("{filter_name}.{BLOB_FILE_EXTENSION}.{LOCK_FILE_SUFFIX}"))
    }

    /**
     * Adquiere el cerrojo cooperativo del nombre indicado.
     *
     * # Logic:
     * Crea el archivo de cerrojo en modo exclusivo; ante contención pausa
     * y reintenta, recuperando cerrojos huérfanos por edad. La señal de
     * cancelación corta la espera en tiempo acotado.
     */
    fn acquire_cooperative_lock(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<LockSentinel, FilterError> {
        let lock_path = self.lock_path(filter_name);

        for _attempt in 0..LOCK_RETRY_LIMIT {
            signal.ensure_active()?;

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_lock_file) => {
                    return Ok(LockSentinel {
                        lock_path: lock_path.clone(),
                    });
                }
                Err(creation_fault) if creation_fault.kind() == std::io::ErrorKind::AlreadyExists => {
                    self.reclaim_stale_lock(&lock_path);
                    std::thread::sleep(LOCK_RETRY_PAUSE);
                }
                Err(creation_fault) => return Err(FilterError::Io(creation_fault)),
            }
        }

        Err(FilterError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("contención irresoluble sobre el cerrojo de '{filter_name}'"),
        )))
    }

    /// Recupera un cerrojo huérfano dejado por un proceso caído.
    fn reclaim_stale_lock(&self, lock_path: &Path) {
        let Ok(lock_metadata) = fs::metadata(lock_path) else {
            return;
        };
        let Ok(modified_at) = lock_metadata.modified() else {
            return;
        };
        if modified_at.elapsed().map_or(false, |age| age > STALE_LOCK_AGE) {
            warn!(
                "🧹 [STALE_LOCK]: Reclaiming orphaned lock {:?}.",
                lock_path
            );
            let _ = fs::remove_file(lock_path);
        }
    }

    /// Escritura física del blob hacia el artefacto temporal + renombre.
    fn crystallize_blob(
        &self,
        filter_name: &str,
        blob: &[u8],
        signal: &CancellationSignal,
    ) -> Result<(), FilterError> {
        fs::create_dir_all(&self.settings.root_directory)?;

        let _lock_sentinel = self.acquire_cooperative_lock(filter_name, signal)?;
        let temp_path = self.temp_path(filter_name);
        let final_path = self.blob_path(filter_name);

        let temp_file = File::create(&temp_path)?;
        let write_outcome = if self.settings.enable_compression {
            let buffered_writer =
                BufWriter::with_capacity(self.settings.buffer_size_bytes, &temp_file);
            let mut gzip_encoder = GzEncoder::new(buffered_writer, Compression::default());
            write_in_bursts(&mut gzip_encoder, blob, signal).and_then(|()| {
                gzip_encoder
                    .finish()
                    .and_then(|mut inner_writer| inner_writer.flush())
                    .map_err(FilterError::Io)
            })
        } else {
            let mut buffered_writer =
                BufWriter::with_capacity(self.settings.buffer_size_bytes, &temp_file);
            write_in_bursts(&mut buffered_writer, blob, signal)
                .and_then(|()| buffered_writer.flush().map_err(FilterError::Io))
        };

        if let Err(write_fault) = write_outcome {
            let _ = fs::remove_file(&temp_path);
            return Err(write_fault);
        }

        temp_file.sync_all()?;
        fs::rename(&temp_path, &final_path)?;

        debug!(
            "💾 [VAULT_COMMIT]: '{}' promoted ({} raw bytes, gzip={}).",
            filter_name,
            blob.len(),
            self.settings.enable_compression
        );
        Ok(())
    }
}

impl BlobStorageDriver for FileSystemBlobVault {
    #[instrument(level = "debug", skip(self, _configuration, blob, signal))]
    fn save_blob(
        &self,
        filter_name: &str,
        _configuration: &FilterConfiguration,
        blob: &[u8],
        signal: &CancellationSignal,
    ) -> Result<(), FilterError> {
        match self.crystallize_blob(filter_name, blob, signal) {
            Ok(()) => Ok(()),
            Err(FilterError::Cancelled) => Err(FilterError::Cancelled),
            Err(storage_fault) if self.settings.ignore_errors => {
                warn!(
                    "⚠️  [VAULT_ABSORBED]: save('{}') failed and was swallowed: {}",
                    filter_name, storage_fault
                );
                Ok(())
            }
            Err(storage_fault) => Err(storage_fault),
        }
    }

    #[instrument(level = "debug", skip(self, signal))]
    fn open_blob_stream(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<Option<BlobReadStream>, FilterError> {
        signal.ensure_active()?;

        let blob_path = self.blob_path(filter_name);
        let blob_file = match File::open(&blob_path) {
            Ok(opened_file) => opened_file,
            Err(open_fault) if open_fault.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(open_fault) if self.settings.ignore_errors => {
                warn!(
                    "⚠️  [VAULT_ABSORBED]: load('{}') degraded to absent: {}",
                    filter_name, open_fault
                );
                return Ok(None);
            }
            Err(open_fault) => return Err(FilterError::Io(open_fault)),
        };

        let mut buffered_reader =
            BufReader::with_capacity(self.settings.buffer_size_bytes, blob_file);

        // Olfateo de compresión: la firma gzip no colisiona con "WBF1".
        let peeked_prefix = buffered_reader.fill_buf()?;
        let is_gzip_stream = peeked_prefix.len() >= 2 && peeked_prefix[0..2] == GZIP_MAGIC;

        let blob_stream: BlobReadStream = if is_gzip_stream {
            Box::new(GzDecoder::new(buffered_reader))
        } else {
            Box::new(buffered_reader)
        };
        Ok(Some(blob_stream))
    }

    #[instrument(level = "debug", skip(self, signal))]
    fn delete_blob(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<(), FilterError> {
        signal.ensure_active()?;

        let mut first_fault: Option<std::io::Error> = None;
        for target_path in [
            self.blob_path(filter_name),
            self.temp_path(filter_name),
            self.lock_path(filter_name),
        ] {
            match fs::remove_file(&target_path) {
                Ok(()) => {}
                Err(remove_fault) if remove_fault.kind() == std::io::ErrorKind::NotFound => {}
                Err(remove_fault) => first_fault = first_fault.or(Some(remove_fault)),
            }
        }

        match first_fault {
            None => {
                info!("🗑️  [VAULT_PURGE]: '{}' artifacts removed.", filter_name);
                Ok(())
            }
            Some(remove_fault) if self.settings.ignore_errors => {
                warn!(
                    "⚠️  [VAULT_ABSORBED]: delete('{}') failed and was swallowed: {}",
                    filter_name, remove_fault
                );
                Ok(())
            }
            Some(remove_fault) => Err(FilterError::Io(remove_fault)),
        }
    }
}

/// Centinela RAII del cerrojo cooperativo; libera el archivo al caer.
struct LockSentinel {
    lock_path: PathBuf,
}

impl Drop for LockSentinel {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// Escribe el blob en ráfagas acotadas consultando la señal entre cortes.
fn write_in_bursts<W: Write>(
    destination: &mut W,
    blob: &[u8],
    signal: &CancellationSignal,
) -> Result<(), FilterError> {
    for burst in blob.chunks(WRITE_BURST_LENGTH_BYTES) {
        signal.ensure_active()?;
        destination.write_all(burst)?;
    }
    Ok(())
}
