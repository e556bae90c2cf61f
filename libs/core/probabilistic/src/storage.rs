// [libs/core/probabilistic/src/storage.rs]
/*!
 * =================================================================
 * APARATO: BLOB STORAGE CONTRACT (V1.1 - PLUGGABLE PERSISTENCE)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: CONTRATO DEL CONDUCTOR DE PERSISTENCIA DE BLOBS
 *
 * El núcleo probabilístico nunca conoce el medio físico: los filtros
 * dialogan con este contrato y el estrato de infraestructura aporta la
 * implementación concreta (sistema de archivos con compresión y commit
 * atómico). Ninguna garantía de durabilidad se asume más allá de la
 * documentada por cada implementación.
 * =================================================================
 */

use crate::configuration::FilterConfiguration;
use crate::errors::FilterError;
use crate::signal::CancellationSignal;
use std::io::Read;

/// Stream de lectura opaco entregado por el conductor al hidratar un blob.
pub type BlobReadStream = Box<dyn Read + Send>;

/// Contrato de persistencia de blobs opacos indexados por nombre de filtro.
///
/// Las tres operaciones aceptan la señal cooperativa de cancelación y deben
/// abortar en tiempo acotado tras su emisión. Las implementaciones deberían
/// confirmar las escrituras de forma atómica (temporal + renombre).
pub trait BlobStorageDriver: Send + Sync {
    /**
     * Persiste el blob asociado a `filter_name`.
     *
     * El buffer recibido ya contiene la cabecera WBF1 seguida del payload;
     * el conductor lo trata como opaco.
     *
     * # Errors:
     * [`FilterError::Io`] ante fallos del medio; [`FilterError::Cancelled`]
     * si la señal interrumpe la escritura.
     */
    fn save_blob(
        &self,
        filter_name: &str,
        configuration: &FilterConfiguration,
        blob: &[u8],
        signal: &CancellationSignal,
    ) -> Result<(), FilterError>;

    /**
     * Abre el stream de lectura del blob de `filter_name`.
     *
     * # Returns:
     * `None` cuando no existe blob persistido para el nombre; el llamador
     * es dueño del stream y de su liberación.
     */
    fn open_blob_stream(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<Option<BlobReadStream>, FilterError>;

    /**
     * Elimina el blob (y sus artefactos residuales) de `filter_name`.
     *
     * La ausencia del blob no constituye un error.
     */
    fn delete_blob(
        &self,
        filter_name: &str,
        signal: &CancellationSignal,
    ) -> Result<(), FilterError>;
}
