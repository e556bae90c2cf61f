// libs/core/probabilistic/src/errors.rs
// =================================================================
// APARATO: PROBABILISTIC ERRORS
// RESPONSABILIDAD: CATÁLOGO DE FALLOS DEL MOTOR DE MEMBRESÍA
// ESTADO: ELITE COMPLIANCE (FULL RUSTDOC)
// =================================================================

use thiserror::Error;

/// Define los errores posibles durante la operación del motor probabilístico.
///
/// Este enum centraliza los fallos que pueden ocurrir al manipular la matriz
/// de membresía, cubriendo desde configuración inválida hasta corrupción del
/// artefacto binario WBF1 persistido.
#[derive(Error, Debug)]
pub enum FilterError {
    /// El nombre solicitado no existe en el catálogo de filtros configurado.
    ///
    /// Surge en el primer acceso vía proveedor cuando las opciones activas
    /// no declaran una definición `(expected_items, error_rate)` para él.
    #[error("Filtro desconocido en el catálogo: '{0}'")]
    UnknownFilter(String),

    /// Parámetros de construcción fuera del dominio válido.
    ///
    /// Ocurre si:
    /// - `expected_items` es cero.
    /// - `error_rate` no pertenece al intervalo abierto (0, 1).
    /// - El conteo de shards no es una potencia de dos.
    #[error("Configuración inválida: {0}")]
    InvalidConfiguration(String),

    /// La cabecera binaria del blob fue rechazada.
    ///
    /// Generalmente ocurre si:
    /// - El stream es más corto que los 36 bytes de cabecera.
    /// - La firma mágica no es `WBF1`.
    /// - La versión del formato es distinta de 1.
    #[error("Cabecera binaria rechazada: {0}")]
    HeaderRejected(&'static str),

    /// La huella de configuración del blob no coincide con la del proceso.
    ///
    /// Cargar bits generados bajo otra forma `(m, k, seed, shards)` corrompería
    /// silenciosamente la semántica de membresía, por lo que el fallo es fatal
    /// para la operación de recarga.
    #[error("Huella de configuración incompatible (esperada {expected:#018x}, encontrada {found:#018x})")]
    FingerprintMismatch {
        /// Huella derivada de la configuración activa del proceso.
        expected: u64,
        /// Huella declarada por la cabecera del blob persistido.
        found: u64,
    },

    /// El tamaño en bits declarado por el blob difiere del configurado.
    #[error("Tamaño de matriz incompatible (esperados {expected} bits, encontrados {found} bits)")]
    SizeMismatch {
        /// Bits que exige la configuración activa.
        expected: i64,
        /// Bits declarados por la cabecera persistida.
        found: i64,
    },

    /// El conteo de funciones de dispersión declarado difiere del configurado.
    #[error("Conteo de dispersión incompatible (esperadas {expected} funciones, encontradas {found})")]
    HashCountMismatch {
        /// Funciones k que exige la configuración activa.
        expected: i32,
        /// Funciones k declaradas por la cabecera persistida.
        found: i32,
    },

    /// La suma de verificación del payload no coincide con la declarada.
    ///
    /// Señala truncamiento o corrupción bit a bit del artefacto. Solo es
    /// fatal cuando la verificación de integridad está habilitada.
    #[error("Suma de verificación corrupta (declarada {declared:#018x}, calculada {computed:#018x})")]
    ChecksumMismatch {
        /// Checksum registrado en la cabecera del blob.
        declared: u64,
        /// Checksum calculado sobre los bytes efectivamente leídos.
        computed: u64,
    },

    /// Error de Entrada/Salida del sistema operativo o del conductor.
    ///
    /// Ocurre si:
    /// - No hay permisos de lectura/escritura (`PermissionDenied`).
    /// - El disco está lleno o el directorio no existe.
    #[error("Error de I/O: {0}")]
    Io(#[from] std::io::Error),

    /// La señal cooperativa de apagado interrumpió la operación.
    ///
    /// La cancelación limpia el estado parcial y nunca envenena el filtro:
    /// la matriz previa permanece intacta.
    #[error("Operación cancelada por la señal de apagado")]
    Cancelled,

    /// Se invocó una operación sobre un filtro o proveedor ya desechado.
    #[error("Acceso a un filtro ya desechado")]
    Disposed,
}

impl FilterError {
    /// Indica si el fallo pertenece a la familia de integridad de datos.
    ///
    /// El proveedor utiliza este triaje para decidir la eliminación del blob
    /// corrupto y el re-sembrado automático del filtro.
    #[must_use]
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            Self::HeaderRejected(_)
                | Self::FingerprintMismatch { .. }
                | Self::SizeMismatch { .. }
                | Self::HashCountMismatch { .. }
                | Self::ChecksumMismatch { .. }
        )
    }
}
