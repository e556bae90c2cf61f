// [libs/infra/lifecycle/src/options.rs]
/*!
 * =================================================================
 * APARATO: ENGINE OPTIONS SURFACE (V2.5 - PASCAL SURFACE)
 * CLASIFICACIÓN: INFRASTRUCTURE (ESTRATO L3)
 * RESPONSABILIDAD: SUPERFICIE DE CONFIGURACIÓN RECONOCIDA DEL MOTOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PASCAL SURFACE: Las claves externas se exponen en PascalCase
 *    ('Filters', 'Performance.GlobalHashSeed', 'Lifecycle.*', 'Storage.*')
 *    con defaults completos por sección.
 * 2. SHARDING THRESHOLD: La decisión de fragmentación vive aquí: si el
 *    payload ceil(m/8) supera el umbral configurado, el conteo de shards
 *    es la siguiente potencia de dos de ceil(bytes/umbral).
 * 3. SEED GOVERNANCE: La semilla global de dispersión se inyecta en toda
 *    configuración derivada, participando en la huella de forma.
 * =================================================================
 */

use centinela_core_probabilistic::configuration::FilterConfiguration;
use centinela_core_probabilistic::errors::FilterError;
use centinela_core_probabilistic::resident::HydrationPolicy;
use centinela_infra_storage::VaultSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Umbral de fragmentación por defecto: 8 MiB de payload.
const DEFAULT_SHARDING_THRESHOLD_BYTES: u64 = 8 * 1024 * 1024;
/// Capacidad por defecto de los buffers de la bóveda.
const DEFAULT_STORAGE_BUFFER_BYTES: usize = 64 * 1024;

/// Definición nominal de un filtro del catálogo.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterProvisioning {
    /// Volumen de elementos esperados (n).
    pub expected_items: u64,
    /// Tasa de falsos positivos objetivo (p).
    pub error_rate: f64,
}

/// Parámetros de rendimiento globales.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PerformanceOptions {
    /// Semilla de 64 bits inyectada en toda la dispersión XXH3.
    pub global_hash_seed: u64,
}

/// Políticas del ciclo de vida de los filtros.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LifecycleOptions {
    /// Umbral de payload que dispara la fragmentación.
    pub sharding_threshold_bytes: u64,
    /// Programa el re-sembrado en segundo plano tras una carga corrupta.
    pub auto_reseed: bool,
    /// Re-inicializa la matriz a ceros ante una huella incompatible.
    pub auto_reset_on_mismatch: bool,
    /// Hace fatales los fallos de cabecera/checksum/huella/tamaño.
    pub enable_integrity_check: bool,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            sharding_threshold_bytes: DEFAULT_SHARDING_THRESHOLD_BYTES,
            auto_reseed: true,
            auto_reset_on_mismatch: false,
            enable_integrity_check: true,
        }
    }
}

/// Parámetros de la bóveda de persistencia.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StorageOptions {
    /// Directorio raíz de los blobs.
    pub path: PathBuf,
    /// Activa la envoltura gzip de los blobs.
    pub enable_compression: bool,
    /// Capacidad de los buffers de lectura/escritura.
    pub buffer_size_bytes: usize,
    /// Absorbe y registra los fallos de I/O de save/delete.
    pub ignore_errors: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("centinela-data"),
            enable_compression: false,
            buffer_size_bytes: DEFAULT_STORAGE_BUFFER_BYTES,
            ignore_errors: false,
        }
    }
}

/// Superficie completa de opciones reconocidas del motor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EngineOptions {
    /// Catálogo de filtros: nombre → (elementos esperados, tasa de error).
    pub filters: HashMap<String, FilterProvisioning>,
    /// Parámetros de rendimiento globales.
    pub performance: PerformanceOptions,
    /// Políticas del ciclo de vida.
    pub lifecycle: LifecycleOptions,
    /// Parámetros de la bóveda.
    pub storage: StorageOptions,
}

impl EngineOptions {
    /**
     * Deserializa la superficie completa desde un documento JSON.
     *
     * # Errors:
     * [`FilterError::InvalidConfiguration`] ante un documento malformado.
     */
    pub fn from_json_str(raw_document: &str) -> Result<Self, FilterError> {
        serde_json::from_str(raw_document).map_err(|parse_fault| {
            FilterError::InvalidConfiguration(format!("documento de opciones inválido: {parse_fault}"))
        })
    }

    /// Registra una definición de filtro en el catálogo.
    #[must_use]
    pub fn with_filter(
        mut self,
        filter_name: impl Into<String>,
        expected_items: u64,
        error_rate: f64,
    ) -> Self {
        self.filters.insert(
            filter_name.into(),
            FilterProvisioning {
                expected_items,
                error_rate,
            },
        );
        self
    }

    /**
     * Deriva la configuración completa de un filtro del catálogo.
     *
     * # Logic:
     * 1. Busca la definición nominal; su ausencia es un fallo de catálogo.
     * 2. Deriva la forma base (m, k) con la semilla global.
     * 3. Si `ceil(m/8)` supera el umbral de fragmentación, el conteo de
     *    shards es `next_power_of_two(ceil(bytes/umbral))`; si no, 1.
     *
     * # Errors:
     * [`FilterError::UnknownFilter`] para nombres fuera del catálogo;
     * [`FilterError::InvalidConfiguration`] para definiciones degeneradas.
     */
    pub fn derive_configuration(
        &self,
        filter_name: &str,
    ) -> Result<FilterConfiguration, FilterError> {
        let provisioning = self
            .filters
            .get(filter_name)
            .ok_or_else(|| FilterError::UnknownFilter(filter_name.to_string()))?;

        let base_shape = FilterConfiguration::derive(
            filter_name,
            provisioning.expected_items,
            provisioning.error_rate,
            self.performance.global_hash_seed,
            1,
        )?;

        let total_payload_bytes = base_shape.payload_length_bytes();
        let threshold_bytes = self.lifecycle.sharding_threshold_bytes.max(1);
        if total_payload_bytes <= threshold_bytes {
            return Ok(base_shape);
        }

        let required_partitions = total_payload_bytes.div_ceil(threshold_bytes);
        let shard_count = u32::try_from(required_partitions.next_power_of_two()).map_err(|_| {
            FilterError::InvalidConfiguration(format!(
                "'{filter_name}': el particionado requerido ({required_partitions}) desborda el dominio"
            ))
        })?;

        FilterConfiguration::derive(
            filter_name,
            provisioning.expected_items,
            provisioning.error_rate,
            self.performance.global_hash_seed,
            shard_count,
        )
    }

    /// Política de hidratación derivada de las opciones de ciclo de vida.
    #[must_use]
    pub fn hydration_policy(&self) -> HydrationPolicy {
        HydrationPolicy {
            enable_integrity_check: self.lifecycle.enable_integrity_check,
            auto_reset_on_mismatch: self.lifecycle.auto_reset_on_mismatch,
        }
    }

    /// Parámetros de bóveda derivados de la sección de almacenamiento.
    #[must_use]
    pub fn vault_settings(&self) -> VaultSettings {
        VaultSettings {
            root_directory: self.storage.path.clone(),
            enable_compression: self.storage.enable_compression,
            buffer_size_bytes: self.storage.buffer_size_bytes,
            ignore_errors: self.storage.ignore_errors,
        }
    }
}
