//! # CapSense Core
//!
//! Crate compartilhada que define os tipos de dados, o protocolo OSC
//! usado no wire e a configuração TOML do sistema de telemetria
//! capacitiva (Pi Cap / MPR121).
//!
//! ## Módulos
//! - [`types`] – Snapshot por ciclo dos eletrodos e thresholds de histerese
//! - [`protocol`] – Encode/decode de bundles OSC 1.0 (subconjunto int32)
//! - [`config`] – Configuração unificada via TOML

pub mod types;
pub mod protocol;
pub mod config;

// Re-exports convenientes
pub use types::{ELECTRODE_COUNT, ElectrodeReading, SensorSnapshot, Thresholds};
pub use protocol::{OscMessage, bundle_messages, decode_bundle, encode_bundle};
pub use config::{AppConfig, ReceiverConfig, SenderConfig};
