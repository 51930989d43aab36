//! Configuração unificada via TOML.
//!
//! Substitui os argumentos soltos do script Python por um único
//! `config.toml`; host e porta ainda podem ser sobrescritos pela linha
//! de comando do sender.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::Thresholds;

/// Configuração do Sender (Raspberry Pi com o Pi Cap).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Host de destino dos bundles OSC
    pub host: String,
    /// Porta UDP de destino
    pub port: u16,
    /// Intervalo entre ciclos em segundos (limita uso de CPU)
    pub interval_secs: f64,
    /// Threshold de toque (baixo ≈ gatilho de proximidade)
    pub touch_threshold: u8,
    /// Threshold de soltura – SEMPRE menor que o de toque
    pub release_threshold: u8,
    /// Barramento I2C do MPR121 (1 no Raspberry Pi)
    pub i2c_bus: u8,
    /// Endereço I2C do MPR121 (0x5C no Pi Cap)
    pub i2c_address: u8,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            interval_secs: 0.01,
            touch_threshold: 40,
            release_threshold: 20,
            i2c_bus: 1,
            i2c_address: 0x5C,
        }
    }
}

impl SenderConfig {
    /// Par de thresholds imutável usado durante toda a vida do processo.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            touch: self.touch_threshold,
            release: self.release_threshold,
        }
    }
}

/// Configuração do Receiver (monitor de terminal).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Porta UDP para escutar
    pub port: u16,
    /// IP do sender (vazio = aceita qualquer origem)
    pub sender_ip: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            sender_ip: String::new(),
        }
    }
}

/// Configuração raiz do aplicativo (unifica sender e receiver).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub receiver: ReceiverConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sender.port == 0 {
            errors.push("Porta do sender não pode ser 0".into());
        }
        if self.sender.interval_secs < 0.001 || self.sender.interval_secs > 60.0 {
            errors.push(format!(
                "Intervalo do sender inválido: {} (0.001–60.0)",
                self.sender.interval_secs
            ));
        }
        if self.sender.release_threshold >= self.sender.touch_threshold {
            errors.push(format!(
                "Threshold de soltura ({}) deve ser menor que o de toque ({})",
                self.sender.release_threshold, self.sender.touch_threshold
            ));
        }
        if !(0x5A..=0x5D).contains(&self.sender.i2c_address) {
            errors.push(format!(
                "Endereço I2C improvável para MPR121: 0x{:02X} (esperado 0x5A–0x5D)",
                self.sender.i2c_address
            ));
        }
        if self.receiver.port == 0 {
            errors.push("Porta do receiver não pode ser 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.sender.port, parsed.sender.port);
        assert_eq!(config.sender.i2c_address, parsed.sender.i2c_address);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[sender]
port = 8000
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.sender.port, 8000);
        // Outros campos devem ter valor padrão
        assert_eq!(config.sender.host, "127.0.0.1");
        assert_eq!(config.sender.interval_secs, 0.01);
        assert_eq!(config.receiver.port, 3000);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = AppConfig::default();
        config.sender.touch_threshold = 20;
        config.sender.release_threshold = 40;
        assert!(!config.validate().is_empty());
    }

    #[test]
    fn equal_thresholds_are_rejected() {
        // A banda de histerese exige release estritamente menor
        let mut config = AppConfig::default();
        config.sender.touch_threshold = 30;
        config.sender.release_threshold = 30;
        assert!(!config.validate().is_empty());
    }

    #[test]
    fn implausible_i2c_address_is_rejected() {
        let mut config = AppConfig::default();
        config.sender.i2c_address = 0x10;
        assert!(!config.validate().is_empty());
    }

    #[test]
    fn thresholds_accessor_copies_config() {
        let config = SenderConfig::default();
        let t = config.thresholds();
        assert_eq!(t.touch, 40);
        assert_eq!(t.release, 20);
    }
}
