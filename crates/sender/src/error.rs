//! Erros do sender.
//!
//! Falhas de startup (config, I2C, resolução de endpoint) e falhas de
//! leitura do sensor durante o ciclo são fatais; a decisão de terminar
//! fica centralizada no `main`. Falhas de envio UDP NÃO aparecem aqui:
//! são transitórias e tratadas dentro do loop.

use crate::sensor::SensorError;

#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Falha ao abrir o barramento I2C {bus}: {source}")]
    I2cOpen {
        bus: u8,
        #[source]
        source: rppal::i2c::Error,
    },

    #[error("Sensor: {0}")]
    Sensor(#[from] SensorError),

    #[error("Endereço de destino inválido: {0}")]
    Resolve(String),

    #[error("Falha ao criar socket UDP: {0}")]
    Socket(#[from] std::io::Error),
}
