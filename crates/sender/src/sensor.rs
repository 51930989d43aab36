//! Interface estreita do driver de toque capacitivo.
//!
//! O driver é uma capability stateful opaca: ele é dono dos caches de
//! toque/baseline/filtered e da memória de "status anterior" usada por
//! [`TouchSensor::touch_status_changed`]. O loop de telemetria nunca
//! duplica essa memória, só consome as operações abaixo.

/// Erros do driver de sensor.
///
/// Qualquer falha de leitura é fatal para o ciclo: não existe semântica
/// de dado degradado, e dado obsoleto nunca é substituído em silêncio.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Erro no barramento I2C: {0}")]
    Bus(embedded_hal::i2c::ErrorKind),

    #[error("MPR121 não encontrado no endereço 0x{address:02X} (CONFIG2 = 0x{config2:02X})")]
    NotFound { address: u8, config2: u8 },

    #[error("Índice de eletrodo inválido: {0}")]
    BadIndex(usize),
}

/// Capacidades do driver consumidas pelo reader e pelo loop.
pub trait TouchSensor {
    /// Número de eletrodos endereçáveis.
    fn electrode_count(&self) -> usize;

    /// Define o threshold de toque de todos os eletrodos.
    fn set_touch_threshold(&mut self, value: u8) -> Result<(), SensorError>;

    /// Define o threshold de soltura de todos os eletrodos.
    fn set_release_threshold(&mut self, value: u8) -> Result<(), SensorError>;

    /// O estado discreto de toque mudou desde a última sondagem?
    fn touch_status_changed(&mut self) -> Result<bool, SensorError>;

    /// Atualiza o cache de toque a partir do hardware.
    fn update_touch_data(&mut self) -> Result<(), SensorError>;

    /// Atualiza o cache de baseline a partir do hardware.
    fn update_baseline_data(&mut self) -> Result<(), SensorError>;

    /// Atualiza o cache de valores filtrados a partir do hardware.
    fn update_filtered_data(&mut self) -> Result<(), SensorError>;

    /// Estado de toque do eletrodo `index`, do cache.
    fn get_touch(&self, index: usize) -> Result<bool, SensorError>;

    /// Valor filtrado do eletrodo `index`, do cache.
    fn get_filtered(&self, index: usize) -> Result<u16, SensorError>;

    /// Baseline do eletrodo `index`, do cache.
    fn get_baseline(&self, index: usize) -> Result<u16, SensorError>;
}

// ──────────────────────────────────────────────
// Stub para testes
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use super::{SensorError, TouchSensor};

    /// Driver falso com contadores de refresh, para testar o contrato
    /// do reader e do loop sem hardware.
    pub struct StubSensor {
        pub touch: Vec<bool>,
        pub filtered: Vec<u16>,
        pub baseline: Vec<u16>,
        pub status_changed: bool,
        pub touch_updates: usize,
        pub baseline_updates: usize,
        pub filtered_updates: usize,
        pub cycles: usize,
        pub fail_reads: bool,
    }

    impl StubSensor {
        pub fn new(touch: Vec<bool>, filtered: Vec<u16>, baseline: Vec<u16>) -> Self {
            Self {
                touch,
                filtered,
                baseline,
                status_changed: true,
                touch_updates: 0,
                baseline_updates: 0,
                filtered_updates: 0,
                cycles: 0,
                fail_reads: false,
            }
        }

        fn check(&self) -> Result<(), SensorError> {
            if self.fail_reads {
                Err(SensorError::Bus(embedded_hal::i2c::ErrorKind::Other))
            } else {
                Ok(())
            }
        }
    }

    impl TouchSensor for StubSensor {
        fn electrode_count(&self) -> usize {
            self.touch.len()
        }

        fn set_touch_threshold(&mut self, _value: u8) -> Result<(), SensorError> {
            self.check()
        }

        fn set_release_threshold(&mut self, _value: u8) -> Result<(), SensorError> {
            self.check()
        }

        fn touch_status_changed(&mut self) -> Result<bool, SensorError> {
            self.check()?;
            self.cycles += 1;
            Ok(self.status_changed)
        }

        fn update_touch_data(&mut self) -> Result<(), SensorError> {
            self.check()?;
            self.touch_updates += 1;
            Ok(())
        }

        fn update_baseline_data(&mut self) -> Result<(), SensorError> {
            self.check()?;
            self.baseline_updates += 1;
            Ok(())
        }

        fn update_filtered_data(&mut self) -> Result<(), SensorError> {
            self.check()?;
            self.filtered_updates += 1;
            Ok(())
        }

        fn get_touch(&self, index: usize) -> Result<bool, SensorError> {
            self.check()?;
            self.touch
                .get(index)
                .copied()
                .ok_or(SensorError::BadIndex(index))
        }

        fn get_filtered(&self, index: usize) -> Result<u16, SensorError> {
            self.check()?;
            self.filtered
                .get(index)
                .copied()
                .ok_or(SensorError::BadIndex(index))
        }

        fn get_baseline(&self, index: usize) -> Result<u16, SensorError> {
            self.check()?;
            self.baseline
                .get(index)
                .copied()
                .ok_or(SensorError::BadIndex(index))
        }
    }
}
