//! Driver do MPR121 (NXP) – controlador de toque capacitivo de 12
//! eletrodos, atrás de `embedded_hal::i2c::I2c`.
//!
//! Cobre só o que a telemetria consome: reset + probe, tuning de
//! baseline do datasheet, thresholds por eletrodo e leitura dos
//! registros de status/filtered/baseline. O cálculo de baseline e a
//! filtragem acontecem dentro do chip; aqui só se leem os resultados.
//!
//! No Raspberry Pi o `I2C` concreto é `rppal::i2c::I2c`; qualquer
//! implementação de `embedded_hal::i2c::I2c` serve (os testes usam um
//! mock de mapa de registros).

use embedded_hal::i2c::{Error as _, I2c};

use capsense_core::types::ELECTRODE_COUNT;

use crate::sensor::{SensorError, TouchSensor};

// ──────────────────────────────────────────────
// Mapa de registros
// ──────────────────────────────────────────────

const REG_TOUCH_STATUS_L: u8 = 0x00;
const REG_FILTERED_BASE: u8 = 0x04;
const REG_BASELINE_BASE: u8 = 0x1E;

// Filtros de baseline (rising / falling / touched)
const REG_MHD_RISING: u8 = 0x2B;
const REG_NHD_RISING: u8 = 0x2C;
const REG_NCL_RISING: u8 = 0x2D;
const REG_FDL_RISING: u8 = 0x2E;
const REG_MHD_FALLING: u8 = 0x2F;
const REG_NHD_FALLING: u8 = 0x30;
const REG_NCL_FALLING: u8 = 0x31;
const REG_FDL_FALLING: u8 = 0x32;
const REG_NHD_TOUCHED: u8 = 0x33;
const REG_NCL_TOUCHED: u8 = 0x34;
const REG_FDL_TOUCHED: u8 = 0x35;

const REG_TOUCH_THRESHOLD_BASE: u8 = 0x41;
const REG_RELEASE_THRESHOLD_BASE: u8 = 0x42;
const REG_DEBOUNCE: u8 = 0x5B;
const REG_AFE_CONFIG1: u8 = 0x5C;
const REG_AFE_CONFIG2: u8 = 0x5D;
const REG_ECR: u8 = 0x5E;
const REG_SOFT_RESET: u8 = 0x80;

const SOFT_RESET_MAGIC: u8 = 0x63;
/// CONFIG2 volta para este valor depois de um soft reset; usado como
/// probe de presença do chip.
const CONFIG2_RESET_VALUE: u8 = 0x24;
/// ECR: baseline tracking ligado + 12 eletrodos habilitados.
const ECR_RUN: u8 = 0x8F;
const ECR_STOP: u8 = 0x00;
/// Máscara dos 12 bits de eletrodo no status de toque (bits 12–15 são
/// overcurrent/out-of-range).
const TOUCH_STATUS_MASK: u16 = 0x0FFF;

// ──────────────────────────────────────────────
// Driver
// ──────────────────────────────────────────────

/// Driver do MPR121. Dono dos caches expostos por [`TouchSensor`].
#[derive(Debug)]
pub struct Mpr121<I2C> {
    i2c: I2C,
    address: u8,
    running: bool,
    /// Status cru da última sondagem (memória do "estado anterior")
    raw_status: u16,
    /// Cache exposto por `get_touch`
    touch_cache: u16,
    filtered: [u16; ELECTRODE_COUNT],
    baseline: [u16; ELECTRODE_COUNT],
}

impl<I2C: I2c> Mpr121<I2C> {
    /// Inicializa o MPR121: soft reset, probe de presença, tuning de
    /// baseline e modo run com os 12 eletrodos habilitados.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, SensorError> {
        let mut dev = Self {
            i2c,
            address,
            running: false,
            raw_status: 0,
            touch_cache: 0,
            filtered: [0; ELECTRODE_COUNT],
            baseline: [0; ELECTRODE_COUNT],
        };

        dev.bus_write(REG_SOFT_RESET, SOFT_RESET_MAGIC)?;
        dev.bus_write(REG_ECR, ECR_STOP)?;

        let config2 = dev.bus_read(REG_AFE_CONFIG2)?;
        if config2 != CONFIG2_RESET_VALUE {
            return Err(SensorError::NotFound { address, config2 });
        }

        dev.apply_default_tuning()?;
        dev.bus_write(REG_ECR, ECR_RUN)?;
        dev.running = true;
        Ok(dev)
    }

    /// Valores de MHD/NHD/NCL/FDL recomendados pelo datasheet para
    /// eletrodos expostos.
    fn apply_default_tuning(&mut self) -> Result<(), SensorError> {
        self.bus_write(REG_MHD_RISING, 0x01)?;
        self.bus_write(REG_NHD_RISING, 0x01)?;
        self.bus_write(REG_NCL_RISING, 0x0E)?;
        self.bus_write(REG_FDL_RISING, 0x00)?;

        self.bus_write(REG_MHD_FALLING, 0x01)?;
        self.bus_write(REG_NHD_FALLING, 0x05)?;
        self.bus_write(REG_NCL_FALLING, 0x01)?;
        self.bus_write(REG_FDL_FALLING, 0x00)?;

        self.bus_write(REG_NHD_TOUCHED, 0x00)?;
        self.bus_write(REG_NCL_TOUCHED, 0x00)?;
        self.bus_write(REG_FDL_TOUCHED, 0x00)?;

        self.bus_write(REG_DEBOUNCE, 0x00)?;
        self.bus_write(REG_AFE_CONFIG1, 0x10)?;
        self.bus_write(REG_AFE_CONFIG2, CONFIG2_RESET_VALUE)?;
        Ok(())
    }

    /// Escreve `value` em `base + 2i` para cada eletrodo. Os registros
    /// de threshold só aceitam escrita em stop mode; o modo run é
    /// restaurado em seguida.
    fn write_threshold_bank(&mut self, base: u8, value: u8) -> Result<(), SensorError> {
        let was_running = self.running;
        if was_running {
            self.bus_write(REG_ECR, ECR_STOP)?;
        }
        for i in 0..ELECTRODE_COUNT as u8 {
            self.bus_write(base + 2 * i, value)?;
        }
        if was_running {
            self.bus_write(REG_ECR, ECR_RUN)?;
        }
        Ok(())
    }

    fn read_raw_status(&mut self) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.bus_read_many(REG_TOUCH_STATUS_L, &mut buf)?;
        Ok(status_from_bytes(buf[0], buf[1]))
    }

    fn bus_read(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.bus_read_many(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn bus_read_many(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|e| SensorError::Bus(e.kind()))
    }

    fn bus_write(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| SensorError::Bus(e.kind()))
    }
}

impl<I2C: I2c> TouchSensor for Mpr121<I2C> {
    fn electrode_count(&self) -> usize {
        ELECTRODE_COUNT
    }

    fn set_touch_threshold(&mut self, value: u8) -> Result<(), SensorError> {
        self.write_threshold_bank(REG_TOUCH_THRESHOLD_BASE, value)
    }

    fn set_release_threshold(&mut self, value: u8) -> Result<(), SensorError> {
        self.write_threshold_bank(REG_RELEASE_THRESHOLD_BASE, value)
    }

    fn touch_status_changed(&mut self) -> Result<bool, SensorError> {
        let status = self.read_raw_status()?;
        let changed = status != self.raw_status;
        self.raw_status = status;
        Ok(changed)
    }

    fn update_touch_data(&mut self) -> Result<(), SensorError> {
        self.touch_cache = self.read_raw_status()?;
        Ok(())
    }

    fn update_baseline_data(&mut self) -> Result<(), SensorError> {
        let mut buf = [0u8; ELECTRODE_COUNT];
        self.bus_read_many(REG_BASELINE_BASE, &mut buf)?;
        for (value, raw) in self.baseline.iter_mut().zip(buf.iter()) {
            *value = baseline_from_byte(*raw);
        }
        Ok(())
    }

    fn update_filtered_data(&mut self) -> Result<(), SensorError> {
        let mut buf = [0u8; 2 * ELECTRODE_COUNT];
        self.bus_read_many(REG_FILTERED_BASE, &mut buf)?;
        for (i, value) in self.filtered.iter_mut().enumerate() {
            *value = filtered_from_bytes(buf[2 * i], buf[2 * i + 1]);
        }
        Ok(())
    }

    fn get_touch(&self, index: usize) -> Result<bool, SensorError> {
        if index >= ELECTRODE_COUNT {
            return Err(SensorError::BadIndex(index));
        }
        Ok(self.touch_cache >> index & 1 == 1)
    }

    fn get_filtered(&self, index: usize) -> Result<u16, SensorError> {
        self.filtered
            .get(index)
            .copied()
            .ok_or(SensorError::BadIndex(index))
    }

    fn get_baseline(&self, index: usize) -> Result<u16, SensorError> {
        self.baseline
            .get(index)
            .copied()
            .ok_or(SensorError::BadIndex(index))
    }
}

// ──────────────────────────────────────────────
// Decodificação de registros
// ──────────────────────────────────────────────

/// Combina os dois registros de status em um bitmap de 12 eletrodos.
fn status_from_bytes(lo: u8, hi: u8) -> u16 {
    (u16::from(hi) << 8 | u16::from(lo)) & TOUCH_STATUS_MASK
}

/// Valor filtrado de 10 bits a partir do par LSB/MSB.
fn filtered_from_bytes(lo: u8, hi: u8) -> u16 {
    (u16::from(hi) << 8 | u16::from(lo)) & 0x03FF
}

/// O registro de baseline guarda os 8 bits altos do valor de 10 bits.
fn baseline_from_byte(raw: u8) -> u16 {
    u16::from(raw) << 2
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
