//! Leitor de canais – um snapshot consistente por ciclo.

use capsense_core::types::{ElectrodeReading, SensorSnapshot};

use crate::sensor::{SensorError, TouchSensor};

/// Produz o snapshot de um ciclo a partir do driver.
///
/// O cache de toque só é atualizado quando o driver reporta transição
/// discreta; baseline e filtered são leituras analógicas contínuas e
/// são atualizadas em todo ciclo. As leituras por eletrodo acontecem
/// depois dos dois refreshes, então o estado de toque e os valores
/// analógicos são consistentes entre si dentro do ciclo.
///
/// Sem retries: qualquer falha do driver propaga como fatal.
pub fn collect_snapshot<S: TouchSensor>(sensor: &mut S) -> Result<SensorSnapshot, SensorError> {
    if sensor.touch_status_changed()? {
        sensor.update_touch_data()?;
    }
    sensor.update_baseline_data()?;
    sensor.update_filtered_data()?;

    let mut electrodes = Vec::with_capacity(sensor.electrode_count());
    for i in 0..sensor.electrode_count() {
        electrodes.push(ElectrodeReading {
            touched: sensor.get_touch(i)?,
            filtered: sensor.get_filtered(i)?,
            baseline: sensor.get_baseline(i)?,
        });
    }
    Ok(SensorSnapshot { electrodes })
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
