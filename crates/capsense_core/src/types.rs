//! Tipos de dados da telemetria capacitiva.
//!
//! Cada ciclo produz um snapshot efêmero dos N eletrodos, consumido e
//! descartado na mesma iteração. Nada é retido entre ciclos: a memória
//! de "estado de toque anterior" pertence ao driver do sensor.

// ──────────────────────────────────────────────
// Eletrodos
// ──────────────────────────────────────────────

/// Número de eletrodos do MPR121 no deployment de referência (Pi Cap).
pub const ELECTRODE_COUNT: usize = 12;

/// Leitura de um eletrodo em um ciclo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElectrodeReading {
    /// Estado discreto de toque
    pub touched: bool,
    /// Valor filtrado (10 bits, 0–1023)
    pub filtered: u16,
    /// Baseline – referência lenta do eletrodo sem toque
    pub baseline: u16,
}

/// Snapshot consistente de todos os eletrodos em um ciclo.
///
/// As leituras são tiradas depois dos refreshes do driver, então o
/// estado de toque e os valores analógicos são mutuamente consistentes
/// dentro do ciclo. A ordem dos índices é significativa: o índice `i`
/// refere-se ao mesmo eletrodo em todas as seis mensagens do bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    pub electrodes: Vec<ElectrodeReading>,
}

impl SensorSnapshot {
    /// Diferença `baseline − filtered` do eletrodo `index`, com sinal e
    /// sem clamp. Positivo normalmente indica queda do valor filtrado
    /// induzida por toque, dependendo da polaridade do sensor.
    pub fn diff(&self, index: usize) -> i32 {
        let e = &self.electrodes[index];
        i32::from(e.baseline) - i32::from(e.filtered)
    }
}

// ──────────────────────────────────────────────
// Thresholds
// ──────────────────────────────────────────────

/// Par de thresholds de histerese, constante durante a vida do processo.
///
/// `release` deve ser estritamente menor que `touch` para evitar
/// oscilação na transição toque/soltura. A validação acontece uma vez
/// no startup, via [`crate::config::AppConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Threshold de toque (baixo ≈ gatilho de proximidade)
    pub touch: u8,
    /// Threshold de soltura
    pub release: u8,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_empty() {
        let s = SensorSnapshot::default();
        assert!(s.electrodes.is_empty());
    }

    #[test]
    fn diff_preserves_sign() {
        let s = SensorSnapshot {
            electrodes: vec![
                ElectrodeReading {
                    touched: true,
                    filtered: 100,
                    baseline: 110,
                },
                ElectrodeReading {
                    touched: false,
                    filtered: 150,
                    baseline: 140,
                },
            ],
        };
        assert_eq!(s.diff(0), 10);
        assert_eq!(s.diff(1), -10);
    }

    #[test]
    fn diff_handles_full_range() {
        // Extremos dos 10 bits não podem estourar
        let s = SensorSnapshot {
            electrodes: vec![ElectrodeReading {
                touched: false,
                filtered: 1023,
                baseline: 0,
            }],
        };
        assert_eq!(s.diff(0), -1023);
    }
}
