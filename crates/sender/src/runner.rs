//! Loop principal: amostra → encode → transmite, em cadência fixa.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use capsense_core::protocol::{bundle_messages, encode_bundle};
use capsense_core::types::Thresholds;
use tracing::{debug, warn};

use crate::error::SenderError;
use crate::reader::collect_snapshot;
use crate::sensor::TouchSensor;
use crate::transport::Transport;

/// Executa o loop de telemetria até o flag de parada ser sinalizado.
///
/// Cada iteração constrói e envia um bundle completo, nunca parcial.
/// Falhas de envio são transitórias: o bundle do ciclo é descartado com
/// um `warn!` e o loop segue, sem retry nem buffering. Falhas de
/// leitura do sensor são fatais e propagam. O delay é incondicional e
/// existe só para limitar uso de CPU; o flag é observado a cada
/// iteração, então a parada acontece dentro de um intervalo.
pub fn run_loop<S, T>(
    sensor: &mut S,
    transport: &T,
    thresholds: Thresholds,
    interval: Duration,
    stop: &AtomicBool,
) -> Result<(), SenderError>
where
    S: TouchSensor,
    T: Transport,
{
    while !stop.load(Ordering::SeqCst) {
        let cycle_start = Instant::now();

        let snapshot = collect_snapshot(sensor)?;
        let frame = encode_bundle(&bundle_messages(&snapshot, &thresholds));

        match transport.send_frame(&frame) {
            Ok(sent) => debug!("→ {sent} bytes ({} eletrodos)", snapshot.electrodes.len()),
            Err(e) => warn!("Falha ao enviar bundle (descartado): {e}"),
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
