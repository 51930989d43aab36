//! # CapSense Receiver
//!
//! Monitor de terminal para a telemetria capacitiva: decodifica cada
//! bundle OSC recebido do sender e imprime o estado dos eletrodos em
//! uma linha. Útil para depurar o datastream sem um cliente OSC
//! completo.
//!
//! Saia com Ctrl-C.

mod net_thread;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use capsense_core::config::AppConfig;
use capsense_core::protocol::{ADDR_BASELINE, ADDR_DIFF, ADDR_FILTERED, ADDR_TOUCH};
use crossbeam_channel::RecvTimeoutError;
use tracing::warn;

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        let _ = config.save(&config_path);
    }

    // ── Stop flag (Ctrl-C) ──
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        }) {
            warn!("Falha ao instalar handler de Ctrl-C: {e}");
        }
    }

    // ── Thread de rede ──
    let rx = net_thread::spawn_receiver_thread(
        config.receiver.port,
        config.receiver.sender_ip.clone(),
    );

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(msg) => println!("{}", format_bundle(&msg)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Formata um bundle em uma linha: bitmap de toque + valores derivados.
///
/// As mensagens são demultiplexadas por endereço, não por posição, então
/// bundles parciais de outros senders ainda são legíveis.
fn format_bundle(msg: &net_thread::NetMessage) -> String {
    let messages = &msg.messages;
    let by_addr = |addr: &str| messages.iter().find(|m| m.address == addr);

    let bits: String = by_addr(ADDR_TOUCH)
        .map(|m| {
            m.args
                .iter()
                .map(|v| if *v != 0 { '█' } else { '·' })
                .collect()
        })
        .unwrap_or_else(|| "?".into());

    let join = |addr: &str| {
        by_addr(addr)
            .map(|m| {
                m.args
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_else(|| "?".into())
    };

    format!(
        "{} {:>4}B │ [{bits}] │ fdat {} │ bval {} │ diff {}",
        msg.source_addr,
        msg.raw_size,
        join(ADDR_FILTERED),
        join(ADDR_BASELINE),
        join(ADDR_DIFF),
    )
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use capsense_core::protocol::OscMessage;
    use net_thread::NetMessage;

    #[test]
    fn format_shows_touch_bitmap_and_diffs() {
        let msg = NetMessage {
            messages: vec![
                OscMessage::new(ADDR_TOUCH, vec![1, 0, 1]),
                OscMessage::new(ADDR_FILTERED, vec![100, 200, 150]),
                OscMessage::new(ADDR_BASELINE, vec![110, 205, 140]),
                OscMessage::new(ADDR_DIFF, vec![10, 5, -10]),
            ],
            source_addr: "192.168.0.12".into(),
            raw_size: 200,
        };
        let line = format_bundle(&msg);
        assert!(line.contains("█·█"));
        assert!(line.contains("diff 10 5 -10"));
        assert!(line.starts_with("192.168.0.12"));
    }

    #[test]
    fn format_tolerates_missing_messages() {
        let msg = NetMessage {
            messages: vec![],
            source_addr: "10.0.0.1".into(),
            raw_size: 16,
        };
        let line = format_bundle(&msg);
        assert!(line.contains("[?]"));
        assert!(line.contains("diff ?"));
    }
}
