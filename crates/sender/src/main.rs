//! # CapSense Sender
//!
//! Lê o sensor capacitivo MPR121 do Pi Cap e transmite o estado dos 12
//! eletrodos como bundles OSC via UDP, em ciclo fixo de ~10ms.
//! Porta do datastream Python (liblo) para Rust.
//!
//! ## Uso
//! ```bash
//! sudo capsense_sender                        # 127.0.0.1:3000
//! sudo capsense_sender -h 192.168.0.12 -p 8000
//! ```
//!
//! Requer privilégios de acesso ao barramento I2C.

mod error;
mod mpr121;
mod reader;
mod runner;
mod sensor;
mod transport;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use capsense_core::config::{AppConfig, SenderConfig};
use tracing::{error, info, warn};

use error::SenderError;
use sensor::TouchSensor;

const USAGE: &str = "\
Envia leituras do Pi Cap via OSC – requer acesso ao I2C (root).

Uso: capsense_sender [-h HOST] [-p PORT]

  -h, --host   endereço de destino (padrão: 127.0.0.1)
  -p, --port   porta UDP de destino (padrão: 3000)
      --help   mostra esta mensagem";

/// Overrides de linha de comando por cima do config.toml.
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    host: Option<String>,
    port: Option<u16>,
    help: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut cli = CliArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--host" => {
                    cli.host = Some(args.next().ok_or_else(|| format!("{arg} exige um valor"))?);
                }
                "-p" | "--port" => {
                    let value = args.next().ok_or_else(|| format!("{arg} exige um valor"))?;
                    cli.port =
                        Some(value.parse().map_err(|_| format!("Porta inválida: {value}"))?);
                }
                "--help" => cli.help = true,
                other => return Err(format!("Argumento desconhecido: {other}")),
            }
        }
        Ok(cli)
    }
}

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── CLI ──
    let cli = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if cli.help {
        println!("{USAGE}");
        return;
    }

    if !is_root() {
        warn!("Rodando sem root – o acesso ao I2C pode falhar");
    }

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(host) = cli.host {
        config.sender.host = host;
    }
    if let Some(port) = cli.port {
        config.sender.port = port;
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

    // Única decisão de término do processo
    if let Err(e) = run(&config, &stop) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: &AppConfig, stop: &AtomicBool) -> Result<(), SenderError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(SenderError::Config(errors.join("; ")));
    }
    let cfg = &config.sender;

    // ── Endpoint (resolvido uma vez, imutável até o fim) ──
    let dest = transport::resolve_endpoint(&cfg.host, cfg.port)?;
    let transport = transport::UdpTransport::new(dest)?;

    // ── Sensor ──
    let i2c = rppal::i2c::I2c::with_bus(cfg.i2c_bus).map_err(|source| SenderError::I2cOpen {
        bus: cfg.i2c_bus,
        source,
    })?;
    let mut sensor = mpr121::Mpr121::new(i2c, cfg.i2c_address)?;

    let thresholds = cfg.thresholds();
    sensor.set_touch_threshold(thresholds.touch)?;
    sensor.set_release_threshold(thresholds.release)?;
    info!(
        "MPR121 inicializado em 0x{:02X} (thresholds {}/{})",
        cfg.i2c_address, thresholds.touch, thresholds.release
    );

    banner(cfg, dest);

    runner::run_loop(
        &mut sensor,
        &transport,
        thresholds,
        Duration::from_secs_f64(cfg.interval_secs),
        stop,
    )
}

fn banner(cfg: &SenderConfig, dest: SocketAddr) {
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ CAPSENSE SENDER – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Destino:    {dest}");
    println!("  Intervalo:  {:.0}ms", cfg.interval_secs * 1000.0);
    println!(
        "  Thresholds: toque {} / soltura {}",
        cfg.touch_threshold, cfg.release_threshold
    );
    println!("  Protocolo:  OSC 1.0 (bundles int32)");
    println!("══════════════════════════════════════════════");
    println!();
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    true
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_means_no_overrides() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli, CliArgs::default());
    }

    #[test]
    fn host_and_port_short_flags() {
        let cli = parse(&["-h", "192.168.0.12", "-p", "8000"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("192.168.0.12"));
        assert_eq!(cli.port, Some(8000));
    }

    #[test]
    fn long_flags_work_too() {
        let cli = parse(&["--host", "10.0.0.1", "--port", "3000"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.port, Some(3000));
    }

    #[test]
    fn missing_value_is_an_error() {
        assert!(parse(&["-h"]).is_err());
        assert!(parse(&["--port"]).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(parse(&["-p", "muitos"]).is_err());
        assert!(parse(&["-p", "70000"]).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn help_flag_is_recognized() {
        assert!(parse(&["--help"]).unwrap().help);
    }
}
