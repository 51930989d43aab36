//! Transporte UDP fire-and-forget dos bundles.
//!
//! Sem ack, sem retry, sem verificação de entrega: telemetria obsoleta
//! é pior que telemetria perdida neste domínio.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::info;

use crate::error::SenderError;

/// Destino de frames já codificados.
pub trait Transport {
    /// Envia um frame em melhor esforço; retorna os bytes escritos.
    fn send_frame(&self, frame: &[u8]) -> io::Result<usize>;
}

/// Resolve o endpoint de destino. Chamado uma única vez no startup;
/// falha aqui é fatal (diferente de erros de envio por pacote).
pub fn resolve_endpoint(host: &str, port: u16) -> Result<SocketAddr, SenderError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| SenderError::Resolve(format!("{host}:{port} ({e})")))?
        .next()
        .ok_or_else(|| SenderError::Resolve(format!("{host}:{port} (sem endereços)")))
}

/// Socket UDP com destino fixo para a vida do processo.
pub struct UdpTransport {
    sock: UdpSocket,
    dest: SocketAddr,
}

impl UdpTransport {
    pub fn new(dest: SocketAddr) -> Result<Self, SenderError> {
        let sock = UdpSocket::bind("0.0.0.0:0")?;
        sock.set_nonblocking(true)?;
        info!("Socket UDP criado → {dest}");
        Ok(Self { sock, dest })
    }
}

impl Transport for UdpTransport {
    fn send_frame(&self, frame: &[u8]) -> io::Result<usize> {
        self.sock.send_to(frame, self.dest)
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn resolves_loopback() {
        let addr = resolve_endpoint("127.0.0.1", 3000).unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn rejects_unresolvable_host() {
        assert!(matches!(
            resolve_endpoint("host.invalido.exemplo.", 3000),
            Err(SenderError::Resolve(_))
        ));
    }

    #[test]
    fn frame_arrives_via_loopback() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let dest = receiver.local_addr().unwrap();

        let transport = UdpTransport::new(dest).unwrap();
        let frame = b"#bundle\0teste";
        let sent = transport.send_frame(frame).unwrap();
        assert_eq!(sent, frame.len());

        let mut buf = [0u8; 64];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..size], frame);
    }
}
