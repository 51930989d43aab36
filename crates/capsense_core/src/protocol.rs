//! Protocolo de comunicação OSC 1.0.
//!
//! Substitui o liblo do Python por um codec próprio. Só o subconjunto
//! usado pela telemetria é suportado: bundles contendo mensagens com
//! argumentos int32.
//!
//! Formato de uma mensagem:
//!
//! ```text
//! ┌──────────────┬───────────────┬───────────────┐
//! │ Address (4n) │ ",iii…" (4n)  │ int32 BE × N  │
//! └──────────────┴───────────────┴───────────────┘
//! ```
//!
//! Formato do bundle:
//!
//! ```text
//! ┌─────────────┬─────────────┬──────────────────────────┐
//! │ "#bundle\0" │ Timetag (8) │ [size(4) + mensagem] × M │
//! └─────────────┴─────────────┴──────────────────────────┘
//! ```
//!
//! Strings são terminadas em NUL e padded para múltiplos de 4 bytes.
//! Inteiros são big-endian. O timetag é sempre "imediato" (1).

use crate::types::{SensorSnapshot, Thresholds};

/// Endereços das seis mensagens do bundle, na ordem de transmissão.
pub const ADDR_TOUCH: &str = "/touch";
pub const ADDR_TOUCH_THRESHOLD: &str = "/tths";
pub const ADDR_RELEASE_THRESHOLD: &str = "/rths";
pub const ADDR_FILTERED: &str = "/fdat";
pub const ADDR_BASELINE: &str = "/bval";
pub const ADDR_DIFF: &str = "/diff";

/// Tag que abre todo bundle OSC (já inclui o NUL de terminação).
const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Timetag "imediato" do OSC 1.0.
const TIMETAG_IMMEDIATE: u64 = 1;

/// Header do bundle: tag (8) + timetag (8).
const BUNDLE_HEADER_SIZE: usize = 16;

/// Tamanho máximo de datagrama UDP sem fragmentação (MTU Ethernet).
pub const MAX_DATAGRAM: usize = 1472;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Pacote muito curto ({0} bytes, mínimo {BUNDLE_HEADER_SIZE})")]
    TooShort(usize),

    #[error("Tag de bundle ausente (esperado \"#bundle\")")]
    MissingBundleTag,

    #[error("Elemento do bundle truncado (declarado {declared}, restante {remaining})")]
    TruncatedElement { declared: usize, remaining: usize },

    #[error("Bundle aninhado não suportado")]
    NestedBundle,

    #[error("String OSC inválida (sem NUL ou não-ASCII)")]
    InvalidString,

    #[error("Type tag deve começar com ',' (obtido {0:?})")]
    InvalidTypeTag(char),

    #[error("Tipo de argumento não suportado: {0:?} (apenas int32)")]
    UnsupportedType(char),

    #[error("Argumentos truncados ({missing} bytes faltando)")]
    TruncatedArgs { missing: usize },
}

/// Mensagem OSC endereçada com argumentos int32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<i32>,
}

impl OscMessage {
    pub fn new(address: &str, args: Vec<i32>) -> Self {
        Self {
            address: address.to_string(),
            args,
        }
    }
}

// ──────────────────────────────────────────────
// Encode
// ──────────────────────────────────────────────

/// Escreve uma string OSC: bytes + NUL, padded para múltiplo de 4.
fn push_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Codifica uma mensagem OSC isolada (sem o prefixo de tamanho).
pub fn encode_message(msg: &OscMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.address.len() + msg.args.len() * 4 + 8);
    push_padded_str(&mut buf, &msg.address);

    let mut type_tag = String::with_capacity(msg.args.len() + 1);
    type_tag.push(',');
    for _ in &msg.args {
        type_tag.push('i');
    }
    push_padded_str(&mut buf, &type_tag);

    for arg in &msg.args {
        buf.extend_from_slice(&arg.to_be_bytes());
    }
    buf
}

/// Codifica um bundle OSC completo para transmissão UDP.
///
/// As mensagens são emitidas na ordem recebida, cada uma prefixada pelo
/// próprio tamanho em int32 big-endian.
pub fn encode_bundle(messages: &[OscMessage]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_DATAGRAM);
    buf.extend_from_slice(BUNDLE_TAG);
    buf.extend_from_slice(&TIMETAG_IMMEDIATE.to_be_bytes());
    for msg in messages {
        let encoded = encode_message(msg);
        buf.extend_from_slice(&(encoded.len() as u32).to_be_bytes());
        buf.extend_from_slice(&encoded);
    }
    buf
}

// ──────────────────────────────────────────────
// Decode
// ──────────────────────────────────────────────

/// Separa uma string OSC do início de `data`, devolvendo o resto já sem
/// o padding.
fn split_padded_str(data: &[u8]) -> Result<(&str, &[u8]), ProtocolError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(ProtocolError::InvalidString)?;
    let s = std::str::from_utf8(&data[..nul]).map_err(|_| ProtocolError::InvalidString)?;
    // NUL + padding até a próxima fronteira de 4 bytes
    let consumed = (nul + 4) & !3;
    if consumed > data.len() {
        return Err(ProtocolError::TooShort(data.len()));
    }
    Ok((s, &data[consumed..]))
}

/// Decodifica uma mensagem OSC isolada (sem o prefixo de tamanho).
pub fn decode_message(data: &[u8]) -> Result<OscMessage, ProtocolError> {
    let (address, rest) = split_padded_str(data)?;
    if address.starts_with('#') {
        return Err(ProtocolError::NestedBundle);
    }

    let (type_tag, mut rest) = split_padded_str(rest)?;
    let mut tags = type_tag.chars();
    match tags.next() {
        Some(',') => {}
        other => return Err(ProtocolError::InvalidTypeTag(other.unwrap_or('\0'))),
    }

    let mut args = Vec::with_capacity(type_tag.len() - 1);
    for tag in tags {
        if tag != 'i' {
            return Err(ProtocolError::UnsupportedType(tag));
        }
        if rest.len() < 4 {
            return Err(ProtocolError::TruncatedArgs {
                missing: 4 - rest.len(),
            });
        }
        args.push(i32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]));
        rest = &rest[4..];
    }

    Ok(OscMessage {
        address: address.to_string(),
        args,
    })
}

/// Decodifica um bundle recebido via UDP nas mensagens que o compõem.
///
/// Valida a tag `#bundle` e os tamanhos declarados antes de decodificar
/// cada elemento.
pub fn decode_bundle(data: &[u8]) -> Result<Vec<OscMessage>, ProtocolError> {
    if data.len() < BUNDLE_HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }
    if &data[..BUNDLE_TAG.len()] != BUNDLE_TAG {
        return Err(ProtocolError::MissingBundleTag);
    }

    let mut rest = &data[BUNDLE_HEADER_SIZE..];
    let mut messages = Vec::new();
    while !rest.is_empty() {
        if rest.len() < 4 {
            return Err(ProtocolError::TruncatedElement {
                declared: 4,
                remaining: rest.len(),
            });
        }
        let declared = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        rest = &rest[4..];
        if declared > rest.len() {
            return Err(ProtocolError::TruncatedElement {
                declared,
                remaining: rest.len(),
            });
        }
        messages.push(decode_message(&rest[..declared])?);
        rest = &rest[declared..];
    }
    Ok(messages)
}

// ──────────────────────────────────────────────
// Montagem do bundle de telemetria
// ──────────────────────────────────────────────

/// Monta as seis mensagens do bundle de telemetria, na ordem fixa do
/// wire: `/touch`, `/tths`, `/rths`, `/fdat`, `/bval`, `/diff`.
///
/// `/diff` é derivada (`baseline − filtered`, com sinal, sem clamp); os
/// thresholds são repetidos N vezes para que consumidores que entram
/// tarde os aprendam sem um passo de descoberta à parte.
pub fn bundle_messages(snapshot: &SensorSnapshot, thresholds: &Thresholds) -> Vec<OscMessage> {
    let n = snapshot.electrodes.len();

    let touch = snapshot
        .electrodes
        .iter()
        .map(|e| i32::from(e.touched))
        .collect();
    let tths = vec![i32::from(thresholds.touch); n];
    let rths = vec![i32::from(thresholds.release); n];
    let fdat = snapshot
        .electrodes
        .iter()
        .map(|e| i32::from(e.filtered))
        .collect();
    let bval = snapshot
        .electrodes
        .iter()
        .map(|e| i32::from(e.baseline))
        .collect();
    let diff = (0..n).map(|i| snapshot.diff(i)).collect();

    vec![
        OscMessage::new(ADDR_TOUCH, touch),
        OscMessage::new(ADDR_TOUCH_THRESHOLD, tths),
        OscMessage::new(ADDR_RELEASE_THRESHOLD, rths),
        OscMessage::new(ADDR_FILTERED, fdat),
        OscMessage::new(ADDR_BASELINE, bval),
        OscMessage::new(ADDR_DIFF, diff),
    ]
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
