//! Secure-protocol phase inference from static evidence.
//!
//! Detectors are independent and non-exclusive: TLS, SSH, and IKE/IPsec
//! each run over the extracted string set (case-insensitive substring
//! matching, no tokenization) plus, for TLS, a raw-byte record-header
//! scan. A generic fallback reports weak evidence only when none of the
//! named families matched; it sets all four phases on any hit, which is
//! deliberately coarse and prone to false positives.

use crate::report::{PhaseFlags, ProtocolEvidence, ProtocolFamily};
use crate::strings::StringRun;

const TLS_HANDSHAKE_KEYWORDS: &[&str] = &[
    "clienthello",
    "serverhello",
    "hellorequest",
    "certificate",
    "certificaterequest",
    "certificateverify",
    "serverkeyexchange",
    "clientkeyexchange",
    "finished",
    "changecipherspec",
    "tlsv1",
    "tlsv1.1",
    "tlsv1.2",
    "tlsv1.3",
    "sslv3",
];

const TLS_CRYPTO_KEYWORDS: &[&str] = &[
    "aes-", "chacha20", "poly1305", "gcm", "ccm", "ecdhe", "dhe-", "rsa-", "hmac", "md5", "sha1",
    "sha256", "sha384",
];

const TLS_KEY_EXCHANGE_CRYPTO: &[&str] = &["ecdhe", "dhe-", "rsa-"];
const TLS_KEY_EXCHANGE_HANDSHAKE: &[&str] = &["serverkeyexchange", "clientkeyexchange"];

const IKE_KEYWORDS: &[&str] = &[
    "isakmp",
    "ikev1",
    "ikev2",
    "quick mode",
    "main mode",
    "phase 1",
    "phase 2",
];
const IPSEC_KEYWORDS: &[&str] = &["esp", "ah", "ipsec", "spi "];

const GENERIC_KEYWORDS: &[&str] = &[
    "key schedule",
    "session key",
    "pre-shared key",
    "psk",
    "nonce",
    "iv ",
];

const SSH_BANNER_PREFIX: &str = "SSH-";

/// Keywords that appear as a substring of any lowered string.
fn keyword_hits(keywords: &[&str], lowered: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|kw| lowered.iter().any(|s| s.contains(*kw)))
        .map(|kw| kw.to_string())
        .collect()
}

/// Count TLS handshake record headers in raw bytes: content type 0x16,
/// version major 0x03, version minor 0x00..=0x04, at any offset.
fn count_tls_record_headers(data: &[u8]) -> usize {
    let mut count = 0;
    for pos in memchr::memchr_iter(0x16, data) {
        if pos + 2 < data.len() && data[pos + 1] == 0x03 && data[pos + 2] <= 0x04 {
            count += 1;
        }
    }
    count
}

fn infer_tls(data: &[u8], lowered: &[String]) -> Option<ProtocolEvidence> {
    let handshake_hits = keyword_hits(TLS_HANDSHAKE_KEYWORDS, lowered);
    let crypto_hits = keyword_hits(TLS_CRYPTO_KEYWORDS, lowered);
    let record_count = count_tls_record_headers(data);

    if handshake_hits.is_empty() && crypto_hits.is_empty() && record_count == 0 {
        return None;
    }

    let key_exchange = crypto_hits
        .iter()
        .any(|k| TLS_KEY_EXCHANGE_CRYPTO.contains(&k.as_str()))
        || handshake_hits
            .iter()
            .any(|k| TLS_KEY_EXCHANGE_HANDSHAKE.contains(&k.as_str()));

    let phases = PhaseFlags {
        initialization: !handshake_hits.is_empty() || !crypto_hits.is_empty(),
        handshake: !handshake_hits.is_empty() || record_count > 0,
        key_exchange,
        encrypted_phase: !crypto_hits.is_empty(),
    };

    let mut keyword_hits = handshake_hits;
    keyword_hits.extend(crypto_hits);
    Some(ProtocolEvidence {
        family: ProtocolFamily::Tls,
        phases,
        keyword_hits,
        record_header_count: record_count,
    })
}

fn infer_ssh(runs: &[StringRun]) -> Option<ProtocolEvidence> {
    let banners: Vec<String> = runs
        .iter()
        .filter(|r| {
            r.text.starts_with(SSH_BANNER_PREFIX)
                || r.text
                    .to_ascii_lowercase()
                    .contains(&SSH_BANNER_PREFIX.to_ascii_lowercase())
        })
        .take(5)
        .map(|r| r.text.clone())
        .collect();

    if banners.is_empty() {
        return None;
    }

    // Banner exchange implies the full negotiation in an always-encrypted
    // transport; all phases are evidenced by presence alone.
    Some(ProtocolEvidence {
        family: ProtocolFamily::Ssh,
        phases: PhaseFlags::all(),
        keyword_hits: banners,
        record_header_count: 0,
    })
}

fn infer_ike_ipsec(lowered: &[String]) -> Option<ProtocolEvidence> {
    let ike_hits = keyword_hits(IKE_KEYWORDS, lowered);
    let ipsec_hits = keyword_hits(IPSEC_KEYWORDS, lowered);

    if ike_hits.is_empty() && ipsec_hits.is_empty() {
        return None;
    }

    let phases = PhaseFlags {
        initialization: true,
        handshake: !ike_hits.is_empty(),
        key_exchange: !ike_hits.is_empty(),
        encrypted_phase: !ipsec_hits.is_empty(),
    };

    let mut keyword_hits = ike_hits;
    keyword_hits.extend(ipsec_hits);
    Some(ProtocolEvidence {
        family: ProtocolFamily::IkeIpsec,
        phases,
        keyword_hits,
        record_header_count: 0,
    })
}

fn infer_generic(lowered: &[String]) -> Option<ProtocolEvidence> {
    let hits = keyword_hits(GENERIC_KEYWORDS, lowered);
    if hits.is_empty() {
        return None;
    }
    Some(ProtocolEvidence {
        family: ProtocolFamily::GenericSecure,
        phases: PhaseFlags::all(),
        keyword_hits: hits,
        record_header_count: 0,
    })
}

/// Run all detectors over a blob and its extracted strings.
///
/// Family order in the result is fixed: TLS, SSH, IKE/IPsec, then the
/// generic fallback only when no named family was detected.
pub fn infer(data: &[u8], runs: &[StringRun]) -> Vec<ProtocolEvidence> {
    let lowered: Vec<String> = runs.iter().map(|r| r.text.to_ascii_lowercase()).collect();

    let mut out = Vec::new();
    if let Some(ev) = infer_tls(data, &lowered) {
        out.push(ev);
    }
    if let Some(ev) = infer_ssh(runs) {
        out.push(ev);
    }
    if let Some(ev) = infer_ike_ipsec(&lowered) {
        out.push(ev);
    }
    if out.is_empty() {
        if let Some(ev) = infer_generic(&lowered) {
            out.push(ev);
        }
    }
    out
}
