use std::net::IpAddr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Sha256, Sha512};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use super::{Ticket, TicketError};

/// Separates the encoded user id from the encoded user data
const FIELD_DELIMITER: char = '!';

/// Issue time is encoded as fixed-width lowercase hex
const TIMESTAMP_HEX_LEN: usize = 16;

/// MAC algorithm used to sign tickets
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Length of the raw MAC in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

/// Encodes, signs and verifies tickets with a server secret
///
/// Wire format (all ASCII):
///
/// ```text
/// hex(mac) | hex16(issue_time) | b64url(user_id) "!" b64url(user_data)
/// ```
///
/// The MAC is an HMAC keyed with the secret over a length-prefixed
/// concatenation of issue time, user id, user data and the optional client
/// IP. Both text fields are base64url encoded so neither can carry the
/// delimiter.
#[derive(Clone)]
pub struct TicketCodec {
    secret: Zeroizing<Vec<u8>>,
    algorithm: HashAlgorithm,
}

impl std::fmt::Debug for TicketCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketCodec")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TicketCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_algorithm(secret, HashAlgorithm::default())
    }

    pub fn with_algorithm(secret: &[u8], algorithm: HashAlgorithm) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Encode and sign a ticket. Deterministic for identical inputs.
    pub fn encode(&self, ticket: &Ticket, client_ip: Option<IpAddr>) -> Result<String, TicketError> {
        if ticket.user_id.is_empty() {
            return Err(TicketError::EmptyUserId);
        }

        let digest = self.sign(ticket, client_ip)?;

        Ok(format!(
            "{}{:016x}{}{}{}",
            hex::encode(digest),
            ticket.issue_time,
            URL_SAFE_NO_PAD.encode(ticket.user_id.as_bytes()),
            FIELD_DELIMITER,
            URL_SAFE_NO_PAD.encode(ticket.user_data.as_bytes()),
        ))
    }

    /// Verify and decode a ticket
    ///
    /// The signature is checked before the age, so `Expired` is only ever
    /// reported for authentic tickets. A malformed ticket is still run
    /// through a MAC computation and a constant-time compare before it is
    /// rejected, which keeps "malformed" and "bad signature" on the same
    /// code path. The age check is inclusive: a ticket exactly `max_age`
    /// seconds old is still valid.
    pub fn decode(
        &self,
        raw: &str,
        client_ip: Option<IpAddr>,
        max_age: u64,
        now: u64,
    ) -> Result<Ticket, TicketError> {
        let (claimed_digest, ticket, well_formed) = match parse(raw, self.algorithm.digest_len()) {
            Some((digest, ticket)) => (digest, ticket, true),
            None => (
                vec![0u8; self.algorithm.digest_len()],
                Ticket::new(String::new(), String::new(), 0),
                false,
            ),
        };

        let expected_digest = self.sign(&ticket, client_ip)?;
        let authentic =
            expected_digest.as_slice().ct_eq(claimed_digest.as_slice()) & Choice::from(well_formed as u8);

        if !bool::from(authentic) {
            return Err(TicketError::Invalid);
        }

        let age = ticket.age(now);
        if age > max_age {
            return Err(TicketError::Expired { age, max_age });
        }

        Ok(ticket)
    }

    fn sign(&self, ticket: &Ticket, client_ip: Option<IpAddr>) -> Result<Vec<u8>, TicketError> {
        let message = canonical_message(ticket, client_ip);

        let digest = match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
                    .map_err(|_| TicketError::InvalidKey)?;
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlgorithm::Sha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(&self.secret)
                    .map_err(|_| TicketError::InvalidKey)?;
                mac.update(&message);
                mac.finalize().into_bytes().to_vec()
            }
        };

        Ok(digest)
    }
}

/// Length-prefixed concatenation of all signed fields
fn canonical_message(ticket: &Ticket, client_ip: Option<IpAddr>) -> Vec<u8> {
    let ip = client_ip.map(|ip| ip.to_string()).unwrap_or_default();
    let fields = [
        ticket.user_id.as_bytes(),
        ticket.user_data.as_bytes(),
        ip.as_bytes(),
    ];

    let mut message =
        Vec::with_capacity(8 + fields.iter().map(|f| f.len() + 8).sum::<usize>());
    message.extend_from_slice(&ticket.issue_time.to_be_bytes());
    for field in fields {
        message.extend_from_slice(&(field.len() as u64).to_be_bytes());
        message.extend_from_slice(field);
    }
    message
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn decode_field(encoded: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Split a raw ticket into claimed digest and fields. Only the canonical
/// encoding is accepted, so no two strings decode to the same ticket.
fn parse(raw: &str, digest_len: usize) -> Option<(Vec<u8>, Ticket)> {
    let digest_hex_len = digest_len * 2;
    if !raw.is_ascii() || raw.len() < digest_hex_len + TIMESTAMP_HEX_LEN {
        return None;
    }

    let (digest_hex, rest) = raw.split_at(digest_hex_len);
    let (timestamp_hex, payload) = rest.split_at(TIMESTAMP_HEX_LEN);
    if !is_lower_hex(digest_hex) || !is_lower_hex(timestamp_hex) {
        return None;
    }

    let digest = hex::decode(digest_hex).ok()?;
    let issue_time = u64::from_str_radix(timestamp_hex, 16).ok()?;

    let (user_id, user_data) = payload.split_once(FIELD_DELIMITER)?;
    let user_id = decode_field(user_id)?;
    let user_data = decode_field(user_data)?;
    if user_id.is_empty() {
        return None;
    }

    Some((digest, Ticket::new(user_id, user_data, issue_time)))
}
