//! Classification of SMP PDUs.
//!
//! Every PDU starts with an opcode byte, followed by an opcode-specific payload.
//! The opcode alone decides whether a received PDU has to match its scripted
//! counterpart byte for byte, or only in length.
pub mod pairing;

use pairing::{FailureReason, PairingFeatures};

/// The fixed L2CAP channel identifier of the Security Manager Protocol.
pub const SMP_CID: u16 = 0x0006;

/// The largest SMP PDU (Pairing Public Key: opcode and two 32 byte coordinates).
pub const MAX_PDU_SIZE: usize = 65;

/// SMP command codes.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    PairingRequest,
    PairingResponse,
    /// Carries a freshly computed confirm value.
    PairingConfirm,
    /// Carries a freshly generated random value.
    PairingRandom,
    PairingFailed,
    EncryptionInformation,
    CentralIdentification,
    IdentityInformation,
    IdentityAddressInformation,
    SigningInformation,
    SecurityRequest,
    PairingPublicKey,
    PairingDhKeyCheck,
    KeypressNotification,
    /// Any code that is not assigned.
    Reserved(u8),
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::PairingRequest,
            0x02 => Self::PairingResponse,
            0x03 => Self::PairingConfirm,
            0x04 => Self::PairingRandom,
            0x05 => Self::PairingFailed,
            0x06 => Self::EncryptionInformation,
            0x07 => Self::CentralIdentification,
            0x08 => Self::IdentityInformation,
            0x09 => Self::IdentityAddressInformation,
            0x0a => Self::SigningInformation,
            0x0b => Self::SecurityRequest,
            0x0c => Self::PairingPublicKey,
            0x0d => Self::PairingDhKeyCheck,
            0x0e => Self::KeypressNotification,
            other => Self::Reserved(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> u8 {
        match opcode {
            Opcode::PairingRequest => 0x01,
            Opcode::PairingResponse => 0x02,
            Opcode::PairingConfirm => 0x03,
            Opcode::PairingRandom => 0x04,
            Opcode::PairingFailed => 0x05,
            Opcode::EncryptionInformation => 0x06,
            Opcode::CentralIdentification => 0x07,
            Opcode::IdentityInformation => 0x08,
            Opcode::IdentityAddressInformation => 0x09,
            Opcode::SigningInformation => 0x0a,
            Opcode::SecurityRequest => 0x0b,
            Opcode::PairingPublicKey => 0x0c,
            Opcode::PairingDhKeyCheck => 0x0d,
            Opcode::KeypressNotification => 0x0e,
            Opcode::Reserved(value) => value,
        }
    }
}

/// How a received PDU is compared against its scripted counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Comparison {
    /// Length and every byte must match.
    Exact,
    /// Only the length must match.
    ///
    /// Used for PDUs that embed cryptographic material, which two independent
    /// stacks generate differently for the same script.
    LengthOnly,
}

impl Comparison {
    /// Check whether `received` is acceptable in place of `expected`.
    pub fn matches(self, expected: &[u8], received: &[u8]) -> bool {
        if expected.len() != received.len() {
            return false;
        }

        match self {
            Comparison::Exact => expected == received,
            Comparison::LengthOnly => true,
        }
    }
}

impl Opcode {
    /// Extract the opcode of a PDU, if there is one.
    pub fn of(pdu: &[u8]) -> Option<Self> {
        pdu.first().copied().map(Self::from)
    }

    /// The comparison rule for PDUs with this opcode.
    pub fn comparison(self) -> Comparison {
        match self {
            Opcode::PairingConfirm | Opcode::PairingRandom => Comparison::LengthOnly,
            _ => Comparison::Exact,
        }
    }
}

/// The comparison rule for a received PDU, decided by its leading opcode byte.
///
/// Empty PDUs are compared exactly.
pub fn classify(pdu: &[u8]) -> Comparison {
    Opcode::of(pdu).map_or(Comparison::Exact, Opcode::comparison)
}

/// The bytes to transmit for a scripted payload.
///
/// Scripted confirm and random values are stand-ins for cryptographically valid ones
/// and are sent verbatim: the tester exercises framing and sequencing, not key generation.
pub fn outbound(scripted: &[u8]) -> &[u8] {
    if classify(scripted) == Comparison::LengthOnly {
        trace!("Sending scripted stand-in for {:?}", Opcode::of(scripted));
    }

    scripted
}

/// Trace a PDU, decoding pairing features and failure reasons where present.
pub(crate) fn log_pdu(direction: &str, round: usize, pdu: &[u8]) {
    match Opcode::of(pdu) {
        None => trace!("Round {}: {} empty PDU", round, direction),
        Some(opcode @ (Opcode::PairingRequest | Opcode::PairingResponse)) => match PairingFeatures::from_pdu(pdu) {
            Ok(features) => trace!("Round {}: {} {:?} {:?}", round, direction, opcode, features),
            Err(_) => trace!("Round {}: {} malformed {:?}", round, direction, opcode),
        },
        Some(Opcode::PairingFailed) => match FailureReason::from_pdu(pdu) {
            Ok(reason) => trace!("Round {}: {} PairingFailed ({:?})", round, direction, reason),
            Err(_) => trace!("Round {}: {} malformed PairingFailed", round, direction),
        },
        Some(opcode) => trace!("Round {}: {} {:?} ({} bytes)", round, direction, opcode, pdu.len()),
    }
}
