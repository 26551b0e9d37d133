//! Decoding of pairing feature exchange and pairing failure PDUs.
//!
//! Only used for diagnostics. Matching never looks at decoded fields.
use proc_bitfield::bitfield;

use super::Opcode;

/// Errors that can occur while decoding a PDU.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The PDU has an invalid length.
    #[error("invalid PDU length (expected {expected}, found {found})")]
    InvalidLength {
        /// The expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
    /// The PDU carries a different opcode than the decoder handles.
    #[error("unexpected opcode `{0:#04x}`")]
    UnexpectedOpcode(u8),
}

/// Input and output capabilities of a device.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IoCapability {
    DisplayOnly,
    DisplayYesNo,
    KeyboardOnly,
    NoInputNoOutput,
    KeyboardDisplay,
    Reserved(u8),
}

impl From<u8> for IoCapability {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::DisplayOnly,
            0x01 => Self::DisplayYesNo,
            0x02 => Self::KeyboardOnly,
            0x03 => Self::NoInputNoOutput,
            0x04 => Self::KeyboardDisplay,
            other => Self::Reserved(other),
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    /// Authentication requirements.
    pub struct AuthReq(pub u8): Debug, FromStorage, IntoStorage {
        /// 00b - no bonding, 01b - bonding.
        pub bonding_flags: u8 @ 0..=1,
        /// Man-in-the-middle protection requested.
        pub mitm: bool @ 2,
        /// LE Secure Connections pairing supported.
        pub secure_connections: bool @ 3,
        /// Keypress notifications requested.
        pub keypress: bool @ 4,
        /// Support for the h7 key derivation function.
        pub ct2: bool @ 5,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    /// Keys that are distributed after pairing.
    pub struct KeyDistribution(pub u8): Debug, FromStorage, IntoStorage {
        /// Long term key, EDIV and Rand.
        pub enc_key: bool @ 0,
        /// Identity resolving key and identity address.
        pub id_key: bool @ 1,
        /// Connection signature resolving key.
        pub sign_key: bool @ 2,
        /// Derive a BR/EDR link key.
        pub link_key: bool @ 3,
    }
}

/// Pairing features, as carried by Pairing Request and Pairing Response PDUs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairingFeatures {
    /// IO capabilities.
    pub io_capability: IoCapability,
    /// Out-of-band authentication data is present.
    pub oob_data_present: bool,
    /// Authentication requirements.
    pub auth_req: AuthReq,
    /// Maximum encryption key size in octets.
    pub max_key_size: u8,
    /// Keys that the initiator distributes.
    pub initiator_key_distribution: KeyDistribution,
    /// Keys that the responder distributes.
    pub responder_key_distribution: KeyDistribution,
}

impl PairingFeatures {
    /// Size of a Pairing Request or Pairing Response PDU, including the opcode.
    pub const PDU_SIZE: usize = 7;

    /// Decode a Pairing Request or Pairing Response PDU.
    pub fn from_pdu(pdu: &[u8]) -> Result<Self, ParseError> {
        if pdu.len() != Self::PDU_SIZE {
            return Err(ParseError::InvalidLength {
                expected: Self::PDU_SIZE,
                found: pdu.len(),
            });
        }

        match Opcode::from(pdu[0]) {
            Opcode::PairingRequest | Opcode::PairingResponse => (),
            other => return Err(ParseError::UnexpectedOpcode(other.into())),
        }

        Ok(Self {
            io_capability: pdu[1].into(),
            oob_data_present: pdu[2] == 0x01,
            auth_req: AuthReq(pdu[3]),
            max_key_size: pdu[4],
            initiator_key_distribution: KeyDistribution(pdu[5]),
            responder_key_distribution: KeyDistribution(pdu[6]),
        })
    }
}

/// Reasons for a Pairing Failed PDU.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureReason {
    PasskeyEntryFailed,
    OobNotAvailable,
    AuthenticationRequirements,
    ConfirmValueFailed,
    PairingNotSupported,
    EncryptionKeySize,
    CommandNotSupported,
    UnspecifiedReason,
    RepeatedAttempts,
    InvalidParameters,
    DhKeyCheckFailed,
    NumericComparisonFailed,
    BrEdrPairingInProgress,
    CrossTransportKeyDerivationNotAllowed,
    KeyRejected,
    Reserved(u8),
}

impl From<u8> for FailureReason {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::PasskeyEntryFailed,
            0x02 => Self::OobNotAvailable,
            0x03 => Self::AuthenticationRequirements,
            0x04 => Self::ConfirmValueFailed,
            0x05 => Self::PairingNotSupported,
            0x06 => Self::EncryptionKeySize,
            0x07 => Self::CommandNotSupported,
            0x08 => Self::UnspecifiedReason,
            0x09 => Self::RepeatedAttempts,
            0x0a => Self::InvalidParameters,
            0x0b => Self::DhKeyCheckFailed,
            0x0c => Self::NumericComparisonFailed,
            0x0d => Self::BrEdrPairingInProgress,
            0x0e => Self::CrossTransportKeyDerivationNotAllowed,
            0x0f => Self::KeyRejected,
            other => Self::Reserved(other),
        }
    }
}

impl FailureReason {
    /// Decode the reason of a Pairing Failed PDU.
    pub fn from_pdu(pdu: &[u8]) -> Result<Self, ParseError> {
        match pdu {
            [0x05, reason] => Ok((*reason).into()),
            [opcode, _] => Err(ParseError::UnexpectedOpcode(*opcode)),
            _ => Err(ParseError::InvalidLength {
                expected: 2,
                found: pdu.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureReason, IoCapability, PairingFeatures, ParseError};

    #[test]
    fn test_decode_pairing_request() {
        // NoInputNoOutput, no OOB, bonding without MITM, 16 octet keys, responder distributes LTK.
        let features = PairingFeatures::from_pdu(&[0x01, 0x03, 0x00, 0x01, 0x10, 0x00, 0x01]).unwrap();

        assert_eq!(features.io_capability, IoCapability::NoInputNoOutput);
        assert!(!features.oob_data_present);
        assert_eq!(features.auth_req.bonding_flags(), 0b01);
        assert!(!features.auth_req.mitm());
        assert!(!features.auth_req.secure_connections());
        assert_eq!(features.max_key_size, 16);
        assert!(!features.initiator_key_distribution.enc_key());
        assert!(features.responder_key_distribution.enc_key());
        assert!(!features.responder_key_distribution.id_key());
    }

    #[test]
    fn test_decode_pairing_features_rejects_other_pdus() {
        assert_eq!(
            PairingFeatures::from_pdu(&[0x01, 0x03]),
            Err(ParseError::InvalidLength { expected: 7, found: 2 })
        );
        assert_eq!(
            PairingFeatures::from_pdu(&[0x03, 0, 0, 0, 0, 0, 0]),
            Err(ParseError::UnexpectedOpcode(0x03))
        );
    }

    #[test]
    fn test_decode_failure_reason() {
        assert_eq!(FailureReason::from_pdu(&[0x05, 0x07]), Ok(FailureReason::CommandNotSupported));
        assert_eq!(FailureReason::from_pdu(&[0x05, 0x06]), Ok(FailureReason::EncryptionKeySize));
        assert_eq!(FailureReason::from_pdu(&[0x05, 0x42]), Ok(FailureReason::Reserved(0x42)));
        assert_eq!(FailureReason::from_pdu(&[0x0b, 0x00]), Err(ParseError::UnexpectedOpcode(0x0b)));
        assert!(FailureReason::from_pdu(&[0x05]).is_err());
    }
}
