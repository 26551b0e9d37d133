//! Built-in test cases.
//!
//! "Server" cases test a peer in the responder role, so the engine plays the initiator.
//! "Client" cases test a peer in the initiator role, so the engine plays the responder.
use crate::Role;
use crate::script::ScriptEntry;
use crate::tester::TestCase;

/// A zeroed PDU of size `N` with the given opcode.
const fn with_opcode<const N: usize>(opcode: u8) -> [u8; N] {
    let mut pdu = [0u8; N];
    pdu[0] = opcode;
    pdu
}

/// Pairing Request: NoInputNoOutput, no OOB data, bonding without MITM, 16 octet keys,
/// responder distributes its LTK.
static PAIRING_REQUEST: [u8; 7] = [0x01, 0x03, 0x00, 0x01, 0x10, 0x00, 0x01];

/// Pairing Response, mirroring the request.
static PAIRING_RESPONSE: [u8; 7] = [0x02, 0x03, 0x00, 0x01, 0x10, 0x00, 0x01];

static PAIRING_CONFIRM: [u8; 17] = with_opcode(0x03);
static PAIRING_RANDOM: [u8; 17] = with_opcode(0x04);

/// Security Request, which an initiator must not send.
static SECURITY_REQUEST: [u8; 2] = [0x0b, 0x00];

/// Pairing Request with a maximum key size of zero.
static ZERO_KEY_SIZE_PAIRING_REQUEST: [u8; 7] = with_opcode(0x01);

static FAILED_COMMAND_NOT_SUPPORTED: [u8; 2] = [0x05, 0x07];
static FAILED_ENCRYPTION_KEY_SIZE: [u8; 2] = [0x05, 0x06];

static SERVER_BASIC_REQUEST_1: [ScriptEntry<'static>; 3] = [
    ScriptEntry::new(&PAIRING_REQUEST, &PAIRING_RESPONSE),
    ScriptEntry::new(&PAIRING_CONFIRM, &PAIRING_CONFIRM),
    ScriptEntry::silent(&PAIRING_RANDOM),
];

static SERVER_INVALID_REQUEST_1: [ScriptEntry<'static>; 1] =
    [ScriptEntry::new(&SECURITY_REQUEST, &FAILED_COMMAND_NOT_SUPPORTED)];

static SERVER_INVALID_REQUEST_2: [ScriptEntry<'static>; 1] =
    [ScriptEntry::new(&ZERO_KEY_SIZE_PAIRING_REQUEST, &FAILED_ENCRYPTION_KEY_SIZE)];

static CLIENT_BASIC_REQUEST_1: [ScriptEntry<'static>; 2] = [
    ScriptEntry::new(&PAIRING_REQUEST, &PAIRING_RESPONSE),
    ScriptEntry::new(&PAIRING_CONFIRM, &PAIRING_CONFIRM),
];

/// All built-in test cases.
pub static CATALOGUE: [TestCase; 4] = [
    TestCase {
        name: "SMP Server - Basic Request 1",
        role: Role::Initiator,
        entries: &SERVER_BASIC_REQUEST_1,
    },
    TestCase {
        name: "SMP Server - Invalid Request 1",
        role: Role::Initiator,
        entries: &SERVER_INVALID_REQUEST_1,
    },
    TestCase {
        name: "SMP Server - Invalid Request 2",
        role: Role::Initiator,
        entries: &SERVER_INVALID_REQUEST_2,
    },
    TestCase {
        name: "SMP Client - Basic Request 1",
        role: Role::Responder,
        entries: &CLIENT_BASIC_REQUEST_1,
    },
];

/// Look up a built-in test case by name.
pub fn find(name: &str) -> Option<&'static TestCase> {
    CATALOGUE.iter().find(|case| case.name == name)
}
