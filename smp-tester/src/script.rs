//! The script model: an immutable, ordered list of request/response rounds.
use crate::pdu::MAX_PDU_SIZE;

/// Errors concerning script construction and indexing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScriptError {
    /// A script needs at least one round.
    #[error("script has no rounds")]
    Empty,
    /// A request, or a present response, has no bytes (and hence no opcode).
    #[error("round {0} contains an empty PDU")]
    EmptyPdu(usize),
    /// A PDU does not fit into the largest SMP PDU.
    #[error("round {index} contains a PDU of {size} bytes")]
    Oversized {
        /// The offending round.
        index: usize,
        /// The PDU's size.
        size: usize,
    },
    /// The script was indexed beyond its length.
    #[error("round {index} out of range for script of length {length}")]
    OutOfRange {
        /// The requested round.
        index: usize,
        /// The script length.
        length: usize,
    },
}

/// One round of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEntry<'a> {
    /// The exact bytes that the peer must send, subject to the PDU classifier.
    pub request: &'a [u8],
    /// The bytes to send back, if any.
    pub response: Option<&'a [u8]>,
}

impl<'a> ScriptEntry<'a> {
    /// A round that expects `request` and answers with `response`.
    pub const fn new(request: &'a [u8], response: &'a [u8]) -> Self {
        Self {
            request,
            response: Some(response),
        }
    }

    /// A round without a reply.
    pub const fn silent(request: &'a [u8]) -> Self {
        Self {
            request,
            response: None,
        }
    }
}

/// An ordered, non-empty sequence of rounds, fixed for the lifetime of a test case.
#[derive(Debug, Clone, Copy)]
pub struct Script<'a> {
    entries: &'a [ScriptEntry<'a>],
}

impl<'a> Script<'a> {
    /// Create a script from its rounds.
    pub fn new(entries: &'a [ScriptEntry<'a>]) -> Result<Self, ScriptError> {
        if entries.is_empty() {
            return Err(ScriptError::Empty);
        }

        for (index, entry) in entries.iter().enumerate() {
            for pdu in core::iter::once(entry.request).chain(entry.response) {
                if pdu.is_empty() {
                    return Err(ScriptError::EmptyPdu(index));
                }

                if pdu.len() > MAX_PDU_SIZE {
                    return Err(ScriptError::Oversized { index, size: pdu.len() });
                }
            }
        }

        Ok(Self { entries })
    }

    /// The number of rounds.
    pub fn length(&self) -> usize {
        self.entries.len()
    }

    /// The round at `index`.
    pub fn entry_at(&self, index: usize) -> Result<&'a ScriptEntry<'a>, ScriptError> {
        self.entries.get(index).ok_or(ScriptError::OutOfRange {
            index,
            length: self.entries.len(),
        })
    }
}
