use core::fmt;
use crate::errors::PstError;

pub const PROTOCOL_VERSION: &str = "PrivateStateTokenV1VOPRF";
pub const KEY_ID_LEN: usize = 4;                 // big-endian u32 prefix
pub const BLINDED_MSG_LEN: usize = 97;           // uncompressed P-384 point: tag(1) || x(48) || y(48)
pub const NONCE_LEN: usize = 64;                 // client nonce inside a redemption token
pub const ISSUE_BATCH_SIZE: u16 = 1;             // single-token batches
pub const COMPRESSED_SIGN_TAG: u8 = 0x03;        // prepended to 48-byte evaluation outputs

/// Process-assigned identifier of one key pair in the rotation set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct KeyId(pub u32);

impl KeyId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; KEY_ID_LEN] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for KeyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Group sizes of a VOPRF suite, fixed once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuiteParams {
    /// `Ne`: compressed element size.
    pub element_len: usize,
    /// Size of an uncompressed element (blinded messages and token points).
    pub uncompressed_element_len: usize,
    /// `Ns`: scalar size.
    pub scalar_len: usize,
}

impl SuiteParams {
    #[must_use]
    pub const fn proof_len(&self) -> usize {
        2 * self.scalar_len
    }

    /// Size of the token carried by a redemption request: key id || nonce || W.
    #[must_use]
    pub const fn token_len(&self) -> usize {
        KEY_ID_LEN + NONCE_LEN + self.uncompressed_element_len
    }
}

// Fixed-size newtypes prevent misuse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct BlindedMsg(pub [u8; BLINDED_MSG_LEN]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Nonce(pub [u8; NONCE_LEN]);

// Exact-sized decode helpers
macro_rules! impl_tryfrom_slice {
    ($t:ty, $len:expr, $name:literal) => {
        impl TryFrom<&[u8]> for $t {
            type Error = PstError;
            fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
                if b.len() != $len {
                    return Err(PstError::InvalidRequest { field: $name, expected: $len, got: b.len() });
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(b);
                Ok(Self(arr))
            }
        }

        impl AsRef<[u8]> for $t {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}
impl_tryfrom_slice!(BlindedMsg, BLINDED_MSG_LEN, "blinded_msg");
impl_tryfrom_slice!(Nonce, NONCE_LEN, "nonce");
