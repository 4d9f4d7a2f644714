//! Key material with an embedded key id.
//!
//! Both halves of a key pair are stored as `BE32(key_id) || raw_key`, which
//! is also the form published in the key commitment (`Y`).

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{errors::PstError, ser::join_all, types::{KeyId, KEY_ID_LEN}};

/// Prefix `raw` with the 4-byte big-endian `id`.
///
/// # Errors
/// `PstError::MalformedKey` if `raw` is empty.
pub fn embed_key_id(id: KeyId, raw: &[u8]) -> Result<KeyedMaterial, PstError> {
    KeyedMaterial::from_bytes(join_all(&[&id.to_be_bytes(), raw]))
}

/// Read the key id prefix.
///
/// # Errors
/// `PstError::MalformedKey` if `material` is shorter than 4 bytes.
pub fn extract_key_id(material: &[u8]) -> Result<KeyId, PstError> {
    let Some(prefix) = material.get(..KEY_ID_LEN) else {
        return Err(PstError::MalformedKey { len: material.len() });
    };
    let mut id = [0u8; KEY_ID_LEN];
    id.copy_from_slice(prefix);
    Ok(KeyId(u32::from_be_bytes(id)))
}

/// Strip the key id prefix.
///
/// # Errors
/// `PstError::MalformedKey` unless `material` holds at least one key byte after the prefix.
pub fn extract_raw_key(material: &[u8]) -> Result<&[u8], PstError> {
    if material.len() <= KEY_ID_LEN {
        return Err(PstError::MalformedKey { len: material.len() });
    }
    Ok(&material[KEY_ID_LEN..])
}

/// Owned `key_id || raw_key` buffer, validated on construction.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyedMaterial(Vec<u8>);

impl KeyedMaterial {
    /// # Errors
    /// `PstError::MalformedKey` if the buffer has no key bytes after the id.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PstError> {
        extract_raw_key(&bytes)?;
        Ok(Self(bytes))
    }

    /// # Errors
    /// `PstError::InvalidEncoding` for non-base64 input, `PstError::MalformedKey` for short material.
    pub fn from_base64(encoded: &str) -> Result<Self, PstError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| PstError::InvalidEncoding("key material is not base64"))?;
        Self::from_bytes(bytes)
    }

    #[must_use]
    pub fn key_id(&self) -> KeyId {
        let mut id = [0u8; KEY_ID_LEN];
        id.copy_from_slice(&self.0[..KEY_ID_LEN]);
        KeyId(u32::from_be_bytes(id))
    }

    #[must_use]
    pub fn raw_key(&self) -> &[u8] {
        &self.0[KEY_ID_LEN..]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

// Private halves share this type, so never print the bytes.
impl core::fmt::Debug for KeyedMaterial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyedMaterial")
            .field("key_id", &self.key_id())
            .field("len", &self.0.len())
            .finish()
    }
}
