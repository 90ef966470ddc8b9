use bitcoin::script::PushBytesBuf;

use crate::SigningError;

/// Copies `bytes` into a buffer that can be pushed onto a script.
pub fn bytes_to_push_bytes(bytes: &[u8]) -> Result<PushBytesBuf, SigningError> {
    PushBytesBuf::try_from(bytes.to_vec()).map_err(SigningError::from)
}
