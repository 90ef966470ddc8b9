use bitcoin::opcodes::all::{OP_CHECKSIG, OP_ENDIF, OP_IF};
use bitcoin::opcodes::{OP_0, OP_FALSE};
use bitcoin::script::{Builder as ScriptBuilder, PushBytesBuf};
use bitcoin::XOnlyPublicKey;

use crate::utils::bytes_to_push_bytes;
use crate::utils::constants::{CONTENT_TYPE_TAG, MAX_SCRIPT_ELEMENT_SIZE, PROTOCOL_ID};
use crate::SigningError;

/// The inscription trait is used to write data to the tapscript leaf spent by a reveal transaction.
pub trait Inscription {
    /// Returns the content type of the inscription.
    fn content_type(&self) -> String;

    /// Returns the inscription body.
    ///
    /// The body follows the header of the envelope:
    ///
    /// - x-only public key
    /// - OP_CHECKSIG
    /// - OP_FALSE
    /// - OP_IF
    /// - ord
    /// - 0x01
    /// - {inscription.content_type()}
    /// - 0x00
    ///
    /// and is split in pushes of at most 520 bytes, then closed by OP_ENDIF.
    fn body(&self) -> Result<Vec<u8>, SigningError>;

    /// Appends the full envelope, locked to `pubkey`, to `builder`.
    fn generate_redeem_script(
        &self,
        builder: ScriptBuilder,
        pubkey: &XOnlyPublicKey,
    ) -> Result<ScriptBuilder, SigningError> {
        let mut builder = builder
            .push_slice(bytes_to_push_bytes(&pubkey.serialize())?.as_push_bytes())
            .push_opcode(OP_CHECKSIG)
            .push_opcode(OP_FALSE)
            .push_opcode(OP_IF)
            .push_slice(&PROTOCOL_ID)
            .push_slice(&CONTENT_TYPE_TAG)
            .push_slice(bytes_to_push_bytes(self.content_type().as_bytes())?.as_push_bytes())
            // body tag
            .push_opcode(OP_0);

        for chunk in self.body()?.chunks(MAX_SCRIPT_ELEMENT_SIZE) {
            let push: PushBytesBuf = bytes_to_push_bytes(chunk)?;
            builder = builder.push_slice(push.as_push_bytes());
        }

        Ok(builder.push_opcode(OP_ENDIF))
    }
}

/// Raw text inscription, as handed over by the pipeline once the operation is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInscription {
    content_type: String,
    body: String,
}

impl TextInscription {
    pub fn new(content_type: impl ToString, body: impl ToString) -> Self {
        Self {
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }
}

impl Inscription for TextInscription {
    fn content_type(&self) -> String {
        self.content_type.clone()
    }

    fn body(&self) -> Result<Vec<u8>, SigningError> {
        Ok(self.body.as_bytes().to_vec())
    }
}
