// Copyright 2021 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
////////////////////////////////////////////////////////////////////////////////

//! `COSE_Sign1` signing and verification.

use crate::{
    cbor::value::Value,
    common::read_to_value,
    header,
    header::{ContentType, Header, MAX_PROTECTED_HEADER_LEN},
    iana,
    iana::EnumI64,
    sig_structure::hash_sig_structure,
    util, AsCborValue, CoseError, CryptoProvider, Label, Result, SignatureAlgorithm,
    MAX_DIGEST_SIZE, MAX_SIGNATURE_SIZE,
};
use alloc::{string::String, vec::Vec};

#[cfg(test)]
mod tests;

/// Option flags modifying signing behavior.  Flags combine with `|`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SignOptions(u32);

impl SignOptions {
    /// No options.
    pub const NONE: SignOptions = SignOptions(0);
    /// Produce a deterministic, non-secret test signature instead of a real
    /// one; see [`SHORT_CIRCUIT_KID`].  Requires the `short-circuit-sig`
    /// feature; without it signing fails with
    /// [`CoseError::ShortCircuitSigDisabled`].
    pub const SHORT_CIRCUIT_SIG: SignOptions = SignOptions(1 << 0);
    /// Do not wrap the message in CBOR tag 18.
    pub const OMIT_CBOR_TAG: SignOptions = SignOptions(1 << 1);

    /// Indicate whether all flags in `other` are set.
    pub fn contains(self, other: SignOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for SignOptions {
    type Output = SignOptions;
    fn bitor(self, other: SignOptions) -> SignOptions {
        SignOptions(self.0 | other.0)
    }
}

/// Option flags modifying verification behavior.  Flags combine with `|`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerifyOptions(u32);

impl VerifyOptions {
    /// No options.
    pub const NONE: VerifyOptions = VerifyOptions(0);
    /// Accept short-circuit signatures on messages carrying the well-known
    /// [`SHORT_CIRCUIT_KID`].  Requires the `short-circuit-sig` feature.
    pub const ALLOW_SHORT_CIRCUIT: VerifyOptions = VerifyOptions(1 << 0);
    /// Fail with [`CoseError::NoKid`] if the message has no kid parameter.
    pub const REQUIRE_KID: VerifyOptions = VerifyOptions(1 << 1);
    /// Fail with [`CoseError::IncorrectlyTagged`] if the message is not
    /// wrapped in CBOR tag 18.
    pub const TAG_REQUIRED: VerifyOptions = VerifyOptions(1 << 2);
    /// Decode the message and return its payload and parameters without any
    /// cryptographic checking.
    pub const PARSE_ONLY: VerifyOptions = VerifyOptions(1 << 3);

    /// Indicate whether all flags in `other` are set.
    pub fn contains(self, other: VerifyOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for VerifyOptions {
    type Output = VerifyOptions;
    fn bitor(self, other: VerifyOptions) -> VerifyOptions {
        VerifyOptions(self.0 | other.0)
    }
}

/// Well-known kid marking a message as carrying a short-circuit signature.
///
/// Short-circuit signatures are a deterministic stand-in for real ones, built
/// from the `Sig_structure` digest alone.  They prove nothing and must never
/// be accepted outside of integration testing.
#[cfg(feature = "short-circuit-sig")]
pub const SHORT_CIRCUIT_KID: [u8; 32] = [
    0xef, 0x95, 0x4b, 0x4b, 0xd9, 0xbd, 0xf6, 0x70, 0xd0, 0x33, 0x60, 0x82, 0xf5, 0xef, 0x15,
    0x2a, 0xf8, 0xf3, 0x5b, 0x6a, 0x6c, 0x00, 0xef, 0xa6, 0xa9, 0xa7, 0x1f, 0x49, 0x51, 0x7e,
    0x18, 0xc6,
];

/// Fill `sig_out` with the short-circuit signature for `digest`: the digest
/// repeated as often as needed to reach the algorithm's signature size.
#[cfg(feature = "short-circuit-sig")]
fn short_circuit_signature(digest: &[u8], sig_out: &mut [u8]) {
    for (i, b) in sig_out.iter_mut().enumerate() {
        *b = digest[i % digest.len()];
    }
}

/// Header parameters recovered from a verified (or parsed) message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parameters {
    /// Signing algorithm from the protected headers.
    pub algorithm: iana::Algorithm,
    /// Key identifier; empty when absent.  When present in both buckets the
    /// unprotected one is reported.
    pub key_id: Vec<u8>,
    /// Content type of the payload.
    pub content_type: Option<ContentType>,
    /// Critical header labels from the protected headers.
    pub crit: Vec<Label>,
    /// Whether the message was wrapped in CBOR tag 18.
    pub cose_tag_present: bool,
}

/// Result of a successful [`Sign1Verifier::verify`] call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedSign1 {
    /// The message payload.
    pub payload: Vec<u8>,
    /// Header parameters recovered from the message.
    pub params: Parameters,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SignerPhase {
    Init,
    HeadersEmitted,
    Finished,
}

/// Signing context for a single `COSE_Sign1` message.
///
/// A signer moves through three phases: created (`new`), headers emitted
/// ([`encode_parameters`](Self::encode_parameters)), and finished
/// ([`encode_signature`](Self::encode_signature)).  Between the last two the
/// caller contributes the payload byte string to the same output buffer,
/// either with [`add_payload`](Self::add_payload) or with a CBOR writer of
/// its own.  Calls outside this order fail with
/// [`CoseError::InvalidArgument`], as does any use of a context after an
/// error; a fresh message needs a fresh context.
pub struct Sign1Signer<'a, P: CryptoProvider> {
    provider: &'a P,
    options: SignOptions,
    alg: &'static SignatureAlgorithm,
    key: Option<&'a P::Key>,
    kid: Vec<u8>,
    content_type: Option<ContentType>,
    phase: SignerPhase,
    /// Encoded protected headers, captured for `Sig_structure` reuse.
    protected_data: Vec<u8>,
    /// Offset of the payload within the output buffer.
    payload_mark: usize,
}

impl<'a, P: CryptoProvider> Sign1Signer<'a, P> {
    /// Create a signing context for the given algorithm.
    ///
    /// Fails with [`CoseError::UnsupportedSigningAlg`] if `alg` is not in
    /// the compiled-in registry.
    pub fn new(provider: &'a P, options: SignOptions, alg: iana::Algorithm) -> Result<Self> {
        #[cfg(not(feature = "short-circuit-sig"))]
        if options.contains(SignOptions::SHORT_CIRCUIT_SIG) {
            return Err(CoseError::ShortCircuitSigDisabled);
        }
        let alg = SignatureAlgorithm::lookup(alg.to_i64())?;
        Ok(Sign1Signer {
            provider,
            options,
            alg,
            key: None,
            kid: Vec::new(),
            content_type: None,
            phase: SignerPhase::Init,
            protected_data: Vec::new(),
            payload_mark: 0,
        })
    }

    /// Store the signing key and an optional kid to emit in the unprotected
    /// headers.  The key must be valid for the context's algorithm; the
    /// crypto provider checks this when the signature is produced.
    pub fn set_signing_key(&mut self, key: &'a P::Key, kid: Option<Vec<u8>>) {
        self.key = Some(key);
        if let Some(kid) = kid {
            self.kid = kid;
        }
    }

    /// Attach a CoAP content format number to the protected headers.
    pub fn set_content_type_int(&mut self, content_type: u16) {
        self.content_type = Some(ContentType::Assigned(content_type));
    }

    /// Attach a media type name to the protected headers.  Subject to the
    /// [`MAX_PROTECTED_HEADER_LEN`] scratch limit.
    pub fn set_content_type_text(&mut self, content_type: String) {
        self.content_type = Some(ContentType::Text(content_type));
    }

    /// Emit the opening of the message into `output`: the optional tag, the
    /// four-element array head, the protected-headers byte string and the
    /// unprotected-headers map.  On return the caller emits the payload as a
    /// single byte string, then calls
    /// [`encode_signature`](Self::encode_signature).
    pub fn encode_parameters(&mut self, output: &mut Vec<u8>) -> Result<()> {
        if self.phase != SignerPhase::Init {
            return Err(CoseError::InvalidArgument);
        }
        match self.encode_parameters_inner(output) {
            Ok(()) => {
                self.phase = SignerPhase::HeadersEmitted;
                Ok(())
            }
            Err(e) => {
                self.phase = SignerPhase::Finished;
                Err(e)
            }
        }
    }

    fn encode_parameters_inner(&mut self, output: &mut Vec<u8>) -> Result<()> {
        if !self.options.contains(SignOptions::OMIT_CBOR_TAG) {
            util::write_head(
                output,
                util::MAJOR_TAG,
                iana::CborTag::CoseSign1.to_i64() as u64,
            );
        }
        util::write_head(output, util::MAJOR_ARRAY, 4);

        let protected = Header {
            alg: Some(self.alg.id.to_i64()),
            content_type: self.content_type.take(),
            ..Default::default()
        };
        self.protected_data = header::encode_protected(protected)?;
        util::write_head(output, util::MAJOR_BSTR, self.protected_data.len() as u64);
        output.extend_from_slice(&self.protected_data);

        let unprotected = Header {
            kid: self.unprotected_kid(),
            ..Default::default()
        };
        crate::cbor::ser::into_writer(&unprotected.to_cbor_value()?, &mut *output)?;

        self.payload_mark = output.len();
        Ok(())
    }

    /// The kid to emit: short-circuit messages carry the well-known marker
    /// kid in place of any caller-supplied one.
    fn unprotected_kid(&self) -> Vec<u8> {
        #[cfg(feature = "short-circuit-sig")]
        if self.options.contains(SignOptions::SHORT_CIRCUIT_SIG) {
            return SHORT_CIRCUIT_KID.to_vec();
        }
        self.kid.clone()
    }

    /// Emit `payload` into `output` as the message's payload byte string.
    ///
    /// Equivalent to the caller writing the byte string with any CBOR
    /// writer; provided for the common case.
    pub fn add_payload(&mut self, output: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
        if self.phase != SignerPhase::HeadersEmitted {
            return Err(CoseError::InvalidArgument);
        }
        util::write_head(output, util::MAJOR_BSTR, payload.len() as u64);
        output.extend_from_slice(payload);
        Ok(())
    }

    /// Compute and append the signature, completing the message in `output`.
    ///
    /// The bytes the caller wrote since
    /// [`encode_parameters`](Self::encode_parameters) returned must form
    /// exactly one byte string (the payload); anything else fails with
    /// [`CoseError::SigStruct`].  Errors from the payload encoding are thus
    /// detected here, in one place, rather than as they happen.
    pub fn encode_signature(&mut self, output: &mut Vec<u8>) -> Result<()> {
        if self.phase != SignerPhase::HeadersEmitted {
            return Err(CoseError::InvalidArgument);
        }
        // Absorbing: the context is spent whether or not signing succeeds.
        self.phase = SignerPhase::Finished;
        self.encode_signature_inner(output)
    }

    fn encode_signature_inner(&mut self, output: &mut Vec<u8>) -> Result<()> {
        if self.payload_mark > output.len() {
            return Err(CoseError::InvalidArgument);
        }
        let payload = match read_to_value(&output[self.payload_mark..]) {
            Ok(Value::Bytes(b)) => b,
            Ok(Value::Null) => return Err(CoseError::DetachedPayload),
            Ok(_) | Err(_) => return Err(CoseError::SigStruct),
        };

        let mut digest = [0u8; MAX_DIGEST_SIZE];
        let digest_len = hash_sig_structure(
            self.provider,
            self.alg.hash,
            &self.protected_data,
            &[],
            &payload,
            &mut digest,
        )?;
        let digest = &digest[..digest_len];

        let sig_len = self.alg.signature_size();
        let mut sig_buf = [0u8; MAX_SIGNATURE_SIZE];
        if self.options.contains(SignOptions::SHORT_CIRCUIT_SIG) {
            #[cfg(not(feature = "short-circuit-sig"))]
            return Err(CoseError::ShortCircuitSigDisabled);
            #[cfg(feature = "short-circuit-sig")]
            short_circuit_signature(digest, &mut sig_buf[..sig_len]);
        } else {
            let key = self.key.ok_or(CoseError::EmptyKey)?;
            let produced = self.provider.sign(self.alg, key, digest, &mut sig_buf)?;
            if produced != sig_len {
                return Err(CoseError::SigFail);
            }
        }

        util::write_head(output, util::MAJOR_BSTR, sig_len as u64);
        output.extend_from_slice(&sig_buf[..sig_len]);
        Ok(())
    }

    /// Sign an in-memory payload, returning the complete encoded message.
    ///
    /// Convenience wrapper running
    /// [`encode_parameters`](Self::encode_parameters) /
    /// [`add_payload`](Self::add_payload) /
    /// [`encode_signature`](Self::encode_signature) over a fresh buffer.
    pub fn sign(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        if self.phase != SignerPhase::Init {
            return Err(CoseError::InvalidArgument);
        }
        let mut output = Vec::with_capacity(
            payload.len() + MAX_PROTECTED_HEADER_LEN + MAX_SIGNATURE_SIZE + self.kid.len() + 16,
        );
        self.encode_parameters(&mut output)?;
        self.add_payload(&mut output, payload)?;
        self.encode_signature(&mut output)?;
        Ok(output)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VerifierPhase {
    Init,
    Finished,
}

/// Verification context for a single `COSE_Sign1` message.
///
/// One-shot: [`verify`](Self::verify) runs the whole decode+verify pipeline
/// and spends the context; a fresh message needs a fresh context.
pub struct Sign1Verifier<'a, P: CryptoProvider> {
    provider: &'a P,
    options: VerifyOptions,
    key: Option<&'a P::Key>,
    phase: VerifierPhase,
}

impl<'a, P: CryptoProvider> Sign1Verifier<'a, P> {
    /// Create a verification context.
    pub fn new(provider: &'a P, options: VerifyOptions) -> Result<Self> {
        #[cfg(not(feature = "short-circuit-sig"))]
        if options.contains(VerifyOptions::ALLOW_SHORT_CIRCUIT) {
            return Err(CoseError::ShortCircuitSigDisabled);
        }
        Ok(Sign1Verifier {
            provider,
            options,
            key: None,
            phase: VerifierPhase::Init,
        })
    }

    /// Store the verification key.  May be omitted when
    /// [`VerifyOptions::PARSE_ONLY`] is set, or when only short-circuit
    /// messages are expected.
    pub fn set_verification_key(&mut self, key: &'a P::Key) {
        self.key = Some(key);
    }

    /// Decode `message`, check its structure and headers, and verify its
    /// signature, returning the payload and the recovered header parameters.
    pub fn verify(&mut self, message: &[u8]) -> Result<VerifiedSign1> {
        if self.phase != VerifierPhase::Init {
            return Err(CoseError::InvalidArgument);
        }
        self.phase = VerifierPhase::Finished;
        self.verify_inner(message)
    }

    fn verify_inner(&self, message: &[u8]) -> Result<VerifiedSign1> {
        let value = read_to_value(message)?;
        let (value, tagged) = match value {
            Value::Tag(tag, inner) => {
                if tag != iana::CborTag::CoseSign1.to_i64() as u64 {
                    return Err(CoseError::IncorrectlyTagged);
                }
                (*inner, true)
            }
            v => (v, false),
        };
        if self.options.contains(VerifyOptions::TAG_REQUIRED) && !tagged {
            return Err(CoseError::IncorrectlyTagged);
        }

        let mut array = match value {
            Value::Array(a) => a,
            _ => return Err(CoseError::Sign1Format),
        };
        if array.len() != 4 {
            return Err(CoseError::Sign1Format);
        }

        // Remove array elements in reverse order to avoid shifts.
        let sig = match array.remove(3) {
            Value::Bytes(b) => b,
            _ => return Err(CoseError::Sign1Format),
        };
        let payload = match array.remove(2) {
            Value::Bytes(b) => b,
            Value::Null => return Err(CoseError::DetachedPayload),
            _ => return Err(CoseError::Sign1Format),
        };
        let unprotected_value = array.remove(1);
        let protected_data = match array.remove(0) {
            Value::Bytes(b) => b,
            _ => return Err(CoseError::Sign1Format),
        };

        let protected = header::decode_protected(&protected_data)?;
        let unprotected = Header::from_cbor_value(unprotected_value)?;
        header::check_header_rules(
            &protected,
            &unprotected,
            self.options.contains(VerifyOptions::REQUIRE_KID),
        )?;

        let alg_id = protected.alg.ok_or(CoseError::NoAlgId)?;
        let alg = SignatureAlgorithm::lookup(alg_id)?;

        // A signature of any other length cannot be valid for the declared
        // algorithm.
        if sig.len() != alg.signature_size() {
            return Err(CoseError::Sign1Format);
        }

        let params = Parameters {
            algorithm: alg.id,
            key_id: if !unprotected.kid.is_empty() {
                unprotected.kid
            } else {
                protected.kid
            },
            content_type: unprotected.content_type.or(protected.content_type),
            crit: protected.crit,
            cose_tag_present: tagged,
        };

        if self.options.contains(VerifyOptions::PARSE_ONLY) {
            return Ok(VerifiedSign1 { payload, params });
        }

        let mut digest = [0u8; MAX_DIGEST_SIZE];
        let digest_len = hash_sig_structure(
            self.provider,
            alg.hash,
            &protected_data,
            &[],
            &payload,
            &mut digest,
        )?;
        let digest = &digest[..digest_len];

        #[cfg(feature = "short-circuit-sig")]
        if self.options.contains(VerifyOptions::ALLOW_SHORT_CIRCUIT) {
            if params.key_id == SHORT_CIRCUIT_KID {
                let mut expected = [0u8; MAX_SIGNATURE_SIZE];
                short_circuit_signature(digest, &mut expected[..alg.signature_size()]);
                if sig.as_slice() != &expected[..alg.signature_size()] {
                    return Err(CoseError::SigVerify);
                }
                return Ok(VerifiedSign1 { payload, params });
            }
            if self.key.is_none() {
                // Not a short-circuit message, and no key to check a real
                // signature with.
                return Err(CoseError::BadShortCircuitKid);
            }
        }

        let key = self.key.ok_or(CoseError::EmptyKey)?;
        self.provider.verify(alg, key, digest, &sig)?;
        Ok(VerifiedSign1 { payload, params })
    }
}
