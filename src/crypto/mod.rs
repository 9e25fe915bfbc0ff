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

//! Adaptation interface to the cryptographic library in use.
//!
//! The signing and verification machinery is generic over [`CryptoProvider`],
//! so the crate never touches key material or algorithm internals itself.  A
//! provider is typically a thin wrapper over an existing cryptographic
//! library; the integration tests carry one built on the RustCrypto stack.

use crate::{Result, SignatureAlgorithm};

/// Hash algorithms a provider may be asked to supply.
///
/// One per supported signing algorithm; providers may implement a subset and
/// return [`crate::CoseError::UnsupportedHash`] for the rest.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Size of the digest this algorithm produces, in bytes.
    pub fn output_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// Largest digest size any [`HashAlgorithm`] produces, for sizing stack
/// buffers.
pub const MAX_DIGEST_SIZE: usize = 64;

/// Capability surface the signing/verification machinery consumes.
///
/// A hash session is created by [`hash_start`](Self::hash_start), fed with
/// any number of [`hash_update`](Self::hash_update) calls and consumed by
/// [`hash_finish`](Self::hash_finish); dropping a session without finishing
/// it abandons the computation.  At most one session exists per
/// signing/verification operation.
///
/// Keys are opaque to this crate: it stores references to
/// [`Key`](Self::Key) values and hands them back to the provider, but never
/// inspects them.  Key/provider mismatches are the provider's to report, via
/// [`crate::CoseError::IncorrectKeyForLib`], [`crate::CoseError::WrongTypeOfKey`],
/// [`crate::CoseError::UnknownKey`] or [`crate::CoseError::EmptyKey`].
pub trait CryptoProvider {
    /// In-progress hash computation.
    type HashSession;
    /// Opaque key handle; the caller keeps it alive for the duration of the
    /// signing/verification operation.
    type Key;

    /// Begin a hash computation.
    fn hash_start(&self, alg: HashAlgorithm) -> Result<Self::HashSession>;

    /// Feed bytes into a hash computation.  Failures are reported at
    /// [`hash_finish`](Self::hash_finish).
    fn hash_update(&self, session: &mut Self::HashSession, data: &[u8]);

    /// Complete a hash computation, writing the digest into `out` and
    /// returning its length.
    ///
    /// Errors: [`crate::CoseError::HashBufferSize`] if `out` is too small,
    /// [`crate::CoseError::HashGeneralFail`] for provider failures.
    fn hash_finish(&self, session: Self::HashSession, out: &mut [u8]) -> Result<usize>;

    /// Produce a signature over `digest`, writing it into `sig_out` and
    /// returning its length.  The signature must be in the fixed-size COSE
    /// wire form for `alg` (for ECDSA: `r || s`, each padded to the curve
    /// coordinate size).
    ///
    /// Errors: [`crate::CoseError::SigBufferSize`] if `sig_out` is too small,
    /// [`crate::CoseError::SigFail`] for provider failures, or one of the key
    /// errors above.
    fn sign(
        &self,
        alg: &SignatureAlgorithm,
        key: &Self::Key,
        digest: &[u8],
        sig_out: &mut [u8],
    ) -> Result<usize>;

    /// Check `sig` over `digest`.
    ///
    /// Errors: [`crate::CoseError::SigVerify`] for a well-formed but wrong
    /// signature, [`crate::CoseError::SigFail`] for provider failures, or one of
    /// the key errors above.
    fn verify(
        &self,
        alg: &SignatureAlgorithm,
        key: &Self::Key,
        digest: &[u8],
        sig: &[u8],
    ) -> Result<()>;
}
