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

//! Creation and verification of [COSE_Sign1][SIGN1] single-signer signed
//! messages, as defined by [RFC 8152][COSE] / RFC 9052.
//!
//! Builds on the [`ciborium`](https://docs.rs/ciborium) crate for underlying
//! [CBOR][CBOR] support, and is agnostic about the cryptographic library in
//! use: all hashing and signing goes through the [`CryptoProvider`] trait,
//! which the caller implements over whatever library holds their keys.
//!
//! Signing is a cooperative process: the signer emits the message framing and
//! headers into a caller-provided output buffer, the caller contributes the
//! payload byte string (directly, or via any CBOR writer targeting the same
//! buffer), and the signer then computes the signature over the standard
//! `Sig_structure` and completes the message.  [`Sign1Signer::sign`] wraps the
//! whole sequence for the common case of an in-memory payload.
//!
//! ## Usage
//!
//! ```
//! # use cose_sign1::{CoseError, CryptoProvider, HashAlgorithm, SignatureAlgorithm};
//! # use sha2::Digest;
//! # struct TestCrypto;
//! # enum Hasher {
//! #     Sha256(sha2::Sha256),
//! #     Sha384(sha2::Sha384),
//! #     Sha512(sha2::Sha512),
//! # }
//! # impl CryptoProvider for TestCrypto {
//! #     type HashSession = Hasher;
//! #     type Key = ();
//! #     fn hash_start(&self, alg: HashAlgorithm) -> Result<Hasher, CoseError> {
//! #         Ok(match alg {
//! #             HashAlgorithm::Sha256 => Hasher::Sha256(sha2::Sha256::new()),
//! #             HashAlgorithm::Sha384 => Hasher::Sha384(sha2::Sha384::new()),
//! #             HashAlgorithm::Sha512 => Hasher::Sha512(sha2::Sha512::new()),
//! #         })
//! #     }
//! #     fn hash_update(&self, session: &mut Hasher, data: &[u8]) {
//! #         match session {
//! #             Hasher::Sha256(h) => h.update(data),
//! #             Hasher::Sha384(h) => h.update(data),
//! #             Hasher::Sha512(h) => h.update(data),
//! #         }
//! #     }
//! #     fn hash_finish(&self, session: Hasher, out: &mut [u8]) -> Result<usize, CoseError> {
//! #         let digest = match session {
//! #             Hasher::Sha256(h) => h.finalize().to_vec(),
//! #             Hasher::Sha384(h) => h.finalize().to_vec(),
//! #             Hasher::Sha512(h) => h.finalize().to_vec(),
//! #         };
//! #         if out.len() < digest.len() {
//! #             return Err(CoseError::HashBufferSize);
//! #         }
//! #         out[..digest.len()].copy_from_slice(&digest);
//! #         Ok(digest.len())
//! #     }
//! #     fn sign(
//! #         &self,
//! #         _alg: &SignatureAlgorithm,
//! #         _key: &(),
//! #         _digest: &[u8],
//! #         _sig_out: &mut [u8],
//! #     ) -> Result<usize, CoseError> {
//! #         Err(CoseError::SigFail)
//! #     }
//! #     fn verify(
//! #         &self,
//! #         _alg: &SignatureAlgorithm,
//! #         _key: &(),
//! #         _digest: &[u8],
//! #         _sig: &[u8],
//! #     ) -> Result<(), CoseError> {
//! #         Err(CoseError::SigVerify)
//! #     }
//! # }
//! use cose_sign1::{iana, Sign1Signer, Sign1Verifier, SignOptions, VerifyOptions};
//!
//! // A provider implementing `CryptoProvider` over some crypto library.
//! let provider = TestCrypto;
//!
//! // Sign a payload.  Short-circuit "signatures" need no key material, which
//! // makes them handy for exercising an integration before real keys exist.
//! let mut signer = Sign1Signer::new(
//!     &provider,
//!     SignOptions::SHORT_CIRCUIT_SIG,
//!     iana::Algorithm::ES256,
//! )?;
//! let message = signer.sign(b"This is the content")?;
//!
//! // At the receiving end, decode and check the message in one call.
//! let mut verifier = Sign1Verifier::new(&provider, VerifyOptions::ALLOW_SHORT_CIRCUIT)?;
//! let verified = verifier.verify(&message)?;
//! assert_eq!(verified.payload, b"This is the content");
//! assert_eq!(verified.params.algorithm, iana::Algorithm::ES256);
//! # Ok::<(), CoseError>(())
//! ```
//!
//! [SIGN1]: https://tools.ietf.org/html/rfc8152#section-4.2
//! [COSE]: https://tools.ietf.org/html/rfc8152
//! [CBOR]: https://tools.ietf.org/html/rfc7049

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(rustdoc::broken_intra_doc_links)]
extern crate alloc;

/// Re-export of the `ciborium` crate used for underlying CBOR encoding.
pub use ciborium as cbor;

pub(crate) mod util;

pub mod iana;

mod alg;
pub use alg::*;
mod common;
pub use common::*;
mod crypto;
pub use crypto::*;
mod header;
pub use header::*;
mod sig_structure;
pub use sig_structure::*;
mod sign;
pub use sign::*;
