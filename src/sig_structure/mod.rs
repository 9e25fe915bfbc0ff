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

//! Construction of the to-be-signed `Sig_structure` (RFC 8152 section 4.4).

use crate::{util, CryptoProvider, HashAlgorithm, Result};


/// Context string identifying a `COSE_Sign1` signature.
const SIG_CONTEXT: &str = "Signature1";

/// Feed the canonical encoding of the `Sig_structure`
///
/// ```cddl
///  Sig_structure = [
///      context : "Signature1",
///      body_protected : empty_or_serialized_map,
///      external_aad : bstr,
///      payload : bstr
///  ]
/// ```
///
/// through a hash session and write the digest into `digest_out`, returning
/// its length.
///
/// The structure is streamed into the hash element by element and never
/// materialized.  `protected` must be the protected-header bytes exactly as
/// they appear in the message; reusing them verbatim (rather than
/// re-encoding the header map) is what makes the digest reproducible across
/// implementations whose CBOR encoders make different legal choices.
pub fn hash_sig_structure<P: CryptoProvider>(
    provider: &P,
    hash: HashAlgorithm,
    protected: &[u8],
    external_aad: &[u8],
    payload: &[u8],
    digest_out: &mut [u8],
) -> Result<usize> {
    let mut head = [0u8; util::MAX_HEAD_LEN];
    let mut session = provider.hash_start(hash)?;

    let len = util::encode_head(util::MAJOR_ARRAY, 4, &mut head);
    provider.hash_update(&mut session, &head[..len]);

    let len = util::encode_head(util::MAJOR_TSTR, SIG_CONTEXT.len() as u64, &mut head);
    provider.hash_update(&mut session, &head[..len]);
    provider.hash_update(&mut session, SIG_CONTEXT.as_bytes());

    for bytes in [protected, external_aad, payload] {
        let len = util::encode_head(util::MAJOR_BSTR, bytes.len() as u64, &mut head);
        provider.hash_update(&mut session, &head[..len]);
        provider.hash_update(&mut session, bytes);
    }

    provider.hash_finish(session, digest_out)
}
