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
#![no_main]
use libfuzzer_sys::fuzz_target;

use cose_sign1::{CoseError, CryptoProvider, HashAlgorithm, SignatureAlgorithm};

/// Provider that refuses everything; parse-only decoding never reaches it.
struct NullCrypto;

impl CryptoProvider for NullCrypto {
    type HashSession = ();
    type Key = ();

    fn hash_start(&self, _alg: HashAlgorithm) -> Result<(), CoseError> {
        Err(CoseError::UnsupportedHash)
    }
    fn hash_update(&self, _session: &mut (), _data: &[u8]) {}
    fn hash_finish(&self, _session: (), _out: &mut [u8]) -> Result<usize, CoseError> {
        Err(CoseError::HashGeneralFail)
    }
    fn sign(
        &self,
        _alg: &SignatureAlgorithm,
        _key: &(),
        _digest: &[u8],
        _sig_out: &mut [u8],
    ) -> Result<usize, CoseError> {
        Err(CoseError::SigFail)
    }
    fn verify(
        &self,
        _alg: &SignatureAlgorithm,
        _key: &(),
        _digest: &[u8],
        _sig: &[u8],
    ) -> Result<(), CoseError> {
        Err(CoseError::SigVerify)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut verifier =
        cose_sign1::Sign1Verifier::new(&NullCrypto, cose_sign1::VerifyOptions::PARSE_ONLY)
            .unwrap();
    let _ = verifier.verify(data);
});
