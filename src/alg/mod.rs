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

//! Registry of supported signing algorithms.

use crate::{
    iana,
    iana::EnumI64,
    CoseError, HashAlgorithm, Result,
};


/// Largest signature size any compiled-in algorithm produces (ES512 over
/// P-521), for sizing stack buffers.
pub const MAX_SIGNATURE_SIZE: usize = 132;

/// Properties of a supported signing algorithm.
#[derive(Debug, Eq, PartialEq)]
pub struct SignatureAlgorithm {
    /// Algorithm identifier.
    pub id: iana::Algorithm,
    /// Hash fed with the `Sig_structure`.
    pub hash: HashAlgorithm,
    /// Curve the signing key must be on.
    pub curve: iana::EllipticCurve,
}

/// Size in bytes of one coordinate on `curve`, from the curve order.
const fn coordinate_size(curve: iana::EllipticCurve) -> usize {
    let bits = match curve {
        iana::EllipticCurve::P_256 => 256,
        iana::EllipticCurve::P_384 => 384,
        iana::EllipticCurve::P_521 => 521,
        _ => 0,
    };
    (bits + 7) / 8
}

impl SignatureAlgorithm {
    /// Size in bytes of the signatures this algorithm produces: `r || s`,
    /// each the size of a curve coordinate.
    pub const fn signature_size(&self) -> usize {
        2 * coordinate_size(self.curve)
    }

    /// Resolve an algorithm identifier from the COSE registry into its
    /// properties.
    ///
    /// Fails with [`CoseError::UnsupportedSigningAlg`] for identifiers
    /// outside the compiled-in set.
    pub fn lookup(alg_id: i64) -> Result<&'static SignatureAlgorithm> {
        match iana::Algorithm::from_i64(alg_id) {
            Some(iana::Algorithm::ES256) => Ok(&ES256),
            #[cfg(feature = "es384")]
            Some(iana::Algorithm::ES384) => Ok(&ES384),
            #[cfg(feature = "es512")]
            Some(iana::Algorithm::ES512) => Ok(&ES512),
            _ => Err(CoseError::UnsupportedSigningAlg),
        }
    }

    /// Indicate whether `alg_id` is in the compiled-in set.
    pub fn is_supported(alg_id: i64) -> bool {
        Self::lookup(alg_id).is_ok()
    }
}

static ES256: SignatureAlgorithm = SignatureAlgorithm {
    id: iana::Algorithm::ES256,
    hash: HashAlgorithm::Sha256,
    curve: iana::EllipticCurve::P_256,
};

#[cfg(feature = "es384")]
static ES384: SignatureAlgorithm = SignatureAlgorithm {
    id: iana::Algorithm::ES384,
    hash: HashAlgorithm::Sha384,
    curve: iana::EllipticCurve::P_384,
};

#[cfg(feature = "es512")]
static ES512: SignatureAlgorithm = SignatureAlgorithm {
    id: iana::Algorithm::ES512,
    hash: HashAlgorithm::Sha512,
    curve: iana::EllipticCurve::P_521,
};
