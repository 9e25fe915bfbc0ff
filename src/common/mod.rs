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

//! Common types.

use crate::cbor::value::Value;
use alloc::{string::String, vec::Vec};
use core::{cmp::Ordering, convert::TryInto};


/// Error type for failures in encoding, decoding, signing or verifying
/// `COSE_Sign1` messages.
///
/// The set of variants is stable: new variants may be added over time, but
/// existing ones are never renumbered or removed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CoseError {
    /// Signing algorithm is not in the compiled-in set.
    UnsupportedSigningAlg,
    /// Hash algorithm not implemented by the crypto provider.
    UnsupportedHash,
    /// Algorithm identifier was a text string or outside the 32-bit integer
    /// range.
    NonIntegerAlgId,
    /// Key belongs to a different crypto library than the provider in use.
    IncorrectKeyForLib,
    /// Key is of the wrong type for the algorithm.
    WrongTypeOfKey,
    /// Key is not known to the crypto provider.
    UnknownKey,
    /// No key material was supplied.
    EmptyKey,
    /// Message is well-formed CBOR but not a valid `COSE_Sign1` structure.
    Sign1Format,
    /// Input is not well-formed CBOR.
    CborNotWellFormed,
    /// Header parameters are structurally invalid (bad label or value type,
    /// duplicate label, misplaced parameter).
    HeaderCbor,
    /// Encoded protected headers exceed the fixed scratch size.
    ProtectedHeaders,
    /// No algorithm identifier in the protected headers.
    NoAlgId,
    /// No kid header parameter when one was required.
    NoKid,
    /// More header parameters than this implementation processes.
    TooManyHeaders,
    /// A critical header parameter listed a label this implementation does
    /// not understand.
    UnknownCriticalHeader,
    /// Content type parameter is neither a text string nor an integer in
    /// `0..=65535`.
    BadContentType,
    /// CBOR tag 18 was required but absent, or an unexpected tag was present.
    IncorrectlyTagged,
    /// Payload is `nil` (detached content), which this crate does not
    /// support.
    DetachedPayload,
    /// Crypto provider failed while hashing.
    HashGeneralFail,
    /// Supplied buffer is too small for the computed digest.
    HashBufferSize,
    /// Supplied buffer is too small for the computed signature.
    SigBufferSize,
    /// Signature verification failed.
    SigVerify,
    /// Crypto provider failed while signing or verifying.
    SigFail,
    /// The to-be-signed `Sig_structure` could not be constructed.
    SigStruct,
    /// Data inconsistency detected during verification.
    TamperingDetected,
    /// Out of memory.
    InsufficientMemory,
    /// Supplied output buffer is too small.
    TooSmall,
    /// Operation invoked in the wrong order or with invalid arguments.
    InvalidArgument,
    /// CBOR could not be encoded.
    CborFormatting,
    /// Short-circuit signature processing failed.
    ShortCircuitSig,
    /// Short-circuit signatures were disabled at compile time.
    ShortCircuitSigDisabled,
    /// Kid on a short-circuit message did not match the well-known value.
    BadShortCircuitKid,
    /// General failure.
    Fail,
}

/// Crate-specific Result type
pub type Result<T, E = CoseError> = core::result::Result<T, E>;

impl<T> core::convert::From<crate::cbor::de::Error<T>> for CoseError {
    fn from(_e: crate::cbor::de::Error<T>) -> Self {
        CoseError::CborNotWellFormed
    }
}

impl<T> core::convert::From<crate::cbor::ser::Error<T>> for CoseError {
    fn from(_e: crate::cbor::ser::Error<T>) -> Self {
        CoseError::CborFormatting
    }
}

impl core::convert::From<core::num::TryFromIntError> for CoseError {
    fn from(_: core::num::TryFromIntError) -> Self {
        CoseError::HeaderCbor
    }
}

impl core::fmt::Display for CoseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            CoseError::UnsupportedSigningAlg => "unsupported signing algorithm",
            CoseError::UnsupportedHash => "unsupported hash algorithm",
            CoseError::NonIntegerAlgId => "algorithm identifier not a 32-bit integer",
            CoseError::IncorrectKeyForLib => "key is for a different crypto library",
            CoseError::WrongTypeOfKey => "wrong type of key for algorithm",
            CoseError::UnknownKey => "key not known to crypto provider",
            CoseError::EmptyKey => "no key supplied",
            CoseError::Sign1Format => "invalid COSE_Sign1 structure",
            CoseError::CborNotWellFormed => "input not well-formed CBOR",
            CoseError::HeaderCbor => "invalid header parameters",
            CoseError::ProtectedHeaders => "protected headers exceed scratch size",
            CoseError::NoAlgId => "no algorithm identifier in protected headers",
            CoseError::NoKid => "required kid header absent",
            CoseError::TooManyHeaders => "too many header parameters",
            CoseError::UnknownCriticalHeader => "unknown critical header parameter",
            CoseError::BadContentType => "invalid content type parameter",
            CoseError::IncorrectlyTagged => "incorrect CBOR tagging",
            CoseError::DetachedPayload => "detached payload not supported",
            CoseError::HashGeneralFail => "hashing failed",
            CoseError::HashBufferSize => "digest buffer too small",
            CoseError::SigBufferSize => "signature buffer too small",
            CoseError::SigVerify => "signature verification failed",
            CoseError::SigFail => "signing/verification operation failed",
            CoseError::SigStruct => "could not construct Sig_structure",
            CoseError::TamperingDetected => "tampering detected",
            CoseError::InsufficientMemory => "out of memory",
            CoseError::TooSmall => "output buffer too small",
            CoseError::InvalidArgument => "invalid argument or call sequence",
            CoseError::CborFormatting => "CBOR encoding failed",
            CoseError::ShortCircuitSig => "short-circuit signature processing failed",
            CoseError::ShortCircuitSigDisabled => "short-circuit signatures disabled",
            CoseError::BadShortCircuitKid => "bad short-circuit kid",
            CoseError::Fail => "general failure",
        };
        write!(f, "{}", msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoseError {}

/// Read a CBOR [`Value`] from a byte slice, failing if any extra data remains
/// after the `Value` has been read.
pub(crate) fn read_to_value(mut slice: &[u8]) -> Result<Value> {
    let value = crate::cbor::de::from_reader(&mut slice)?;
    if slice.is_empty() {
        Ok(value)
    } else {
        Err(CoseError::CborNotWellFormed)
    }
}

/// Trait for types that can be converted to/from a [`Value`].
pub trait AsCborValue: Sized {
    /// Convert a [`Value`] into an instance of the type.
    fn from_cbor_value(value: Value) -> Result<Self>;
    /// Convert the object into a [`Value`], consuming it along the way.
    fn to_cbor_value(self) -> Result<Value>;
}

/// Extension trait that adds serialization/deserialization methods.
pub trait CborSerializable: AsCborValue {
    /// Create an object instance from serialized CBOR data in a slice.  This
    /// method will fail (with `CoseError::CborNotWellFormed`) if there is
    /// additional data after the object.
    fn from_slice(slice: &[u8]) -> Result<Self> {
        Self::from_cbor_value(read_to_value(slice)?)
    }

    /// Serialize this object to a vector, consuming it along the way.
    fn to_vec(self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        crate::cbor::ser::into_writer(&self.to_cbor_value()?, &mut data)?;
        Ok(data)
    }
}

/// Trivial implementation of [`AsCborValue`] for [`Value`].
impl AsCborValue for Value {
    fn from_cbor_value(value: Value) -> Result<Self> {
        Ok(value)
    }
    fn to_cbor_value(self) -> Result<Value> {
        Ok(self)
    }
}

impl CborSerializable for Value {}

/// A COSE label may be either a signed integer value or a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl CborSerializable for Label {}

/// Manual implementation of [`Ord`] to ensure that CBOR canonical ordering is
/// respected.
///
/// Note that this uses the ordering given by RFC 8949 section 4.2.1
/// (lexicographic ordering of encoded form), which is *different* from the
/// canonical ordering defined in RFC 7049 section 3.9 (where the primary
/// sorting criterion is the length of the encoded form)
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Label::Int(i1), Label::Int(i2)) => match (i1.signum(), i2.signum()) {
                (-1, -1) => i2.cmp(i1),
                (-1, 0) => Ordering::Greater,
                (-1, 1) => Ordering::Greater,
                (0, -1) => Ordering::Less,
                (0, 0) => Ordering::Equal,
                (0, 1) => Ordering::Less,
                (1, -1) => Ordering::Less,
                (1, 0) => Ordering::Greater,
                (1, 1) => i1.cmp(i2),
                (_, _) => unreachable!(), // safe: all possibilies covered
            },
            (Label::Int(_i1), Label::Text(_t2)) => Ordering::Less,
            (Label::Text(_t1), Label::Int(_i2)) => Ordering::Greater,
            (Label::Text(t1), Label::Text(t2)) => t1.len().cmp(&t2.len()).then(t1.cmp(t2)),
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AsCborValue for Label {
    fn from_cbor_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(Label::Int(i.try_into()?)),
            Value::Text(t) => Ok(Label::Text(t)),
            _ => Err(CoseError::HeaderCbor),
        }
    }
    fn to_cbor_value(self) -> Result<Value> {
        Ok(match self {
            Label::Int(i) => Value::from(i),
            Label::Text(t) => Value::Text(t),
        })
    }
}
