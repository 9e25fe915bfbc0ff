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

//! COSE header parameter functionality.

use crate::{
    cbor::value::Value,
    common::read_to_value,
    iana,
    iana::EnumI64,
    AsCborValue, CborSerializable, CoseError, Label, Result,
};
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::convert::TryInto;


/// Fixed size of the scratch buffer for encoded protected headers: one byte
/// of map head, one byte for the `alg` label, five bytes for a 32-bit
/// algorithm identifier, and slack for a small content type parameter.
pub const MAX_PROTECTED_HEADER_LEN: usize = 16;

/// Maximum number of integer-labeled (and, separately, text-labeled) header
/// parameters processed across both buckets of a message.
pub const PARAMETER_LIST_MAX: usize = 10;

const ALG: i64 = iana::HeaderParameter::Alg as i64;
const CRIT: i64 = iana::HeaderParameter::Crit as i64;
const CONTENT_TYPE: i64 = iana::HeaderParameter::ContentType as i64;
const KID: i64 = iana::HeaderParameter::Kid as i64;

/// Content type of the payload: either a CoAP content format number or a
/// media type name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContentType {
    Assigned(u16),
    Text(String),
}

impl AsCborValue for ContentType {
    fn from_cbor_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => {
                let i: u16 = i.try_into().map_err(|_| CoseError::BadContentType)?;
                Ok(ContentType::Assigned(i))
            }
            Value::Text(t) => Ok(ContentType::Text(t)),
            _ => Err(CoseError::BadContentType),
        }
    }
    fn to_cbor_value(self) -> Result<Value> {
        Ok(match self {
            ContentType::Assigned(i) => Value::from(i64::from(i)),
            ContentType::Text(t) => Value::Text(t),
        })
    }
}

/// Structure representing one bucket of a COSE header map.
///
/// ```cddl
///   header_map = {
///       Generic_Headers,
///       * label => values
///   }
///
///   Generic_Headers = (
///       ? 1 => int / tstr,  ; algorithm identifier
///       ? 2 => [+label],    ; criticality
///       ? 3 => tstr / int,  ; content type
///       ? 4 => bstr,        ; key identifier
///   )
///  ```
///
/// Which bucket a parameter is allowed to live in, and the cross-bucket
/// invariants, are enforced when a whole message is processed; a `Header` on
/// its own is bucket-agnostic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    /// Algorithm identifier.  Always an integer representable in 32 bits;
    /// text-string identifiers are rejected on decode.
    pub alg: Option<i64>,
    /// Critical header labels to be understood.
    pub crit: Vec<Label>,
    /// Content type of the payload.
    pub content_type: Option<ContentType>,
    /// Key identifier; empty when absent.
    pub kid: Vec<u8>,
    /// Any additional header parameters, carried but not interpreted.
    pub rest: BTreeMap<Label, Value>,
}

impl Header {
    /// Indicate whether the `Header` is empty.
    pub fn is_empty(&self) -> bool {
        self.alg.is_none()
            && self.crit.is_empty()
            && self.content_type.is_none()
            && self.kid.is_empty()
            && self.rest.is_empty()
    }

    /// Number of (integer-labeled, text-labeled) parameters in this bucket.
    fn label_counts(&self) -> (usize, usize) {
        let mut ints = 0;
        let mut texts = 0;
        if self.alg.is_some() {
            ints += 1;
        }
        if !self.crit.is_empty() {
            ints += 1;
        }
        if self.content_type.is_some() {
            ints += 1;
        }
        if !self.kid.is_empty() {
            ints += 1;
        }
        for label in self.rest.keys() {
            match label {
                Label::Int(_) => ints += 1,
                Label::Text(_) => texts += 1,
            }
        }
        (ints, texts)
    }
}

impl CborSerializable for Header {}

impl AsCborValue for Header {
    fn from_cbor_value(value: Value) -> Result<Self> {
        let m = match value {
            Value::Map(m) => m,
            _ => return Err(CoseError::HeaderCbor),
        };

        let mut headers = Self::default();
        let mut kid_seen = false;
        for (label, value) in m.into_iter() {
            match label {
                Value::Integer(i) => {
                    let label: i64 = i.try_into()?;
                    match iana::HeaderParameter::from_i64(label) {
                        Some(iana::HeaderParameter::Alg) => {
                            if headers.alg.is_some() {
                                return Err(CoseError::HeaderCbor);
                            }
                            headers.alg = Some(alg_id_value(value)?);
                        }

                        Some(iana::HeaderParameter::Crit) => {
                            if !headers.crit.is_empty() {
                                return Err(CoseError::HeaderCbor);
                            }
                            match value {
                                Value::Array(a) => {
                                    if a.is_empty() {
                                        return Err(CoseError::HeaderCbor);
                                    }
                                    for v in a {
                                        headers.crit.push(Label::from_cbor_value(v)?);
                                    }
                                }
                                _ => return Err(CoseError::HeaderCbor),
                            }
                        }

                        Some(iana::HeaderParameter::ContentType) => {
                            if headers.content_type.is_some() {
                                return Err(CoseError::HeaderCbor);
                            }
                            headers.content_type = Some(ContentType::from_cbor_value(value)?);
                        }

                        Some(iana::HeaderParameter::Kid) => {
                            if kid_seen {
                                return Err(CoseError::HeaderCbor);
                            }
                            match value {
                                Value::Bytes(v) => {
                                    headers.kid = v;
                                    kid_seen = true;
                                }
                                _ => return Err(CoseError::HeaderCbor),
                            }
                        }

                        _ => insert_unknown(&mut headers.rest, Label::Int(label), value)?,
                    }
                }
                Value::Text(t) => insert_unknown(&mut headers.rest, Label::Text(t), value)?,
                _ => return Err(CoseError::HeaderCbor),
            }
        }
        Ok(headers)
    }

    fn to_cbor_value(self) -> Result<Value> {
        let mut map = Vec::<(Value, Value)>::new();
        if let Some(alg) = self.alg {
            map.push((Value::from(ALG), Value::from(alg)));
        }
        if !self.crit.is_empty() {
            let mut arr = Vec::new();
            for label in self.crit {
                arr.push(label.to_cbor_value()?);
            }
            map.push((Value::from(CRIT), Value::Array(arr)));
        }
        if let Some(content_type) = self.content_type {
            map.push((Value::from(CONTENT_TYPE), content_type.to_cbor_value()?));
        }
        if !self.kid.is_empty() {
            map.push((Value::from(KID), Value::Bytes(self.kid)));
        }
        for (label, value) in self.rest {
            map.push((label.to_cbor_value()?, value));
        }
        Ok(Value::Map(map))
    }
}

/// Parse an `alg` header value: an integer representable in 32 bits.
fn alg_id_value(value: Value) -> Result<i64> {
    match value {
        Value::Integer(i) => {
            let alg: i64 = i.try_into().map_err(|_| CoseError::NonIntegerAlgId)?;
            if alg < i64::from(i32::MIN) || alg > i64::from(i32::MAX) {
                return Err(CoseError::NonIntegerAlgId);
            }
            Ok(alg)
        }
        Value::Text(_) => Err(CoseError::NonIntegerAlgId),
        _ => Err(CoseError::HeaderCbor),
    }
}

fn insert_unknown(rest: &mut BTreeMap<Label, Value>, label: Label, value: Value) -> Result<()> {
    use alloc::collections::btree_map::Entry;
    match rest.entry(label) {
        Entry::Occupied(_) => Err(CoseError::HeaderCbor),
        Entry::Vacant(ve) => {
            ve.insert(value);
            Ok(())
        }
    }
}

/// Parse the contents of a protected-headers byte string: a zero-length
/// string stands for an empty header map.
pub(crate) fn decode_protected(raw: &[u8]) -> Result<Header> {
    if raw.is_empty() {
        return Ok(Header::default());
    }
    Header::from_cbor_value(read_to_value(raw)?)
}

/// Serialize protected headers into the byte-string form, enforcing the
/// fixed scratch size.  An empty header map encodes as a zero-length string.
pub(crate) fn encode_protected(header: Header) -> Result<Vec<u8>> {
    if header.is_empty() {
        return Ok(Vec::new());
    }
    let mut data = Vec::new();
    crate::cbor::ser::into_writer(&header.to_cbor_value()?, &mut data)?;
    if data.len() > MAX_PROTECTED_HEADER_LEN {
        return Err(CoseError::ProtectedHeaders);
    }
    Ok(data)
}

/// Enforce the cross-bucket header invariants on a decoded message:
///
/// - `alg` present exactly once, in the protected bucket;
/// - `crit` only protected, every listed label understood;
/// - no label present in both buckets;
/// - no more than [`PARAMETER_LIST_MAX`] parameters of each label kind;
/// - a kid present somewhere when `require_kid` is set.
pub(crate) fn check_header_rules(
    protected: &Header,
    unprotected: &Header,
    require_kid: bool,
) -> Result<()> {
    if unprotected.alg.is_some() {
        return Err(CoseError::HeaderCbor);
    }
    if protected.alg.is_none() {
        return Err(CoseError::NoAlgId);
    }

    if !unprotected.crit.is_empty() {
        return Err(CoseError::HeaderCbor);
    }
    for label in &protected.crit {
        let understood = match label {
            Label::Int(l) => matches!(
                iana::HeaderParameter::from_i64(*l),
                Some(iana::HeaderParameter::Alg)
                    | Some(iana::HeaderParameter::Crit)
                    | Some(iana::HeaderParameter::ContentType)
                    | Some(iana::HeaderParameter::Kid)
            ),
            Label::Text(_) => false,
        };
        if !understood {
            return Err(CoseError::UnknownCriticalHeader);
        }
    }

    if protected.content_type.is_some() && unprotected.content_type.is_some() {
        return Err(CoseError::HeaderCbor);
    }
    if !protected.kid.is_empty() && !unprotected.kid.is_empty() {
        return Err(CoseError::HeaderCbor);
    }
    for label in protected.rest.keys() {
        if unprotected.rest.contains_key(label) {
            return Err(CoseError::HeaderCbor);
        }
    }

    let (p_ints, p_texts) = protected.label_counts();
    let (u_ints, u_texts) = unprotected.label_counts();
    if p_ints + u_ints > PARAMETER_LIST_MAX || p_texts + u_texts > PARAMETER_LIST_MAX {
        return Err(CoseError::TooManyHeaders);
    }

    if require_kid && protected.kid.is_empty() && unprotected.kid.is_empty() {
        return Err(CoseError::NoKid);
    }
    Ok(())
}
