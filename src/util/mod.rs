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

//! Common internal utilities.

use alloc::vec::Vec;


/// CBOR major type for byte strings.
pub(crate) const MAJOR_BSTR: u8 = 2;
/// CBOR major type for text strings.
pub(crate) const MAJOR_TSTR: u8 = 3;
/// CBOR major type for arrays.
pub(crate) const MAJOR_ARRAY: u8 = 4;
/// CBOR major type for tags.
pub(crate) const MAJOR_TAG: u8 = 6;

/// Maximum encoded length of a CBOR data item head.
pub(crate) const MAX_HEAD_LEN: usize = 9;

/// Encode the head of a definite-length CBOR data item into `buf`, returning
/// the number of bytes used.  Always produces the preferred (shortest-form)
/// serialization, matching what `ciborium` emits for complete items.
pub(crate) fn encode_head(major: u8, value: u64, buf: &mut [u8; MAX_HEAD_LEN]) -> usize {
    let mt = major << 5;
    if value < 24 {
        buf[0] = mt | (value as u8);
        1
    } else if value <= u8::MAX as u64 {
        buf[0] = mt | 24;
        buf[1] = value as u8;
        2
    } else if value <= u16::MAX as u64 {
        buf[0] = mt | 25;
        buf[1..3].copy_from_slice(&(value as u16).to_be_bytes());
        3
    } else if value <= u32::MAX as u64 {
        buf[0] = mt | 26;
        buf[1..5].copy_from_slice(&(value as u32).to_be_bytes());
        5
    } else {
        buf[0] = mt | 27;
        buf[1..9].copy_from_slice(&value.to_be_bytes());
        9
    }
}

/// Append the head of a definite-length CBOR data item to `out`.
pub(crate) fn write_head(out: &mut Vec<u8>, major: u8, value: u64) {
    let mut buf = [0u8; MAX_HEAD_LEN];
    let len = encode_head(major, value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}
