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

use super::*;
use crate::HashAlgorithm;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use sha2::Digest;

/// `CryptoProvider` over the RustCrypto ECDSA and SHA-2 implementations.
struct TestCrypto;

enum TestHash {
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

enum TestKey {
    P256(p256::ecdsa::SigningKey),
    P256Pub(p256::ecdsa::VerifyingKey),
    #[cfg(feature = "es384")]
    P384(p384::ecdsa::SigningKey),
    #[cfg(feature = "es384")]
    P384Pub(p384::ecdsa::VerifyingKey),
    #[cfg(feature = "es512")]
    P521(p521::ecdsa::SigningKey),
    #[cfg(feature = "es512")]
    P521Pub(p521::ecdsa::VerifyingKey),
}

fn put_sig(sig: &[u8], sig_out: &mut [u8]) -> crate::Result<usize> {
    if sig_out.len() < sig.len() {
        return Err(CoseError::SigBufferSize);
    }
    sig_out[..sig.len()].copy_from_slice(sig);
    Ok(sig.len())
}

impl CryptoProvider for TestCrypto {
    type HashSession = TestHash;
    type Key = TestKey;

    fn hash_start(&self, alg: HashAlgorithm) -> crate::Result<TestHash> {
        Ok(match alg {
            HashAlgorithm::Sha256 => TestHash::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => TestHash::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => TestHash::Sha512(sha2::Sha512::new()),
        })
    }

    fn hash_update(&self, session: &mut TestHash, data: &[u8]) {
        match session {
            TestHash::Sha256(h) => h.update(data),
            TestHash::Sha384(h) => h.update(data),
            TestHash::Sha512(h) => h.update(data),
        }
    }

    fn hash_finish(&self, session: TestHash, out: &mut [u8]) -> crate::Result<usize> {
        let digest = match session {
            TestHash::Sha256(h) => h.finalize().to_vec(),
            TestHash::Sha384(h) => h.finalize().to_vec(),
            TestHash::Sha512(h) => h.finalize().to_vec(),
        };
        if out.len() < digest.len() {
            return Err(CoseError::HashBufferSize);
        }
        out[..digest.len()].copy_from_slice(&digest);
        Ok(digest.len())
    }

    fn sign(
        &self,
        alg: &SignatureAlgorithm,
        key: &TestKey,
        digest: &[u8],
        sig_out: &mut [u8],
    ) -> crate::Result<usize> {
        match (alg.id, key) {
            (iana::Algorithm::ES256, TestKey::P256(sk)) => {
                let sig: p256::ecdsa::Signature =
                    sk.sign_prehash(digest).map_err(|_| CoseError::SigFail)?;
                put_sig(sig.to_bytes().as_slice(), sig_out)
            }
            #[cfg(feature = "es384")]
            (iana::Algorithm::ES384, TestKey::P384(sk)) => {
                let sig: p384::ecdsa::Signature =
                    sk.sign_prehash(digest).map_err(|_| CoseError::SigFail)?;
                put_sig(sig.to_bytes().as_slice(), sig_out)
            }
            #[cfg(feature = "es512")]
            (iana::Algorithm::ES512, TestKey::P521(sk)) => {
                let sig: p521::ecdsa::Signature =
                    sk.sign_prehash(digest).map_err(|_| CoseError::SigFail)?;
                put_sig(sig.to_bytes().as_slice(), sig_out)
            }
            _ => Err(CoseError::WrongTypeOfKey),
        }
    }

    fn verify(
        &self,
        alg: &SignatureAlgorithm,
        key: &TestKey,
        digest: &[u8],
        sig: &[u8],
    ) -> crate::Result<()> {
        match (alg.id, key) {
            (iana::Algorithm::ES256, TestKey::P256Pub(pk)) => {
                let sig =
                    p256::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::SigVerify)?;
                pk.verify_prehash(digest, &sig)
                    .map_err(|_| CoseError::SigVerify)
            }
            #[cfg(feature = "es384")]
            (iana::Algorithm::ES384, TestKey::P384Pub(pk)) => {
                let sig =
                    p384::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::SigVerify)?;
                pk.verify_prehash(digest, &sig)
                    .map_err(|_| CoseError::SigVerify)
            }
            #[cfg(feature = "es512")]
            (iana::Algorithm::ES512, TestKey::P521Pub(pk)) => {
                let sig =
                    p521::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::SigVerify)?;
                pk.verify_prehash(digest, &sig)
                    .map_err(|_| CoseError::SigVerify)
            }
            _ => Err(CoseError::WrongTypeOfKey),
        }
    }
}

/// The fixed P-256 key pair from the RFC 8152 appendix C test vectors
/// (kid "11").
fn p256_keys() -> (TestKey, TestKey) {
    let d = hex::decode("57c92077664146e876760c9520d054aa93c3afb04e306705db6090308507b4d3")
        .unwrap();
    let sk = p256::ecdsa::SigningKey::from_slice(&d).unwrap();
    let pk = sk.verifying_key().clone();
    (TestKey::P256(sk), TestKey::P256Pub(pk))
}

/// Sign `payload` with ES256 and the fixed key, no kid.
fn sign_es256(payload: &[u8], options: SignOptions) -> Vec<u8> {
    let (sk, _) = p256_keys();
    let mut signer = Sign1Signer::new(&TestCrypto, options, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, None);
    signer.sign(payload).unwrap()
}

/// Encode a tagged `COSE_Sign1` message from raw pieces.
fn encode_message(protected: Vec<u8>, unprotected: Value, payload: Vec<u8>, sig: Vec<u8>) -> Vec<u8> {
    let message = Value::Tag(
        18,
        alloc::boxed::Box::new(Value::Array(vec![
            Value::Bytes(protected),
            unprotected,
            Value::Bytes(payload),
            Value::Bytes(sig),
        ])),
    );
    let mut data = Vec::new();
    crate::cbor::ser::into_writer(&message, &mut data).unwrap();
    data
}

fn encode_map(entries: Vec<(i64, Value)>) -> Vec<u8> {
    let map = Value::Map(
        entries
            .into_iter()
            .map(|(l, v)| (Value::from(l), v))
            .collect(),
    );
    let mut data = Vec::new();
    crate::cbor::ser::into_writer(&map, &mut data).unwrap();
    data
}

#[test]
fn test_es256_round_trip() {
    let (_, pk) = p256_keys();
    let message = sign_es256(b"payload", SignOptions::NONE);

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.payload, b"payload");
    assert_eq!(verified.params.algorithm, iana::Algorithm::ES256);
    assert!(verified.params.key_id.is_empty());
    assert!(verified.params.cose_tag_present);

    // Flip a bit inside the payload byte string: the signature no longer
    // matches.
    let offset = message
        .windows(b"payload".len())
        .position(|w| w == b"payload")
        .unwrap();
    let mut tampered = message.clone();
    tampered[offset + 2] ^= 0x01;
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(verifier.verify(&tampered).unwrap_err(), CoseError::SigVerify);
}

#[test]
fn test_round_trip_payload_sizes() {
    let (_, pk) = p256_keys();
    for len in [0usize, 1, 23, 24, 255, 256, 65536] {
        let payload = vec![0x5a; len];
        let message = sign_es256(&payload, SignOptions::NONE);
        let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
        verifier.set_verification_key(&pk);
        assert_eq!(verifier.verify(&message).unwrap().payload, payload, "len {}", len);
    }
}

#[test]
fn test_signature_size() {
    // The emitted signature is always the declared fixed size.
    let message = sign_es256(b"x", SignOptions::NONE);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::PARSE_ONLY).unwrap();
    verifier.verify(&message).unwrap();
    // 64-byte signature encodes as 58 40 <sig>; it is the message suffix.
    assert_eq!(message[message.len() - 66], 0x58);
    assert_eq!(message[message.len() - 65], 0x40);
}

#[test]
fn test_cwt_message_prefix() {
    // Signed CWT from RFC 8392 appendix A.3: the message must be
    // byte-identical up to the start of the signature.
    let claims = Value::Map(vec![
        (Value::from(1), Value::Text("coap://as.example.com".to_owned())),
        (Value::from(2), Value::Text("erikw".to_owned())),
        (
            Value::from(3),
            Value::Text("coap://light.example.com".to_owned()),
        ),
        (Value::from(4), Value::from(1444064944)),
        (Value::from(5), Value::from(1443944944)),
        (Value::from(6), Value::from(1443944944)),
        (Value::from(7), Value::Bytes(vec![0x0b, 0x71])),
    ]);
    let mut claims_data = Vec::new();
    crate::cbor::ser::into_writer(&claims, &mut claims_data).unwrap();
    assert_eq!(claims_data.len(), 0x50);

    let (sk, pk) = p256_keys();
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, Some(b"AsymmetricECDSA256".to_vec()));
    let message = signer.sign(&claims_data).unwrap();

    let want_prefix = concat!(
        "d28443a10126a104524173796d6d65747269634543445341323536",
        "5850",
        "a70175636f61703a2f2f61732e6578616d706c652e636f6d02656572696b77",
        "037818636f61703a2f2f6c696768742e6578616d706c652e636f6d",
        "041a5612aeb0051a5610d9f0061a5610d9f007420b71",
    );
    assert_eq!(hex::encode(&message[..109]), want_prefix);

    // And it still round-trips.
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::REQUIRE_KID).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.payload, claims_data);
    assert_eq!(verified.params.key_id, b"AsymmetricECDSA256");
}

#[cfg(feature = "es384")]
#[test]
fn test_es384_round_trip() {
    let sk = p384::ecdsa::SigningKey::from_slice(&[0x01; 48]).unwrap();
    let pk = TestKey::P384Pub(sk.verifying_key().clone());
    let sk = TestKey::P384(sk);

    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES384).unwrap();
    signer.set_signing_key(&sk, Some(b"p384".to_vec()));
    let message = signer.sign(b"payload").unwrap();

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.payload, b"payload");
    assert_eq!(verified.params.algorithm, iana::Algorithm::ES384);
}

#[cfg(feature = "es512")]
#[test]
fn test_es512_round_trip() {
    let sk = p521::ecdsa::SigningKey::from_slice(&[0x01; 66]).unwrap();
    let pk = TestKey::P521Pub(p521::ecdsa::VerifyingKey::from(&sk));
    let sk = TestKey::P521(sk);

    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES512).unwrap();
    signer.set_signing_key(&sk, None);
    let message = signer.sign(b"payload").unwrap();

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(verifier.verify(&message).unwrap().payload, b"payload");
}

#[test]
fn test_streamed_payload() {
    // The caller can emit the payload with its own CBOR writer between the
    // two encoding calls.
    let (sk, pk) = p256_keys();
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, None);

    let mut output = Vec::new();
    signer.encode_parameters(&mut output).unwrap();
    crate::cbor::ser::into_writer(&Value::Bytes(b"streamed".to_vec()), &mut output).unwrap();
    signer.encode_signature(&mut output).unwrap();

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(verifier.verify(&output).unwrap().payload, b"streamed");
}

#[test]
fn test_signer_rejects_bad_payload_encoding() {
    // (caller-written bytes after the headers, want_err)
    let tests: Vec<(&[u8], CoseError)> = vec![
        // Two byte strings.
        (b"\x41\x01\x41\x02", CoseError::SigStruct),
        // A text string.
        (b"\x63\x61\x62\x63", CoseError::SigStruct),
        // Truncated byte string.
        (b"\x58", CoseError::SigStruct),
        // Nothing at all.
        (b"", CoseError::SigStruct),
        // nil payload: detached content is recognized but unsupported.
        (b"\xf6", CoseError::DetachedPayload),
    ];
    let (sk, _) = p256_keys();
    for (i, (extra, want_err)) in tests.into_iter().enumerate() {
        let mut signer =
            Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
        signer.set_signing_key(&sk, None);
        let mut output = Vec::new();
        signer.encode_parameters(&mut output).unwrap();
        output.extend_from_slice(extra);
        assert_eq!(
            signer.encode_signature(&mut output).unwrap_err(),
            want_err,
            "case {}",
            i
        );
        // The error poisons the context.
        assert_eq!(
            signer.encode_signature(&mut output).unwrap_err(),
            CoseError::InvalidArgument,
            "case {}",
            i
        );
    }
}

#[test]
fn test_signer_call_order() {
    let (sk, _) = p256_keys();
    let mut output = Vec::new();

    // Payload and signature before headers.
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, None);
    assert_eq!(
        signer.add_payload(&mut output, b"p").unwrap_err(),
        CoseError::InvalidArgument
    );
    assert_eq!(
        signer.encode_signature(&mut output).unwrap_err(),
        CoseError::InvalidArgument
    );

    // Headers twice.
    signer.encode_parameters(&mut output).unwrap();
    assert_eq!(
        signer.encode_parameters(&mut output).unwrap_err(),
        CoseError::InvalidArgument
    );

    // One-shot after streaming has started.
    assert_eq!(signer.sign(b"p").unwrap_err(), CoseError::InvalidArgument);

    // Completing normally, then reusing the spent context.
    signer.add_payload(&mut output, b"p").unwrap();
    signer.encode_signature(&mut output).unwrap();
    assert_eq!(
        signer.encode_signature(&mut output).unwrap_err(),
        CoseError::InvalidArgument
    );
}

#[test]
fn test_signer_without_key() {
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    assert_eq!(signer.sign(b"payload").unwrap_err(), CoseError::EmptyKey);
}

#[test]
fn test_signer_wrong_key_type() {
    let (_, pk) = p256_keys();
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    // A verification key cannot produce signatures.
    signer.set_signing_key(&pk, None);
    assert_eq!(
        signer.sign(b"payload").unwrap_err(),
        CoseError::WrongTypeOfKey
    );
}

#[test]
fn test_signer_protected_headers_too_big() {
    let (sk, _) = p256_keys();
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, None);
    signer.set_content_type_text("application/octet-stream".to_owned());
    assert_eq!(
        signer.sign(b"payload").unwrap_err(),
        CoseError::ProtectedHeaders
    );
}

#[test]
fn test_content_type_round_trip() {
    let (sk, pk) = p256_keys();
    let mut signer =
        Sign1Signer::new(&TestCrypto, SignOptions::NONE, iana::Algorithm::ES256).unwrap();
    signer.set_signing_key(&sk, None);
    signer.set_content_type_int(42);
    let message = signer.sign(b"payload").unwrap();

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.params.content_type, Some(ContentType::Assigned(42)));
}

#[test]
fn test_verify_missing_alg() {
    // Protected headers present but without label 1.
    let message = encode_message(
        encode_map(vec![(4, Value::Bytes(b"11".to_vec()))]),
        Value::Map(vec![]),
        b"payload".to_vec(),
        vec![0; 64],
    );
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::NoAlgId);

    // Same for completely empty protected headers.
    let message = encode_message(Vec::new(), Value::Map(vec![]), b"payload".to_vec(), vec![0; 64]);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::NoAlgId);
}

#[test]
fn test_verify_unknown_critical_header() {
    let message = encode_message(
        encode_map(vec![
            (1, Value::from(-7)),
            (2, Value::Array(vec![Value::from(99)])),
        ]),
        Value::Map(vec![]),
        b"payload".to_vec(),
        vec![0; 64],
    );
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(
        verifier.verify(&message).unwrap_err(),
        CoseError::UnknownCriticalHeader
    );
}

#[test]
fn test_verify_known_critical_header() {
    // crit listing only understood labels is accepted.
    let (sk, pk) = p256_keys();
    let protected = encode_map(vec![
        (1, Value::from(-7)),
        (2, Value::Array(vec![Value::from(1)])),
    ]);

    // Build a correctly-signed message around the crafted headers.
    let payload = b"payload".to_vec();
    let mut digest = [0u8; MAX_DIGEST_SIZE];
    let digest_len = hash_sig_structure(
        &TestCrypto,
        HashAlgorithm::Sha256,
        &protected,
        &[],
        &payload,
        &mut digest,
    )
    .unwrap();
    let alg = SignatureAlgorithm::lookup(-7).unwrap();
    let mut sig = [0u8; MAX_SIGNATURE_SIZE];
    let sig_len = TestCrypto
        .sign(alg, &sk, &digest[..digest_len], &mut sig)
        .unwrap();

    let message = encode_message(
        protected,
        Value::Map(vec![]),
        payload,
        sig[..sig_len].to_vec(),
    );
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.params.crit, vec![Label::Int(1)]);
}

#[test]
fn test_tag_handling() {
    let (_, pk) = p256_keys();

    // S5: sign without the tag; TAG_REQUIRED rejects, default accepts.
    let untagged = sign_es256(b"payload", SignOptions::OMIT_CBOR_TAG);
    assert_ne!(untagged[0], 0xd2);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::TAG_REQUIRED).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(
        verifier.verify(&untagged).unwrap_err(),
        CoseError::IncorrectlyTagged
    );

    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    let verified = verifier.verify(&untagged).unwrap();
    assert_eq!(verified.payload, b"payload");
    assert!(!verified.params.cose_tag_present);

    // A tagged message satisfies TAG_REQUIRED.
    let tagged = sign_es256(b"payload", SignOptions::NONE);
    assert_eq!(tagged[0], 0xd2);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::TAG_REQUIRED).unwrap();
    verifier.set_verification_key(&pk);
    assert!(verifier.verify(&tagged).unwrap().params.cose_tag_present);

    // Any other tag is wrong, with or without the flag.
    let mut wrong_tag = tagged.clone();
    wrong_tag[0] = 0xd3;
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(
        verifier.verify(&wrong_tag).unwrap_err(),
        CoseError::IncorrectlyTagged
    );
}

#[test]
fn test_parse_only() {
    let (_, pk) = p256_keys();
    let mut message = sign_es256(b"payload", SignOptions::NONE);

    // Corrupt the signature (the final byte of the message).
    let last = message.len() - 1;
    message[last] ^= 0xff;

    // S6: PARSE_ONLY returns the payload without cryptographic checking, and
    // needs no key.
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::PARSE_ONLY).unwrap();
    let verified = verifier.verify(&message).unwrap();
    assert_eq!(verified.payload, b"payload");

    // A normal verify of the same bytes fails.
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::SigVerify);
}

#[test]
fn test_verify_without_key() {
    let message = sign_es256(b"payload", SignOptions::NONE);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::EmptyKey);
}

#[test]
fn test_verifier_single_use() {
    let (_, pk) = p256_keys();
    let message = sign_es256(b"payload", SignOptions::NONE);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    verifier.set_verification_key(&pk);
    verifier.verify(&message).unwrap();
    assert_eq!(
        verifier.verify(&message).unwrap_err(),
        CoseError::InvalidArgument
    );
}

#[test]
fn test_verify_structure_errors() {
    let make = |value: Value| {
        let mut data = Vec::new();
        crate::cbor::ser::into_writer(&value, &mut data).unwrap();
        data
    };
    let protected = encode_map(vec![(1, Value::from(-7))]);

    // Three-element array.
    let message = make(Value::Array(vec![
        Value::Bytes(protected.clone()),
        Value::Map(vec![]),
        Value::Bytes(b"p".to_vec()),
    ]));
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::Sign1Format);

    // Not an array at all.
    let message = make(Value::Map(vec![]));
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::Sign1Format);

    // Protected headers not wrapped in a byte string.
    let message = make(Value::Array(vec![
        Value::Map(vec![(Value::from(1), Value::from(-7))]),
        Value::Map(vec![]),
        Value::Bytes(b"p".to_vec()),
        Value::Bytes(vec![0; 64]),
    ]));
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::Sign1Format);

    // Signature of the wrong length for the declared algorithm.
    let message = encode_message(
        protected.clone(),
        Value::Map(vec![]),
        b"p".to_vec(),
        vec![0; 63],
    );
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::Sign1Format);

    // Detached payload.
    let message = make(Value::Tag(
        18,
        alloc::boxed::Box::new(Value::Array(vec![
            Value::Bytes(protected.clone()),
            Value::Map(vec![]),
            Value::Null,
            Value::Bytes(vec![0; 64]),
        ])),
    ));
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(
        verifier.verify(&message).unwrap_err(),
        CoseError::DetachedPayload
    );

    // Unsupported algorithm in the protected headers.
    let message = encode_message(
        encode_map(vec![(1, Value::from(-8))]),
        Value::Map(vec![]),
        b"p".to_vec(),
        vec![0; 64],
    );
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(
        verifier.verify(&message).unwrap_err(),
        CoseError::UnsupportedSigningAlg
    );

    // Trailing data after the message.
    let mut message = sign_es256(b"p", SignOptions::NONE);
    message.push(0x00);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(
        verifier.verify(&message).unwrap_err(),
        CoseError::CborNotWellFormed
    );

    // Ill-formed CBOR.
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
    assert_eq!(
        verifier.verify(&[0xd2, 0x84]).unwrap_err(),
        CoseError::CborNotWellFormed
    );
}

#[test]
fn test_require_kid() {
    let (_, pk) = p256_keys();
    let message = sign_es256(b"payload", SignOptions::NONE);
    let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::REQUIRE_KID).unwrap();
    verifier.set_verification_key(&pk);
    assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::NoKid);
}

#[test]
fn test_tamper_sweep() {
    // Every byte of a kid-less message is load-bearing: flipping any single
    // bit must make verification fail, one way or another.
    let (_, pk) = p256_keys();
    let message = sign_es256(b"payload", SignOptions::NONE);
    for offset in 0..message.len() {
        for bit in 0..8 {
            let mut tampered = message.clone();
            tampered[offset] ^= 1 << bit;
            let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
            verifier.set_verification_key(&pk);
            assert!(
                verifier.verify(&tampered).is_err(),
                "offset {} bit {} unexpectedly verified",
                offset,
                bit
            );
        }
    }
}

#[cfg(feature = "short-circuit-sig")]
mod short_circuit {
    use super::*;

    #[test]
    fn test_short_circuit_round_trip() {
        // No key material on either side.
        let mut signer = Sign1Signer::new(
            &TestCrypto,
            SignOptions::SHORT_CIRCUIT_SIG,
            iana::Algorithm::ES256,
        )
        .unwrap();
        let message = signer.sign(b"payload").unwrap();

        let mut verifier =
            Sign1Verifier::new(&TestCrypto, VerifyOptions::ALLOW_SHORT_CIRCUIT).unwrap();
        let verified = verifier.verify(&message).unwrap();
        assert_eq!(verified.payload, b"payload");
        assert_eq!(verified.params.key_id, SHORT_CIRCUIT_KID);

        // Without the opt-in flag the fake signature must not pass.
        let (_, pk) = p256_keys();
        let mut verifier = Sign1Verifier::new(&TestCrypto, VerifyOptions::NONE).unwrap();
        verifier.set_verification_key(&pk);
        assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::SigVerify);
    }

    #[test]
    fn test_short_circuit_tamper() {
        let mut signer = Sign1Signer::new(
            &TestCrypto,
            SignOptions::SHORT_CIRCUIT_SIG,
            iana::Algorithm::ES256,
        )
        .unwrap();
        let mut message = signer.sign(b"payload").unwrap();
        let last = message.len() - 1;
        message[last] ^= 0x01;

        let mut verifier =
            Sign1Verifier::new(&TestCrypto, VerifyOptions::ALLOW_SHORT_CIRCUIT).unwrap();
        assert_eq!(verifier.verify(&message).unwrap_err(), CoseError::SigVerify);
    }

    #[test]
    fn test_short_circuit_sig_sizes() {
        // The fake signature is always padded out to the declared size.
        let mut algs = vec![iana::Algorithm::ES256];
        #[cfg(feature = "es384")]
        algs.push(iana::Algorithm::ES384);
        #[cfg(feature = "es512")]
        algs.push(iana::Algorithm::ES512);
        for alg in algs {
            let mut signer =
                Sign1Signer::new(&TestCrypto, SignOptions::SHORT_CIRCUIT_SIG, alg).unwrap();
            let message = signer.sign(b"payload").unwrap();

            let sig_size = SignatureAlgorithm::lookup(alg.to_i64())
                .unwrap()
                .signature_size();
            // The signature byte string is the message suffix.
            assert_eq!(message[message.len() - sig_size - 2], 0x58, "{:?}", alg);

            let mut verifier =
                Sign1Verifier::new(&TestCrypto, VerifyOptions::ALLOW_SHORT_CIRCUIT).unwrap();
            let verified = verifier.verify(&message).unwrap();
            assert_eq!(verified.params.algorithm, alg);
        }
    }

    #[test]
    fn test_allow_short_circuit_without_kid_or_key() {
        // Flag set, message is a normal one with no kid, no key supplied:
        // there is nothing that could check the signature.
        let message = sign_es256(b"payload", SignOptions::NONE);
        let mut verifier =
            Sign1Verifier::new(&TestCrypto, VerifyOptions::ALLOW_SHORT_CIRCUIT).unwrap();
        assert_eq!(
            verifier.verify(&message).unwrap_err(),
            CoseError::BadShortCircuitKid
        );

        // With a key, the real signature is checked as usual.
        let (_, pk) = p256_keys();
        let mut verifier =
            Sign1Verifier::new(&TestCrypto, VerifyOptions::ALLOW_SHORT_CIRCUIT).unwrap();
        verifier.set_verification_key(&pk);
        assert_eq!(verifier.verify(&message).unwrap().payload, b"payload");
    }
}
