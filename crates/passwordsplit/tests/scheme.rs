//! end-to-end split / encode / decode / reconstruct properties

use passwordsplit::{
    decode_part_from_base64, encode_part_to_base64, reconstruct, split, Part, ReconstructError,
};
use proptest::prelude::*;
use proptest::sample::subsequence;

fn transport(parts: &[Part]) -> Vec<Part> {
    parts
        .iter()
        .map(|p| decode_part_from_base64(&encode_part_to_base64(p)).unwrap())
        .collect()
}

#[test]
fn two_of_three_scenario() {
    let result = split("test-password-123", 2, 3, None).unwrap();
    assert_eq!(result.parts.len(), 3);

    let positions: Vec<u8> = result.parts.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![1, 2, 3]);
    for part in &result.parts {
        assert_eq!(part.metadata.scheme_id, result.parts[0].metadata.scheme_id);
        assert_eq!(part.metadata.threshold, 2);
        assert_eq!(part.metadata.total_parts, 3);
    }

    let recovered = reconstruct(&transport(&result.parts[0..2])).unwrap();
    assert_eq!(recovered.secret, "test-password-123");

    let err = reconstruct(&result.parts[0..1]).unwrap_err();
    assert!(err.to_string().contains("Insufficient parts"));
}

#[test]
fn empty_input() {
    let err = reconstruct(&[]).unwrap_err();
    assert!(err.to_string().contains("No parts provided"));
}

#[test]
fn tampered_iv_is_detected() {
    let mut parts = split("iv check", 2, 3, None).unwrap().parts;
    parts[0].metadata.iv[11] ^= 0x10;
    assert!(matches!(
        reconstruct(&parts[..2]),
        Err(ReconstructError::Failed(_))
    ));
}

#[test]
fn truncated_ciphertext_is_detected() {
    let mut parts = split("truncate me", 2, 2, None).unwrap().parts;
    parts[0].metadata.encrypted_secret.truncate(4);
    assert!(matches!(
        reconstruct(&parts),
        Err(ReconstructError::Failed(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_threshold_subset_reconstructs(
        secret in ".{0,64}",
        (total, threshold) in (2u8..=20).prop_flat_map(|n| (Just(n), 2u8..=n)),
        seed in any::<u64>(),
    ) {
        let parts = split(&secret, threshold, total, None).unwrap().parts;
        prop_assert_eq!(parts.len(), total as usize);

        // deterministic pick of `threshold` parts, rotated by seed
        let offset = (seed % total as u64) as usize;
        let picked: Vec<Part> = (0..threshold as usize)
            .map(|i| parts[(offset + i) % total as usize].clone())
            .collect();

        let recovered = reconstruct(&transport(&picked)).unwrap();
        prop_assert_eq!(recovered.secret, secret);

        let err = reconstruct(&picked[..threshold as usize - 1]).unwrap_err();
        prop_assert_eq!(
            err,
            ReconstructError::InsufficientParts { need: threshold, got: threshold as usize - 1 }
        );
    }

    #[test]
    fn codec_roundtrip(
        secret in "\\PC{0,32}",
        description in proptest::option::of("[a-zA-Z0-9 ]{0,100}"),
    ) {
        let parts = split(&secret, 2, 4, description.as_deref()).unwrap().parts;
        for part in &parts {
            let decoded = decode_part_from_base64(&encode_part_to_base64(part)).unwrap();
            prop_assert_eq!(&decoded, part);
        }
    }

    #[test]
    fn superset_of_threshold_reconstructs(
        picked in subsequence((0usize..6).collect::<Vec<_>>(), 3..=6),
    ) {
        let parts = split("superset", 3, 6, None).unwrap().parts;
        let chosen: Vec<Part> = picked.iter().map(|&i| parts[i].clone()).collect();
        prop_assert_eq!(reconstruct(&chosen).unwrap().secret, "superset");
    }

    #[test]
    fn flipped_share_byte_is_detected(index in 0usize..33, bit in 0u8..8) {
        let mut parts = split("flip", 2, 3, None).unwrap().parts;
        parts[0].share[index] ^= 1 << bit;

        // flipping the x coordinate can collide with the other share's x,
        // which is rejected too
        prop_assert!(reconstruct(&parts[..2]).is_err());
    }
}
