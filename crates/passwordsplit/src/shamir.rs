//! shamir's secret sharing over GF(256)
//!
//! each byte of the secret gets its own random polynomial of degree
//! `threshold - 1`. a share is the evaluation of every polynomial at one
//! x coordinate, laid out as `y_0 .. y_{len-1} || x`. the trailing x byte
//! keeps shares self-describing, so combining needs no side channel.

use rand::{rngs::OsRng, seq::SliceRandom, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// most shares a single split may produce (x in 1..=255)
pub const MAX_SHARES: usize = 255;

/// GF(256) multiplication using AES polynomial (x^8 + x^4 + x^3 + x + 1)
///
/// fixed 8 rounds with masks instead of branches on secret data.
fn gf256_mul(a: u8, b: u8) -> u8 {
    let mut result = 0u8;
    let mut a = a;
    let mut b = b;

    for _ in 0..8 {
        result ^= a & (b & 1).wrapping_neg();
        let hi = (a >> 7).wrapping_neg();
        a = (a << 1) ^ (0x1b & hi);
        b >>= 1;
    }
    result
}

/// GF(256) multiplicative inverse, a^254 = a^(-1)
fn gf256_inv(a: u8) -> u8 {
    let mut result = a;
    for _ in 0..6 {
        result = gf256_mul(result, result);
        result = gf256_mul(result, a);
    }
    gf256_mul(result, result)
}

/// GF(256) division
fn gf256_div(a: u8, b: u8) -> u8 {
    gf256_mul(a, gf256_inv(b))
}

/// evaluate polynomial at point x (horner, highest coefficient last)
fn poly_eval(coeffs: &[u8], x: u8) -> u8 {
    coeffs.iter().rev().fold(0u8, |acc, &c| gf256_mul(acc, x) ^ c)
}

/// lagrange basis weights at x=0 for the given coordinates
///
/// w_i = prod_{j != i} x_j / (x_i - x_j), subtraction is xor in GF(256)
fn lagrange_weights(xs: &[u8]) -> Vec<u8> {
    xs.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let mut num = 1u8;
            let mut den = 1u8;
            for (j, &xj) in xs.iter().enumerate() {
                if i != j {
                    num = gf256_mul(num, xj);
                    den = gf256_mul(den, xi ^ xj);
                }
            }
            gf256_div(num, den)
        })
        .collect()
}

/// split a secret into `shares` shares, any `threshold` of which recover it
pub fn split(secret: &[u8], shares: usize, threshold: usize) -> Result<Vec<Vec<u8>>, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::Sharing("secret cannot be empty".into()));
    }
    if !(2..=MAX_SHARES).contains(&shares) {
        return Err(CryptoError::Sharing(format!(
            "share count must be between 2 and {MAX_SHARES}, got {shares}"
        )));
    }
    if threshold < 2 || threshold > shares {
        return Err(CryptoError::Sharing(format!(
            "threshold must be between 2 and {shares}, got {threshold}"
        )));
    }

    let mut rng = OsRng;

    // distinct non-zero x coordinates in random order
    let mut coordinates: Vec<u8> = (1..=MAX_SHARES as u8).collect();
    coordinates.shuffle(&mut rng);
    coordinates.truncate(shares);

    let mut out: Vec<Vec<u8>> = coordinates
        .iter()
        .map(|&x| {
            let mut share = vec![0u8; secret.len() + 1];
            share[secret.len()] = x;
            share
        })
        .collect();

    let mut coeffs = Zeroizing::new(vec![0u8; threshold]);
    for (i, &byte) in secret.iter().enumerate() {
        coeffs[0] = byte;
        rng.fill_bytes(&mut coeffs[1..]);

        for share in out.iter_mut() {
            let x = share[secret.len()];
            share[i] = poly_eval(&coeffs, x);
        }
    }

    Ok(out)
}

/// recover the secret from shares produced by `split`
///
/// every supplied share takes part in the interpolation. shares from
/// different splits interpolate to garbage rather than an error; callers
/// must authenticate the result.
pub fn combine(shares: &[Vec<u8>]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if shares.len() < 2 {
        return Err(CryptoError::Sharing(format!(
            "need at least 2 shares, got {}",
            shares.len()
        )));
    }

    let share_len = shares[0].len();
    if share_len < 2 {
        return Err(CryptoError::Sharing("share too short".into()));
    }
    if shares.iter().any(|s| s.len() != share_len) {
        return Err(CryptoError::Sharing("shares must all have the same length".into()));
    }

    let xs: Vec<u8> = shares.iter().map(|s| s[share_len - 1]).collect();
    for (i, &x) in xs.iter().enumerate() {
        if x == 0 {
            return Err(CryptoError::Sharing("share has zero x coordinate".into()));
        }
        if xs[..i].contains(&x) {
            return Err(CryptoError::Sharing("duplicate share coordinate".into()));
        }
    }

    let weights = lagrange_weights(&xs);
    let mut secret = Zeroizing::new(vec![0u8; share_len - 1]);

    for (k, byte) in secret.iter_mut().enumerate() {
        *byte = shares
            .iter()
            .zip(&weights)
            .fold(0u8, |acc, (share, &w)| acc ^ gf256_mul(share[k], w));
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gf256_ops() {
        assert_eq!(gf256_mul(0, 0), 0);
        assert_eq!(gf256_mul(1, 1), 1);
        assert_eq!(gf256_mul(2, 2), 4);
        // known AES field product
        assert_eq!(gf256_mul(0x57, 0x83), 0xc1);

        for a in 1..=255u8 {
            let inv = gf256_inv(a);
            assert_eq!(gf256_mul(a, inv), 1, "inverse failed for {}", a);
        }
    }

    #[test]
    fn test_poly_eval() {
        // f(x) = 5 + 3x
        assert_eq!(poly_eval(&[5, 3], 0), 5);
        assert_eq!(poly_eval(&[5, 3], 1), 5 ^ 3);
        assert_eq!(poly_eval(&[5, 3], 2), 5 ^ gf256_mul(3, 2));
    }

    #[test]
    fn test_split_combine_2_of_3() {
        let secret = [42u8; 32];
        let shares = split(&secret, 3, 2).unwrap();
        assert_eq!(shares.len(), 3);
        assert!(shares.iter().all(|s| s.len() == 33));

        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let recovered = combine(&[shares[a].clone(), shares[b].clone()]).unwrap();
            assert_eq!(recovered.as_slice(), secret.as_slice());
        }

        // all 3 also works
        let recovered = combine(&shares).unwrap();
        assert_eq!(recovered.as_slice(), secret.as_slice());
    }

    #[test]
    fn test_random_secret_3_of_5() {
        let secret: [u8; 32] = crate::crypto::random_bytes();
        let shares = split(&secret, 5, 3).unwrap();

        let picked = vec![shares[4].clone(), shares[0].clone(), shares[2].clone()];
        let recovered = combine(&picked).unwrap();
        assert_eq!(recovered.as_slice(), secret.as_slice());
    }

    #[test]
    fn test_below_threshold_does_not_recover() {
        let secret: [u8; 32] = crate::crypto::random_bytes();
        let shares = split(&secret, 5, 3).unwrap();

        // 2 shares of a degree-2 polynomial interpolate a line, not the secret
        let recovered = combine(&shares[..2]).unwrap();
        assert_ne!(recovered.as_slice(), secret.as_slice());
    }

    #[test]
    fn test_distinct_nonzero_coordinates() {
        let shares = split(&[1, 2, 3], 20, 2).unwrap();
        let mut xs: Vec<u8> = shares.iter().map(|s| s[3]).collect();
        assert!(xs.iter().all(|&x| x != 0));
        xs.sort_unstable();
        xs.dedup();
        assert_eq!(xs.len(), 20);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(split(&[], 3, 2).is_err());
        assert!(split(&[1], 1, 1).is_err());
        assert!(split(&[1], 3, 4).is_err());
        assert!(split(&[1], 3, 1).is_err());
        assert!(split(&[1], 256, 2).is_err());
    }

    #[test]
    fn test_combine_rejects_bad_shares() {
        let shares = split(&[9u8; 8], 3, 2).unwrap();

        assert!(combine(&shares[..1]).is_err());
        assert!(combine(&[shares[0].clone(), shares[0].clone()]).is_err());

        let mut short = shares[1].clone();
        short.remove(0);
        assert!(combine(&[shares[0].clone(), short]).is_err());

        let mut zero_x = shares[1].clone();
        *zero_x.last_mut().unwrap() = 0;
        assert!(combine(&[shares[0].clone(), zero_x]).is_err());
    }
}
