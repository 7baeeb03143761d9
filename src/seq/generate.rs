//! Composition-constrained random sequence generation.

use anyhow::bail;

/// Generate a random 4-letter sequence of the given length with the
/// requested base composition. Percentages are given for A, C and T; G
/// takes the remainder.
pub fn random_sequence(
    length: usize,
    a_pct: u32,
    c_pct: u32,
    t_pct: u32,
    rng: &mut fastrand::Rng,
) -> crate::Result<String> {
    if a_pct + c_pct + t_pct > 100 {
        bail!(
            "base percentages exceed 100 (a={a_pct}, c={c_pct}, t={t_pct})"
        );
    }
    let a = length * a_pct as usize / 100;
    let c = length * c_pct as usize / 100;
    let t = length * t_pct as usize / 100;
    let g = length - (a + c + t);

    let mut pool = Vec::with_capacity(length);
    for (base, count) in [(b'A', a), (b'C', c), (b'T', t), (b'G', g)] {
        pool.extend(std::iter::repeat(base).take(count));
    }
    rng.shuffle(&mut pool);
    Ok(pool.into_iter().map(char::from).collect())
}
