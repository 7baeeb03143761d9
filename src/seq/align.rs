//! Distances and a layout view of reconstructed fragments.

use anyhow::bail;

/// Hamming distance between equal-length strings, case-insensitive.
pub fn hamming(a: &str, b: &str) -> crate::Result<usize> {
    if a.len() != b.len() {
        bail!(
            "hamming distance requires equal lengths ({} vs {})",
            a.len(),
            b.len()
        );
    }
    Ok(a.bytes()
        .zip(b.bytes())
        .filter(|(x, y)| !x.eq_ignore_ascii_case(y))
        .count())
}

/// Levenshtein distance, two-row dynamic program.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short = short.as_bytes();
    let long = long.as_bytes();
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0usize; short.len() + 1];
    for (j, &lc) in long.iter().enumerate() {
        current[0] = j + 1;
        for (i, &sc) in short.iter().enumerate() {
            let cost = usize::from(!sc.eq_ignore_ascii_case(&lc));
            current[i + 1] = (current[i] + 1)
                .min(prev[i + 1] + 1)
                .min(prev[i] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[short.len()]
}

/// Render reconstructed fragments under a reference, each shifted to its
/// minimum-Hamming offset.
///
/// Fragments are placed longest-first. A fragment at least as long as the
/// reference is pinned at offset zero; empty fragments are skipped.
pub fn align_fragments(fragments: &[String], reference: &str) -> crate::Result<String> {
    let mut ordered: Vec<&String> = fragments.iter().collect();
    ordered.sort_by_key(|fragment| std::cmp::Reverse(fragment.len()));

    let mut lines = vec![reference.to_string()];
    for fragment in ordered {
        if fragment.is_empty() {
            continue;
        }
        let offset = if fragment.len() < reference.len() {
            best_offset(fragment, reference)?
        } else {
            0
        };
        lines.push(format!("{}{}", " ".repeat(offset), fragment));
    }
    Ok(lines.join("\n"))
}

/// Slide the fragment across the reference and return the offset with the
/// smallest Hamming distance, earliest on ties.
fn best_offset(fragment: &str, reference: &str) -> crate::Result<usize> {
    let mut best = (usize::MAX, 0usize);
    for offset in 0..=reference.len() - fragment.len() {
        let window = &reference[offset..offset + fragment.len()];
        let distance = hamming(fragment, window)?;
        if distance < best.0 {
            best = (distance, offset);
        }
    }
    Ok(best.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_counts_mismatches() {
        assert_eq!(hamming("ACGT", "ACGT").unwrap(), 0);
        assert_eq!(hamming("ACGT", "ACGA").unwrap(), 1);
        assert_eq!(hamming("acgt", "ACGA").unwrap(), 1);
        assert!(hamming("ACG", "AC").is_err());
    }

    #[test]
    fn levenshtein_known_values() {
        assert_eq!(levenshtein("ACGTT", "GT"), 3);
        assert_eq!(levenshtein("", "ACG"), 3);
        assert_eq!(levenshtein("ACGT", "ACGT"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn fragments_settle_at_their_best_offset() {
        let reference = "AAAATTTTCCCC";
        let fragments = vec!["TTTT".to_string(), "CCCC".to_string()];
        let layout = align_fragments(&fragments, reference).unwrap();
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines[0], reference);
        assert_eq!(lines[1], "    TTTT");
        assert_eq!(lines[2], "        CCCC");
    }

    #[test]
    fn long_fragments_pin_to_the_start() {
        let layout = align_fragments(
            &["ACGTACGTACGT".to_string()],
            "ACGT",
        )
        .unwrap();
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines[1], "ACGTACGTACGT");
    }

    #[test]
    fn longest_fragment_renders_first() {
        let layout = align_fragments(
            &["AA".to_string(), "AAAA".to_string()],
            "AAAAAA",
        )
        .unwrap();
        let lines: Vec<&str> = layout.lines().collect();
        assert_eq!(lines[1], "AAAA");
        assert_eq!(lines[2], "AA");
    }
}
