use rand::seq::IndexedRandom;

/// Browser fingerprints the client can present.
pub const IDENTITY_POOL: [&str; 4] = ["chrome_131", "edge_131", "firefox_133", "safari_18"];

/// Picks a random identity, never the one currently in use.
pub fn choose_identity(current: Option<&str>) -> String {
    let candidates: Vec<&str> = IDENTITY_POOL
        .iter()
        .copied()
        .filter(|id| Some(*id) != current)
        .collect();
    candidates
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(IDENTITY_POOL[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_never_repeats() {
        let mut current = choose_identity(None);
        for _ in 0..50 {
            let next = choose_identity(Some(&current));
            assert_ne!(next, current);
            assert!(IDENTITY_POOL.contains(&next.as_str()));
            current = next;
        }
    }
}
