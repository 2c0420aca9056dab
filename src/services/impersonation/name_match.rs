//! Display-name comparison for impersonation scoring.
//!
//! Impersonators rarely copy an admin name verbatim; they lean on lookalike
//! characters and near-misses. Names are folded to a normalized skeleton
//! first, then compared exactly or within edit distance one.

/// Strip separators, fold case, and map the usual lookalike characters onto
/// their plain-letter targets
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter_map(|c| {
            let mapped = match c {
                '0' => 'o',
                '1' | '|' => 'l',
                '3' => 'e',
                '4' | '@' => 'a',
                '5' | '$' => 's',
                '7' => 't',
                '!' => 'i',
                // Cyrillic lookalikes commonly used in handle spoofing
                'а' => 'a',
                'е' => 'e',
                'о' => 'o',
                'р' => 'p',
                'с' => 'c',
                'х' => 'x',
                'у' => 'y',
                _ => c,
            };
            if mapped.is_alphanumeric() {
                Some(mapped.to_ascii_lowercase())
            } else {
                None
            }
        })
        .collect()
}

pub fn names_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return false;
    }

    a == b || within_one_edit(&a, &b)
}

/// True when the strings differ by at most one substitution, insertion, or
/// deletion
fn within_one_edit(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if longer.len() - shorter.len() > 1 {
        return false;
    }

    let mut i = 0;
    let mut j = 0;
    let mut edits = 0;

    while i < shorter.len() && j < longer.len() {
        if shorter[i] == longer[j] {
            i += 1;
            j += 1;
            continue;
        }

        edits += 1;
        if edits > 1 {
            return false;
        }

        if shorter.len() == longer.len() {
            i += 1;
        }
        j += 1;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_match() {
        assert!(names_match("ServerAdmin", "serveradmin"));
        assert!(names_match("Mod Team", "modteam"));
    }

    #[test]
    fn lookalike_characters_are_folded() {
        assert!(names_match("S3rverAdm1n", "ServerAdmin"));
        assert!(names_match("Аdmin", "Admin")); // Cyrillic A
        assert!(names_match("4dm!n", "admin"));
    }

    #[test]
    fn one_character_slip_still_matches() {
        assert!(names_match("ServerAdmn", "ServerAdmin"));
        assert!(names_match("ServerAdminn", "ServerAdmin"));
        assert!(names_match("ServerAdmun", "ServerAdmin"));
    }

    #[test]
    fn different_names_do_not_match() {
        assert!(!names_match("ServerAdmin", "CasualUser"));
        assert!(!names_match("Admin", "Adnim")); // transposition is two edits
        assert!(!names_match("", "ServerAdmin"));
    }
}
