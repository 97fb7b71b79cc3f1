//! Simplified Porter stemmer
//!
//! Implements steps 1a, 1b, 1c, the common step 2 suffix rewrites and step 5a.
//! Only ASCII lowercase words are stemmed, anything else is returned as is.

/// Step 2 rewrites, checked in order; the first suffix that matches wins
const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("biliti", "ble"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("alism", "al"),
    ("ousli", "ous"),
    ("entli", "ent"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("alli", "al"),
    ("ator", "ate"),
    ("eli", "e"),
];

/// Stem one lowercase word
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }
    let mut w = word.as_bytes().to_vec();
    step1a(&mut w);
    step1b(&mut w);
    step1c(&mut w);
    step2(&mut w);
    step5a(&mut w);
    // ascii in, ascii out
    String::from_utf8(w).unwrap_or_else(|_| word.to_string())
}

/// Consonant flag per byte, computed left to right
///
/// `y` is a consonant at the start of the word or after a vowel.
/// The mask of a prefix is the prefix of the mask.
fn consonant_mask(w: &[u8]) -> Vec<bool> {
    let mut mask: Vec<bool> = Vec::with_capacity(w.len());
    for (i, &b) in w.iter().enumerate() {
        let cons = match b {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !mask[i - 1],
            _ => true,
        };
        mask.push(cons);
    }
    mask
}

/// Number of VC sequences in `w`
fn measure(w: &[u8]) -> usize {
    let mut m = 0;
    let mut prev_vowel = false;
    for cons in consonant_mask(w) {
        if cons && prev_vowel {
            m += 1;
        }
        prev_vowel = !cons;
    }
    m
}

fn contains_vowel(w: &[u8]) -> bool {
    consonant_mask(w).iter().any(|&cons| !cons)
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && consonant_mask(w)[n - 1]
}

fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    if n < 3 || matches!(w[n - 1], b'w' | b'x' | b'y') {
        return false;
    }
    let mask = consonant_mask(w);
    mask[n - 3] && !mask[n - 2] && mask[n - 1]
}

fn replace_tail(w: &mut Vec<u8>, suffix_len: usize, replacement: &[u8]) {
    w.truncate(w.len() - suffix_len);
    w.extend_from_slice(replacement);
}

fn step1a(w: &mut Vec<u8>) {
    if w.ends_with(b"sses") || w.ends_with(b"ies") {
        w.truncate(w.len() - 2);
    } else if w.ends_with(b"s") && !w.ends_with(b"ss") {
        w.pop();
    }
}

fn step1b(w: &mut Vec<u8>) {
    if w.ends_with(b"eed") {
        if measure(&w[..w.len() - 3]) > 0 {
            w.pop();
        }
        return;
    }
    let suffix_len = if w.ends_with(b"ed") {
        2
    } else if w.ends_with(b"ing") {
        3
    } else {
        return;
    };
    if !contains_vowel(&w[..w.len() - suffix_len]) {
        return;
    }
    w.truncate(w.len() - suffix_len);

    if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
        w.push(b'e');
    } else if ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.pop();
    } else if measure(w) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step1c(w: &mut [u8]) {
    let n = w.len();
    if n > 1 && w[n - 1] == b'y' && contains_vowel(&w[..n - 1]) {
        w[n - 1] = b'i';
    }
}

fn step2(w: &mut Vec<u8>) {
    for (suffix, replacement) in STEP2_RULES {
        if w.ends_with(suffix.as_bytes()) {
            if measure(&w[..w.len() - suffix.len()]) > 0 {
                replace_tail(w, suffix.len(), replacement.as_bytes());
            }
            return;
        }
    }
}

fn step5a(w: &mut Vec<u8>) {
    if !w.ends_with(b"e") {
        return;
    }
    let stem = &w[..w.len() - 1];
    let m = measure(stem);
    if m > 1 || (m == 1 && !ends_cvc(stem)) {
        w.pop();
    }
}
