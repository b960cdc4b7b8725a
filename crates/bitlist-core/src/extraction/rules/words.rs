//! Upper-case English rendering of fee amounts ("NINETY THOUSAND").

const ONES: [&str; 20] = [
    "", "ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN", "ELEVEN",
    "TWELVE", "THIRTEEN", "FOURTEEN", "FIFTEEN", "SIXTEEN", "SEVENTEEN", "EIGHTEEN", "NINETEEN",
];

const TENS: [&str; 10] = [
    "", "", "TWENTY", "THIRTY", "FORTY", "FIFTY", "SIXTY", "SEVENTY", "EIGHTY", "NINETY",
];

const SCALES: [&str; 4] = ["", "THOUSAND", "MILLION", "BILLION"];

/// Convert a numeric string to upper-case English words.
///
/// Commas are stripped and the leading integer is used, so `"90,000.75"`
/// reads as ninety thousand. Zero, unparseable input and values beyond the
/// billions return an empty string.
pub fn number_to_words(value: &str) -> String {
    let cleaned = value.replace(',', "");
    match leading_integer(&cleaned) {
        Some(n) if n < 0 => {
            let words = integer_to_words(n.unsigned_abs());
            if words.is_empty() {
                words
            } else {
                format!("NEGATIVE {words}")
            }
        }
        Some(n) => integer_to_words(n.unsigned_abs()),
        None => String::new(),
    }
}

/// Parse an optional sign followed by digits, ignoring anything after them.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn integer_to_words(mut remaining: u64) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut scale = 0;

    while remaining > 0 {
        let chunk = remaining % 1000;
        if chunk > 0 {
            let Some(scale_word) = SCALES.get(scale) else {
                return String::new();
            };
            let words = chunk_to_words(chunk as usize);
            if scale_word.is_empty() {
                parts.push(words);
            } else {
                parts.push(format!("{words} {scale_word}"));
            }
        }
        remaining /= 1000;
        scale += 1;
    }

    parts.reverse();
    parts.join(" ")
}

fn chunk_to_words(n: usize) -> String {
    match n {
        0 => String::new(),
        1..=19 => ONES[n].to_string(),
        20..=99 => {
            if n % 10 == 0 {
                TENS[n / 10].to_string()
            } else {
                format!("{} {}", TENS[n / 10], ONES[n % 10])
            }
        }
        _ => {
            let hundreds = format!("{} HUNDRED", ONES[n / 100]);
            if n % 100 == 0 {
                hundreds
            } else {
                format!("{hundreds} {}", chunk_to_words(n % 100))
            }
        }
    }
}
