use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a fully punctuated CPF (`###.###.###-##`).
pub const MASK_LEN: usize = 14;
const DIGITS: usize = 11;

pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Standard CPF check-digit validation. Formatting characters are ignored.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != DIGITS || input.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

// Weights run from len+1 down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 | 11 => 0,
        r => r,
    }
}

/// Progressive input mask: keeps at most 11 digits and punctuates them as
/// `###.###.###-##` while they accumulate.
pub fn format_cpf(input: &str) -> String {
    let digits: String = digits_only(input).chars().take(DIGITS).collect();
    let mut out = String::with_capacity(MASK_LEN);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Validation only runs once the mask is complete.
pub fn should_validate(formatted: &str) -> bool {
    formatted.chars().count() == MASK_LEN
}

/// A CPF that passed check-digit validation. Holds the 11 bare digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    pub fn parse(input: &str) -> Option<Self> {
        if is_valid_cpf(input) {
            Some(Self(digits_only(input)))
        } else {
            None
        }
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn formatted(&self) -> String {
        format_cpf(&self.0)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl TryFrom<String> for Cpf {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value).ok_or_else(|| format!("invalid CPF: {}", value))
    }
}

impl From<Cpf> for String {
    fn from(value: Cpf) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "529.982.247-25";

    #[test]
    fn accepts_known_valid_cpf() {
        assert!(is_valid_cpf(VALID));
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("111.444.777-35"));
    }

    #[test]
    fn rejects_repeated_digits() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(11);
            assert!(!is_valid_cpf(&cpf), "{} should be rejected", cpf);
        }
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529982247250"));
        assert!(!is_valid_cpf(""));
    }

    #[test]
    fn single_digit_mutations_break_validity() {
        // Bumping any single digit of 52998224725 by one changes a check digit.
        let base: Vec<char> = "52998224725".chars().collect();
        for pos in 0..11 {
            let mut mutated = base.clone();
            let d = mutated[pos].to_digit(10).unwrap();
            mutated[pos] = char::from_digit((d + 1) % 10, 10).unwrap();
            let s: String = mutated.into_iter().collect();
            assert!(!is_valid_cpf(&s), "mutation at {} produced valid {}", pos, s);
        }
    }

    #[test]
    fn rejects_letters_mixed_in() {
        assert!(!is_valid_cpf("52998224725a"));
    }

    #[test]
    fn formats_progressively() {
        assert_eq!(format_cpf("529"), "529");
        assert_eq!(format_cpf("5299"), "529.9");
        assert_eq!(format_cpf("5299822"), "529.982.2");
        assert_eq!(format_cpf("5299822472"), "529.982.247-2");
        assert_eq!(format_cpf("52998224725"), VALID);
    }

    #[test]
    fn formatting_is_idempotent_and_truncates() {
        assert_eq!(format_cpf(VALID), VALID);
        assert_eq!(format_cpf(&format_cpf(VALID)), VALID);
        assert_eq!(format_cpf("529982247251234"), VALID);
    }

    #[test]
    fn validation_waits_for_full_mask() {
        assert!(!should_validate(&format_cpf("5299822472")));
        assert!(should_validate(&format_cpf("52998224725")));
    }

    #[test]
    fn cpf_newtype_stores_digits() {
        let cpf = Cpf::parse(VALID).unwrap();
        assert_eq!(cpf.digits(), "52998224725");
        assert_eq!(cpf.to_string(), VALID);
        assert!(Cpf::parse("123.456.789-00").is_none());
    }

    #[test]
    fn cpf_deserializes_through_validation() {
        let ok: Cpf = serde_json::from_str("\"529.982.247-25\"").unwrap();
        assert_eq!(ok.digits(), "52998224725");
        assert!(serde_json::from_str::<Cpf>("\"11111111111\"").is_err());
    }
}
