//! CPF / CNPJ check-digit validation
//!
//! Both documents use modulo-11 check digits: for each check digit,
//! `r = sum(d_i * w_i) % 11` and the digit is `0` when `r < 2`, else `11 - r`.
//! Sequences made of a single repeated digit pass the arithmetic but are
//! never issued, so they are rejected explicitly.

use crate::error::AppError;
use crate::models::DocumentType;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Strip punctuation (`.`, `-`, `/`, spaces) and keep the digits.
pub fn normalize_digits(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn check_digit(digits: &[u32], weights: impl Iterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let r = sum % 11;
    if r < 2 {
        0
    } else {
        11 - r
    }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn validate_cpf(input: &str) -> bool {
    let digits = normalize_digits(input);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }
    let first = check_digit(&digits[..9], (2..=10).rev());
    if first != digits[9] {
        return false;
    }
    let second = check_digit(&digits[..10], (2..=11).rev());
    second == digits[10]
}

pub fn validate_cnpj(input: &str) -> bool {
    let digits = normalize_digits(input);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }
    let first = check_digit(&digits[..12], CNPJ_FIRST_WEIGHTS.into_iter());
    if first != digits[12] {
        return false;
    }
    let second = check_digit(&digits[..13], CNPJ_SECOND_WEIGHTS.into_iter());
    second == digits[13]
}

/// Validate `number` as the given document type and return its bare digits.
pub fn validate_document(kind: DocumentType, number: &str) -> Result<String, AppError> {
    let valid = match kind {
        DocumentType::Cpf => validate_cpf(number),
        DocumentType::Cnpj => validate_cnpj(number),
    };
    if !valid {
        let label = match kind {
            DocumentType::Cpf => "CPF",
            DocumentType::Cnpj => "CNPJ",
        };
        return Err(AppError::InvalidDocument(format!("Invalid {}", label)));
    }
    Ok(normalize_digits(number)
        .into_iter()
        .filter_map(|d| char::from_digit(d, 10))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cpf() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("12345678909"));
    }

    #[test]
    fn test_cpf_bad_check_digit() {
        assert!(!validate_cpf("123.456.789-00"));
    }

    #[test]
    fn test_cpf_repeated_digits() {
        assert!(!validate_cpf("111.111.111-11"));
        assert!(!validate_cpf("00000000000"));
    }

    #[test]
    fn test_cpf_wrong_length() {
        assert!(!validate_cpf("1234567890"));
        assert!(!validate_cpf(""));
    }

    #[test]
    fn test_cnpj() {
        assert!(validate_cnpj("11.222.333/0001-81"));
        assert!(!validate_cnpj("11.222.333/0001-80"));
        assert!(!validate_cnpj("22.222.222/2222-22"));
        assert!(!validate_cnpj("529.982.247-25"));
    }

    #[test]
    fn test_validate_document_returns_digits() {
        assert_eq!(
            validate_document(DocumentType::Cpf, "529.982.247-25").unwrap(),
            "52998224725"
        );
        let err = validate_document(DocumentType::Cnpj, "529.982.247-25").unwrap_err();
        assert!(matches!(err, AppError::InvalidDocument(_)));
    }
}
