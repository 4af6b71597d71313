//! Account number and bank prefix rules
//!
//! Every account number starts with the 3-character prefix of the bank that
//! holds it. These checks are shared by the transfer validator, the remote
//! bank registry and config loading.

/// Length of the bank prefix at the start of every account number
pub const BANK_PREFIX_LEN: usize = 3;

/// Shortest accepted account number (prefix plus at least one character)
pub const ACCOUNT_NUMBER_MIN_LEN: usize = BANK_PREFIX_LEN + 1;

/// Longest accepted account number (IBAN upper bound)
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 34;

/// Extract the bank prefix from an account number
///
/// Returns `None` if the number is shorter than the prefix.
pub fn bank_prefix(account_number: &str) -> Option<&str> {
    account_number.get(..BANK_PREFIX_LEN)
}

/// Exactly 3 ASCII alphanumeric characters
pub fn is_valid_bank_prefix(prefix: &str) -> bool {
    prefix.len() == BANK_PREFIX_LEN && prefix.chars().all(|c| c.is_ascii_alphanumeric())
}

/// 4-34 ASCII alphanumeric characters
pub fn is_valid_account_number(number: &str) -> bool {
    (ACCOUNT_NUMBER_MIN_LEN..=ACCOUNT_NUMBER_MAX_LEN).contains(&number.len())
        && number.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_prefix() {
        assert_eq!(bank_prefix("111abc"), Some("111"));
        assert_eq!(bank_prefix("8b9"), Some("8b9"));
        assert_eq!(bank_prefix("11"), None);
        assert_eq!(bank_prefix(""), None);
    }

    #[test]
    fn test_bank_prefix_multibyte() {
        // Slicing inside a multi-byte char must not panic
        assert_eq!(bank_prefix("ää1"), None);
    }

    #[test]
    fn test_valid_bank_prefix() {
        assert!(is_valid_bank_prefix("111"));
        assert!(is_valid_bank_prefix("8b9"));
        assert!(!is_valid_bank_prefix("11"));
        assert!(!is_valid_bank_prefix("1111"));
        assert!(!is_valid_bank_prefix("1-1"));
    }

    #[test]
    fn test_valid_account_number() {
        assert!(is_valid_account_number("1110"));
        assert!(is_valid_account_number("111a3f9c2e8b"));
        assert!(!is_valid_account_number("111"));
        assert!(!is_valid_account_number(&"1".repeat(35)));
        assert!(!is_valid_account_number("111 222"));
        assert!(!is_valid_account_number("111-222"));
    }
}
