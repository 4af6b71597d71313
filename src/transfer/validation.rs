//! Transfer request validation
//!
//! Shape checks only; no balances or registry lookups here.

use thiserror::Error;

use super::types::TransferRequest;
use crate::account::validation::is_valid_account_number;

pub const EXPLANATION_MAX_LEN: usize = 200;

/// First rule a request broke; `field` uses the wire name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_account(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_valid_account_number(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("\"{field}\" must be 4-34 alphanumeric characters"),
        ))
    }
}

/// Validate in field order and stop at the first violation
pub fn validate_request(request: &TransferRequest) -> Result<(), ValidationError> {
    check_account("accountFrom", &request.account_from)?;
    check_account("accountTo", &request.account_to)?;

    if request.amount <= 0 {
        return Err(ValidationError::new(
            "amount",
            "\"amount\" must be a positive number",
        ));
    }

    let currency = &request.currency;
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "\"currency\" must be 3 uppercase letters",
        ));
    }

    let explanation = request.explanation.trim();
    if explanation.is_empty() {
        return Err(ValidationError::new(
            "explanation",
            "\"explanation\" is not allowed to be empty",
        ));
    }
    if explanation.chars().count() > EXPLANATION_MAX_LEN {
        return Err(ValidationError::new(
            "explanation",
            format!("\"explanation\" must be at most {EXPLANATION_MAX_LEN} characters"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TransferRequest {
        TransferRequest {
            account_from: "111aaaa".into(),
            account_to: "111bbbb".into(),
            amount: 100,
            currency: "EUR".into(),
            explanation: "rent".into(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&valid()).is_ok());
    }

    #[test]
    fn test_account_format() {
        let mut req = valid();
        req.account_from = "111".into();
        assert_eq!(validate_request(&req).unwrap_err().field, "accountFrom");

        let mut req = valid();
        req.account_to = "111-bbbb".into();
        assert_eq!(validate_request(&req).unwrap_err().field, "accountTo");

        let mut req = valid();
        req.account_to = "1".repeat(35);
        assert_eq!(validate_request(&req).unwrap_err().field, "accountTo");
    }

    #[test]
    fn test_amount_must_be_positive() {
        for amount in [0, -1, i64::MIN] {
            let mut req = valid();
            req.amount = amount;
            assert_eq!(validate_request(&req).unwrap_err().field, "amount");
        }
    }

    #[test]
    fn test_currency_format() {
        for currency in ["eur", "EU", "EURO", "E1R", ""] {
            let mut req = valid();
            req.currency = currency.into();
            assert_eq!(
                validate_request(&req).unwrap_err().field,
                "currency",
                "currency {currency:?}"
            );
        }
    }

    #[test]
    fn test_explanation_length() {
        let mut req = valid();
        req.explanation = "   ".into();
        assert_eq!(validate_request(&req).unwrap_err().field, "explanation");

        let mut req = valid();
        req.explanation = "ü".repeat(EXPLANATION_MAX_LEN);
        assert!(validate_request(&req).is_ok());

        req.explanation.push('x');
        assert_eq!(validate_request(&req).unwrap_err().field, "explanation");
    }

    #[test]
    fn test_first_violation_wins() {
        let req = TransferRequest {
            account_from: "x".into(),
            account_to: "y".into(),
            amount: 0,
            currency: "eur".into(),
            explanation: String::new(),
        };
        assert_eq!(validate_request(&req).unwrap_err().field, "accountFrom");
    }
}
