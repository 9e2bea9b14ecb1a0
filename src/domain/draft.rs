use crate::error::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A strictly positive payment amount.
///
/// Wraps `rust_decimal::Decimal` so a zero or negative value can never reach the
/// risk service or the commit service.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| ValidationError::InvalidAmount)?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A payee handle such as `rahul@upi`. Always trimmed and always contains `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if !trimmed.contains('@') {
            return Err(ValidationError::InvalidRecipient);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecipientId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RecipientId> for String {
    fn from(id: RecipientId) -> Self {
        id.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw, unvalidated form input for a payment.
///
/// Field names double as the CSV header of batch input files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DraftInput {
    pub recipient: String,
    pub amount: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl DraftInput {
    pub fn new(
        recipient: impl Into<String>,
        amount: impl Into<String>,
        remarks: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            remarks: Some(remarks.into()),
        }
    }

    /// Validates the input into an immutable draft.
    ///
    /// Blank fields are reported first, then the recipient, then the amount. No
    /// draft exists unless every rule passes.
    pub fn validate(&self) -> Result<TransactionDraft, ValidationError> {
        if self.recipient.trim().is_empty() || self.amount.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }
        let recipient = RecipientId::new(&self.recipient)?;
        let amount = self.amount.parse::<Amount>()?;
        let remarks = self
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(TransactionDraft {
            recipient,
            amount,
            remarks,
        })
    }
}

/// A validated payment intent. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDraft {
    recipient: RecipientId,
    amount: Amount,
    remarks: Option<String>,
}

impl TransactionDraft {
    pub fn recipient(&self) -> &RecipientId {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }
}

impl TryFrom<DraftInput> for TransactionDraft {
    type Error = ValidationError;

    fn try_from(input: DraftInput) -> Result<Self, Self::Error> {
        input.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert_eq!(Amount::new(dec!(0.0)), Err(ValidationError::InvalidAmount));
        assert_eq!(Amount::new(dec!(-1.0)), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!("2500".parse::<Amount>().unwrap().value(), dec!(2500));
        assert_eq!(" 99.50 ".parse::<Amount>().unwrap().value(), dec!(99.50));
        assert_eq!("abc".parse::<Amount>(), Err(ValidationError::InvalidAmount));
        assert_eq!("-10".parse::<Amount>(), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_valid_draft() {
        let draft = DraftInput::new(" rahul@upi ", "2500", " lunch ")
            .validate()
            .unwrap();

        assert_eq!(draft.recipient().as_str(), "rahul@upi");
        assert_eq!(draft.amount().value(), dec!(2500));
        assert_eq!(draft.remarks(), Some("lunch"));
    }

    #[test]
    fn test_blank_remarks_become_none() {
        let draft = DraftInput::new("rahul@upi", "10", "   ").validate().unwrap();
        assert_eq!(draft.remarks(), None);

        let input = DraftInput {
            recipient: "rahul@upi".to_string(),
            amount: "10".to_string(),
            remarks: None,
        };
        assert_eq!(input.validate().unwrap().remarks(), None);
    }

    #[test]
    fn test_recipient_without_at_sign() {
        for recipient in ["rahul", "rahul.upi", "9876543210", "   x  "] {
            let result = DraftInput::new(recipient, "100", "").validate();
            assert_eq!(result, Err(ValidationError::InvalidRecipient), "{recipient}");
        }
    }

    #[test]
    fn test_missing_fields_reported_first() {
        assert_eq!(
            DraftInput::new("", "100", "").validate(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            DraftInput::new("no-at-sign", "  ", "").validate(),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in ["0", "-5", "abc", "1,000"] {
            let result = DraftInput::new("rahul@upi", amount, "").validate();
            assert_eq!(result, Err(ValidationError::InvalidAmount), "{amount}");
        }
    }

    #[test]
    fn test_try_from_input() {
        let input = DraftInput::new("shop@okaxis", "12.5", "tea");
        let draft = TransactionDraft::try_from(input).unwrap();
        assert_eq!(draft.amount().to_string(), "12.5");
    }
}
