//! Input validation for the record and amend flows.
//!
//! Every check runs before any id is generated or hash computed, so a
//! rejected draft never touches the chain or the store.

use fal_types::{Amount, TransactionFields, TypeError};
use serde::{Deserialize, Deserializer};

use crate::error::LedgerError;

pub const MAX_PARTY_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_AUDITOR_LEN: usize = 50;

/// Unvalidated input for a new transaction.
///
/// Missing fields deserialize to empty values so they are reported by
/// [`validate`](Self::validate) rather than by the decoder.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionDraft {
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    pub from: String,
    pub to: String,
    pub description: String,
    pub auditor: String,
}

impl TransactionDraft {
    pub fn new(
        amount: f64,
        from: impl Into<String>,
        to: impl Into<String>,
        description: impl Into<String>,
        auditor: impl Into<String>,
    ) -> Self {
        Self {
            amount: Some(amount),
            from: from.into(),
            to: to.into(),
            description: description.into(),
            auditor: auditor.into(),
        }
    }

    /// Check every field and return the trimmed, typed result.
    pub fn validate(&self) -> Result<TransactionFields, LedgerError> {
        let from = self.from.trim();
        let to = self.to.trim();
        let description = self.description.trim();
        let auditor = self.auditor.trim();

        if self.amount.is_none()
            || from.is_empty()
            || to.is_empty()
            || description.is_empty()
            || auditor.is_empty()
        {
            return Err(LedgerError::Validation(
                "missing required fields: amount, from, to, description, auditor".into(),
            ));
        }

        let amount = validate_amount(self.amount)?;
        if char_len(from) > MAX_PARTY_LEN || char_len(to) > MAX_PARTY_LEN {
            return Err(LedgerError::Validation(format!(
                "addresses cannot exceed {MAX_PARTY_LEN} characters"
            )));
        }
        let description = validate_description(description)?;
        if char_len(auditor) > MAX_AUDITOR_LEN {
            return Err(LedgerError::Validation(format!(
                "auditor name cannot exceed {MAX_AUDITOR_LEN} characters"
            )));
        }
        if from.to_lowercase() == to.to_lowercase() {
            return Err(LedgerError::Validation(
                "from and to addresses cannot be the same".into(),
            ));
        }

        Ok(TransactionFields {
            amount,
            from: from.to_string(),
            to: to.to_string(),
            description,
            auditor: auditor.to_string(),
        })
    }
}

/// Unvalidated input for an amendment: the corrected amount and description.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AmendmentDraft {
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    pub description: String,
}

impl AmendmentDraft {
    pub fn new(amount: f64, description: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<Amendment, LedgerError> {
        Ok(Amendment {
            amount: validate_amount(self.amount)?,
            description: validate_description(self.description.trim())?,
        })
    }
}

/// A validated amendment.
#[derive(Clone, Debug, PartialEq)]
pub struct Amendment {
    pub amount: Amount,
    pub description: String,
}

fn validate_amount(amount: Option<f64>) -> Result<Amount, LedgerError> {
    let value = amount.ok_or_else(|| LedgerError::Validation("amount is required".into()))?;
    Amount::new(value).map_err(|e| match e {
        TypeError::InvalidAmount(reason) => LedgerError::Validation(reason),
        other => LedgerError::Validation(other.to_string()),
    })
}

fn validate_description(description: &str) -> Result<String, LedgerError> {
    if description.is_empty() {
        return Err(LedgerError::Validation("description cannot be empty".into()));
    }
    if char_len(description) > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Accept a JSON number or a numeric string. Anything else becomes NaN so
/// the amount check reports it.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TransactionDraft {
        TransactionDraft::new(100.0, "A", "B", "test", "aud1")
    }

    fn reason(result: Result<TransactionFields, LedgerError>) -> String {
        match result {
            Err(LedgerError::Validation(reason)) => reason,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let mut d = draft();
        d.from = "  Acme Corp ".into();
        d.description = "\tinvoice 42 ".into();
        let fields = d.validate().unwrap();
        assert_eq!(fields.from, "Acme Corp");
        assert_eq!(fields.description, "invoice 42");
        assert_eq!(fields.amount.value(), 100.0);
    }

    #[test]
    fn amount_bounds() {
        for bad in [0.0, -5.0, 1_000_000_000.01, f64::NAN, f64::INFINITY] {
            let mut d = draft();
            d.amount = Some(bad);
            assert!(d.validate().is_err(), "{bad} should be rejected");
        }
        let mut d = draft();
        d.amount = Some(1_000_000_000.0);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let mut d = draft();
        d.auditor = "   ".into();
        assert!(reason(d.validate()).starts_with("missing required fields"));
        let mut d = draft();
        d.amount = None;
        assert!(reason(d.validate()).starts_with("missing required fields"));
    }

    #[test]
    fn same_party_is_case_insensitive() {
        let mut d = draft();
        d.from = "Acme".into();
        d.to = " ACME ".into();
        assert_eq!(reason(d.validate()), "from and to addresses cannot be the same");
    }

    #[test]
    fn length_limits_count_characters() {
        let mut d = draft();
        d.from = "é".repeat(MAX_PARTY_LEN);
        assert!(d.validate().is_ok());
        d.from = "é".repeat(MAX_PARTY_LEN + 1);
        assert!(reason(d.validate()).contains("addresses"));

        let mut d = draft();
        d.description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(reason(d.validate()).contains("description"));

        let mut d = draft();
        d.auditor = "x".repeat(MAX_AUDITOR_LEN + 1);
        assert!(reason(d.validate()).contains("auditor"));
    }

    #[test]
    fn json_drafts_accept_numeric_strings() {
        let d: TransactionDraft = serde_json::from_str(
            r#"{"amount":"250.75","from":"A","to":"B","description":"d","auditor":"x"}"#,
        )
        .unwrap();
        assert_eq!(d.validate().unwrap().amount.value(), 250.75);

        let d: TransactionDraft =
            serde_json::from_str(r#"{"amount":"lots","from":"A","to":"B","description":"d","auditor":"x"}"#)
                .unwrap();
        assert_eq!(reason(d.validate()), "amount must be a valid number");

        let d: TransactionDraft = serde_json::from_str(r#"{"from":"A"}"#).unwrap();
        assert!(reason(d.validate()).starts_with("missing required fields"));
    }

    #[test]
    fn amendment_validation() {
        let ok = AmendmentDraft::new(200.0, " corrected ").validate().unwrap();
        assert_eq!(ok.amount.value(), 200.0);
        assert_eq!(ok.description, "corrected");

        assert!(AmendmentDraft::new(-1.0, "x").validate().is_err());
        assert!(AmendmentDraft::new(1.0, "  ").validate().is_err());
        assert!(AmendmentDraft::default().validate().is_err());
    }
}
