use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::identity::ActorId;
use crate::temporal::Timestamp;

/// Largest amount accepted for a new transaction.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

const ID_PREFIX: &str = "tx_";
const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Unique transaction identifier: `tx_<unix-millis>_<9 base-36 chars>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh identifier from the current time and a random suffix.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!(
            "{ID_PREFIX}{}_{suffix}",
            Timestamp::now().as_millis()
        ))
    }

    /// Wrap an existing identifier without checking its shape.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns `true` if the identifier carries the `tx_` prefix.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() > ID_PREFIX.len() && self.0.starts_with(ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Monetary amount.
///
/// The string rendering is the shortest form that round-trips the value,
/// without a trailing `.0` for whole numbers (`100`, `100.5`). That rendering
/// feeds the transaction hash, so it must never change between creation and
/// verification.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// A validated amount for a new transaction: finite, positive, and at
    /// most [`MAX_AMOUNT`].
    pub fn new(value: f64) -> Result<Self, TypeError> {
        if !value.is_finite() {
            return Err(TypeError::InvalidAmount("amount must be a valid number".into()));
        }
        if value <= 0.0 {
            return Err(TypeError::InvalidAmount("amount must be greater than 0".into()));
        }
        if value > MAX_AMOUNT {
            return Err(TypeError::InvalidAmount(
                "amount cannot exceed 1,000,000,000".into(),
            ));
        }
        Ok(Self(value))
    }

    /// Any finite value, without range checks. Used for values read back from
    /// storage, which may have been altered outside the ledger.
    pub fn from_stored(value: f64) -> Result<Self, TypeError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(TypeError::InvalidAmount("amount must be a valid number".into()))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    fn as_whole(self) -> Option<i64> {
        let whole = self.0.trunc();
        if whole == self.0 && whole.abs() < 9.0e15 {
            Some(whole as i64)
        } else {
            None
        }
    }
}

/// Renders the way JavaScript's `String(number)` does: plain decimal inside
/// `[1e-6, 1e21)`, shortest exponent form (`1e-7`, `1e+21`) outside it.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.abs();
        if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
            let exponent = format!("{:e}", self.0);
            return match exponent.split_once('e') {
                Some((mantissa, exp)) if !exp.starts_with('-') => {
                    write!(f, "{mantissa}e+{exp}")
                }
                _ => f.write_str(&exponent),
            };
        }
        match self.as_whole() {
            Some(whole) => write!(f, "{whole}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({self})")
    }
}

impl FromStr for Amount {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidAmount("amount must be a valid number".into()))?;
        Self::new(value)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_whole() {
            Some(whole) => serializer.serialize_i64(whole),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_stored(value).map_err(serde::de::Error::custom)
    }
}

/// Sign-off state of a transaction. Orthogonal to hash integrity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[default]
    Pending,
    Verified,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Verified => f.write_str("Verified"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Verified" => Ok(Self::Verified),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// The caller-supplied part of a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionFields {
    pub amount: Amount,
    pub from: String,
    pub to: String,
    pub description: String,
    pub auditor: String,
}

/// A recorded financial transaction.
///
/// `hash` is computed once, when the transaction is created, over `id`,
/// `amount`, `from`, `to`, `description`, `auditor`, `timestamp`,
/// `block_index` and `previous_hash`. Nothing in the normal flow rewrites it,
/// so a later change to any of those fields in storage is detectable by
/// recomputation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: Amount,
    pub from: String,
    pub to: String,
    pub description: String,
    pub auditor: String,
    pub timestamp: Timestamp,
    pub block_index: u64,
    pub previous_hash: String,
    pub hash: String,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    /// Actor that persisted the record. Set by the record store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
}

impl Transaction {
    pub fn is_verified(&self) -> bool {
        self.status == TransactionStatus::Verified
    }

    /// The caller-supplied fields of this transaction.
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            amount: self.amount,
            from: self.from.clone(),
            to: self.to.clone(),
            description: self.description.clone(),
            auditor: self.auditor.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Transaction {
        Transaction {
            id: TransactionId::new("tx_1700000000000_abc123xyz"),
            amount: Amount::new(100.0).unwrap(),
            from: "A".into(),
            to: "B".into(),
            description: "test".into(),
            auditor: "aud1".into(),
            timestamp: Timestamp::from_millis(1_700_000_000_000).unwrap(),
            block_index: 1,
            previous_hash: "00".into(),
            hash: "ff".into(),
            status: TransactionStatus::Pending,
            verified_by: None,
            verified_at: None,
            created_by: None,
        }
    }

    #[test]
    fn generated_ids_are_well_formed_and_unique() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert!(a.is_well_formed());
        assert_ne!(a, b);
        let parts: Vec<&str> = a.as_str().splitn(3, '_').collect();
        assert_eq!(parts[0], "tx");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn id_without_prefix_is_malformed() {
        assert!(!TransactionId::new("abc").is_well_formed());
        assert!(!TransactionId::new("tx_").is_well_formed());
    }

    #[test]
    fn whole_amounts_render_without_fraction() {
        assert_eq!(Amount::new(100.0).unwrap().to_string(), "100");
        assert_eq!(Amount::new(200.0).unwrap().to_string(), "200");
    }

    #[test]
    fn fractional_amounts_render_shortest_form() {
        assert_eq!(Amount::new(100.5).unwrap().to_string(), "100.5");
        assert_eq!(Amount::new(0.1).unwrap().to_string(), "0.1");
        assert_eq!(Amount::new(1234.56).unwrap().to_string(), "1234.56");
    }

    #[test]
    fn tiny_amounts_render_in_exponent_form() {
        assert_eq!(Amount::new(1e-7).unwrap().to_string(), "1e-7");
        assert_eq!(Amount::new(1.5e-7).unwrap().to_string(), "1.5e-7");
        assert_eq!(Amount::new(0.000001).unwrap().to_string(), "0.000001");
        assert_eq!(Amount::from_stored(-2.5e-9).unwrap().to_string(), "-2.5e-9");
    }

    #[test]
    fn huge_stored_amounts_render_with_signed_exponent() {
        assert_eq!(Amount::from_stored(1e21).unwrap().to_string(), "1e+21");
        assert_eq!(Amount::from_stored(1e20).unwrap().to_string(), "100000000000000000000");
    }

    #[test]
    fn amount_bounds_are_enforced() {
        assert!(Amount::new(0.0).is_err());
        assert!(Amount::new(-5.0).is_err());
        assert!(Amount::new(f64::NAN).is_err());
        assert!(Amount::new(f64::INFINITY).is_err());
        assert!(Amount::new(MAX_AMOUNT + 1.0).is_err());
        assert!(Amount::new(MAX_AMOUNT).is_ok());
    }

    #[test]
    fn stored_amounts_skip_range_checks() {
        assert_eq!(Amount::from_stored(-3.0).unwrap().to_string(), "-3");
        assert!(Amount::from_stored(f64::NAN).is_err());
    }

    #[test]
    fn amount_parses_from_string() {
        assert_eq!(" 42.5 ".parse::<Amount>().unwrap().value(), 42.5);
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn amount_serializes_whole_values_as_integers() {
        assert_eq!(serde_json::to_string(&Amount::new(100.0).unwrap()).unwrap(), "100");
        assert_eq!(serde_json::to_string(&Amount::new(2.25).unwrap()).unwrap(), "2.25");
    }

    #[test]
    fn transaction_uses_camel_case_wire_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["blockIndex"], 1);
        assert_eq!(json["previousHash"], "00");
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20.000Z");
        assert!(json.get("verifiedBy").is_none());
    }

    #[test]
    fn transaction_defaults_missing_status_to_pending() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("status");
        let parsed: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.status, TransactionStatus::Pending);
        assert!(!parsed.is_verified());
    }

    #[test]
    fn status_parses_exact_names() {
        assert_eq!("Verified".parse::<TransactionStatus>().unwrap(), TransactionStatus::Verified);
        assert!("verified".parse::<TransactionStatus>().is_err());
    }

    proptest! {
        #[test]
        fn amount_rendering_round_trips(value in 0.01f64..MAX_AMOUNT) {
            let amount = Amount::new(value).unwrap();
            let reparsed: f64 = amount.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, value);
        }

        #[test]
        fn whole_amounts_never_render_a_decimal_point(value in 1u32..1_000_000_000u32) {
            let amount = Amount::new(f64::from(value)).unwrap();
            prop_assert_eq!(amount.to_string(), value.to_string());
        }
    }
}
