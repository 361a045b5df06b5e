//! Payment methods accepted at checkout.

use serde::{Deserialize, Serialize};

/// How a tourist paid for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "tripmart.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Wallet,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Wire name of this method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Wallet => "wallet",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let parsed: PaymentMethod = serde_json::from_str("\"cash_on_delivery\"").unwrap();
        assert_eq!(parsed, PaymentMethod::CashOnDelivery);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::DebitCard).unwrap(),
            "\"debit_card\""
        );
        assert!(serde_json::from_str::<PaymentMethod>("\"bitcoin\"").is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        for method in [
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::Wallet,
            PaymentMethod::CashOnDelivery,
        ] {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json.trim_matches('"'), method.to_string());
        }
    }
}
