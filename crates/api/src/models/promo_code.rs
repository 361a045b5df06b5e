//! Promo code domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripmart_core::{DateRange, PercentOff, PromoCode, PromoCodeId};

/// A stored promo code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromoCodeId,
    pub code: PromoCode,
    pub is_used: bool,
    pub percent_off: PercentOff,
    pub date_range: DateRange,
    pub created_at: DateTime<Utc>,
}

/// Why a promo code cannot be redeemed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoStatus {
    Active,
    Used,
    NotYetValid,
    Expired,
}

impl Promotion {
    /// Redemption state at `now`. Single use wins over the date window.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> PromoStatus {
        if self.is_used {
            PromoStatus::Used
        } else if now < self.date_range.start() {
            PromoStatus::NotYetValid
        } else if self.date_range.contains(now) {
            PromoStatus::Active
        } else {
            PromoStatus::Expired
        }
    }

    /// The discount to apply if the code is redeemable at `now`.
    ///
    /// # Errors
    ///
    /// Returns the non-active [`PromoStatus`] otherwise.
    pub fn redeemable_at(&self, now: DateTime<Utc>) -> Result<PercentOff, PromoStatus> {
        match self.status_at(now) {
            PromoStatus::Active => Ok(self.percent_off),
            other => Err(other),
        }
    }
}

impl PromoStatus {
    /// Client-facing reason for a refused redemption.
    #[must_use]
    pub const fn rejection_message(self) -> &'static str {
        match self {
            Self::Active => "promo code is active",
            Self::Used => "promo code has already been used",
            Self::NotYetValid => "promo code is not valid yet",
            Self::Expired => "promo code has expired",
        }
    }
}

/// `GET /promo-codes/{code}` response: the code plus whether it works now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionView {
    #[serde(flatten)]
    pub promotion: Promotion,
    pub status: PromoStatus,
}

/// Body of `POST /promo-codes`.
///
/// Field-level rules (code format, percent bounds, `end > start`) are
/// enforced while deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPromotion {
    pub code: PromoCode,
    pub percent_off: PercentOff,
    pub date_range: DateRange,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn promotion(is_used: bool, start: DateTime<Utc>, end: DateTime<Utc>) -> Promotion {
        Promotion {
            id: PromoCodeId::new(1),
            code: PromoCode::parse("NILE20").unwrap(),
            is_used,
            percent_off: PercentOff::new(20).unwrap(),
            date_range: DateRange::new(start, end).unwrap(),
            created_at: start,
        }
    }

    #[test]
    fn test_active_inside_window() {
        let now = Utc::now();
        let promo = promotion(false, now - Duration::days(1), now + Duration::days(1));
        assert_eq!(promo.status_at(now), PromoStatus::Active);
        assert_eq!(promo.redeemable_at(now).unwrap().get(), 20);
    }

    #[test]
    fn test_window_edges() {
        let now = Utc::now();
        let promo = promotion(false, now, now + Duration::hours(1));

        assert_eq!(promo.status_at(now), PromoStatus::Active);
        assert_eq!(
            promo.status_at(now - Duration::seconds(1)),
            PromoStatus::NotYetValid
        );
        assert_eq!(
            promo.status_at(now + Duration::hours(1)),
            PromoStatus::Expired
        );
    }

    #[test]
    fn test_used_code_is_never_redeemable() {
        let now = Utc::now();
        let promo = promotion(true, now - Duration::days(1), now + Duration::days(1));
        assert_eq!(promo.redeemable_at(now), Err(PromoStatus::Used));
    }

    #[test]
    fn test_new_promotion_parses_and_normalizes() {
        let json = r#"{
            "code": "summer10",
            "percentOff": 10,
            "dateRange": {"start": "2026-06-01T00:00:00Z", "end": "2026-09-01T00:00:00Z"}
        }"#;
        let input: NewPromotion = serde_json::from_str(json).unwrap();
        assert_eq!(input.code.as_str(), "SUMMER10");

        let bad = json.replace("\"percentOff\": 10", "\"percentOff\": 150");
        assert!(serde_json::from_str::<NewPromotion>(&bad).is_err());
    }

    #[test]
    fn test_view_flattens_promotion() {
        let now = Utc::now();
        let view = PromotionView {
            promotion: promotion(false, now, now + Duration::days(2)),
            status: PromoStatus::Active,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["code"], "NILE20");
        assert_eq!(json["status"], "active");
        assert_eq!(json["percentOff"], 20);
    }
}
