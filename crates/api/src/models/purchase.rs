//! Purchase domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tripmart_core::{
    Caller, PaymentMethod, Price, ProductId, PromoCode, PromoCodeId, PurchaseId, SellerId,
    TouristId,
};

use super::ValidationError;

/// Largest quantity a single purchase may request.
pub const MAX_QUANTITY: u32 = 1_000;

/// A completed purchase. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,
    pub tourist: TouristId,
    /// Plain reference; the product may since have been deleted.
    pub product: ProductId,
    /// Seller of the product at purchase time.
    pub seller: SellerId,
    pub quantity: u32,
    pub total_price: Price,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<PromoCodeId>,
    pub purchase_date: DateTime<Utc>,
}

impl Purchase {
    /// The buyer, the seller and admins may read a purchase.
    #[must_use]
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        caller.is_admin()
            || caller.tourist_id() == Some(self.tourist)
            || caller.seller_id() == Some(self.seller)
    }
}

/// Body of `POST /purchases`. The tourist is always the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPurchase {
    pub product: ProductId,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<PromoCode>,
}

impl NewPurchase {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] unless `1 <= quantity <= MAX_QUANTITY`.
    pub fn validated(self) -> Result<Self, ValidationError> {
        if !(1..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(ValidationError::new(
                "quantity",
                format!("must be between 1 and {MAX_QUANTITY}"),
            ));
        }
        Ok(self)
    }
}
