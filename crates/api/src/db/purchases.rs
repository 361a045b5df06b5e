//! Purchase repository.
//!
//! Checkout locks the product row (and the promo code row, when one is
//! given) so stock and single-use codes cannot be oversold by concurrent
//! requests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use tripmart_core::{
    PaymentMethod, Price, ProductId, PromoCodeId, PurchaseId, SellerId, TouristId,
};

use super::{RepositoryError, non_negative, promo_codes, to_db_int};
use crate::models::purchase::{NewPurchase, Purchase};

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    tourist_id: TouristId,
    product_id: ProductId,
    seller_id: SellerId,
    quantity: i32,
    total_price: Price,
    payment_method: PaymentMethod,
    promo_code_id: Option<PromoCodeId>,
    purchase_date: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = RepositoryError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            tourist: row.tourist_id,
            product: row.product_id,
            seller: row.seller_id,
            quantity: non_negative(row.quantity, "quantity")?,
            total_price: row.total_price,
            payment_method: row.payment_method,
            promo_code: row.promo_code_id,
            purchase_date: row.purchase_date,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    price: Price,
    seller_id: SellerId,
    quantity: i32,
}

fn into_purchases(rows: Vec<PurchaseRow>) -> Result<Vec<Purchase>, RepositoryError> {
    rows.into_iter().map(Purchase::try_from).collect()
}

/// Repository for purchase database operations.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check out `input` for `tourist` at time `now`.
    ///
    /// In one transaction: lock the product and check stock, validate and
    /// consume the promo code, decrement stock, and write the purchase with
    /// the discounted total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist and
    /// `RepositoryError::Rejected` for insufficient stock, an unusable promo
    /// code, or a total over [`Price::MAX`].
    #[instrument(skip(self, input), fields(tourist = %tourist, product = %input.product))]
    pub async fn create(
        &self,
        tourist: TouristId,
        input: &NewPurchase,
        now: DateTime<Utc>,
    ) -> Result<Purchase, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let stock = sqlx::query_as::<_, StockRow>(
            r"
            SELECT price, seller_id, quantity
            FROM tripmart.product
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(input.product)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let available = non_negative(stock.quantity, "quantity")?;
        if available < input.quantity {
            return Err(RepositoryError::Rejected(format!(
                "only {available} left in stock"
            )));
        }

        let (promo_id, percent_off) = match &input.promo_code {
            Some(code) => {
                let promo = promo_codes::lock_by_code(&mut *tx, code)
                    .await?
                    .ok_or_else(|| RepositoryError::Rejected("unknown promo code".to_owned()))?;
                let percent_off = promo
                    .redeemable_at(now)
                    .map_err(|status| RepositoryError::Rejected(status.rejection_message().to_owned()))?;
                promo_codes::mark_used(&mut *tx, promo.id).await?;
                (Some(promo.id), percent_off.get())
            }
            None => (None, 0),
        };

        let total = stock.price.total(input.quantity, percent_off);
        if total > Price::MAX {
            return Err(RepositoryError::Rejected(format!(
                "purchase total must be at most {}",
                Price::MAX
            )));
        }
        let quantity = to_db_int(input.quantity, "quantity")?;

        sqlx::query("UPDATE tripmart.product SET quantity = quantity - $2 WHERE id = $1")
            .bind(input.product)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, PurchaseRow>(
            r"
            INSERT INTO tripmart.purchase
                (tourist_id, product_id, seller_id, quantity, total_price, payment_method,
                 promo_code_id, purchase_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, tourist_id, product_id, seller_id, quantity, total_price,
                      payment_method, promo_code_id, purchase_date
            ",
        )
        .bind(tourist)
        .bind(input.product)
        .bind(stock.seller_id)
        .bind(quantity)
        .bind(total)
        .bind(input.payment_method)
        .bind(promo_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(purchase = %row.id, total = %total, "Purchase completed");
        Purchase::try_from(row)
    }

    /// Get a purchase by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: PurchaseId) -> Result<Option<Purchase>, RepositoryError> {
        sqlx::query_as::<_, PurchaseRow>(
            r"
            SELECT id, tourist_id, product_id, seller_id, quantity, total_price,
                   payment_method, promo_code_id, purchase_date
            FROM tripmart.purchase
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .map(Purchase::try_from)
        .transpose()
    }

    /// Purchases made by `tourist`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn by_tourist(&self, tourist: TouristId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r"
            SELECT id, tourist_id, product_id, seller_id, quantity, total_price,
                   payment_method, promo_code_id, purchase_date
            FROM tripmart.purchase
            WHERE tourist_id = $1
            ORDER BY purchase_date DESC, id DESC
            ",
        )
        .bind(tourist)
        .fetch_all(self.pool)
        .await?;

        into_purchases(rows)
    }

    /// Purchases of `product`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn by_product(&self, product: ProductId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            r"
            SELECT id, tourist_id, product_id, seller_id, quantity, total_price,
                   payment_method, promo_code_id, purchase_date
            FROM tripmart.purchase
            WHERE product_id = $1
            ORDER BY purchase_date DESC, id DESC
            ",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        into_purchases(rows)
    }
}
