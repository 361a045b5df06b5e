//! Product repository, including reviews and the derived rating.
//!
//! Every path that changes reviews or the rating runs in one transaction
//! holding `SELECT ... FOR UPDATE` on the product row, so the stored rating
//! always matches the committed review list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, instrument};

use tripmart_core::{
    Caller, Price, Principal, ProductId, ReviewId, SellerId, Stars, TouristId, average_rating,
};

use super::{RepositoryError, non_negative, to_db_int};
use crate::models::product::{NewProduct, PriceRange, Product, ProductUpdate, Review, ReviewInput};
use crate::services::guard::{Owned, Policy, authorize};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Price,
    description: Option<String>,
    picture: Option<String>,
    seller_id: SellerId,
    rating: Option<f64>,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Owned for ProductRow {
    const KIND: &'static str = Product::KIND;

    fn owner(&self) -> Principal {
        self.seller_id.into()
    }
}

impl ProductRow {
    fn into_product(self, reviews: Vec<Review>) -> Result<Product, RepositoryError> {
        Ok(Product {
            id: self.id,
            name: self.name,
            price: self.price,
            description: self.description,
            picture: self.picture,
            seller: self.seller_id,
            rating: self.rating,
            reviews,
            quantity: non_negative(self.quantity, "quantity")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    tourist_id: Option<TouristId>,
    rating: i16,
    body: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Stars::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid review rating in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            tourist: row.tourist_id,
            rating,
            text: row.body,
            created_at: row.created_at,
        })
    }
}

/// Escape `%`, `_` and `\` so the needle matches literally inside `ILIKE`.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ILIKE` pattern for a name search, or `None` to list everything.
fn search_pattern(name: Option<&str>) -> Option<String> {
    let needle = name.map(str::trim).filter(|n| !n.is_empty())?;
    Some(format!("%{}%", escape_like(needle)))
}

async fn load_reviews<'e>(
    executor: impl PgExecutor<'e>,
    product_ids: &[i32],
) -> Result<Vec<ReviewRow>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        r"
        SELECT id, product_id, tourist_id, rating, body, created_at
        FROM tripmart.product_review
        WHERE product_id = ANY($1)
        ORDER BY product_id, id
        ",
    )
    .bind(product_ids)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// Pair product rows with their reviews, keeping the row order.
fn assemble(
    rows: Vec<ProductRow>,
    reviews: Vec<ReviewRow>,
) -> Result<Vec<Product>, RepositoryError> {
    let mut by_product: HashMap<ProductId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_product
            .entry(review.product_id)
            .or_default()
            .push(Review::try_from(review)?);
    }

    rows.into_iter()
        .map(|row| {
            let reviews = by_product.remove(&row.id).unwrap_or_default();
            row.into_product(reviews)
        })
        .collect()
}

async fn product_reviews<'e>(
    executor: impl PgExecutor<'e>,
    id: ProductId,
) -> Result<Vec<Review>, RepositoryError> {
    load_reviews(executor, &[id.as_i32()])
        .await?
        .into_iter()
        .map(Review::try_from)
        .collect()
}

async fn lock_product<'e>(
    executor: impl PgExecutor<'e>,
    id: ProductId,
) -> Result<Option<ProductRow>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, name, price, description, picture, seller_id, rating, quantity,
               created_at, updated_at
        FROM tripmart.product
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

async fn insert_review<'e>(
    executor: impl PgExecutor<'e>,
    product: ProductId,
    tourist: Option<TouristId>,
    review: &ReviewInput,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO tripmart.product_review (product_id, tourist_id, rating, body)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(product)
    .bind(tourist)
    .bind(i16::from(review.rating.get()))
    .bind(review.text.as_deref())
    .execute(executor)
    .await?;
    Ok(())
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn with_reviews(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let reviews = load_reviews(self.pool, &ids).await?;
        assemble(rows, reviews)
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.with_reviews(rows).await
    }

    /// Case-insensitive substring search on the name.
    ///
    /// A missing or blank `name` returns every product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, name: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let Some(pattern) = search_pattern(name) else {
            return self.list().await;
        };

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY id
            ",
        )
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        self.with_reviews(rows).await
    }

    /// Products priced within `range`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn by_price(&self, range: PriceRange) -> Result<Vec<Product>, RepositoryError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            WHERE ($1::numeric IS NULL OR price >= $1)
              AND ($2::numeric IS NULL OR price <= $2)
            ORDER BY price, id
            ",
        )
        .bind(range.min)
        .bind(range.max)
        .fetch_all(self.pool)
        .await?;

        self.with_reviews(rows).await
    }

    /// All products by rating, highest first. Unrated products come last
    /// and ties are broken by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn sorted_by_rating(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            ORDER BY rating DESC NULLS LAST, id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.with_reviews(rows).await
    }

    /// Products listed by `seller`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn by_seller(&self, seller: SellerId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            WHERE seller_id = $1
            ORDER BY id
            ",
        )
        .bind(seller)
        .fetch_all(self.pool)
        .await?;

        self.with_reviews(rows).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, picture, seller_id, rating, quantity,
                   created_at, updated_at
            FROM tripmart.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_reviews(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Create a product owned by `seller`. New products have no reviews and
    /// no rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(seller = %seller))]
    pub async fn create(
        &self,
        seller: SellerId,
        input: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO tripmart.product (name, price, description, picture, seller_id, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, price, description, picture, seller_id, rating, quantity,
                      created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.description.as_deref())
        .bind(input.picture.as_deref())
        .bind(seller)
        .bind(to_db_int(input.quantity, "quantity")?)
        .fetch_one(self.pool)
        .await?;

        debug!(product = %row.id, "Created product");
        row.into_product(Vec::new())
    }

    /// Update a product the caller owns.
    ///
    /// When `update.reviews` is present the review list is replaced and the
    /// rating recomputed, all under the product row lock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the product is missing or owned
    /// by someone else, `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, update), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn update(
        &self,
        id: ProductId,
        caller: &Caller,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = authorize(lock_product(&mut *tx, id).await?, caller, Policy::OwnerOnly)?;
        let mut product = row.into_product(Vec::new())?;
        update.apply_to(&mut product);

        if let Some(reviews) = &update.reviews {
            sqlx::query("DELETE FROM tripmart.product_review WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for review in reviews {
                insert_review(&mut *tx, id, None, review).await?;
            }
        }

        let reviews = product_reviews(&mut *tx, id).await?;
        let rating = average_rating(reviews.iter().map(|r| r.rating));

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE tripmart.product
            SET name = $2, price = $3, description = $4, picture = $5, quantity = $6,
                rating = $7
            WHERE id = $1
            RETURNING id, name, price, description, picture, seller_id, rating, quantity,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.description.as_deref())
        .bind(product.picture.as_deref())
        .bind(to_db_int(product.quantity, "quantity")?)
        .bind(rating)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product = %id, reviews = reviews.len(), "Updated product");
        row.into_product(reviews)
    }

    /// Append a tourist's review and recompute the rating atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, review), fields(tourist = %tourist))]
    pub async fn add_review(
        &self,
        id: ProductId,
        tourist: TouristId,
        review: &ReviewInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if lock_product(&mut *tx, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        insert_review(&mut *tx, id, Some(tourist), review).await?;

        let reviews = product_reviews(&mut *tx, id).await?;
        let rating = average_rating(reviews.iter().map(|r| r.rating));

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE tripmart.product
            SET rating = $2
            WHERE id = $1
            RETURNING id, name, price, description, picture, seller_id, rating, quantity,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(rating)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product = %id, ?rating, "Recorded review");
        row.into_product(reviews)
    }

    /// Delete a product after the ownership check. Reviews go with it;
    /// purchases keep their plain product reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Access` if the product is missing or the
    /// caller is refused under `policy`.
    #[instrument(skip(self), fields(caller_role = %caller.role, caller_subject = caller.subject))]
    pub async fn delete(
        &self,
        id: ProductId,
        caller: &Caller,
        policy: Policy,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        authorize(lock_product(&mut *tx, id).await?, caller, policy)?;
        sqlx::query("DELETE FROM tripmart.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(product = %id, "Deleted product");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(id: i32) -> ProductRow {
        let now = Utc::now();
        ProductRow {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::parse("10").unwrap(),
            description: None,
            picture: None,
            seller_id: SellerId::new(1),
            rating: None,
            quantity: 3,
            created_at: now,
            updated_at: now,
        }
    }

    fn review(id: i32, product: i32, rating: i16) -> ReviewRow {
        ReviewRow {
            id: ReviewId::new(id),
            product_id: ProductId::new(product),
            tourist_id: Some(TouristId::new(9)),
            rating,
            body: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("papyrus"), "papyrus");
    }

    #[test]
    fn test_blank_search_lists_everything() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("")), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" Lamp ")).as_deref(), Some("%Lamp%"));
        assert_eq!(search_pattern(Some("100%")).as_deref(), Some("%100\\%%"));
    }

    #[test]
    fn test_assemble_groups_reviews_and_keeps_order() {
        let products = assemble(
            vec![row(2), row(1)],
            vec![review(10, 1, 4), review(11, 2, 5), review(12, 1, 2)],
        )
        .unwrap();

        assert_eq!(products[0].id, ProductId::new(2));
        assert_eq!(products[0].reviews.len(), 1);
        let ids: Vec<_> = products[1].reviews.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![ReviewId::new(10), ReviewId::new(12)]);
    }

    #[test]
    fn test_assemble_flags_corrupt_rating() {
        let err = assemble(vec![row(1)], vec![review(1, 1, 9)]).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_product_row_is_owned_by_seller() {
        assert_eq!(row(1).owner(), Principal::from(SellerId::new(1)));
    }
}
