//! Catalog and feed writes
//!
//! Inserts used by the `seed` command to load demo data. Listing goes
//! through the query layer, never through here.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::error::SqliteError;

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub is_active: bool,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: String,
    pub body: String,
    pub visibility: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl NewProduct {
    #[cfg(test)]
    pub fn sample(name: &str, price: f64) -> Self {
        Self {
            seller_id: "seller-1".to_string(),
            name: name.to_string(),
            category: "general".to_string(),
            price,
            stock: 10,
            is_active: true,
            rating: Some(4.0),
            created_at: Utc::now(),
        }
    }
}

pub async fn insert_product(pool: &SqlitePool, product: &NewProduct) -> Result<i64, SqliteError> {
    let result = sqlx::query(
        "INSERT INTO products (seller_id, name, category, price, stock, is_active, rating, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&product.seller_id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.is_active)
    .bind(product.rating)
    .bind(product.created_at.timestamp())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64, SqliteError> {
    let result = sqlx::query(
        "INSERT INTO posts (author_id, body, visibility, like_count, created_at, edited_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.author_id)
    .bind(&post.body)
    .bind(&post.visibility)
    .bind(post.like_count)
    .bind(post.created_at.timestamp())
    .bind(post.edited_at.map(|t| t.timestamp()))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

const CATEGORIES: &[&str] = &["books", "garden", "kitchen", "music", "toys"];
const VISIBILITIES: &[&str] = &["public", "public", "followers", "private"];

/// Insert a deterministic demo data set in one transaction
///
/// Returns the number of (products, posts) inserted.
pub async fn seed_demo(
    pool: &SqlitePool,
    products: usize,
    posts: usize,
) -> Result<(usize, usize), SqliteError> {
    let base = Utc::now().timestamp() - 86_400 * 30;
    let mut tx = pool.begin().await?;

    for i in 0..products {
        let n = i as i64;
        sqlx::query(
            "INSERT INTO products (seller_id, name, category, price, stock, is_active, rating, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format!("seller-{}", i % 7))
        .bind(format!("Product {}", i + 1))
        .bind(CATEGORIES[i % CATEGORIES.len()])
        .bind(((n * 37) % 5000) as f64 / 100.0 + 0.99)
        .bind((n * 13) % 40)
        .bind(i % 10 != 0)
        .bind((i % 4 != 0).then(|| ((n * 7) % 50) as f64 / 10.0))
        .bind(base + n * 600)
        .execute(&mut *tx)
        .await?;
    }

    for i in 0..posts {
        let n = i as i64;
        sqlx::query(
            "INSERT INTO posts (author_id, body, visibility, like_count, created_at, edited_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(format!("user-{}", i % 5))
        .bind(format!("Post number {}", i + 1))
        .bind(VISIBILITIES[i % VISIBILITIES.len()])
        .bind((n * 17) % 250)
        .bind(base + n * 300)
        .bind((i % 6 == 0).then_some(base + n * 300 + 120))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(products, posts, "Seeded demo data");
    Ok((products, posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteService;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteService::from_pool(pool).await.unwrap().pool().clone()
    }

    #[tokio::test]
    async fn insert_returns_ids() {
        let pool = setup_test_pool().await;
        let first = insert_product(&pool, &NewProduct::sample("a", 1.0)).await.unwrap();
        let second = insert_product(&pool, &NewProduct::sample("b", 2.0)).await.unwrap();
        assert!(second > first);

        let post = NewPost {
            author_id: "user-1".into(),
            body: "hello".into(),
            visibility: "public".into(),
            like_count: 0,
            created_at: Utc::now(),
            edited_at: None,
        };
        assert_eq!(insert_post(&pool, &post).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_visibility() {
        let pool = setup_test_pool().await;
        let post = NewPost {
            author_id: "user-1".into(),
            body: "hello".into(),
            visibility: "secret".into(),
            like_count: 0,
            created_at: Utc::now(),
            edited_at: None,
        };
        assert!(matches!(
            insert_post(&pool, &post).await,
            Err(SqliteError::Database(_))
        ));
    }

    #[tokio::test]
    async fn seed_inserts_requested_counts() {
        let pool = setup_test_pool().await;
        assert_eq!(seed_demo(&pool, 25, 40).await.unwrap(), (25, 40));

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&pool)
            .await
            .unwrap();
        let nulls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE rating IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(products, 25);
        assert!(nulls > 0);
    }
}
