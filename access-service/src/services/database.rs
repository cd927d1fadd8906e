//! PostgreSQL implementation of [`Store`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::store::{Store, StoreError};
use crate::models::{ApiKey, Home, HomeMember, HomeRole, Item, Location, User};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(anyhow::anyhow!(e))
}

/// Maps a unique violation to `Duplicate(what)`, anything else to `Backend`.
fn unique(what: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Duplicate(what.to_string())
        }
        other => backend(other),
    }
}

#[async_trait]
impl Store for Database {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                backend(e)
            })?;
        Ok(())
    }

    // ==================== Users ====================

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique("email"))?;
        Ok(())
    }

    // ==================== API keys ====================

    async fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, user_id, name, key_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(key.id)
        .bind(key.user_id)
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(key.is_active)
        .bind(key.created_at)
        .bind(key.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique("api key"))?;
        Ok(())
    }

    async fn list_active_api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, user_id, name, key_hash, is_active, created_at, updated_at
            FROM api_keys
            WHERE is_active = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn list_api_keys(&self, owner_id: Uuid) -> Result<Vec<ApiKey>, StoreError> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, user_id, name, key_hash, is_active, created_at, updated_at
            FROM api_keys
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn set_api_key_inactive(&self, key_id: Uuid, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_active = TRUE
            "#,
        )
        .bind(key_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected())
    }

    // ==================== Homes ====================

    async fn create_home_with_owner(&self, home: &Home) -> Result<HomeMember, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO homes (id, name, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(home.id)
        .bind(&home.name)
        .bind(home.owner_id)
        .bind(home.created_at)
        .bind(home.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(unique("home"))?;

        let owner = sqlx::query_as::<_, HomeMember>(
            r#"
            INSERT INTO home_users (home_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING home_id, user_id, role, joined_at
            "#,
        )
        .bind(home.id)
        .bind(home.owner_id)
        .bind(HomeRole::Owner.as_str())
        .bind(home.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique("membership"))?;

        // Dropping `tx` on any early return above rolls both inserts back.
        tx.commit().await.map_err(backend)?;
        Ok(owner)
    }

    async fn list_homes_for_user(&self, user_id: Uuid) -> Result<Vec<Home>, StoreError> {
        sqlx::query_as::<_, Home>(
            r#"
            SELECT h.id, h.name, h.owner_id, h.created_at, h.updated_at
            FROM homes h
            JOIN home_users hu ON hu.home_id = h.id
            WHERE hu.user_id = $1
            ORDER BY h.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn find_home(&self, home_id: Uuid) -> Result<Option<Home>, StoreError> {
        sqlx::query_as::<_, Home>(
            "SELECT id, name, owner_id, created_at, updated_at FROM homes WHERE id = $1",
        )
        .bind(home_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn update_home(
        &self,
        home_id: Uuid,
        name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Home>, StoreError> {
        sqlx::query_as::<_, Home>(
            r#"
            UPDATE homes SET name = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, name, owner_id, created_at, updated_at
            "#,
        )
        .bind(home_id)
        .bind(name)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn delete_home(&self, home_id: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Items reference locations without cascading; clear them first.
        sqlx::query(
            "DELETE FROM items WHERE location_id IN (SELECT id FROM locations WHERE home_id = $1)",
        )
        .bind(home_id)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query("UPDATE locations SET parent_location_id = NULL WHERE home_id = $1")
            .bind(home_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let result = sqlx::query("DELETE FROM homes WHERE id = $1")
            .bind(home_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(result.rows_affected())
    }

    // ==================== Membership ====================

    async fn find_membership(
        &self,
        home_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HomeRole>, StoreError> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM home_users WHERE home_id = $1 AND user_id = $2")
                .bind(home_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        role.map(|r| r.parse::<HomeRole>())
            .transpose()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!(e)))
    }

    async fn insert_membership(&self, member: &HomeMember) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO home_users (home_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(member.home_id)
        .bind(member.user_id)
        .bind(member.role.as_str())
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(unique("membership"))?;
        Ok(())
    }

    async fn list_members(&self, home_id: Uuid) -> Result<Vec<HomeMember>, StoreError> {
        sqlx::query_as::<_, HomeMember>(
            r#"
            SELECT home_id, user_id, role, joined_at
            FROM home_users
            WHERE home_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(home_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn update_member_role(
        &self,
        home_id: Uuid,
        user_id: Uuid,
        role: HomeRole,
    ) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE home_users SET role = $3 WHERE home_id = $1 AND user_id = $2")
                .bind(home_id)
                .bind(user_id)
                .bind(role.as_str())
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        Ok(result.rows_affected())
    }

    async fn remove_member(&self, home_id: Uuid, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM home_users WHERE home_id = $1 AND user_id = $2")
            .bind(home_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }

    // ==================== Locations ====================

    async fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO locations
                (id, home_id, parent_location_id, name, location_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(location.id)
        .bind(location.home_id)
        .bind(location.parent_location_id)
        .bind(&location.name)
        .bind(&location.location_type)
        .bind(location.created_at)
        .bind(location.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unique("location"))?;
        Ok(())
    }

    async fn find_location(
        &self,
        home_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<Location>, StoreError> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT id, home_id, parent_location_id, name, location_type, created_at, updated_at
            FROM locations
            WHERE id = $1 AND home_id = $2
            "#,
        )
        .bind(location_id)
        .bind(home_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn list_locations(&self, home_id: Uuid) -> Result<Vec<Location>, StoreError> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT id, home_id, parent_location_id, name, location_type, created_at, updated_at
            FROM locations
            WHERE home_id = $1
            ORDER BY name
            "#,
        )
        .bind(home_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn count_child_locations(&self, location_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE parent_location_id = $1")
            .bind(location_id)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }

    async fn count_items_in_location(&self, location_id: Uuid) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE location_id = $1")
            .bind(location_id)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)
    }

    async fn delete_location(&self, home_id: Uuid, location_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1 AND home_id = $2")
            .bind(location_id)
            .bind(home_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }

    // ==================== Items ====================

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, quantity, location_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.location_id)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}
