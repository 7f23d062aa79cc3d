use async_trait::async_trait;
use condomi_core::models::Role;
use condomi_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::store::AccessStore;

/// Role lookups through the `get_user_condominium_ids` and `has_role`
/// database functions.
#[derive(Clone)]
pub struct AccessRepository {
    pool: PgPool,
}

impl AccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for AccessRepository {
    #[tracing::instrument(skip(self), fields(db.table = "user_roles", db.operation = "call"))]
    async fn get_user_condominium_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT condominium_id FROM get_user_condominium_ids($1) AS t(condominium_id)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_roles", db.operation = "call"))]
    async fn has_role(
        &self,
        user_id: Uuid,
        role: Role,
        condominium_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let allowed = sqlx::query_scalar::<_, bool>("SELECT has_role($1, $2, $3)")
            .bind(user_id)
            .bind(role)
            .bind(condominium_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(allowed)
    }
}
