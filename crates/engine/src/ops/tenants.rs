use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Tenant, tenants, util::normalize_key};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new tenant.
    pub async fn create_tenant(&self, name: &str) -> ResultEngine<Tenant> {
        let name = normalize_required_name(name, "tenant")?;
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        };
        let entry: tenants::ActiveModel = (&tenant).into();
        with_tx!(self, |db_tx| {
            entry.insert(&db_tx).await?;
            Ok(tenant)
        })
    }

    /// All tenants, oldest first.
    pub async fn list_tenants(&self) -> ResultEngine<Vec<Tenant>> {
        let models = tenants::Entity::find()
            .order_by_asc(tenants::Column::CreatedAt)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Tenant::from).collect())
    }

    /// Look a tenant up by exact or normalized name.
    pub async fn find_tenant(&self, name: &str) -> ResultEngine<Tenant> {
        let key = normalize_key(name)
            .ok_or_else(|| EngineError::InvalidName("tenant name must not be empty".to_string()))?;
        let models = tenants::Entity::find().all(&self.database).await?;
        models
            .into_iter()
            .find(|model| normalize_key(&model.name).as_deref() == Some(key.as_str()))
            .map(Tenant::from)
            .ok_or_else(|| EngineError::KeyNotFound(name.to_string()))
    }

    pub(super) async fn require_tenant<C: ConnectionTrait>(
        &self,
        conn: &C,
        tenant_id: Uuid,
    ) -> ResultEngine<tenants::Model> {
        tenants::Entity::find()
            .filter(tenants::Column::Id.eq(tenant_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("tenant not exists".to_string()))
    }
}
