use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ChannelKind, EngineError, PaymentChannel, ResultEngine, payment_channels,
    util::{normalize_display, normalize_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a payment channel, or return the existing one with the same
    /// normalized name.
    pub async fn register_channel(
        &self,
        tenant_id: Uuid,
        name: &str,
        kind: Option<ChannelKind>,
    ) -> ResultEngine<PaymentChannel> {
        let display = normalize_display(name)
            .ok_or_else(|| EngineError::InvalidName("channel name must not be empty".to_string()))?;
        let key = normalize_key(&display)
            .ok_or_else(|| EngineError::InvalidName(format!("unusable channel name: {display}")))?;
        let kind = kind.unwrap_or_else(|| ChannelKind::classify(&display));

        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;

            if let Some(model) = Self::channel_by_key(&db_tx, tenant_id, &key).await? {
                return PaymentChannel::try_from(model);
            }

            let channel = PaymentChannel {
                id: Uuid::new_v4(),
                tenant_id,
                name: display,
                name_norm: key.clone(),
                kind,
                created_at: Utc::now(),
            };
            let active: payment_channels::ActiveModel = (&channel).into();
            if let Err(err) = active.insert(&db_tx).await {
                // Unique index hit: somebody registered the same name in between.
                if let Some(model) = Self::channel_by_key(&db_tx, tenant_id, &key).await? {
                    return PaymentChannel::try_from(model);
                }
                return Err(err.into());
            }
            Ok(channel)
        })
    }

    /// All channels of a tenant, oldest first.
    pub async fn list_channels(&self, tenant_id: Uuid) -> ResultEngine<Vec<PaymentChannel>> {
        let models = payment_channels::Entity::find()
            .filter(payment_channels::Column::TenantId.eq(tenant_id))
            .order_by_asc(payment_channels::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(PaymentChannel::try_from).collect()
    }

    pub(super) async fn channel_by_key<C: ConnectionTrait>(
        conn: &C,
        tenant_id: Uuid,
        key: &str,
    ) -> ResultEngine<Option<payment_channels::Model>> {
        Ok(payment_channels::Entity::find()
            .filter(payment_channels::Column::TenantId.eq(tenant_id))
            .filter(payment_channels::Column::NameNorm.eq(key.to_string()))
            .one(conn)
            .await?)
    }

    /// Declared kind of a channel name, if the channel is registered.
    pub(super) async fn channel_kind_for<C: ConnectionTrait>(
        conn: &C,
        tenant_id: Uuid,
        name: &str,
    ) -> ResultEngine<Option<ChannelKind>> {
        let Some(key) = normalize_key(name) else {
            return Ok(None);
        };
        let model = Self::channel_by_key(conn, tenant_id, &key).await?;
        match model {
            Some(model) => Ok(Some(ChannelKind::try_from(model.kind.as_str())?)),
            None => Ok(None),
        }
    }
}
