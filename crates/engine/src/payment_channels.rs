//! Payment channel registry per tenant.
//!
//! A channel is a place money sits (a till, a bank account, an e-wallet).
//! Each channel maps to one asset account under the matching skeleton parent.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Cash,
    Bank,
    Ewallet,
}

const BANK_KEYWORDS: &[&str] = &[
    "bank", "bca", "bri", "bni", "mandiri", "cimb", "btn", "permata", "rekening",
];
const EWALLET_KEYWORDS: &[&str] = &[
    "gopay", "ovo", "dana", "shopeepay", "linkaja", "ewallet", "e wallet", "qris",
];

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::Ewallet => "ewallet",
        }
    }

    /// Guess a channel kind from its name. Used when a channel is registered
    /// without an explicit kind; cash is the fallback.
    pub fn classify(name: &str) -> ChannelKind {
        let Some(key) = crate::util::normalize_key(name) else {
            return ChannelKind::Cash;
        };
        if BANK_KEYWORDS.iter().any(|kw| key.contains(kw)) {
            return ChannelKind::Bank;
        }
        if EWALLET_KEYWORDS.iter().any(|kw| key.contains(kw)) {
            return ChannelKind::Ewallet;
        }
        ChannelKind::Cash
    }
}

impl TryFrom<&str> for ChannelKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank" => Ok(Self::Bank),
            "ewallet" => Ok(Self::Ewallet),
            other => Err(EngineError::InvalidName(format!(
                "invalid channel kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub name_norm: String,
    pub kind: ChannelKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Tenant,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PaymentChannel> for ActiveModel {
    fn from(channel: &PaymentChannel) -> Self {
        Self {
            id: ActiveValue::Set(channel.id),
            tenant_id: ActiveValue::Set(channel.tenant_id),
            name: ActiveValue::Set(channel.name.clone()),
            name_norm: ActiveValue::Set(channel.name_norm.clone()),
            kind: ActiveValue::Set(channel.kind.as_str().to_string()),
            created_at: ActiveValue::Set(channel.created_at),
        }
    }
}

impl TryFrom<Model> for PaymentChannel {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            name_norm: model.name_norm,
            kind: ChannelKind::try_from(model.kind.as_str())?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ChannelKind;

    #[test]
    fn classify_matches_known_keywords() {
        assert_eq!(ChannelKind::classify("Bank BCA"), ChannelKind::Bank);
        assert_eq!(ChannelKind::classify("rekening toko"), ChannelKind::Bank);
        assert_eq!(ChannelKind::classify("GoPay Merchant"), ChannelKind::Ewallet);
        assert_eq!(ChannelKind::classify("OVO"), ChannelKind::Ewallet);
    }

    #[test]
    fn classify_defaults_to_cash() {
        assert_eq!(ChannelKind::classify("Kas Utama"), ChannelKind::Cash);
        assert_eq!(ChannelKind::classify("Main Wallet drawer"), ChannelKind::Cash);
        assert_eq!(ChannelKind::classify("   "), ChannelKind::Cash);
    }
}
