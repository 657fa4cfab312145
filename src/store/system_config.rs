use chrono::Utc;

use super::{Store, StoreError, StoreResult};
use crate::models::{SystemConfig, SystemConfigInput};

impl Store {
    /// Create the singleton. Fails if one already exists.
    pub async fn create_system_config(&self, input: SystemConfigInput) -> StoreResult<SystemConfig> {
        let mut tables = self.inner.write().await;
        if tables.system_config.is_some() {
            return Err(StoreError::Conflict("System config already exists".to_string()));
        }
        let now = Utc::now();
        let config = SystemConfig {
            shipping_fee: input.shipping_fee,
            promotion: input.promotion,
            promotion_info: input.promotion_info,
            created_at: now,
            updated_at: now,
        };
        tables.system_config = Some(config.clone());
        Ok(config)
    }

    pub async fn get_system_config(&self) -> StoreResult<SystemConfig> {
        self.inner
            .read()
            .await
            .system_config
            .clone()
            .ok_or(StoreError::NotFound("System config"))
    }

    pub async fn update_system_config(&self, input: SystemConfigInput) -> StoreResult<SystemConfig> {
        let mut tables = self.inner.write().await;
        let config = tables.system_config.as_mut().ok_or(StoreError::NotFound("System config"))?;
        config.shipping_fee = input.shipping_fee;
        config.promotion = input.promotion;
        config.promotion_info = input.promotion_info;
        config.updated_at = Utc::now();
        Ok(config.clone())
    }

    pub async fn delete_system_config(&self) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .system_config
            .take()
            .map(|_| ())
            .ok_or(StoreError::NotFound("System config"))
    }
}
