//! Background expiry of abandoned orders.
//!
//! Pending orders that nobody processed within `pending_timeout` are canceled.
//! Canceled orders are deleted once they have not changed for
//! `canceled_retention`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Store;
use crate::models::{ExpiryPolicy, ExpiryReport, OrderStatus};
use crate::tasks::spawn_periodic;

impl Store {
    /// Run one expiry pass as of `now`.
    pub async fn expire_orders(&self, now: DateTime<Utc>, policy: &ExpiryPolicy) -> ExpiryReport {
        let mut tables = self.inner.write().await;
        let mut report = ExpiryReport::default();

        // A cutoff before the earliest representable time matches nothing.
        if let Some(purge_before) = now.checked_sub_signed(policy.canceled_retention) {
            let before = tables.orders.len();
            tables
                .orders
                .retain(|_, o| !(o.status == OrderStatus::Canceled && o.updated_at < purge_before));
            report.purged = before - tables.orders.len();
        }

        if let Some(cancel_before) = now.checked_sub_signed(policy.pending_timeout) {
            for order in tables.orders.values_mut() {
                if order.status == OrderStatus::Pending && order.created_at < cancel_before {
                    order.status = OrderStatus::Canceled;
                    order.updated_at = now;
                    report.canceled += 1;
                }
            }
        }
        report
    }
}

/// Run [`Store::expire_orders`] every `interval` until the returned token is cancelled.
pub fn spawn_order_sweeper(store: Store, interval: Duration, policy: ExpiryPolicy) -> CancellationToken {
    spawn_periodic("order_sweeper", interval, move || {
        let store = store.clone();
        async move {
            let report = store.expire_orders(Utc::now(), &policy).await;
            if report != ExpiryReport::default() {
                info!(canceled = report.canceled, purged = report.purged, "Expired stale orders");
            }
        }
    })
}
