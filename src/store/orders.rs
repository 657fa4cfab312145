use std::collections::BTreeMap;

use chrono::Utc;

use super::{Store, StoreError, StoreResult, Tables, next_id};
use crate::models::{
    Order, OrderDetails, OrderItem, OrderItemDetails, OrderLine, OrderStatus, PaymentMethod,
};

impl Tables {
    /// Price each line against the live catalog. Stock is checked against the
    /// total quantity requested per book across all lines.
    fn price_lines(&mut self, lines: &[OrderLine]) -> StoreResult<(Vec<OrderItem>, f64)> {
        let mut priced = Vec::with_capacity(lines.len());
        let mut requested: BTreeMap<u64, u64> = BTreeMap::new();
        for line in lines {
            let book = self
                .live_book(line.book_id)
                .ok_or_else(|| StoreError::Invalid(format!("Book {} not found", line.book_id)))?;
            let total = requested.entry(line.book_id).or_default();
            *total += u64::from(line.quantity);
            if u64::from(book.stock) < *total {
                return Err(StoreError::Invalid(format!(
                    "Not enough stock for book {}",
                    book.title
                )));
            }
            priced.push((line.book_id, line.quantity, book.price));
        }

        let mut total = 0.0;
        let items = priced
            .into_iter()
            .map(|(book_id, quantity, price)| {
                total += price * f64::from(quantity);
                OrderItem { id: next_id(&mut self.ids.order_item), book_id, quantity, price, discount: 0.0 }
            })
            .collect();
        Ok((items, total))
    }

    fn order_details(&self, order: &Order) -> OrderDetails {
        let order_items = order
            .items
            .iter()
            .map(|item| {
                let book = self.books.get(&item.book_id);
                OrderItemDetails {
                    id: item.id,
                    book_id: item.book_id,
                    title: book.map(|b| b.title.clone()),
                    author: book.map(|b| b.author.clone()),
                    image_url: book.map(|b| b.cover_image.clone()),
                    quantity: item.quantity,
                    discount: item.discount,
                    price: item.price,
                }
            })
            .collect();
        OrderDetails {
            id: order.id,
            user_id: order.user_id,
            username: self.username_of(order.user_id),
            total_amount: order.total_amount,
            status: order.status,
            payment_method: order.payment_method,
            order_items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl Store {
    pub async fn create_order(
        &self,
        user_id: u64,
        lines: &[OrderLine],
        payment_method: PaymentMethod,
    ) -> StoreResult<OrderDetails> {
        let mut tables = self.inner.write().await;
        let (items, total_amount) = tables.price_lines(lines)?;
        let now = Utc::now();
        let id = next_id(&mut tables.ids.order);
        let order = Order {
            id,
            user_id,
            total_amount,
            status: OrderStatus::Pending,
            payment_method,
            items,
            created_at: now,
            updated_at: now,
        };
        let details = tables.order_details(&order);
        tables.orders.insert(id, order);
        Ok(details)
    }

    /// Replace the items and payment method of the caller's own pending order.
    pub async fn replace_order_items(
        &self,
        order_id: u64,
        user_id: u64,
        lines: &[OrderLine],
        payment_method: PaymentMethod,
    ) -> StoreResult<OrderDetails> {
        let mut tables = self.inner.write().await;
        let order = tables.orders.get(&order_id).ok_or(StoreError::NotFound("Order"))?;
        if order.user_id != user_id {
            return Err(StoreError::Forbidden(
                "You don't have permission to update this order".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(StoreError::Invalid("Only pending orders can be updated".to_string()));
        }

        let (items, total_amount) = tables.price_lines(lines)?;
        let order = tables.orders.get_mut(&order_id).ok_or(StoreError::NotFound("Order"))?;
        order.items = items;
        order.total_amount = total_amount;
        order.payment_method = payment_method;
        order.updated_at = Utc::now();
        let order = order.clone();
        Ok(tables.order_details(&order))
    }

    pub async fn set_order_status(&self, order_id: u64, status: OrderStatus) -> StoreResult<Order> {
        let mut tables = self.inner.write().await;
        let order = tables.orders.get_mut(&order_id).ok_or(StoreError::NotFound("Order"))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    pub async fn get_order_details(&self, order_id: u64) -> StoreResult<OrderDetails> {
        let tables = self.inner.read().await;
        let order = tables.orders.get(&order_id).ok_or(StoreError::NotFound("Order"))?;
        Ok(tables.order_details(order))
    }

    /// Orders placed by one user, newest first.
    pub async fn orders_for_user(&self, user_id: u64) -> Vec<OrderDetails> {
        let tables = self.inner.read().await;
        tables
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .map(|o| tables.order_details(o))
            .collect()
    }

    /// Every order, newest first.
    pub async fn all_orders(&self) -> Vec<OrderDetails> {
        let tables = self.inner.read().await;
        tables.orders.values().rev().map(|o| tables.order_details(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::books::tests::draft;

    fn line(book_id: u64, quantity: u32) -> OrderLine {
        OrderLine { book_id, quantity }
    }

    #[tokio::test]
    async fn test_totals_use_current_price() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 5)).await.unwrap();
        let b = store.create_book(draft("Beta", "1000000002", 2.5, 5)).await.unwrap();

        let order = store
            .create_order(7, &[line(a.id, 2), line(b.id, 4)], PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(order.total_amount, 30.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_items[0].title.as_deref(), Some("Alpha"));

        // Stock is checked, not reserved.
        assert_eq!(store.get_book(a.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_rejects_overstock_and_unknown_books() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 1)).await.unwrap();

        let err = store.create_order(1, &[line(a.id, 2)], PaymentMethod::Cod).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(msg) if msg.contains("Not enough stock")));
        assert!(matches!(
            store.create_order(1, &[line(99, 1)], PaymentMethod::Cod).await,
            Err(StoreError::Invalid(_))
        ));
        assert!(store.all_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_split_lines_share_stock() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 3)).await.unwrap();

        let err = store
            .create_order(1, &[line(a.id, 2), line(a.id, 2)], PaymentMethod::Cod)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(msg) if msg == "Not enough stock for book Alpha"));

        let order = store
            .create_order(1, &[line(a.id, 2), line(a.id, 1)], PaymentMethod::Cod)
            .await
            .unwrap();
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.total_amount, 30.0);
    }

    #[tokio::test]
    async fn test_only_owner_edits_pending_orders() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 5)).await.unwrap();
        let order = store.create_order(1, &[line(a.id, 1)], PaymentMethod::Card).await.unwrap();

        assert!(matches!(
            store.replace_order_items(order.id, 2, &[line(a.id, 2)], PaymentMethod::Card).await,
            Err(StoreError::Forbidden(_))
        ));

        let updated = store
            .replace_order_items(order.id, 1, &[line(a.id, 3)], PaymentMethod::BankTransfer)
            .await
            .unwrap();
        assert_eq!(updated.total_amount, 30.0);
        assert_eq!(updated.payment_method, PaymentMethod::BankTransfer);

        store.set_order_status(order.id, OrderStatus::Completed).await.unwrap();
        assert!(matches!(
            store.replace_order_items(order.id, 1, &[line(a.id, 1)], PaymentMethod::Card).await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_active_order_blocks_book_delete() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 5)).await.unwrap();
        let order = store.create_order(1, &[line(a.id, 1)], PaymentMethod::Card).await.unwrap();

        assert!(matches!(store.delete_book(a.id).await, Err(StoreError::Invalid(_))));
        store.set_order_status(order.id, OrderStatus::Processing).await.unwrap();
        assert!(matches!(store.delete_book(a.id).await, Err(StoreError::Invalid(_))));
        store.set_order_status(order.id, OrderStatus::Completed).await.unwrap();
        store.delete_book(a.id).await.unwrap();

        // Historical orders still resolve the deleted book's title.
        let details = store.get_order_details(order.id).await.unwrap();
        assert_eq!(details.order_items[0].title.as_deref(), Some("Alpha"));
    }

    #[tokio::test]
    async fn test_user_orders_newest_first() {
        let store = Store::new();
        let a = store.create_book(draft("Alpha", "1000000001", 10.0, 5)).await.unwrap();
        let first = store.create_order(1, &[line(a.id, 1)], PaymentMethod::Card).await.unwrap();
        store.create_order(2, &[line(a.id, 1)], PaymentMethod::Card).await.unwrap();
        let third = store.create_order(1, &[line(a.id, 1)], PaymentMethod::Card).await.unwrap();

        let mine: Vec<u64> = store.orders_for_user(1).await.iter().map(|o| o.id).collect();
        assert_eq!(mine, vec![third.id, first.id]);
        assert_eq!(store.all_orders().await.len(), 3);
    }
}
