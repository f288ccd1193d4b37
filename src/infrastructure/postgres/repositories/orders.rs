use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;

use crate::{
    domain::{
        entities::orders::{
            InsertOrderItemEntity, InsertOrderMealEntity, InsertOrderWithLines, OrderEntity,
            OrderItemEntity, OrderMealEntity,
        },
        repositories::orders::OrderRepository,
        value_objects::{
            enums::{
                order_statuses::OrderStatus, subscription_statuses::SubscriptionStatus,
            },
            orders::OrderStatusTally,
        },
    },
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, checkout},
        schema::{order_items, order_meals, orders, subscriptions},
    },
};

fn in_flight_statuses() -> Vec<String> {
    vec![
        OrderStatus::Confirmed.to_string(),
        OrderStatus::Preparing.to_string(),
        OrderStatus::OutForDelivery.to_string(),
    ]
}

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn create_batch(&self, batch: Vec<InsertOrderWithLines>) -> Result<Vec<OrderEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        conn.transaction::<Vec<OrderEntity>, anyhow::Error, _>(|conn| {
            let mut created = Vec::with_capacity(batch.len());

            for entry in batch {
                let order = insert_into(orders::table)
                    .values(&entry.order)
                    .returning(OrderEntity::as_returning())
                    .get_result::<OrderEntity>(conn)?;

                if !entry.meal_lines.is_empty() {
                    let meal_rows: Vec<InsertOrderMealEntity> = entry
                        .meal_lines
                        .into_iter()
                        .map(|line| InsertOrderMealEntity {
                            order_id: order.id,
                            meal_id: line.meal_id,
                            name: line.name,
                            quantity: line.quantity,
                            unit_price_minor: line.unit_price_minor,
                            total_price_minor: line.total_price_minor,
                        })
                        .collect();
                    insert_into(order_meals::table)
                        .values(&meal_rows)
                        .execute(conn)?;
                }

                if !entry.item_lines.is_empty() {
                    let item_rows: Vec<InsertOrderItemEntity> = entry
                        .item_lines
                        .into_iter()
                        .map(|line| InsertOrderItemEntity {
                            order_id: order.id,
                            item_id: line.item_id,
                            name: line.name,
                            quantity: line.quantity,
                            unit_price_minor: line.unit_price_minor,
                            total_price_minor: line.total_price_minor,
                        })
                        .collect();
                    insert_into(order_items::table)
                        .values(&item_rows)
                        .execute(conn)?;
                }

                created.push(order);
            }

            Ok(created)
        })
    }

    async fn find_by_id(&self, order_id: i64) -> Result<Option<OrderEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let result = orders::table
            .filter(orders::id.eq(order_id))
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_meal_lines(&self, order_id: i64) -> Result<Vec<OrderMealEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = order_meals::table
            .filter(order_meals::order_id.eq(order_id))
            .order(order_meals::id.asc())
            .select(OrderMealEntity::as_select())
            .load::<OrderMealEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_item_lines(&self, order_id: i64) -> Result<Vec<OrderItemEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = order_items::table
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::id.asc())
            .select(OrderItemEntity::as_select())
            .load::<OrderItemEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_by_subscription(&self, subscription_id: i64) -> Result<Vec<OrderEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = orders::table
            .filter(orders::subscription_id.eq(subscription_id))
            .order(orders::id.asc())
            .select(OrderEntity::as_select())
            .load::<OrderEntity>(&mut conn)?;

        Ok(results)
    }

    async fn count_in_flight(&self, subscription_id: i64) -> Result<i64> {
        let mut conn = checkout(&self.db_pool)?;

        let count = orders::table
            .filter(orders::subscription_id.eq(subscription_id))
            .filter(orders::status.eq_any(in_flight_statuses()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn find_oldest_pending(&self, subscription_id: i64) -> Result<Option<OrderEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let result = orders::table
            .filter(orders::subscription_id.eq(subscription_id))
            .filter(orders::status.eq(OrderStatus::Pending.to_string()))
            .order(orders::id.asc())
            .select(OrderEntity::as_select())
            .first::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn confirm_pending_order(
        &self,
        order_id: i64,
        scheduled_delivery_date: DateTime<Utc>,
    ) -> Result<Option<OrderEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        // The status predicate makes the promotion conditional: a row that a
        // racing activation already confirmed matches nothing and yields
        // `None` instead of a double activation.
        let result = update(orders::table)
            .filter(orders::id.eq(order_id))
            .filter(orders::status.eq(OrderStatus::Pending.to_string()))
            .set((
                orders::status.eq(OrderStatus::Confirmed.to_string()),
                orders::scheduled_delivery_date.eq(Some(scheduled_delivery_date)),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderEntity::as_returning())
            .get_result::<OrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<OrderEntity> {
        let mut conn = checkout(&self.db_pool)?;
        let now = Utc::now();

        let result = match notes {
            Some(notes) => update(orders::table)
                .filter(orders::id.eq(order_id))
                .set((
                    orders::status.eq(status.to_string()),
                    orders::notes.eq(Some(notes)),
                    orders::updated_at.eq(now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result::<OrderEntity>(&mut conn)?,
            None => update(orders::table)
                .filter(orders::id.eq(order_id))
                .set((
                    orders::status.eq(status.to_string()),
                    orders::updated_at.eq(now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result::<OrderEntity>(&mut conn)?,
        };

        Ok(result)
    }

    async fn mark_delivered(&self, order_id: i64, notes: Option<String>) -> Result<OrderEntity> {
        let mut conn = checkout(&self.db_pool)?;

        conn.transaction::<OrderEntity, anyhow::Error, _>(|conn| {
            let now = Utc::now();

            let order = match notes {
                Some(notes) => update(orders::table)
                    .filter(orders::id.eq(order_id))
                    .set((
                        orders::status.eq(OrderStatus::Delivered.to_string()),
                        orders::actual_delivery_date.eq(Some(now)),
                        orders::notes.eq(Some(notes)),
                        orders::updated_at.eq(now),
                    ))
                    .returning(OrderEntity::as_returning())
                    .get_result::<OrderEntity>(conn)?,
                None => update(orders::table)
                    .filter(orders::id.eq(order_id))
                    .set((
                        orders::status.eq(OrderStatus::Delivered.to_string()),
                        orders::actual_delivery_date.eq(Some(now)),
                        orders::updated_at.eq(now),
                    ))
                    .returning(OrderEntity::as_returning())
                    .get_result::<OrderEntity>(conn)?,
            };

            if let Some(subscription_id) = order.subscription_id {
                update(subscriptions::table)
                    .filter(subscriptions::id.eq(subscription_id))
                    .set((
                        subscriptions::consumed_meals.eq(subscriptions::consumed_meals + 1),
                        subscriptions::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                // Completion flip: the counter just reached the plan total
                // and the subscription is still open.
                update(subscriptions::table)
                    .filter(subscriptions::id.eq(subscription_id))
                    .filter(subscriptions::consumed_meals.ge(subscriptions::total_meals))
                    .filter(subscriptions::status.ne_all(vec![
                        SubscriptionStatus::Cancelled.to_string(),
                        SubscriptionStatus::Completed.to_string(),
                    ]))
                    .set((
                        subscriptions::status.eq(SubscriptionStatus::Completed.to_string()),
                        subscriptions::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }

            Ok(order)
        })
    }

    async fn cancel_pending_by_subscription(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<usize> {
        let mut conn = checkout(&self.db_pool)?;
        let now = Utc::now();

        let affected = match reason {
            Some(reason) => update(orders::table)
                .filter(orders::subscription_id.eq(subscription_id))
                .filter(orders::status.eq(OrderStatus::Pending.to_string()))
                .set((
                    orders::status.eq(OrderStatus::Cancelled.to_string()),
                    orders::notes.eq(Some(reason)),
                    orders::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
            None => update(orders::table)
                .filter(orders::subscription_id.eq(subscription_id))
                .filter(orders::status.eq(OrderStatus::Pending.to_string()))
                .set((
                    orders::status.eq(OrderStatus::Cancelled.to_string()),
                    orders::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
        };

        Ok(affected)
    }

    async fn status_tally(&self, subscription_id: i64) -> Result<OrderStatusTally> {
        let mut conn = checkout(&self.db_pool)?;

        let statuses = orders::table
            .filter(orders::subscription_id.eq(subscription_id))
            .select(orders::status)
            .load::<String>(&mut conn)?;

        let mut tally = OrderStatusTally::default();
        for status in &statuses {
            tally.total += 1;
            match OrderStatus::from_str(status) {
                Some(OrderStatus::Pending) => tally.pending += 1,
                Some(OrderStatus::Delivered) => tally.delivered += 1,
                Some(OrderStatus::Cancelled) | Some(OrderStatus::Refunded) => tally.cancelled += 1,
                Some(parsed) if parsed.is_in_flight() => tally.in_flight += 1,
                _ => {}
            }
        }

        Ok(tally)
    }
}
