use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    models::{CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity, ProductEntity},
    pricing,
    schema::{order_items, orders, products},
    services::products::product_not_found,
    validation::Quantity,
};

/// One requested line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i32,
    pub quantity: Quantity,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderItemDetail {
    pub product: i32,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub price: Decimal,
}

impl From<OrderItemEntity> for OrderItemDetail {
    fn from(item: OrderItemEntity) -> Self {
        Self {
            product: item.product_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct OrderDetail {
    pub id: i32,
    pub user: i32,
    pub placed_at: DateTime<Utc>,
    pub total: Decimal,
    pub items: Vec<OrderItemDetail>,
}

impl OrderDetail {
    fn new(order: OrderEntity, items: Vec<OrderItemEntity>) -> Self {
        Self {
            id: order.id,
            user: order.user_id,
            placed_at: order.placed_at,
            total: order.total,
            items: items.into_iter().map(OrderItemDetail::from).collect(),
        }
    }
}

/// Validates raw `(product_id, quantity)` pairs into order lines.
pub fn order_lines<I>(items: I) -> Result<Vec<OrderLine>, AppError>
where
    I: IntoIterator<Item = (i32, i32)>,
{
    let lines = items
        .into_iter()
        .map(|(product_id, quantity)| {
            Ok(OrderLine {
                product_id,
                quantity: Quantity::new(quantity)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }

    Ok(lines)
}

/// Places an order for `lines`, snapshotting prices and decrementing stock.
///
/// Everything runs in one transaction: an unknown product anywhere in the
/// list, or a total too large to store, leaves no order behind and no stock
/// touched. Stock is clamped at zero rather than checked for sufficiency.
pub async fn place_order(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    lines: Vec<OrderLine>,
) -> Result<OrderDetail, AppError> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }

    let (order, items) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order: OrderEntity = diesel::insert_into(orders::table)
                    .values(CreateOrderEntity {
                        user_id,
                        total: Decimal::ZERO,
                    })
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let mut total = Decimal::ZERO;
                let mut items = Vec::with_capacity(lines.len());

                for line in lines {
                    let product: ProductEntity = products::table
                        .find(line.product_id)
                        .select(ProductEntity::as_select())
                        .for_update()
                        .get_result(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| product_not_found(line.product_id))?;

                    let item: OrderItemEntity = diesel::insert_into(order_items::table)
                        .values(CreateOrderItemEntity {
                            order_id: order.id,
                            product_id: product.id,
                            quantity: line.quantity.get(),
                            price: product.price,
                        })
                        .returning(OrderItemEntity::as_returning())
                        .get_result(conn)
                        .await?;

                    total = pricing::add_line(total, item.price, item.quantity)
                        .ok_or_else(order_total_too_large)?;

                    diesel::update(products::table.find(product.id))
                        .set(
                            products::stock
                                .eq(pricing::decrement_stock(product.stock, item.quantity)),
                        )
                        .execute(conn)
                        .await?;

                    items.push(item);
                }

                let order: OrderEntity = diesel::update(orders::table.find(order.id))
                    .set(orders::total.eq(total))
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                Ok::<(OrderEntity, Vec<OrderItemEntity>), AppError>((order, items))
            })
        })
        .await?;

    info!(
        "Order #{} has been placed by user {} ({} items, total {})",
        order.id,
        order.user_id,
        items.len(),
        order.total
    );

    Ok(OrderDetail::new(order, items))
}

fn order_total_too_large() -> AppError {
    AppError::BadRequest("order total exceeds the maximum allowed".into())
}

/// Lists the user's orders, most recent first, with their items.
pub async fn list_orders(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<Vec<OrderDetail>, AppError> {
    let orders: Vec<OrderEntity> = orders::table
        .filter(orders::user_id.eq(user_id))
        .order_by((orders::placed_at.desc(), orders::id.desc()))
        .select(OrderEntity::as_select())
        .load(conn)
        .await?;

    let order_ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by(order_items::id.asc())
        .select(OrderItemEntity::as_select())
        .load(conn)
        .await?;

    let mut group: HashMap<i32, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        group.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = group.remove(&order.id).unwrap_or_default();
            OrderDetail::new(order, items)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn order_lines_keep_input_order() {
        let lines = order_lines(vec![(3, 1), (1, 4), (3, 2)]).unwrap();
        let ids: Vec<i32> = lines.iter().map(|line| line.product_id).collect();
        assert_eq!(ids, vec![3, 1, 3]);
        assert_eq!(lines[1].quantity.get(), 4);
    }

    #[test]
    fn order_lines_reject_empty_list() {
        match order_lines(Vec::new()) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "items must not be empty"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn order_lines_reject_non_positive_quantity() {
        assert!(matches!(
            order_lines(vec![(1, 2), (2, 0)]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn order_detail_keeps_snapshot_prices() {
        let order = OrderEntity {
            id: 9,
            user_id: 4,
            placed_at: Utc::now(),
            total: Decimal::from_str("40.00").unwrap(),
        };
        let items = vec![OrderItemEntity {
            id: 1,
            order_id: 9,
            product_id: 2,
            quantity: 4,
            price: Decimal::from_str("10.00").unwrap(),
        }];

        let detail = OrderDetail::new(order, items);
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["user"], 4);
        assert_eq!(json["total"], "40.00");
        assert_eq!(json["items"][0]["product"], 2);
        assert_eq!(json["items"][0]["price"], "10.00");
        assert_eq!(json["items"][0]["quantity"], 4);
    }
}
