use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    models::{CartEntity, CartItemEntity, CreateCartEntity, CreateCartItemEntity, ProductEntity},
    pricing,
    schema::{cart_items, carts, products},
    services::products::get_product,
    validation::Quantity,
};

/// A cart line joined with the product it refers to.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CartItemDetail {
    pub id: i32,
    pub product: i32,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl CartItemDetail {
    fn new(item: CartItemEntity, product: ProductEntity) -> Self {
        Self {
            id: item.id,
            product: item.product_id,
            product_name: product.name,
            price: product.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CartDetail {
    pub id: i32,
    pub user: i32,
    pub items: Vec<CartItemDetail>,
    pub total_price: Decimal,
}

/// Returns the user's cart, creating an empty one on first access.
///
/// Relies on the unique constraint on `carts.user_id`, so concurrent first
/// accesses still end up with a single cart.
pub async fn get_or_create_cart(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<CartEntity, AppError> {
    let inserted = diesel::insert_into(carts::table)
        .values(CreateCartEntity { user_id })
        .on_conflict(carts::user_id)
        .do_nothing()
        .execute(conn)
        .await?;

    if inserted > 0 {
        info!("Created cart for user {}", user_id);
    }

    let cart = carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(cart)
}

/// Returns the user's cart without creating one.
pub async fn find_cart(conn: &mut AsyncPgConnection, user_id: i32) -> Result<CartEntity, AppError> {
    carts::table
        .filter(carts::user_id.eq(user_id))
        .select(CartEntity::as_select())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("Cart not found".into()))
}

/// Loads the cart with its items and total price.
pub async fn get_cart(conn: &mut AsyncPgConnection, user_id: i32) -> Result<CartDetail, AppError> {
    let cart = get_or_create_cart(conn, user_id).await?;
    let items = cart_items(conn, cart.id).await?;
    let total_price = get_total_price(&items);

    Ok(CartDetail {
        id: cart.id,
        user: cart.user_id,
        items,
        total_price,
    })
}

pub async fn cart_items(
    conn: &mut AsyncPgConnection,
    cart_id: i32,
) -> Result<Vec<CartItemDetail>, AppError> {
    let rows: Vec<(CartItemEntity, ProductEntity)> = cart_items::table
        .inner_join(products::table)
        .filter(cart_items::cart_id.eq(cart_id))
        .order_by(cart_items::id.asc())
        .select((CartItemEntity::as_select(), ProductEntity::as_select()))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| CartItemDetail::new(item, product))
        .collect())
}

/// Adds `quantity` units of a product to the user's cart.
///
/// A new line starts at `quantity`; an existing line is increased by it. The
/// cart row is locked for the duration so concurrent adds cannot lose updates.
pub async fn add_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    product_id: i32,
    quantity: Quantity,
) -> Result<CartItemDetail, AppError> {
    let (cart_id, item, product) = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let product = get_product(conn, product_id).await?;
                let cart = get_or_create_cart(conn, user_id).await?;

                carts::table
                    .find(cart.id)
                    .select(carts::id)
                    .for_update()
                    .get_result::<i32>(conn)
                    .await?;

                let existing: Option<CartItemEntity> = cart_items::table
                    .filter(cart_items::cart_id.eq(cart.id))
                    .filter(cart_items::product_id.eq(product.id))
                    .select(CartItemEntity::as_select())
                    .for_update()
                    .get_result(conn)
                    .await
                    .optional()?;

                let item: CartItemEntity = match existing {
                    Some(existing) => {
                        let merged = merge_quantity(existing.quantity, quantity)?;
                        diesel::update(cart_items::table.find(existing.id))
                            .set(cart_items::quantity.eq(merged))
                            .returning(CartItemEntity::as_returning())
                            .get_result(conn)
                            .await?
                    }
                    None => {
                        diesel::insert_into(cart_items::table)
                            .values(CreateCartItemEntity {
                                cart_id: cart.id,
                                product_id: product.id,
                                quantity: quantity.get(),
                            })
                            .returning(CartItemEntity::as_returning())
                            .get_result(conn)
                            .await?
                    }
                };

                Ok::<(i32, CartItemEntity, ProductEntity), AppError>((cart.id, item, product))
            })
        })
        .await?;

    info!(
        "Cart #{} now holds {} x product #{}",
        cart_id, item.quantity, product.id
    );

    Ok(CartItemDetail::new(item, product))
}

/// Quantity of an existing line after adding `added` units.
pub fn merge_quantity(current: i32, added: Quantity) -> Result<i32, AppError> {
    current
        .checked_add(added.get())
        .ok_or_else(|| AppError::BadRequest("quantity exceeds the maximum allowed".into()))
}

/// Sets the quantity of an existing cart line.
pub async fn update_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    product_id: i32,
    quantity: Quantity,
) -> Result<CartItemDetail, AppError> {
    let cart = find_cart(conn, user_id).await?;

    let item: CartItemEntity = diesel::update(
        cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .filter(cart_items::product_id.eq(product_id)),
    )
    .set(cart_items::quantity.eq(quantity.get()))
    .returning(CartItemEntity::as_returning())
    .get_result(conn)
    .await
    .optional()?
    .ok_or_else(cart_item_not_found)?;

    let product = get_product(conn, item.product_id).await?;

    info!(
        "Cart #{} quantity of product #{} set to {}",
        cart.id, product.id, item.quantity
    );

    Ok(CartItemDetail::new(item, product))
}

pub async fn remove_item(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    product_id: i32,
) -> Result<(), AppError> {
    let cart = find_cart(conn, user_id).await?;

    let deleted = diesel::delete(
        cart_items::table
            .filter(cart_items::cart_id.eq(cart.id))
            .filter(cart_items::product_id.eq(product_id)),
    )
    .execute(conn)
    .await?;

    if deleted == 0 {
        return Err(cart_item_not_found());
    }

    info!("Removed product #{} from cart #{}", product_id, cart.id);
    Ok(())
}

/// Current value of the cart at live catalog prices.
pub fn get_total_price(items: &[CartItemDetail]) -> Decimal {
    pricing::total(items.iter().map(|item| (item.price, item.quantity)))
}

fn cart_item_not_found() -> AppError {
    AppError::NotFound("Cart item not found".into())
}
