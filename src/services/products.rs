use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    app_error::AppError,
    models::{CreateProductEntity, ProductEntity},
    schema::products,
};

pub async fn list_products(conn: &mut AsyncPgConnection) -> Result<Vec<ProductEntity>, AppError> {
    let products = products::table
        .order_by(products::id.asc())
        .select(ProductEntity::as_select())
        .load(conn)
        .await?;

    Ok(products)
}

pub async fn get_product(
    conn: &mut AsyncPgConnection,
    product_id: i32,
) -> Result<ProductEntity, AppError> {
    products::table
        .find(product_id)
        .select(ProductEntity::as_select())
        .get_result(conn)
        .await
        .optional()?
        .ok_or_else(|| product_not_found(product_id))
}

/// Inserts a catalog entry. The catalog is owned elsewhere; this is used for seeding.
pub async fn create_product(
    conn: &mut AsyncPgConnection,
    product: CreateProductEntity,
) -> Result<ProductEntity, AppError> {
    let product = diesel::insert_into(products::table)
        .values(product)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    Ok(product)
}

pub(crate) fn product_not_found(product_id: i32) -> AppError {
    AppError::NotFound(format!("Product {} not found", product_id))
}
