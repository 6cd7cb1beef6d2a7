//! Handlers for the `/products` resource.

use axum::Json;
use oiab_core::products::{Product, ProductInfo};

use crate::response::DataResponse;

/// GET /api/v1/products
///
/// List purchasable products and the job type each one creates.
pub async fn list_products() -> Json<DataResponse<Vec<ProductInfo>>> {
    let data = Product::ALL.into_iter().map(Product::info).collect();
    Json(DataResponse { data })
}
