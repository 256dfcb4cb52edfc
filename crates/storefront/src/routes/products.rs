//! Catalog route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::{Deserialize, Deserializer, Serialize};

use kiosk_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductPage, ProductText};
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationQuery {
    /// Page number starting at 1 and a limit within `1..=MAX_LIMIT`.
    fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit)
    }
}

/// Query parameters of the detail route.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    /// Only return the description, for clients refreshing a cached product.
    #[serde(default, deserialize_with = "switch")]
    pub update: bool,
}

/// Any non-empty value except `false` and `0` turns the switch on.
fn switch<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.is_some_and(|v| {
        let v = v.trim();
        !(v.is_empty() || v.eq_ignore_ascii_case("false") || v == "0")
    }))
}

/// Detail body: the full product, or only its description.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProductDetail {
    Full(Product),
    Text(ProductText),
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    product: ProductDetail,
}

/// List active products.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    query: std::result::Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<Json<ProductPage>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (page, limit) = query.resolve();
    let offset = i64::from(page - 1) * i64::from(limit);

    let mut conn = state.pool().acquire().await?;
    let mut products = ProductRepository::new(&mut *conn);
    let items = products.list_active(i64::from(limit), offset).await?;
    let total = if page == 1 {
        Some(products.count_active().await?)
    } else {
        None
    };

    Ok(Json(ProductPage {
        products: items,
        total,
        page,
        limit,
    }))
}

/// Show an active product, or only its description with `?update=true`.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    product_id: std::result::Result<Path<i32>, PathRejection>,
    query: std::result::Result<Query<DetailQuery>, QueryRejection>,
) -> Result<Json<ProductResponse>> {
    let Path(product_id) = product_id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let product_id = ProductId::new(product_id);
    let not_found = AppError::NotFound("Produkt nicht gefunden.");

    let mut conn = state.pool().acquire().await?;
    let mut products = ProductRepository::new(&mut *conn);

    let product = if query.update {
        products
            .get_text(product_id)
            .await?
            .map(ProductDetail::Text)
    } else {
        products.get(product_id).await?.map(ProductDetail::Full)
    };

    Ok(Json(ProductResponse {
        product: product.ok_or(not_found)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(PaginationQuery::default().resolve(), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn test_pagination_clamps() {
        let query = PaginationQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(query.resolve(), (1, MAX_LIMIT));

        let query = PaginationQuery {
            page: Some(3),
            limit: Some(0),
        };
        assert_eq!(query.resolve(), (3, 1));
    }

    #[test]
    fn test_update_switch_is_lenient() {
        let cases = [
            (r#"{"update": "true"}"#, true),
            (r#"{"update": "1"}"#, true),
            (r#"{"update": "yes"}"#, true),
            (r#"{"update": ""}"#, false),
            (r#"{"update": "false"}"#, false),
            (r#"{"update": "0"}"#, false),
            ("{}", false),
        ];

        for (json, expected) in cases {
            let query: DetailQuery = serde_json::from_str(json).unwrap_or_default();
            assert_eq!(query.update, expected, "{json}");
        }
    }

    #[test]
    fn test_text_detail_keeps_product_envelope() {
        let response = ProductResponse {
            product: ProductDetail::Text(ProductText {
                id: ProductId::new(8),
                text: "Getrocknete Ananas".to_owned(),
            }),
        };

        let json = serde_json::to_value(&response).unwrap_or_default();

        assert_eq!(
            json,
            serde_json::json!({"product": {"id": 8, "text": "Getrocknete Ananas"}})
        );
    }
}
