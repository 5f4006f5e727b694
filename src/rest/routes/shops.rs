// rest/routes/shops.rs — Shop registry routes.
//
// Owners see and register their own shops; admins review every shop and are
// the only role allowed to change tax status or delete.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    registry::{NewShop, TaxStatus},
    rest::auth::{authenticate, internal, not_found, require_admin, AuthError},
    AppContext,
};

pub async fn list_shops(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    let user = authenticate(&ctx, &headers).await?;
    let shops = if user.is_admin() {
        ctx.registry.list_shops().await
    } else {
        ctx.registry.list_shops_for(&user.id).await
    }
    .map_err(internal)?;
    Ok(Json(json!({ "shops": shops })))
}

pub async fn create_shop(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<NewShop>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    let user = authenticate(&ctx, &headers).await?;

    if body.shop_name.trim().is_empty() || body.address.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "shop_name and address are required" })),
        ));
    }

    let shop = ctx
        .registry
        .create_shop(&user.id, &body)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(json!(shop))))
}

pub async fn get_shop(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    let user = authenticate(&ctx, &headers).await?;
    let shop = ctx
        .registry
        .get_shop(&id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("shop not found"))?;

    if !user.is_admin() && shop.user_id != user.id {
        return Err(crate::rest::auth::forbidden("not your shop"));
    }
    Ok(Json(json!(shop)))
}

#[derive(Deserialize)]
pub struct SetTaxStatusRequest {
    pub status: TaxStatus,
}

pub async fn set_tax_status(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SetTaxStatusRequest>,
) -> Result<Json<Value>, AuthError> {
    let user = authenticate(&ctx, &headers).await?;
    require_admin(&user)?;

    let updated = ctx
        .registry
        .set_tax_status(&id, body.status)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(not_found("shop not found"));
    }

    let shop = ctx
        .registry
        .get_shop(&id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("shop not found"))?;
    Ok(Json(json!(shop)))
}

pub async fn delete_shop(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    let user = authenticate(&ctx, &headers).await?;
    require_admin(&user)?;

    let deleted = ctx.registry.delete_shop(&id).await.map_err(internal)?;
    if !deleted {
        return Err(not_found("shop not found"));
    }
    Ok(Json(json!({ "deleted": true })))
}
