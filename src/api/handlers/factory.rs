//! Generic CRUD handlers shared by every resource.
//!
//! Resource handlers extract their inputs and delegate here, so listing,
//! lookup and write responses have the same envelope and error behavior for
//! tours, users and reviews.

use axum::{Json, http::StatusCode};
use serde_json::Value;

use crate::api::dto::envelope::{ApiResponse, Data};
use crate::api::extractors::parse_id;
use crate::application::services::CrudService;
use crate::application::services::crud_service::to_document_value;
use crate::domain::entities::Document;
use crate::domain::query_features::{Projection, QueryFeatures};
use crate::domain::repositories::CrudRepository;
use crate::error::AppError;

pub type ListResponse = Json<ApiResponse<Data<Vec<Value>>>>;
pub type DocumentResponse = Json<ApiResponse<Data<Value>>>;

/// Builds the full feature chain for a listing request.
pub fn list_features(params: Vec<(String, String)>) -> Result<QueryFeatures, AppError> {
    Ok(QueryFeatures::new(params)
        .filter()
        .sort()
        .limit_fields()?
        .paginate())
}

fn document<D: Document>(doc: &D) -> Result<DocumentResponse, AppError> {
    let value = to_document_value(doc, &Projection::default())?;
    Ok(Json(Data::wrap(value)))
}

/// `200` with one page of documents, `results` and `total`.
pub async fn get_all<D: Document, R: CrudRepository<D>>(
    service: &CrudService<D, R>,
    features: QueryFeatures,
) -> Result<ListResponse, AppError> {
    let page = service.get_all(features).await?;
    Ok(Json(ApiResponse::list(page.items, page.total)))
}

/// `200` with the document, `400` for a malformed id, `404` if missing.
pub async fn get_one<D: Document, R: CrudRepository<D>>(
    service: &CrudService<D, R>,
    raw_id: &str,
    populate: bool,
) -> Result<DocumentResponse, AppError> {
    let id = parse_id(raw_id)?;
    let doc = service.get_one(id, populate).await?;
    document(&doc)
}

/// `201` with the created document.
pub async fn create_one<D: Document, R: CrudRepository<D>>(
    service: &CrudService<D, R>,
    new: D::Create,
) -> Result<(StatusCode, DocumentResponse), AppError> {
    let doc = service.create(new).await?;
    Ok((StatusCode::CREATED, document(&doc)?))
}

/// `200` with the updated document.
pub async fn update_one<D: Document, R: CrudRepository<D>>(
    service: &CrudService<D, R>,
    raw_id: &str,
    patch: D::Patch,
) -> Result<DocumentResponse, AppError> {
    let id = parse_id(raw_id)?;
    let doc = service.update(id, patch).await?;
    document(&doc)
}

/// `204` with an empty body.
pub async fn delete_one<D: Document, R: CrudRepository<D>>(
    service: &CrudService<D, R>,
    raw_id: &str,
) -> Result<StatusCode, AppError> {
    let id = parse_id(raw_id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
