//! In-memory stand-in for the marketplace resource server.
//!
//! Serves the same REST surface as production (`/api/crops`, `/api/interests`,
//! `/api/users`) with the same envelopes: `{"success": true, "data": ...}` on
//! success and `{"success": false, "message": ...}` on failure. Every route
//! requires a bearer token; crop mutations are scoped by the `user-email`
//! header.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const CROP_TYPES: [&str; 8] = [
    "Vegetable", "Fruit", "Grain", "Spice", "Pulse", "Oilseed", "Fiber", "Other",
];

/// How many crops `/api/crops/latest` returns.
pub const LATEST_LIMIT: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub owner_email: String,
    pub owner_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: String,
    pub price_per_unit: f64,
    pub unit: String,
    pub quantity: f64,
    pub description: String,
    pub location: String,
    pub image: String,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropInput {
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: Option<String>,
    pub price_per_unit: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub quantity: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

fn default_unit() -> String {
    "kg".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: String,
    pub location: String,
    pub unit: String,
    pub price_per_unit: f64,
    pub image: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub crop_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub quantity: u32,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_details: Option<CropDetails>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterest {
    pub crop_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub interest_id: Uuid,
    pub crop_id: Uuid,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "farmer".to_string()
}

#[derive(Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct EmailParams {
    pub email: Option<String>,
}

/// Crops and interests are kept in creation order.
#[derive(Default)]
pub struct Store {
    crops: Vec<Crop>,
    interests: Vec<Interest>,
    users: Vec<User>,
}

pub type Db = Arc<RwLock<Store>>;

/// Success envelope.
#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// Error response carrying a user-facing message.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "success": false, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

type Reply<T> = Result<Json<Envelope<T>>, Failure>;

/// `Json` body whose rejection is reported as a 400 failure envelope.
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Failure::bad_request(e.body_text()))?;
        Ok(Body(value))
    }
}

/// `Path` parameter whose rejection is reported as a 400 failure envelope.
pub struct Param<T>(pub T);

impl<S, T> FromRequestParts<S> for Param<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| Failure::bad_request(e.body_text()))?;
        Ok(Param(value))
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/crops", get(list_crops).post(create_crop))
        .route("/api/crops/latest", get(latest_crops))
        .route(
            "/api/crops/{id}",
            get(get_crop).put(update_crop).delete(delete_crop),
        )
        .route("/api/interests", post(add_interest))
        .route("/api/interests/sent", get(sent_interests))
        .route("/api/interests/received", get(received_interests))
        .route("/api/interests/status", put(update_interest_status))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{email}", get(get_user).put(update_user))
        .layer(middleware::from_fn(require_bearer))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_bearer(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !token.trim().is_empty());
    if !authorized {
        return Failure::new(StatusCode::UNAUTHORIZED, "Unauthorized access").into_response();
    }
    next.run(request).await
}

fn actor(headers: &HeaderMap) -> Result<String, Failure> {
    headers
        .get("user-email")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "User email is required"))
}

fn check_crop(input: &CropInput) -> Result<String, Failure> {
    if input.name.trim().is_empty() {
        return Err(Failure::bad_request("Crop name is required"));
    }
    let crop_type = input
        .crop_type
        .clone()
        .filter(|t| CROP_TYPES.contains(&t.as_str()))
        .ok_or_else(|| Failure::bad_request("Valid crop type is required"))?;
    if input.price_per_unit.is_nan() || input.price_per_unit <= 0.0 {
        return Err(Failure::bad_request("Valid price is required"));
    }
    if input.quantity.is_nan() || input.quantity <= 0.0 {
        return Err(Failure::bad_request("Valid quantity is required"));
    }
    Ok(crop_type)
}

fn matches_search(crop: &Crop, term: &str) -> bool {
    let term = term.to_lowercase();
    [&crop.name, &crop.crop_type, &crop.location, &crop.description]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

fn details(crop: &Crop) -> CropDetails {
    CropDetails {
        name: crop.name.clone(),
        crop_type: crop.crop_type.clone(),
        location: crop.location.clone(),
        unit: crop.unit.clone(),
        price_per_unit: crop.price_per_unit,
        image: crop.image.clone(),
    }
}

// --- crops ---------------------------------------------------------------

async fn list_crops(State(db): State<Db>, Query(params): Query<SearchParams>) -> Json<Envelope<Vec<Crop>>> {
    let store = db.read().await;
    let term = params.search.unwrap_or_default();
    let crops = store
        .crops
        .iter()
        .rev()
        .filter(|c| term.trim().is_empty() || matches_search(c, &term))
        .cloned()
        .collect();
    ok(crops)
}

async fn latest_crops(State(db): State<Db>) -> Json<Envelope<Vec<Crop>>> {
    let store = db.read().await;
    ok(store.crops.iter().rev().take(LATEST_LIMIT).cloned().collect())
}

async fn get_crop(State(db): State<Db>, Param(id): Param<Uuid>) -> Reply<Crop> {
    let store = db.read().await;
    store
        .crops
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(ok)
        .ok_or_else(|| Failure::not_found("Crop not found"))
}

async fn create_crop(
    State(db): State<Db>,
    headers: HeaderMap,
    Body(input): Body<CropInput>,
) -> Result<(StatusCode, Json<Envelope<Crop>>), Failure> {
    let email = actor(&headers)?;
    let crop_type = check_crop(&input)?;
    let owner_name = input
        .owner
        .as_ref()
        .map(|o| o.owner_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let crop = Crop {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        crop_type,
        price_per_unit: input.price_per_unit,
        unit: input.unit,
        quantity: input.quantity,
        description: input.description,
        location: input.location,
        image: input.image.unwrap_or_default(),
        owner: Owner {
            owner_email: email,
            owner_name,
        },
        created_at: Utc::now(),
    };
    tracing::info!(id = %crop.id, owner = %crop.owner.owner_email, "crop created");
    db.write().await.crops.push(crop.clone());
    Ok(created(crop))
}

async fn update_crop(
    State(db): State<Db>,
    Param(id): Param<Uuid>,
    headers: HeaderMap,
    Body(input): Body<CropInput>,
) -> Reply<Crop> {
    let email = actor(&headers)?;
    let crop_type = check_crop(&input)?;
    let mut store = db.write().await;
    let crop = store
        .crops
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| Failure::not_found("Crop not found"))?;
    if crop.owner.owner_email != email {
        return Err(Failure::new(
            StatusCode::FORBIDDEN,
            "You can only edit your own crops",
        ));
    }
    crop.name = input.name.trim().to_string();
    crop.crop_type = crop_type;
    crop.price_per_unit = input.price_per_unit;
    crop.unit = input.unit;
    crop.quantity = input.quantity;
    crop.description = input.description;
    crop.location = input.location;
    crop.image = input.image.unwrap_or_default();
    Ok(ok(crop.clone()))
}

async fn delete_crop(
    State(db): State<Db>,
    Param(id): Param<Uuid>,
    headers: HeaderMap,
) -> Reply<Uuid> {
    let email = actor(&headers)?;
    let mut store = db.write().await;
    let pos = store
        .crops
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| Failure::not_found("Crop not found"))?;
    if store.crops[pos].owner.owner_email != email {
        return Err(Failure::new(
            StatusCode::FORBIDDEN,
            "You can only delete your own crops",
        ));
    }
    store.crops.remove(pos);
    store.interests.retain(|i| i.crop_id != id);
    tracing::info!(%id, "crop deleted");
    Ok(ok(id))
}

// --- interests -----------------------------------------------------------

async fn add_interest(
    State(db): State<Db>,
    Body(input): Body<NewInterest>,
) -> Result<(StatusCode, Json<Envelope<Interest>>), Failure> {
    if input.quantity == 0 {
        return Err(Failure::bad_request("Valid quantity is required"));
    }
    let mut store = db.write().await;
    let crop = store
        .crops
        .iter()
        .find(|c| c.id == input.crop_id)
        .ok_or_else(|| Failure::not_found("Crop not found"))?;
    if crop.owner.owner_email == input.user_email {
        return Err(Failure::bad_request(
            "You cannot send interest on your own crop",
        ));
    }
    let duplicate = store
        .interests
        .iter()
        .any(|i| i.crop_id == input.crop_id && i.user_email == input.user_email);
    if duplicate {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "You have already sent an interest for this crop",
        ));
    }
    let interest = Interest {
        id: Uuid::new_v4(),
        crop_id: input.crop_id,
        user_email: input.user_email,
        user_name: input.user_name,
        quantity: input.quantity,
        message: input.message,
        status: "pending".to_string(),
        created_at: Utc::now(),
        crop_details: None,
    };
    store.interests.push(interest.clone());
    Ok(created(interest))
}

fn required_email(params: EmailParams) -> Result<String, Failure> {
    params
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| Failure::bad_request("Email is required"))
}

async fn sent_interests(
    State(db): State<Db>,
    Query(params): Query<EmailParams>,
) -> Reply<Vec<Interest>> {
    let email = required_email(params)?;
    let store = db.read().await;
    let sent = store
        .interests
        .iter()
        .filter(|i| i.user_email == email)
        .map(|i| {
            let mut interest = i.clone();
            interest.crop_details = store
                .crops
                .iter()
                .find(|c| c.id == i.crop_id)
                .map(details);
            interest
        })
        .collect();
    Ok(ok(sent))
}

async fn received_interests(
    State(db): State<Db>,
    Query(params): Query<EmailParams>,
) -> Reply<Vec<Interest>> {
    let email = required_email(params)?;
    let store = db.read().await;
    let received = store
        .interests
        .iter()
        .filter(|i| {
            store
                .crops
                .iter()
                .any(|c| c.id == i.crop_id && c.owner.owner_email == email)
        })
        .cloned()
        .collect();
    Ok(ok(received))
}

async fn update_interest_status(
    State(db): State<Db>,
    Body(update): Body<StatusUpdate>,
) -> Reply<Interest> {
    if update.status != "accepted" && update.status != "rejected" {
        return Err(Failure::bad_request("Status must be accepted or rejected"));
    }
    let mut store = db.write().await;
    let Store {
        crops, interests, ..
    } = &mut *store;
    let interest = interests
        .iter_mut()
        .find(|i| i.id == update.interest_id && i.crop_id == update.crop_id)
        .ok_or_else(|| Failure::not_found("Interest not found"))?;
    if interest.status != "pending" {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            format!("Interest has already been {}", interest.status),
        ));
    }
    if update.status == "accepted" {
        let crop = crops
            .iter_mut()
            .find(|c| c.id == update.crop_id)
            .ok_or_else(|| Failure::not_found("Crop not found"))?;
        let wanted = f64::from(interest.quantity);
        if crop.quantity < wanted {
            return Err(Failure::bad_request("Insufficient quantity available"));
        }
        crop.quantity -= wanted;
    }
    interest.status = update.status;
    tracing::info!(id = %interest.id, status = %interest.status, "interest resolved");
    Ok(ok(interest.clone()))
}

// --- users ---------------------------------------------------------------

async fn list_users(State(db): State<Db>) -> Json<Envelope<Vec<User>>> {
    ok(db.read().await.users.clone())
}

async fn create_user(
    State(db): State<Db>,
    Body(user): Body<User>,
) -> Result<(StatusCode, Json<Envelope<User>>), Failure> {
    if user.email.trim().is_empty() {
        return Err(Failure::bad_request("Email is required"));
    }
    let mut store = db.write().await;
    if store.users.iter().any(|u| u.email == user.email) {
        return Err(Failure::new(StatusCode::CONFLICT, "User already exists"));
    }
    store.users.push(user.clone());
    Ok(created(user))
}

async fn get_user(State(db): State<Db>, Param(email): Param<String>) -> Reply<User> {
    let store = db.read().await;
    store
        .users
        .iter()
        .find(|u| u.email == email)
        .cloned()
        .map(ok)
        .ok_or_else(|| Failure::not_found("User not found"))
}

async fn update_user(
    State(db): State<Db>,
    Param(email): Param<String>,
    Body(update): Body<UserUpdate>,
) -> Reply<User> {
    let mut store = db.write().await;
    let user = store
        .users
        .iter_mut()
        .find(|u| u.email == email)
        .ok_or_else(|| Failure::not_found("User not found"))?;
    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(photo_url) = update.photo_url {
        user.photo_url = photo_url;
    }
    if let Some(phone) = update.phone {
        user.phone = phone;
    }
    if let Some(address) = update.address {
        user.address = address;
    }
    if let Some(bio) = update.bio {
        user.bio = bio;
    }
    if let Some(role) = update.role {
        user.role = role;
    }
    Ok(ok(user.clone()))
}
