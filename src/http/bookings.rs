//! Repair booking endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::access::Principal;
use crate::error::{ApiError, ApiResult};
use crate::events::DomainEvent;

use super::{ok, page_window, AppState, PaginatedResponse, Success};

pub const BOOKING_STATUSES: [&str; 5] =
    ["pending", "confirmed", "in-progress", "completed", "cancelled"];

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookingView {
    pub id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub device_model_id: Option<Uuid>,
    pub device_model_name: Option<String>,
    pub technician_id: Option<Uuid>,
    pub technician_name: Option<String>,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub problem_description: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

const BOOKING_COLUMNS: &str = "b.id, b.booking_number, b.user_id, b.service_id, \
     s.name AS service_name, b.device_model_id, m.name AS device_model_name, \
     b.technician_id, t.name AS technician_name, b.status, b.scheduled_at, b.total_amount, \
     b.problem_description, b.address, b.city, b.state, b.pincode, b.notes, b.created_at";

const BOOKING_JOINS: &str = "FROM bookings b \
     JOIN services s ON s.id = b.service_id \
     LEFT JOIN device_models m ON m.id = b.device_model_id \
     LEFT JOIN users t ON t.id = b.technician_id";

#[derive(Debug, Serialize)]
pub struct BookingBody {
    pub booking: BookingView,
}

#[derive(Debug, Serialize)]
pub struct BookingsBody {
    pub bookings: Vec<BookingView>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub device_model_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Pincode is required"))]
    pub pincode: String,
    pub problem_description: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Success<BookingBody>>)> {
    payload.validate()?;
    let service: Option<(Decimal, Option<Decimal>)> =
        sqlx::query_as("SELECT price, discount_price FROM services WHERE id = $1")
            .bind(payload.service_id)
            .fetch_optional(&state.db)
            .await?;
    let Some((price, discount_price)) = service else {
        return Err(ApiError::NotFound("Service not found".into()));
    };
    let total_amount = discount_price.unwrap_or(price);

    let booking_id = Uuid::now_v7();
    let booking_number = format!("BKG-{:08}", rand::random::<u32>() % 100_000_000);
    sqlx::query(
        "INSERT INTO bookings (id, booking_number, user_id, service_id, device_model_id, \
         status, scheduled_at, total_amount, problem_description, address, city, state, \
         pincode, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11, $12, $13, NOW(), NOW())",
    )
    .bind(booking_id)
    .bind(&booking_number)
    .bind(principal.id)
    .bind(payload.service_id)
    .bind(payload.device_model_id)
    .bind(payload.scheduled_at)
    .bind(total_amount)
    .bind(&payload.problem_description)
    .bind(&payload.address)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.pincode)
    .bind(&payload.notes)
    .execute(&state.db)
    .await?;

    state
        .events
        .publish(&DomainEvent::BookingCreated {
            booking_id,
            booking_number: booking_number.clone(),
            user_id: principal.id,
            service_id: payload.service_id,
        })
        .await;
    tracing::info!(%booking_id, %booking_number, "booking created");

    let booking = fetch_booking(&state, booking_id).await?;
    Ok((StatusCode::CREATED, ok(BookingBody { booking })))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Success<BookingsBody>>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} {BOOKING_JOINS} WHERE b.user_id = $1 ORDER BY b.created_at DESC"
    );
    let bookings =
        sqlx::query_as::<_, BookingView>(&sql).bind(principal.id).fetch_all(&state.db).await?;
    Ok(ok(BookingsBody { bookings }))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Success<BookingBody>>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} {BOOKING_JOINS} WHERE b.id = $1 AND b.user_id = $2");
    let booking = sqlx::query_as::<_, BookingView>(&sql)
        .bind(id)
        .bind(principal.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".into()))?;
    Ok(ok(BookingBody { booking }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Customers can only move their own booking to `cancelled`. Anything
/// else is a technician or admin action.
pub async fn update_own_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Success<BookingBody>>> {
    if payload.status != "cancelled" {
        return Err(ApiError::Forbidden("You can only cancel bookings".into()));
    }

    let status: Option<(String,)> =
        sqlx::query_as("SELECT status FROM bookings WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(principal.id)
            .fetch_optional(&state.db)
            .await?;
    let Some((status,)) = status else {
        return Err(ApiError::NotFound("Booking not found".into()));
    };
    if status == "completed" || status == "cancelled" {
        return Err(ApiError::Validation(format!(
            "Cannot cancel a booking that is already {status}"
        )));
    }

    sqlx::query(
        "UPDATE bookings SET status = 'cancelled', updated_at = NOW() \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(principal.id)
    .execute(&state.db)
    .await?;

    state
        .events
        .publish(&DomainEvent::BookingStatusChanged { booking_id: id, status: "cancelled".into() })
        .await;

    let booking = fetch_booking(&state, id).await?;
    Ok(ok(BookingBody { booking }))
}

#[derive(Debug, Deserialize)]
pub struct AdminListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminBookingView {
    pub id: Uuid,
    pub booking_number: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub service_id: Uuid,
    pub service_name: String,
    pub technician_id: Option<Uuid>,
    pub technician_name: Option<String>,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> ApiResult<Json<Success<PaginatedResponse<AdminBookingView>>>> {
    let (page, limit, offset) = page_window(params.page, params.per_page);

    let filters = "($1::text IS NULL OR b.status = $1) \
         AND ($2::timestamptz IS NULL OR b.scheduled_at >= $2) \
         AND ($3::timestamptz IS NULL OR b.scheduled_at <= $3)";
    let sql = format!(
        "SELECT b.id, b.booking_number, b.user_id, u.name AS user_name, u.email AS user_email, \
         b.service_id, s.name AS service_name, b.technician_id, t.name AS technician_name, \
         b.status, b.scheduled_at, b.total_amount, b.created_at \
         FROM bookings b \
         JOIN users u ON u.id = b.user_id \
         JOIN services s ON s.id = b.service_id \
         LEFT JOIN users t ON t.id = b.technician_id \
         WHERE {filters} ORDER BY b.scheduled_at DESC LIMIT $4 OFFSET $5"
    );
    let bookings = sqlx::query_as::<_, AdminBookingView>(&sql)
        .bind(&params.status)
        .bind(params.from)
        .bind(params.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM bookings b WHERE {filters}");
    let total: (i64,) = sqlx::query_as(&count_sql)
        .bind(&params.status)
        .bind(params.from)
        .bind(params.to)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(PaginatedResponse { data: bookings, total: total.0, page }))
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateBookingRequest {
    pub status: Option<String>,
    pub technician_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateBookingRequest>,
) -> ApiResult<Json<Success<BookingBody>>> {
    if let Some(status) = &payload.status {
        if !BOOKING_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::Validation("Invalid booking status".into()));
        }
    }

    let result = sqlx::query(
        "UPDATE bookings SET status = COALESCE($2, status), \
         technician_id = COALESCE($3, technician_id), \
         scheduled_at = COALESCE($4, scheduled_at), address = COALESCE($5, address), \
         notes = COALESCE($6, notes), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.status)
    .bind(payload.technician_id)
    .bind(payload.scheduled_at)
    .bind(&payload.address)
    .bind(&payload.notes)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Booking not found".into()));
    }

    if let Some(status) = payload.status {
        state
            .events
            .publish(&DomainEvent::BookingStatusChanged { booking_id: id, status: status.clone() })
            .await;
        tracing::info!(%id, status = %status, "booking status updated");
    }

    let booking = fetch_booking(&state, id).await?;
    Ok(ok(BookingBody { booking }))
}

async fn fetch_booking(state: &AppState, id: Uuid) -> ApiResult<BookingView> {
    let sql = format!("SELECT {BOOKING_COLUMNS} {BOOKING_JOINS} WHERE b.id = $1");
    sqlx::query_as::<_, BookingView>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".into()))
}
