//! HTTP handlers
//!
//! Each handler parses its inputs into domain types, calls the ledger service
//! or a directory, and shapes the result. Business rules live in the service.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use super::dto::{
    amount_from, parse_id, required, BalanceResponse, DepositRequest, DepositResponse,
    HistoryQuery, PayeeResponse, RegisterPayeeRequest, RegisterUserRequest, TransactionView,
    TransferRequest, TransferResponse, UpdateUserRequest, UserRegisteredResponse, UserResponse,
    WithdrawRequest, WithdrawResponse,
};
use super::AppState;
use crate::io::write_history_csv;
use crate::types::{AccountId, HistoryFilter, LedgerError, Payee, PayeeStatus, User};

type ApiResult<T> = Result<T, LedgerError>;

/// Unwrap a JSON body, turning axum's rejection into `InvalidRequest`
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| LedgerError::invalid_request(rejection.body_text()))
}

fn history_filter(query: &HistoryQuery) -> ApiResult<HistoryFilter> {
    HistoryFilter::parse(
        query.kind.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )
}

pub async fn deposit(
    State(state): State<AppState>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> ApiResult<Json<DepositResponse>> {
    let request = body(payload)?;
    let account = parse_id("userId", required("userId", &request.user_id)?)?;
    let amount = amount_from(&request.amount)?;

    let balance = state.service.deposit(account, amount).await?;

    Ok(Json(DepositResponse {
        success: true,
        message: "Deposit successful".to_string(),
        balance,
    }))
}

pub async fn withdraw(
    State(state): State<AppState>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> ApiResult<Json<WithdrawResponse>> {
    let request = body(payload)?;
    let account = parse_id("userId", required("userId", &request.user_id)?)?;
    let amount = amount_from(&request.amount)?;

    let receipt = state
        .service
        .withdraw(account, amount, request.reason)
        .await?;

    Ok(Json(WithdrawResponse {
        message: "Withdrawal successful".to_string(),
        transaction: receipt.transaction.into(),
        balance: receipt.balance,
    }))
}

pub async fn transfer(
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<Json<TransferResponse>> {
    let request = body(payload)?;
    let sender = parse_id("userId", required("userId", &request.user_id)?)?;
    let payee = parse_id("payeeId", required("payeeId", &request.payee_id)?)?;
    let amount = amount_from(&request.amount)?;

    let receipt = state.service.transfer(sender, payee, amount).await?;

    Ok(Json(TransferResponse {
        success: true,
        message: "Transfer successful".to_string(),
        amount: receipt.amount,
        balance: receipt.balance,
        transaction_id: receipt.transaction_id,
    }))
}

pub async fn balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let account: AccountId = parse_id("userId", &user_id)?;
    let balance = state.service.balance(account).await?;

    Ok((
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        Json(BalanceResponse { balance }),
    ))
}

pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    let account: AccountId = parse_id("userId", &user_id)?;
    let filter = history_filter(&query)?;

    let entries = state.service.history(account, &filter).await?;
    Ok(Json(entries.into_iter().map(TransactionView::from).collect()))
}

pub async fn export(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let account: AccountId = parse_id("userId", &user_id)?;
    let filter = history_filter(&query)?;

    let entries = state.service.history(account, &filter).await?;
    let mut csv = Vec::new();
    write_history_csv(&entries, &mut csv)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    ))
}

pub async fn all_transactions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    let entries = state.service.all_transactions().await?;
    Ok(Json(entries.into_iter().map(TransactionView::from).collect()))
}

pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let new = body(payload)?.into_new_user()?;
    let user = state.service.users().register(new)?;

    Ok((
        StatusCode::CREATED,
        Json(UserRegisteredResponse {
            msg: "User registered successfully".to_string(),
            user,
        }),
    ))
}

pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.service.users().all())
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id: AccountId = parse_id("id", &id)?;
    state
        .service
        .users()
        .find_by_id(id)
        .map(Json)
        .ok_or_else(|| LedgerError::not_found("User", id))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let id: AccountId = parse_id("id", &id)?;
    let update = body(payload)?.into();
    let user = state.service.users().update(id, update)?;

    info!(user = %id, "user updated");
    Ok(Json(UserResponse { user }))
}

pub async fn register_payee(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayeeRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let new = body(payload)?.into_new_payee()?;
    let payee = state.service.register_payee(new)?;

    Ok((
        StatusCode::CREATED,
        Json(PayeeResponse {
            message: "Payee added, pending admin approval".to_string(),
            payee,
        }),
    ))
}

pub async fn payees_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Payee>>> {
    let owner: AccountId = parse_id("userId", &user_id)?;
    Ok(Json(state.service.payees().owned_by(owner)))
}

pub async fn pending_payees(State(state): State<AppState>) -> Json<Vec<Payee>> {
    Json(state.service.payees().with_status(PayeeStatus::Pending))
}

async fn set_payee_status(
    state: &AppState,
    raw_id: &str,
    status: PayeeStatus,
) -> ApiResult<Json<PayeeResponse>> {
    let id = parse_id("payeeId", raw_id)?;
    let payee = state.service.payees().set_status(id, status)?;

    Ok(Json(PayeeResponse {
        message: format!("Payee {}", status),
        payee,
    }))
}

pub async fn approve_payee(
    State(state): State<AppState>,
    Path(payee_id): Path<String>,
) -> ApiResult<Json<PayeeResponse>> {
    set_payee_status(&state, &payee_id, PayeeStatus::Approved).await
}

pub async fn reject_payee(
    State(state): State<AppState>,
    Path(payee_id): Path<String>,
) -> ApiResult<Json<PayeeResponse>> {
    set_payee_status(&state, &payee_id, PayeeStatus::Rejected).await
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.stats().await?))
}
