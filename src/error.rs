use std::{
    env::VarError, io::Error as IO_ERROR, num::ParseIntError,
    str::ParseBoolError as PARSE_BOOL_ERROR,
};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use alloy::{
    contract::Error as CONTRACT_ERROR,
    hex::FromHexError as HEX_ERROR,
    providers::PendingTransactionError as PENDING_TX_ERROR,
    signers::local::LocalSignerError as SIGNER_ERROR,
    transports::TransportError as TRANSPORT_ERROR,
};
use anyhow::Error as ANYHOW_ERROR;
use base64::DecodeError as BASE64_DECODE_ERROR;
use bigdecimal::ParseBigDecimalError as BIG_DECIMAL_ERROR;
use reqwest::Error as REQWEST_ERROR;
use serde_json::Error as JSON_ERROR;
use thiserror::Error;
use tokio::{task::JoinError, time::error::Elapsed};
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    VAR(#[from] VarError),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    TokioElapsedError(#[from] Elapsed),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("{0}")]
    Base64DecodeError(#[from] BASE64_DECODE_ERROR),

    #[error("{0}")]
    BigDecimalError(#[from] BIG_DECIMAL_ERROR),

    #[error("{0}")]
    JsonError(#[from] JSON_ERROR),

    #[error("{0}")]
    ReqwestError(#[from] REQWEST_ERROR),

    #[error("{0}")]
    HexError(#[from] HEX_ERROR),

    #[error("{0}")]
    TransportError(#[from] TRANSPORT_ERROR),

    #[error("{0}")]
    ContractError(#[from] CONTRACT_ERROR),

    #[error("{0}")]
    PendingTransactionError(#[from] PENDING_TX_ERROR),

    #[error("{0}")]
    SignerError(#[from] SIGNER_ERROR),

    #[error("{0}")]
    AnyHowError(#[from] ANYHOW_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Field not exists: {0}")]
    FieldNotExist(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Server end with error: {0}")]
    ServerError(String),

    #[error("Task message error: {0}")]
    TaskError(String),

    #[error("Loan {0} not found")]
    LoanNotFound(u64),

    #[error("Loan {0} has a transaction in flight")]
    LoanBusy(u64),

    #[error("{0}")]
    LoanState(String),

    #[error("{0}")]
    NotBorrower(String),

    #[error("{0}")]
    Validation(String),

    #[error("Karma too low for loan approval")]
    KarmaTooLow,

    #[error("Address {0} is already registered as {1}")]
    RoleAlreadyRegistered(String, String),

    #[error("Address {0} must be registered as {1}")]
    RoleRequired(String, String),

    #[error("Transaction was cancelled by signer")]
    TransactionCancelled,

    #[error("Insufficient funds for amount plus gas fees")]
    InsufficientFunds,

    #[error("Smart contract error: {0}")]
    ContractRevert(String),

    #[error("Scoring service unavailable: {0}")]
    ScoringUnavailable(String),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - client sent invalid input
            Error::FieldNotExist(_)
            | Error::Validation(_)
            | Error::KarmaTooLow
            | Error::ParseBoolError(_)
            | Error::INT(_)
            | Error::HexError(_)
            | Error::BigDecimalError(_)
            | Error::Base64DecodeError(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found - requested resource does not exist
            Error::LoanNotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict - current state forbids the transition
            Error::LoanBusy(_)
            | Error::LoanState(_)
            | Error::NotBorrower(_)
            | Error::RoleAlreadyRegistered(_, _)
            | Error::RoleRequired(_, _) => StatusCode::CONFLICT,

            // 402 Payment Required - signer cannot cover the call
            Error::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,

            // 422 - the contract itself rejected the call
            Error::ContractRevert(_) | Error::TransactionCancelled => {
                StatusCode::UNPROCESSABLE_ENTITY
            },

            // 502 Bad Gateway - upstream service error
            Error::ReqwestError(_)
            | Error::TransportError(_)
            | Error::ScoringUnavailable(_) => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout - upstream timed out
            Error::TokioElapsedError(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error - everything else
            Error::Io(_)
            | Error::URL(_)
            | Error::VAR(_)
            | Error::TokioJoinError(_)
            | Error::JsonError(_)
            | Error::ContractError(_)
            | Error::PendingTransactionError(_)
            | Error::SignerError(_)
            | Error::AnyHowError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::ConfigurationError(_)
            | Error::ServerError(_)
            | Error::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Unknown"),
            "message": self.to_string(),
            "status": status.as_u16(),
        });
        HttpResponse::build(status).json(body)
    }
}
