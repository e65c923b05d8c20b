//! Response envelopes: `{ data }`, `{ data, message }`, `{ message }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub const CREATED_MESSAGE: &str = "Record created successfully";
pub const UPDATED_MESSAGE: &str = "Record updated successfully";
pub const DELETED_MESSAGE: &str = "Record deleted successfully";

#[derive(Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct DataWithMessage<T> {
    pub data: T,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<Data<T>>) {
    (StatusCode::OK, Json(Data { data }))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<DataWithMessage<T>>) {
    (
        StatusCode::CREATED,
        Json(DataWithMessage {
            data,
            message: CREATED_MESSAGE,
        }),
    )
}

pub fn success_updated<T: Serialize>(data: T) -> (StatusCode, Json<DataWithMessage<T>>) {
    (
        StatusCode::OK,
        Json(DataWithMessage {
            data,
            message: UPDATED_MESSAGE,
        }),
    )
}

pub fn success_deleted() -> (StatusCode, Json<Message>) {
    (
        StatusCode::OK,
        Json(Message {
            message: DELETED_MESSAGE,
        }),
    )
}
