//! JSON request/response framing for prediction requests.
//!
//! Accepted event shapes:
//!
//! - `{"prices": [milk, chocolate, soup, ramen]}`
//! - an API-gateway style wrapper `{"body": <JSON string or object>}` around it
//! - a batch, either `{"records": [{"prices": ..}, ..]}` or a top-level array
//! - any of the above encoded as a JSON string
//!
//! Responses carry a status code, CORS/content headers and a JSON-encoded body:
//! `200` on success, `400` for requests that fail validation, `500` when
//! loading models or predicting fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{ModelConfig, ModelRegistry, Product};
use crate::error::AppError;
use crate::models::predict_demand;

/// Example request prices, echoed back in validation errors.
pub const EXAMPLE_PRICES: [f64; Product::COUNT] = [3.5, 4.0, 4.5, 2.5];

/// A gateway-style response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded payload.
    pub body: String,
}

impl Response {
    fn json(status_code: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    /// Decode the body back into JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Validated prices from an event.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceRequest {
    Single(Vec<f64>),
    Batch(Vec<Vec<f64>>),
}

/// Reasons a request is rejected with `400`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("{0}")]
    Malformed(String),

    #[error("Invalid input. Expected \"prices\" array with {expected} values [{names}]")]
    WrongPriceCount { expected: usize, names: String },

    #[error("All prices must be positive numbers")]
    NonPositive,

    #[error("record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<RequestError>,
    },
}

impl RequestError {
    fn wrong_count() -> Self {
        let names: Vec<&str> = Product::ALL.iter().map(|p| p.name()).collect();
        RequestError::WrongPriceCount {
            expected: Product::COUNT,
            names: names.join(", "),
        }
    }

    fn wants_example(&self) -> bool {
        match self {
            RequestError::WrongPriceCount { .. } => true,
            RequestError::Record { source, .. } => source.wants_example(),
            _ => false,
        }
    }
}

/// Extract and validate prices from an event.
pub fn parse_request(event: &Value) -> Result<PriceRequest, RequestError> {
    let event = match event {
        Value::String(raw) => parse_json(raw)?,
        other => other.clone(),
    };

    let payload = match event.get("body").cloned() {
        None => event,
        Some(Value::String(raw)) => parse_json(&raw)?,
        Some(Value::Null) => return Err(RequestError::Malformed("Missing request body".into())),
        Some(body) => body,
    };

    match &payload {
        Value::Array(records) => parse_batch(records),
        Value::Object(map) => match map.get("records") {
            Some(Value::Array(records)) => parse_batch(records),
            Some(_) => Err(RequestError::Malformed("'records' must be an array".into())),
            None => Ok(PriceRequest::Single(extract_prices(&payload)?)),
        },
        _ => Err(RequestError::Malformed("Payload must be a JSON object or array".into())),
    }
}

fn parse_json(raw: &str) -> Result<Value, RequestError> {
    serde_json::from_str(raw).map_err(|e| RequestError::Malformed(format!("Invalid JSON: {e}")))
}

fn parse_batch(records: &[Value]) -> Result<PriceRequest, RequestError> {
    if records.is_empty() {
        return Err(RequestError::Malformed("No records provided in payload".into()));
    }
    let prices = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            extract_prices(record).map_err(|source| RequestError::Record {
                index,
                source: Box::new(source),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PriceRequest::Batch(prices))
}

fn extract_prices(record: &Value) -> Result<Vec<f64>, RequestError> {
    let Some(Value::Array(items)) = record.get("prices") else {
        return Err(RequestError::wrong_count());
    };
    if items.len() != Product::COUNT {
        return Err(RequestError::wrong_count());
    }
    let prices: Vec<f64> = items
        .iter()
        .map(Value::as_f64)
        .collect::<Option<_>>()
        .ok_or_else(|| RequestError::Malformed("Prices must be numbers".into()))?;
    if prices.iter().any(|&p| p <= 0.0) {
        return Err(RequestError::NonPositive);
    }
    Ok(prices)
}

/// Handle one event end to end.
///
/// Models are loaded only after the request validates, through `load_models`.
pub fn handle_event<F>(event: &Value, config: &ModelConfig, load_models: F) -> Response
where
    F: FnOnce() -> Result<ModelRegistry, AppError>,
{
    let request = match parse_request(event) {
        Ok(r) => r,
        Err(err) => {
            warn!(%err, "rejected request");
            let mut body = json!({ "error": err.to_string() });
            if err.wants_example() {
                body["example"] = json!({ "prices": EXAMPLE_PRICES });
            }
            return Response::json(400, &body);
        }
    };

    match respond(&request, config, load_models) {
        Ok(body) => Response::json(200, &body),
        Err(err) => {
            error!(%err, "request failed");
            Response::json(500, &json!({ "error": format!("Internal server error: {err}") }))
        }
    }
}

fn respond<F>(request: &PriceRequest, config: &ModelConfig, load_models: F) -> Result<Value, AppError>
where
    F: FnOnce() -> Result<ModelRegistry, AppError>,
{
    let registry = load_models()?;
    match request {
        PriceRequest::Single(prices) => {
            let prediction = predict_demand(prices, &registry, config)?;
            info!(?prices, "served prediction");
            Ok(json!({ "predictions": prediction, "input_prices": prices }))
        }
        PriceRequest::Batch(batch) => {
            let predictions = batch
                .iter()
                .map(|prices| predict_demand(prices, &registry, config))
                .collect::<Result<Vec<_>, _>>()?;
            info!(count = predictions.len(), "served batch prediction");
            Ok(json!({ "predictions": predictions, "count": predictions.len() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coefficients;

    fn registry() -> Result<ModelRegistry, AppError> {
        let mut models = BTreeMap::new();
        for product in Product::ALL {
            let mut coefficients = vec![0.0; Product::COUNT + 1];
            coefficients[0] = 1000f64.ln();
            coefficients[product.index() + 1] = -1.0;
            models.insert(product, Coefficients::new(coefficients));
        }
        Ok(ModelRegistry::new(Product::COUNT, models)?)
    }

    fn handle(event: Value) -> (u16, Value) {
        let response = handle_event(&event, &ModelConfig::default(), registry);
        let body = response.body_json().unwrap();
        (response.status_code, body)
    }

    #[test]
    fn direct_event_returns_predictions() {
        let (status, body) = handle(json!({ "prices": [2.0, 4.0, 5.0, 8.0] }));
        assert_eq!(status, 200);
        // demand = 1000 / own price
        assert_eq!(body["predictions"]["Milk"], json!(500.0));
        assert_eq!(body["predictions"]["Ramen"], json!(125.0));
        assert_eq!(body["input_prices"], json!([2.0, 4.0, 5.0, 8.0]));
    }

    #[test]
    fn gateway_body_string_is_unwrapped() {
        let event = json!({ "body": "{\"prices\": [2.0, 4.0, 5.0, 8.0]}" });
        let (status, body) = handle(event);
        assert_eq!(status, 200);
        assert_eq!(body["predictions"]["Chocolate"], json!(250.0));

        let (status, _) = handle(Value::String("{\"prices\": [1, 1, 1, 1]}".into()));
        assert_eq!(status, 200);
    }

    #[test]
    fn wrong_price_count_is_bad_request_with_example() {
        let (status, body) = handle(json!({ "prices": [3.5, 4.0] }));
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("Milk, Chocolate, Soup, Ramen"));
        assert_eq!(body["example"]["prices"], json!(EXAMPLE_PRICES));

        let (status, _) = handle(json!({}));
        assert_eq!(status, 400);
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        let (status, body) = handle(json!({ "prices": [3.5, 0.0, 4.5, 2.5] }));
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("All prices must be positive numbers"));
        assert!(body.get("example").is_none());
    }

    #[test]
    fn batch_requests_predict_each_record() {
        let (status, body) = handle(json!({ "records": [
            { "prices": [2.0, 4.0, 5.0, 8.0] },
            { "prices": [1.0, 1.0, 1.0, 1.0] }
        ]}));
        assert_eq!(status, 200);
        assert_eq!(body["count"], json!(2));
        assert_eq!(body["predictions"][1]["Soup"], json!(1000.0));

        let (status, body) = handle(json!([{ "prices": [1.0, 1.0, 1.0, 1.0] }, { "prices": [1.0] }]));
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().starts_with("record 1:"));
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let (status, body) = handle(json!({ "body": "{not json" }));
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[test]
    fn model_loading_failure_is_internal_error() {
        let event = json!({ "prices": [3.5, 4.0, 4.5, 2.5] });
        let response = handle_event(&event, &ModelConfig::default(), || {
            Err(AppError::new(2, "Failed to open CSV 'missing.csv'"))
        });
        assert_eq!(response.status_code, 500);
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        let body = response.body_json().unwrap();
        assert_eq!(body["error"], json!("Internal server error: Failed to open CSV 'missing.csv'"));
    }
}
