//! Incremental-delivery merging.
//!
//! Each multipart batch is folded into an accumulating result tree. Payloads
//! carrying a `path` are lifted into a nested structure first (string keys
//! build objects, numeric indices build arrays), then deep-merged into the
//! combined data: objects merge key-by-key, arrays merge index-wise, and
//! scalars are overwritten. The combined tree only ever grows; keys are
//! never removed.

use serde_json::{Map, Value};

use crate::error::{format_error_message, GQL_API_ERROR, NO_DATA_OR_ERRORS_ERROR};
use crate::response::{ClientStreamResponse, ResponseErrors};

/// Lifts `data` into a nested structure so that it resides at `path`.
///
/// String segments construct objects, numeric segments construct arrays
/// (earlier slots padded with `null`).
#[must_use]
pub(crate) fn build_data_object_by_path(path: &[Value], data: Value) -> Value {
    let mut current = data;
    for segment in path.iter().rev() {
        current = match segment {
            Value::String(key) => {
                let mut object = Map::new();
                object.insert(key.clone(), current);
                Value::Object(object)
            }
            Value::Number(index) => {
                let index = index.as_u64().unwrap_or(0) as usize;
                let mut array = vec![Value::Null; index];
                array.push(current);
                Value::Array(array)
            }
            _ => current,
        };
    }
    current
}

/// Deep-merges `incoming` into `base`.
///
/// Array positions merge index-wise so a later chunk targeting `[0].name`
/// enriches the existing element instead of replacing the array. A `null`
/// array slot in `incoming` is a padding hole and keeps the base element.
#[must_use]
pub(crate) fn combine_data(base: &Value, incoming: &Value) -> Value {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in incoming_map {
                let next = match merged.get(key) {
                    Some(existing) if value.is_object() || value.is_array() => {
                        combine_data(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (Value::Array(base_items), Value::Array(incoming_items)) => {
            let len = base_items.len().max(incoming_items.len());
            let merged = (0..len)
                .map(|i| match (base_items.get(i), incoming_items.get(i)) {
                    (Some(existing), Some(Value::Null)) => existing.clone(),
                    (Some(existing), Some(value)) => combine_data(existing, value),
                    (Some(existing), None) => existing.clone(),
                    (None, Some(value)) => value.clone(),
                    (None, None) => Value::Null,
                })
                .collect();
            Value::Array(merged)
        }
        (_, other) => other.clone(),
    }
}

/// Accumulating state for one incremental stream.
///
/// Owned by the stream task; snapshots clone out of it so the final error
/// snapshot can still carry the partial data.
#[derive(Debug)]
pub(crate) struct IncrementalAccumulator {
    status: u16,
    combined_data: Value,
    extensions: Option<Value>,
    has_next: bool,
}

impl IncrementalAccumulator {
    pub(crate) fn new(status: u16) -> Self {
        Self {
            status,
            combined_data: Value::Object(Map::new()),
            extensions: None,
            // A stream that ends before delivering anything terminated early.
            has_next: true,
        }
    }

    pub(crate) const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Folds one batch of part bodies into the accumulator and produces the
    /// snapshot to yield. `Err` carries the final error snapshot and means
    /// the stream must end after yielding it.
    pub(crate) fn apply_batch(
        &mut self,
        parts: &[String],
    ) -> Result<ClientStreamResponse, ClientStreamResponse> {
        let mut payloads = Vec::with_capacity(parts.len());
        for part in parts {
            match serde_json::from_str::<Value>(part) {
                Ok(payload) => payloads.push(payload),
                Err(error) => {
                    return Err(self.error_snapshot(
                        format_error_message(&format!(
                            "Error in parsing multipart response - {error}"
                        )),
                        None,
                    ));
                }
            }
        }

        let mut batch_errors: Vec<Value> = Vec::new();
        for payload in &payloads {
            let data = payload.get("data").filter(|value| !value.is_null());
            let path = payload.get("path").and_then(Value::as_array);

            let effective = match (data, path) {
                (Some(data), Some(path)) => build_data_object_by_path(path, data.clone()),
                (Some(data), None) => data.clone(),
                (None, _) => Value::Object(Map::new()),
            };
            self.combined_data = combine_data(&self.combined_data, &effective);

            if let Some(extensions) = payload.get("extensions") {
                if !extensions.is_null()
                    && !extensions.as_object().is_some_and(Map::is_empty)
                {
                    self.extensions = Some(extensions.clone());
                }
            }

            if let Some(has_next) = payload.get("hasNext").and_then(Value::as_bool) {
                self.has_next = has_next;
            }

            if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
                if !errors.is_empty() {
                    batch_errors.extend(errors.iter().cloned());
                }
            }
        }

        if !batch_errors.is_empty() {
            return Err(
                self.error_snapshot(format_error_message(GQL_API_ERROR), Some(batch_errors))
            );
        }

        if self.combined_data_is_empty() {
            return Err(self.error_snapshot(format_error_message(NO_DATA_OR_ERRORS_ERROR), None));
        }

        Ok(ClientStreamResponse {
            data: Some(self.combined_data.clone()),
            errors: None,
            extensions: self.extensions.clone(),
            has_next: self.has_next,
        })
    }

    /// Builds the final snapshot for a failed stream, preserving whatever
    /// data was merged so far.
    pub(crate) fn error_snapshot(
        &self,
        message: String,
        graphql_errors: Option<Vec<Value>>,
    ) -> ClientStreamResponse {
        let data = if self.combined_data_is_empty() {
            None
        } else {
            Some(self.combined_data.clone())
        };
        ClientStreamResponse {
            data,
            errors: Some(ResponseErrors {
                network_status_code: Some(self.status),
                message: Some(message),
                graphql_errors,
                response: None,
            }),
            extensions: self.extensions.clone(),
            has_next: false,
        }
    }

    fn combined_data_is_empty(&self) -> bool {
        self.combined_data.as_object().is_some_and(Map::is_empty)
    }
}
