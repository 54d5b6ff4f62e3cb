use axum::body;
use serde::de::DeserializeOwned;

/// Reads an HTTP response body to its end and deserializes it into the requested type,
/// panicking (and failing the test) if either step goes wrong.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse body content into data structure! Error: {}, Received body: {:?}",
            err, bytes
        )
    })
}
