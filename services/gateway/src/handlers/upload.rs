use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header},
};
use market_data::ingestion::UploadReceipt;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

pub async fn submit_upload(
    State(state): State<AppState>,
    Path(api_key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadReceipt>, AppError> {
    if !is_json(&headers) {
        return Err(AppError::UnsupportedMediaType(
            "uploads must be sent as application/json".into(),
        ));
    }

    let receipt = state.ctx.submit_upload(&api_key, &body).await?;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&with_type("application/json")));
        assert!(is_json(&with_type("application/json; charset=utf-8")));
        assert!(is_json(&with_type("Application/JSON")));
        assert!(!is_json(&with_type("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }
}
