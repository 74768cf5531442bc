use lambda_http::{
    http::{response::Builder, Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use relay_shared::payload::{self, Encoding};
use relay_shared::store::Ssh2Store;
use relay_shared::upload::{upload, UploadError, UploadRequest};
use relay_shared::AppState;
use std::sync::Arc;

/// Destination folder used when the caller does not name one.
const DEFAULT_FOLDER: &str = "ENCARTS";

/// Upload Lambda handler: CORS preflight, then POST-only transfer to the
/// remote SFTP store.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    tracing::info!("Upload Lambda invoked - Method: {}", method);

    // Handle CORS preflight
    if method == "OPTIONS" {
        return Ok(cors(StatusCode::OK).body(Body::Empty).map_err(Box::new)?);
    }

    if method != Method::POST {
        return json_error(
            StatusCode::METHOD_NOT_ALLOWED,
            serde_json::json!({"error": "Method not allowed"}),
        );
    }

    let folder = match name_param(&event, "folder", "x-folder") {
        Some(folder) if !folder.is_empty() => folder,
        _ => DEFAULT_FOLDER.to_string(),
    };
    let file_name = name_param(&event, "name", "x-file-name").unwrap_or_default();

    let encoding = Encoding::from_content_type(
        event
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
    );
    let payload = match payload::decode(encoding, event.body()) {
        Ok(payload) => payload,
        Err(e) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": e.to_string()}),
            )
        }
    };

    let request = UploadRequest {
        folder,
        file_name,
        payload,
    };
    let config = state.config.clone();

    // The ssh2 session is blocking; keep it off the async workers.
    let result =
        tokio::task::spawn_blocking(move || upload(&Ssh2Store, &config, &request)).await?;

    match result {
        Ok(outcome) => {
            let mut body = serde_json::json!({
                "ok": true,
                "remotePath": outcome.remote_path,
                "bytes": outcome.bytes_written,
            });
            if let Some(warning) = outcome.warning {
                body["warning"] = warning.into();
            }
            Ok(cors(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(body.to_string().into())
                .map_err(Box::new)?)
        }
        Err(e) if e.is_client_error() => {
            json_error(StatusCode::BAD_REQUEST, serde_json::json!({"error": e.to_string()}))
        }
        Err(e) => {
            tracing::error!(error = %e, code = e.native_code(), "upload failed");
            let status = match &e {
                UploadError::Connect { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let mut body = serde_json::json!({"error": e.to_string()});
            if let Some(code) = e.native_code() {
                body["code"] = code.into();
            }
            json_error(status, body)
        }
    }
}

/// Folder and file names arrive as query parameters, with headers as an
/// alternative source for callers that cannot set a query string.
fn name_param(event: &Request, query: &str, header: &str) -> Option<String> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(query))
        .map(|s| s.to_string())
        .or_else(|| {
            event
                .headers()
                .get(header)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

fn cors(status: StatusCode) -> Builder {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
}

fn json_error(status: StatusCode, body: serde_json::Value) -> Result<Response<Body>, Error> {
    Ok(cors(status)
        .header("Content-Type", "application/json")
        .body(body.to_string().into())
        .map_err(Box::new)?)
}
