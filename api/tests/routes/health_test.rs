#[cfg(test)]
mod tests {
    use crate::helpers::app::{get_request, make_test_app};
    use axum::http::StatusCode;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn health_check_returns_ok_json() {
        let app = make_test_app().await;

        let (status, json) = app.send(get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Health check passed");
    }
}
