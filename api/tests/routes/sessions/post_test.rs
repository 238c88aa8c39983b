#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        TestApp, json_request, make_test_app, make_test_app_with, multipart_body, multipart_request, token_for,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use db::models::{student, teacher};
    use serde_json::{Value, json};
    use serial_test::serial;
    use util::config::AppConfig;

    async fn seed_people(app: &TestApp) {
        teacher::Model::create(&app.db, "t@x.com", "Ms Smith").await.unwrap();
        student::Model::create(&app.db, "s@x.com", "Sam", Some("R1")).await.unwrap();
    }

    async fn create_s1(app: &TestApp, location: &str) -> Value {
        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/create",
                Some(&token_for("t@x.com")),
                json!({
                    "session_id": "S1",
                    "name": "Algebra",
                    "date": "2025-01-01",
                    "time": "09:00",
                    "location": location,
                    "course": "MTH101"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json
    }

    fn attend_fields<'a>(location: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![
            ("session_id", "S1"),
            ("teacher_email", "t@x.com"),
            ("regno", "R1"),
            ("IP", "10.0.0.7"),
            ("student_email", "ignored@x.com"),
            ("Location", location),
            ("date", "2025-01-01"),
        ]
    }

    #[tokio::test]
    #[serial]
    async fn create_returns_url_and_live_session() {
        let app = make_test_app().await;
        seed_people(&app).await;

        let json = create_s1(&app, "10,10.001").await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Session created successfully");
        assert_eq!(json["url"], "http://localhost:3000/login?session_id=S1&email=t%40x.com");
        assert_eq!(json["session"]["subject"], "Algebra");
        assert_eq!(json["session"]["isActive"], true);
        assert_eq!(json["session"]["radius"], 100);
        assert_eq!(json["session"]["duration"], 60);

        let live = app.registry.get_session_by_id("S1").await.unwrap();
        assert_eq!(live.instructor, "Ms Smith");
    }

    #[tokio::test]
    #[serial]
    async fn create_with_missing_fields_is_400_and_registers_nothing() {
        let app = make_test_app().await;
        seed_people(&app).await;

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/create",
                Some(&token_for("t@x.com")),
                json!({ "session_id": "S1", "name": "Algebra" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "validation");
        assert_eq!(app.registry.get_session_stats().await.total, 0);
    }

    #[tokio::test]
    #[serial]
    async fn create_for_unknown_teacher_is_404() {
        let app = make_test_app().await;

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/create",
                Some(&token_for("ghost@x.com")),
                json!({ "session_id": "S1", "name": "Algebra", "date": "2025-01-01", "time": "09:00" }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Teacher not found");
    }

    #[tokio::test]
    #[serial]
    async fn protected_routes_require_credentials() {
        let app = make_test_app().await;

        let (status, json) = app
            .send(json_request("POST", "/sessions/getSessions", None, json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["kind"], "missing_credentials");
        assert_eq!(json["message"], "Access Denied");

        let (status, json) = app
            .send(json_request("POST", "/sessions/getSessions", Some("garbage"), json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["kind"], "auth");
    }

    #[tokio::test]
    #[serial]
    async fn cookie_token_is_accepted() {
        let app = make_test_app().await;
        seed_people(&app).await;

        let req = Request::builder()
            .method("POST")
            .uri("/sessions/getQR")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("token={}", token_for("t@x.com")))
            .body(Body::from(json!({ "session_id": "S1" }).to_string()))
            .unwrap();

        let (status, json) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["url"], "http://localhost:3000/login?session_id=S1&email=t%40x.com");
    }

    #[tokio::test]
    #[serial]
    async fn get_sessions_lists_attendance() {
        let app = make_test_app().await;
        seed_people(&app).await;
        create_s1(&app, "10,10.001").await;

        let body = multipart_body(&attend_fields("10,10"), Some(&[1, 2, 3]));
        let (status, _) = app
            .send(multipart_request("/sessions/attend_session", &token_for("s@x.com"), body))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/getSessions",
                Some(&token_for("t@x.com")),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let sessions = json["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_id"], "S1");
        assert_eq!(sessions[0]["attendance"][0]["regno"], "R1");
        assert_eq!(sessions[0]["attendance"][0]["IP"], "10.0.0.7");
        assert_eq!(sessions[0]["attendance"][0]["Location"], "10,10");
    }

    #[tokio::test]
    #[serial]
    async fn attend_marks_once_then_reports_already_marked() {
        let app = make_test_app().await;
        seed_people(&app).await;
        create_s1(&app, "10,10.001").await;
        let token = token_for("s@x.com");

        let body = multipart_body(&attend_fields("10,10"), Some(&[1, 2, 3]));
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token, body))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "Attendance marked successfully");
        assert_eq!(json["already_marked"], false);
        assert_eq!(json["attendance"]["student_email"], "s@x.com");
        let distance: f64 = json["attendance"]["distance"].as_str().unwrap().parse().unwrap();
        assert!((distance - 111.0).abs() < 6.0, "distance {distance}");
        let image = json["attendance"]["image"].as_str().unwrap().to_owned();
        assert!(app.images.path().join(&image).exists());

        let body = multipart_body(&attend_fields("10,10"), Some(&[4, 5, 6]));
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token, body))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Attendance already marked");
        assert_eq!(json["already_marked"], true);
        assert_eq!(json["attendance"]["image"], image);
    }

    #[tokio::test]
    #[serial]
    async fn attend_without_image_is_400() {
        let app = make_test_app().await;
        seed_people(&app).await;
        create_s1(&app, "10,10.001").await;

        let body = multipart_body(&attend_fields("10,10"), None);
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token_for("s@x.com"), body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "image is required");
    }

    #[tokio::test]
    #[serial]
    async fn attend_with_bad_location_is_400() {
        let app = make_test_app().await;
        seed_people(&app).await;
        create_s1(&app, "10,10.001").await;

        let body = multipart_body(&attend_fields("north-ish"), Some(&[1]));
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token_for("s@x.com"), body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "validation");
    }

    #[tokio::test]
    #[serial]
    async fn attend_outside_radius_is_403_under_reject_policy() {
        let app = make_test_app_with(|| AppConfig::set_geofence_policy("reject")).await;
        seed_people(&app).await;
        create_s1(&app, "10,10.01").await;

        let body = multipart_body(&attend_fields("10,10"), Some(&[1]));
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token_for("s@x.com"), body))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["kind"], "outside_geofence");
    }

    #[tokio::test]
    #[serial]
    async fn student_sessions_hold_the_summary() {
        let app = make_test_app().await;
        seed_people(&app).await;
        create_s1(&app, "10,10.001").await;
        let token = token_for("s@x.com");

        let body = multipart_body(&attend_fields("10,10"), Some(&[1]));
        app.send(multipart_request("/sessions/attend_session", &token, body)).await;

        let (status, json) = app
            .send(json_request("POST", "/sessions/getStudentSessions", Some(&token), json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let sessions = json["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["session_id"], "S1");
        assert_eq!(sessions[0]["teacher_email"], "t@x.com");
        assert_eq!(sessions[0]["radius"], 100);
    }

    #[tokio::test]
    #[serial]
    async fn submit_attendance_checks_in_against_live_session() {
        let app = make_test_app().await;
        seed_people(&app).await;
        let created = create_s1(&app, "").await;
        let token = token_for("s@x.com");

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/submit-attendance",
                Some(&token),
                json!({ "sessionId": "S1", "qrData": created["url"] }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["attendance"]["subject"], "Algebra");
        assert_eq!(json["attendance"]["status"], "Present");

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/submit-attendance",
                Some(&token),
                json!({ "sessionId": "S1", "qrData": "not a qr code" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid QR code, try again");
    }

    #[tokio::test]
    #[serial]
    async fn submit_attendance_after_expiry_is_404() {
        let app = make_test_app().await;
        seed_people(&app).await;
        let created = create_s1(&app, "").await;

        app.clock.advance(chrono::Duration::minutes(31));

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/submit-attendance",
                Some(&token_for("s@x.com")),
                json!({ "sessionId": "S1", "qrData": created["url"] }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Session not found or expired");
    }

    #[tokio::test]
    #[serial]
    async fn submit_attendance_requires_bearer_header() {
        let app = make_test_app().await;

        let req = Request::builder()
            .method("POST")
            .uri("/sessions/submit-attendance")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("token={}", token_for("s@x.com")))
            .body(Body::from(json!({ "sessionId": "S1", "qrData": "x" }).to_string()))
            .unwrap();

        let (status, json) = app.send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["kind"], "missing_credentials");
    }

    #[tokio::test]
    #[serial]
    async fn demo_token_creates_registry_only_session() {
        let app = make_test_app_with(|| AppConfig::set_demo_mode(true)).await;

        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/create",
                Some("demo-token-for-development"),
                json!({ "session_id": "D1", "name": "Demo", "date": "2025-01-01", "time": "09:00" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "Demo session created successfully");
        assert_eq!(json["session"]["instructor"], "Demo Teacher");
        assert!(
            teacher::Model::find_by_email(&app.db, "demo@teacher.com")
                .await
                .unwrap()
                .is_none()
        );
        AppConfig::set_demo_mode(false);
    }
}
