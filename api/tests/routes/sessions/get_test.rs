#[cfg(test)]
mod tests {
    use crate::helpers::app::{
        TestApp, get_request, json_request, make_test_app, multipart_body, multipart_request, token_for,
    };
    use axum::http::StatusCode;
    use chrono::Duration;
    use db::models::{student, teacher};
    use serde_json::json;
    use serial_test::serial;

    async fn create(app: &TestApp, session_id: &str, name: &str, course: &str) {
        let (status, json) = app
            .send(json_request(
                "POST",
                "/sessions/create",
                Some(&token_for("t@x.com")),
                json!({
                    "session_id": session_id,
                    "name": name,
                    "date": "2025-01-01",
                    "time": "09:00",
                    "course": course
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
    }

    async fn attend(app: &TestApp, session_id: &str) {
        let body = multipart_body(
            &[
                ("session_id", session_id),
                ("teacher_email", "t@x.com"),
                ("regno", "R1"),
                ("IP", "10.0.0.7"),
                ("Location", "10,10"),
                ("date", "2025-01-01"),
            ],
            Some(&[1, 2, 3]),
        );
        let (status, json) = app
            .send(multipart_request("/sessions/attend_session", &token_for("s@x.com"), body))
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
    }

    #[tokio::test]
    #[serial]
    async fn active_sessions_are_public_and_expire() {
        let app = make_test_app().await;
        teacher::Model::create(&app.db, "t@x.com", "Ms Smith").await.unwrap();
        create(&app, "S1", "Algebra", "MTH101").await;

        app.clock.advance(Duration::minutes(29));
        let (status, json) = app.send(get_request("/sessions/active-sessions", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        let sessions = json["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["subject"], "Algebra");
        assert_eq!(sessions[0]["instructor"], "Ms Smith");

        app.clock.advance(Duration::minutes(2));
        let (_, json) = app.send(get_request("/sessions/active-sessions", None)).await;
        assert!(json["sessions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn stats_count_without_pruning() {
        let app = make_test_app().await;
        teacher::Model::create(&app.db, "t@x.com", "Ms Smith").await.unwrap();
        create(&app, "S1", "Algebra", "MTH101").await;
        app.clock.advance(Duration::minutes(10));
        create(&app, "S2", "Physics", "PHY101").await;
        app.clock.advance(Duration::minutes(25));

        let (status, json) = app.send(get_request("/sessions/active-sessions/stats", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 2);
        assert_eq!(json["active"], 1);
        assert_eq!(json["expired"], 1);
    }

    #[tokio::test]
    #[serial]
    async fn student_attendance_filters_by_course() {
        let app = make_test_app().await;
        teacher::Model::create(&app.db, "t@x.com", "Ms Smith").await.unwrap();
        student::Model::create(&app.db, "s@x.com", "Sam", Some("R1")).await.unwrap();
        create(&app, "S1", "Algebra", "MTH101").await;
        create(&app, "S2", "Mechanics", "PHY101").await;
        attend(&app, "S1").await;
        attend(&app, "S2").await;
        let token = token_for("s@x.com");

        let (status, json) = app
            .send(get_request("/sessions/student-attendance", Some(&token)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["attendance"].as_array().unwrap().len(), 2);

        let (_, json) = app
            .send(get_request("/sessions/student-attendance?course=phy", Some(&token)))
            .await;
        let attendance = json["attendance"].as_array().unwrap();
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance[0]["session_id"], "S2");
        assert_eq!(attendance[0]["status"], "Present");

        let (_, json) = app
            .send(get_request("/sessions/student-attendance?course=all", Some(&token)))
            .await;
        assert_eq!(json["attendance"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn student_attendance_requires_bearer_header() {
        let app = make_test_app().await;

        let (status, json) = app.send(get_request("/sessions/student-attendance", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["kind"], "missing_credentials");
    }
}
