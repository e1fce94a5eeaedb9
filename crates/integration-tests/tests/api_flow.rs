use actix_web::{http::StatusCode, test, web, App};
use cr_api::{configure_routes, AppState};
use cr_core::PageLimits;
use integration_tests::Backend;
use serde_json::{json, Value};

fn content_body(title: &str) -> Value {
    json!({
        "title": title,
        "year": 1982,
        "duration": 117,
        "genre": "Sci-Fi",
        "actors": ["Harrison Ford", "Rutger Hauer"],
        "description": "A blade runner hunts four escaped replicants."
    })
}

#[actix_web::test]
async fn rating_scenarios_over_http() {
    for backend in Backend::all().await.unwrap() {
        let name = backend.name;
        let state = web::Data::new(AppState::new(backend.services.clone(), PageLimits::default()));
        let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/contents")
            .set_json(content_body("Blade Runner"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let c1 = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["genre"], "Sci-Fi", "{name}");

        let mut rating_ids = Vec::new();
        for (user, value, expected_avg, expected_total) in [("u1", 4, 4.0, 1), ("u2", 5, 4.5, 2)] {
            let req = test::TestRequest::post()
                .uri("/api/ratings")
                .set_json(json!({ "userId": user, "contentId": c1, "rating": value }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED, "{name}");
            let body: Value = test::read_body_json(resp).await;
            rating_ids.push(body["data"]["id"].as_str().unwrap().to_string());

            let req = test::TestRequest::get()
                .uri(&format!("/api/contents/{c1}"))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["averageRating"], expected_avg, "{name}");
            assert_eq!(body["data"]["totalRatings"], expected_total, "{name}");
        }

        // duplicate from u1
        let req = test::TestRequest::post()
            .uri("/api/ratings")
            .set_json(json!({ "userId": "u1", "contentId": c1, "rating": 3 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::put()
            .uri(&format!("/api/ratings/{}", rating_ids[0]))
            .set_json(json!({ "rating": 2 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/ratings/content/{c1}?limit=1"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pagination"]["total"], 2, "{name}");
        assert_eq!(body["pagination"]["pages"], 2);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/ratings/{}", rating_ids[1]))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contents/{c1}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["averageRating"], 2.0, "{name}");
        assert_eq!(body["data"]["totalRatings"], 1);
        assert_eq!(body["data"]["recentReviews"].as_array().unwrap().len(), 1);

        // malformed and unknown content ids
        let req = test::TestRequest::post()
            .uri("/api/ratings")
            .set_json(json!({ "userId": "u1", "contentId": "nonexistent-id", "rating": 3 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/ratings")
            .set_json(json!({ "userId": "u1", "contentId": uuid::Uuid::now_v7(), "rating": 3 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/analytics/overview")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["totalRatings"], 1, "{name}");
        assert_eq!(body["data"]["averageRating"], 2.0);
    }
}

#[actix_web::test]
async fn manual_recompute_reports_summary() {
    for backend in Backend::all().await.unwrap() {
        let content = backend.add_content("Dune").await.unwrap();
        let state = web::Data::new(AppState::new(backend.services.clone(), PageLimits::default()));
        let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/contents/{}/recompute", content.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"], json!({ "averageRating": 0.0, "totalRatings": 0 }), "{}", backend.name);
    }
}
