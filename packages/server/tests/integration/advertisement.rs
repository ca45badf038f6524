use reqwest::multipart::Part;
use serde_json::json;

use crate::common::{
    MAX_IMAGE_SIZE, PNG_BYTES, ProviderBehavior, TestApp, TestOptions, ad_form, png_part, routes,
};

mod creation {
    use super::*;

    #[tokio::test]
    async fn multipart_create_starts_active() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z", "2")
                    .part("image", png_part()),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "active");
        assert_eq!(res.body["current_impressions"], 0);
        assert_eq!(res.body["impression_count"], 2);
        assert!(res.body["created_at"].is_string());
        assert!(res.body["updated_at"].is_null());

        let path = res.body["image_path"].as_str().unwrap();
        assert!(path.starts_with("advertisements/") && path.ends_with(".png"));
        assert!(res.body["image_url"].as_str().unwrap().ends_with(path));
    }

    #[tokio::test]
    async fn stored_image_is_served() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(5).await;
        let ad = app.get(&routes::advertisement(id)).await;
        let path = ad.body["image_path"].as_str().unwrap();

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::asset(path)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["content-type"], "image/png");
        assert_eq!(res.bytes().await.unwrap().as_ref(), PNG_BYTES);
    }

    #[tokio::test]
    async fn only_advertisement_keys_are_served() {
        let app = TestApp::spawn().await;
        let root = app.asset_dir.path();
        std::fs::create_dir_all(root.join(".tmp")).unwrap();
        std::fs::write(root.join(".tmp/partial-upload"), PNG_BYTES).unwrap();
        std::fs::write(root.join("stray.png"), PNG_BYTES).unwrap();
        std::fs::create_dir_all(root.join("advertisements-old")).unwrap();
        std::fs::write(root.join("advertisements-old/a.png"), PNG_BYTES).unwrap();

        for key in [".tmp/partial-upload", "stray.png", "advertisements-old/a.png"] {
            let res = app.get(&routes::asset(key)).await;
            assert_eq!(res.status, 404, "{key}: {}", res.text);
        }
    }

    #[tokio::test]
    async fn naive_timestamps_are_read_as_utc() {
        let app = TestApp::spawn().await;
        let id = app
            .create_ad("2024-01-01T00:00:00", "2024-01-31T23:59:59", 3)
            .await;

        let res = app.get(&routes::advertisement(id)).await;
        let start = chrono::DateTime::parse_from_rfc3339(res.body["start_time"].as_str().unwrap())
            .unwrap();
        assert_eq!(start.offset().local_minus_utc(), 0);
    }

    #[tokio::test]
    async fn end_before_start_is_rejected_without_storing() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-02-01T00:00:00Z", "2024-01-01T00:00:00Z", "5")
                    .part("image", png_part()),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("end_time"));

        let list = app.get(routes::ADVERTISEMENTS).await;
        assert_eq!(list.body["count"], 0);
    }

    #[tokio::test]
    async fn zero_impressions_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z", "0")
                    .part("image", png_part()),
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("impression_count"));
    }

    #[tokio::test]
    async fn missing_image_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z", "1"),
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("image"));
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let pdf = Part::bytes(b"%PDF-1.7".to_vec())
            .file_name("flyer.pdf")
            .mime_str("application/pdf")
            .unwrap();

        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z", "1").part("image", pdf),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let app = TestApp::spawn().await;
        let big = Part::bytes(vec![0u8; MAX_IMAGE_SIZE as usize + 1])
            .file_name("huge.png")
            .mime_str("image/png")
            .unwrap();

        let res = app
            .post_multipart(
                routes::ADVERTISEMENTS,
                ad_form("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z", "1").part("image", big),
            )
            .await;
        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn generated_creative_is_stored() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::GENERATE_AD,
                &json!({
                    "prompt": "A red bicycle poster",
                    "model": "sdxl",
                    "description": "Bike week",
                    "start_time": "2024-01-01T00:00:00Z",
                    "end_time": "2024-01-31T23:59:59Z",
                    "impression_count": 10
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "active");
        assert_eq!(app.provider.calls(), 1);
        let path = res.body["image_path"].as_str().unwrap();
        assert!(app.assets.exists(path).await.unwrap());
    }

    #[tokio::test]
    async fn generation_is_skipped_for_invalid_ad_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::GENERATE_AD,
                &json!({
                    "prompt": "A red bicycle poster",
                    "description": "Bike week",
                    "start_time": "2024-01-31T00:00:00Z",
                    "end_time": "2024-01-01T00:00:00Z",
                    "impression_count": 10
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(app.provider.calls(), 0);
    }

    #[tokio::test]
    async fn loading_model_is_retryable() {
        let app = TestApp::spawn_with(TestOptions {
            provider: ProviderBehavior::ModelLoading,
            ..Default::default()
        })
        .await;

        let res = app
            .post(
                routes::GENERATE_AD,
                &json!({
                    "prompt": "A red bicycle poster",
                    "description": "Bike week",
                    "start_time": "2024-01-01T00:00:00Z",
                    "end_time": "2024-01-31T00:00:00Z",
                    "impression_count": 10
                }),
            )
            .await;

        assert_eq!(res.status, 503);
        assert_eq!(res.body["code"], "PROVIDER_UNAVAILABLE");
        assert!(res.header("retry-after").is_some());
        assert_eq!(app.get(routes::ADVERTISEMENTS).await.body["count"], 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn pages_are_ordered_by_id() {
        let app = TestApp::spawn().await;
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(app.create_current_ad(10).await);
        }

        let res = app
            .get(&format!("{}?limit=2&offset=1", routes::ADVERTISEMENTS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 2);
        assert_eq!(res.body["limit"], 2);
        assert_eq!(res.body["offset"], 1);
        let page: Vec<i64> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_i64().unwrap())
            .collect();
        assert_eq!(page, vec![ids[1] as i64, ids[2] as i64]);
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&format!("{}?limit=5000", routes::ADVERTISEMENTS))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["limit"], 1000);
    }

    #[tokio::test]
    async fn status_filter_applies() {
        let app = TestApp::spawn().await;
        let paused = app.create_current_ad(10).await;
        app.create_current_ad(10).await;
        app.patch(&routes::advertisement(paused), &json!({"status": "paused"}))
            .await;

        let res = app
            .get(&format!("{}?status=paused", routes::ADVERTISEMENTS))
            .await;
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["id"], paused);
    }

    #[tokio::test]
    async fn unknown_status_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app
            .get(&format!("{}?status=archived", routes::ADVERTISEMENTS))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn active_view_excludes_paused_expired_and_exhausted() {
        let app = TestApp::spawn().await;
        let live = app.create_current_ad(10).await;
        let paused = app.create_current_ad(10).await;
        let expired = app
            .create_ad("2020-01-01T00:00:00Z", "2020-01-31T00:00:00Z", 10)
            .await;
        let exhausted = app.create_current_ad(1).await;

        app.patch(&routes::advertisement(paused), &json!({"status": "paused"}))
            .await;
        app.post_empty(&routes::impression(exhausted)).await;

        let res = app.get(routes::ACTIVE).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["data"][0]["id"], live);

        // The lapsed window did not change the stored status.
        let stored = app.get(&routes::advertisement(expired)).await;
        assert_eq!(stored.body["status"], "active");
    }
}

mod impressions {
    use super::*;

    #[tokio::test]
    async fn target_reached_completes_the_ad() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(2).await;

        let first = app.post_empty(&routes::impression(id)).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["current_impressions"], 1);
        assert_eq!(first.body["status"], "active");
        assert!(first.body["updated_at"].is_string());

        let second = app.post_empty(&routes::impression(id)).await;
        assert_eq!(second.body["current_impressions"], 2);
        assert_eq!(second.body["status"], "completed");

        let active = app.get(routes::ACTIVE).await;
        assert_eq!(active.body["count"], 0);
    }

    #[tokio::test]
    async fn completed_ad_rejects_further_impressions() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(1).await;
        app.post_empty(&routes::impression(id)).await;

        let res = app.post_empty(&routes::impression(id)).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn paused_ad_rejects_impressions() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(5).await;
        app.patch(&routes::advertisement(id), &json!({"status": "paused"}))
            .await;

        let res = app.post_empty(&routes::impression(id)).await;
        assert_eq!(res.status, 409);
        let stored = app.get(&routes::advertisement(id)).await;
        assert_eq!(stored.body["current_impressions"], 0);
    }

    #[tokio::test]
    async fn missing_ad_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.post_empty(&routes::impression(404)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn concurrent_impressions_are_all_counted() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(1000).await;
        let path = routes::impression(id);

        let requests = (0..20).map(|_| app.post_empty(&path));
        let responses = futures::future::join_all(requests).await;
        assert!(responses.iter().all(|r| r.status == 200));

        let stored = app.get(&routes::advertisement(id)).await;
        assert_eq!(stored.body["current_impressions"], 20);
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn status_only_patch_keeps_other_fields() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;
        let before = app.get(&routes::advertisement(id)).await;

        let res = app
            .patch(&routes::advertisement(id), &json!({"status": "paused"}))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "paused");
        assert!(res.body["updated_at"].is_string());
        for field in ["description", "start_time", "end_time", "impression_count", "image_url"] {
            assert_eq!(res.body[field], before.body[field], "{field} changed");
        }
    }

    #[tokio::test]
    async fn end_before_stored_start_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app
            .create_ad("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z", 10)
            .await;
        let before = app.get(&routes::advertisement(id)).await;

        let res = app
            .patch(
                &routes::advertisement(id),
                &json!({"end_time": "2023-12-01T00:00:00Z"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let after = app.get(&routes::advertisement(id)).await;
        assert_eq!(after.body, before.body);
    }

    #[tokio::test]
    async fn completed_ad_can_be_reopened() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(1).await;
        app.post_empty(&routes::impression(id)).await;

        let res = app
            .patch(
                &routes::advertisement(id),
                &json!({"status": "active", "impression_count": 3}),
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "active");

        let active = app.get(routes::ACTIVE).await;
        assert_eq!(active.body["count"], 1);
    }

    #[tokio::test]
    async fn empty_patch_returns_current_record() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;
        let before = app.get(&routes::advertisement(id)).await;

        let res = app.patch(&routes::advertisement(id), &json!({})).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, before.body);
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;

        let res = app
            .patch(&routes::advertisement(id), &json!({"impression_count": "many"}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_ad_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .patch(&routes::advertisement(999), &json!({"description": "x"}))
            .await;
        assert_eq!(res.status, 404);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_image() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;
        let ad = app.get(&routes::advertisement(id)).await;
        let path = ad.body["image_path"].as_str().unwrap().to_string();
        assert!(app.assets.exists(&path).await.unwrap());

        let res = app.delete(&routes::advertisement(id)).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get(&routes::advertisement(id)).await.status, 404);
        assert!(!app.assets.exists(&path).await.unwrap());
        assert_eq!(app.get(&routes::asset(&path)).await.status, 404);
    }

    #[tokio::test]
    async fn delete_survives_missing_image() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;
        let ad = app.get(&routes::advertisement(id)).await;
        app.assets
            .delete(ad.body["image_path"].as_str().unwrap())
            .await
            .unwrap();

        assert_eq!(app.delete(&routes::advertisement(id)).await.status, 204);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let id = app.create_current_ad(10).await;
        app.delete(&routes::advertisement(id)).await;

        assert_eq!(app.delete(&routes::advertisement(id)).await.status, 404);
    }
}
