use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use tower::ServiceExt;

const BASE: &str = "http://mock.test";

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

/// Text between `<tag>` and `</tag>`; the mock emits each tested tag once.
fn between<'a>(doc: &'a str, tag: &str) -> &'a str {
    let open = format!("<{tag}>");
    let start = doc.find(&open).unwrap() + open.len();
    let end = doc[start..].find(&format!("</{tag}>")).unwrap();
    &doc[start..start + end]
}

// --- OFP fetcher ---

#[tokio::test]
async fn known_pilot_gets_success_document() {
    let resp = app(BASE)
        .oneshot(get("/api/xml.fetcher.php?userid=123456"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/xml");
    let doc = body_text(resp).await;
    assert_eq!(between(&doc, "status"), "Success");
    assert_eq!(between(&doc, "directory"), "http://mock.test/ofp/flightplans/");
    assert!(doc.contains("<icao_code>KJFK</icao_code>"));
}

#[tokio::test]
async fn unknown_pilot_gets_error_status() {
    let resp = app(BASE)
        .oneshot(get("/api/xml.fetcher.php?userid=999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_text(resp).await;
    assert_eq!(between(&doc, "status"), "Error: Unknown UserID");
}

#[tokio::test]
async fn missing_userid_is_unknown() {
    let resp = app(BASE)
        .oneshot(get("/api/xml.fetcher.php"))
        .await
        .unwrap();

    let doc = body_text(resp).await;
    assert_eq!(between(&doc, "status"), "Error: Unknown UserID");
}

// --- plan files ---

#[tokio::test]
async fn unknown_plan_file_is_404() {
    let resp = app(BASE)
        .oneshot(get("/ofp/flightplans/NOPE.fms"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- edge endpoints ---

#[tokio::test]
async fn empty_returns_200_without_body() {
    let resp = app(BASE).oneshot(get("/empty")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_route_echoes_code() {
    let resp = app(BASE).oneshot(get("/status/503")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn slow_route_answers_after_delay() {
    let resp = app(BASE).oneshot(get("/slow?secs=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "late");
}

// --- full fetch, download, notify cycle ---

#[tokio::test]
async fn fetch_download_notify_cycle() {
    use tower::Service;

    let mut app = app(BASE).into_service();

    // fetch the OFP
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/xml.fetcher.php?userid=654321"))
        .await
        .unwrap();
    let doc = body_text(resp).await;
    let directory = between(&doc, "directory").to_string();
    let xpe = between(&doc, "xpe").to_string();
    let link = between(&xpe, "link").to_string();
    assert!(link.starts_with("EDDMLFPG_XPE_"));

    // download the linked plan
    let path = format!("{}{}", directory, link).replacen(BASE, "", 1);
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&path))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let plan = body_text(resp).await;
    assert!(plan.contains("ADEP EDDM\n"));
    assert!(plan.contains("ADES LFPG\n"));

    // notify ActiveSky
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/ActiveSky/API/LoadFlightPlan?FileName=EDDMLFPG19.fms"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // the load request was recorded
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/ActiveSky/API/Loaded"))
        .await
        .unwrap();
    let loaded: Vec<String> = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(loaded, vec!["EDDMLFPG19.fms".to_string()]);
}
