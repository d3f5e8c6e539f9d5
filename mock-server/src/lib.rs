//! Local stand-in for the dispatch service, its flight plan download
//! directory and the ActiveSky load-plan API.
//!
//! Every known pilot gets a fresh OFP document whose download link points
//! back at this server. A few extra routes produce the awkward answers the
//! transport has to cope with: a slow endpoint, an empty body and arbitrary
//! status codes.

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A flight plan the mock dispatcher knows about.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub origin: String,
    pub destination: String,
    pub time_generated: u64,
}

#[derive(Default)]
pub struct Dispatch {
    base_url: String,
    /// Pilot id to its current plan.
    pilots: HashMap<String, Plan>,
    /// Generated file name to FMS body.
    files: HashMap<String, String>,
    /// File names ActiveSky was asked to load, in order.
    loaded: Vec<String>,
}

pub type Db = Arc<RwLock<Dispatch>>;

/// Pilot ids served by `app`, with their plans.
pub fn default_pilots() -> HashMap<String, Plan> {
    let mut pilots = HashMap::new();
    pilots.insert(
        "123456".to_string(),
        Plan {
            origin: "KJFK".to_string(),
            destination: "KBOS".to_string(),
            time_generated: 1_690_000_000,
        },
    );
    pilots.insert(
        "654321".to_string(),
        Plan {
            origin: "EDDM".to_string(),
            destination: "LFPG".to_string(),
            time_generated: 1_700_000_000,
        },
    );
    pilots
}

/// Router whose generated links point at `base_url`.
pub fn app(base_url: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Dispatch {
        base_url: base_url.trim_end_matches('/').to_string(),
        pilots: default_pilots(),
        ..Dispatch::default()
    }));
    Router::new()
        .route("/api/xml.fetcher.php", get(fetch_ofp))
        .route("/ofp/flightplans/{file}", get(get_plan_file))
        .route("/ActiveSky/API/LoadFlightPlan", get(load_flight_plan))
        .route("/ActiveSky/API/Loaded", get(loaded_plans))
        .route("/slow", get(slow))
        .route("/empty", get(empty))
        .route("/status/{code}", get(status))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let base_url = format!("http://{}", listener.local_addr()?);
    axum::serve(listener, app(&base_url)).await
}

#[derive(Deserialize)]
pub struct FetchQuery {
    pub userid: Option<String>,
}

async fn fetch_ofp(State(db): State<Db>, Query(query): Query<FetchQuery>) -> impl IntoResponse {
    let mut dispatch = db.write().await;
    let plan = query
        .userid
        .as_deref()
        .and_then(|id| dispatch.pilots.get(id))
        .cloned();

    let body = match plan {
        Some(plan) => {
            let file = format!(
                "{}{}_XPE_{}.fms",
                plan.origin,
                plan.destination,
                Uuid::new_v4().simple()
            );
            dispatch.files.insert(file.clone(), fms_body(&plan));
            ofp_document(&dispatch.base_url, &plan, &file)
        }
        None => error_document("Error: Unknown UserID"),
    };
    ([(header::CONTENT_TYPE, "application/xml")], body)
}

async fn get_plan_file(
    State(db): State<Db>,
    Path(file): Path<String>,
) -> Result<String, StatusCode> {
    let dispatch = db.read().await;
    dispatch.files.get(&file).cloned().ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
pub struct LoadQuery {
    #[serde(rename = "FileName")]
    pub file_name: String,
}

async fn load_flight_plan(State(db): State<Db>, Query(query): Query<LoadQuery>) -> StatusCode {
    db.write().await.loaded.push(query.file_name);
    StatusCode::OK
}

async fn loaded_plans(State(db): State<Db>) -> Json<Vec<String>> {
    Json(db.read().await.loaded.clone())
}

#[derive(Deserialize)]
pub struct SlowQuery {
    #[serde(default = "default_delay")]
    pub secs: u64,
}

fn default_delay() -> u64 {
    5
}

async fn slow(Query(query): Query<SlowQuery>) -> &'static str {
    tokio::time::sleep(Duration::from_secs(query.secs)).await;
    "late"
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// OFP document in the shape of the SimBrief XML fetcher.
pub fn ofp_document(base_url: &str, plan: &Plan, fms_file: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OFP>
  <fetch>
    <userid>mock</userid>
    <static_id/>
    <status>Success</status>
    <time>0.0042</time>
  </fetch>
  <params>
    <request_id>{request_id}</request_id>
    <time_generated>{time}</time_generated>
    <units>kgs</units>
  </params>
  <general>
    <release>1</release>
    <remarks>NOTAM &amp; WX &lt;CHECKED&gt;</remarks>
  </general>
  <origin>
    <icao_code>{origin}</icao_code>
    <plan_rwy>04L</plan_rwy>
  </origin>
  <destination>
    <icao_code>{destination}</icao_code>
    <plan_rwy>33L</plan_rwy>
  </destination>
  <fms_downloads>
    <directory>{base_url}/ofp/flightplans/</directory>
    <pdf><name>PDF Document</name><link>{origin}{destination}_PDF.pdf</link></pdf>
    <xpe><name>X-Plane 11/12</name><link>{fms_file}</link></xpe>
  </fms_downloads>
</OFP>
"#,
        request_id = Uuid::new_v4(),
        time = plan.time_generated,
        origin = plan.origin,
        destination = plan.destination,
    )
}

pub fn error_document(status: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<OFP>\n  <fetch>\n    <status>{status}</status>\n  </fetch>\n</OFP>\n"
    )
}

/// Minimal X-Plane 11 FMS plan for `plan`.
pub fn fms_body(plan: &Plan) -> String {
    format!(
        "I\n1100 Version\nCYCLE 2307\nADEP {origin}\nADES {destination}\nNUMENR 2\n\
         1 {origin} ADEP 0.000000 0.000000 0.000000\n\
         1 {destination} ADES 0.000000 0.000000 0.000000\n",
        origin = plan.origin,
        destination = plan.destination,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            origin: "KJFK".to_string(),
            destination: "KBOS".to_string(),
            time_generated: 1_690_000_000,
        }
    }

    #[test]
    fn document_links_back_to_base_url() {
        let doc = ofp_document("http://127.0.0.1:9", &plan(), "KJFKKBOS_XPE_1.fms");
        assert!(doc.contains("<directory>http://127.0.0.1:9/ofp/flightplans/</directory>"));
        assert!(doc.contains("<link>KJFKKBOS_XPE_1.fms</link>"));
        assert!(doc.contains("<time_generated>1690000000</time_generated>"));
    }

    #[test]
    fn error_document_carries_status() {
        let doc = error_document("Error: Unknown UserID");
        assert!(doc.contains("<status>Error: Unknown UserID</status>"));
        assert!(!doc.contains("<origin>"));
    }

    #[test]
    fn fms_body_names_both_airports() {
        let body = fms_body(&plan());
        assert!(body.starts_with("I\n1100 Version\n"));
        assert!(body.contains("ADEP KJFK\n"));
        assert!(body.contains("ADES KBOS\n"));
    }

    #[test]
    fn plan_roundtrips_through_json() {
        let json = serde_json::to_string(&plan()).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan());
    }

    #[test]
    fn default_pilots_are_known() {
        let pilots = default_pilots();
        assert_eq!(pilots["123456"].origin, "KJFK");
        assert!(!pilots.contains_key("000000"));
    }
}
