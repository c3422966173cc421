// Demo mode: an in-process fake registry endpoint
//
// Serves canned HOA records in the same markup shape the real registry
// returns, so the TUI, the headless commands and the scraper can all be
// exercised without network access. The client tests also run against it.
//
// Run with: HOA_LOOKUP_DEMO=1 cargo run --release

use anyhow::{Context, Result};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Path the fake endpoint is mounted on, mirroring the real registry
pub const AJAX_PATH: &str = "/hoa/assets/js/hoa-ajax.php";

struct Person {
    name: &'static str,
    phone: &'static str,
    email: &'static str,
    address: &'static [&'static str],
}

struct DemoHoa {
    pid: u64,
    name: &'static str,
    dba: Option<&'static str>,
    registration: &'static str,
    registration_type: &'static str,
    status: &'static str,
    expires: &'static str,
    location: &'static str,
    mailing: &'static [&'static str],
    president: Option<Person>,
    manager: Option<Person>,
    payoff: Option<Person>,
    board_heading: &'static str,
    board: &'static [Person],
}

fn demo_records() -> Vec<DemoHoa> {
    vec![
        DemoHoa {
            pid: 1001,
            name: "Aspen Ridge Owners Association",
            dba: Some("Aspen Ridge"),
            registration: "HOA-1001",
            registration_type: "Homeowners Association",
            status: "Active",
            expires: "03/31/2027",
            location: "Salt Lake County",
            mailing: &["PO Box 100", "Salt Lake City, UT 84101"],
            president: Some(Person {
                name: "Jane Smith",
                phone: "(801) 555-0101",
                email: "jane@aspenridge.org",
                address: &["12 Aspen Way", "Salt Lake City, UT 84101"],
            }),
            manager: Some(Person {
                name: "Wasatch Community Management",
                phone: "(801) 555-0150",
                email: "office@wasatchcm.com",
                address: &["400 S Main St", "Salt Lake City, UT 84111"],
            }),
            payoff: Some(Person {
                name: "Payoff Desk",
                phone: "(801) 555-0151",
                email: "payoffs@wasatchcm.com",
                address: &[],
            }),
            board_heading: "Board Members",
            board: &[
                Person {
                    name: "Tom Jones",
                    phone: "(801) 555-0110",
                    email: "tom@aspenridge.org",
                    address: &[],
                },
                Person {
                    name: "Maria Lopez",
                    phone: "801 555-0111",
                    email: "",
                    address: &["18 Aspen Way"],
                },
            ],
        },
        DemoHoa {
            pid: 1002,
            name: "Canyon View Condominiums",
            dba: None,
            registration: "HOA-1002",
            registration_type: "Condominium Association",
            status: "Expired",
            expires: "12/31/2024",
            location: "Utah County",
            mailing: &["88 Canyon Rd", "Provo, UT 84604"],
            president: Some(Person {
                name: "Robert Smith",
                phone: "(385) 555-0120",
                email: "rsmith@canyonview.net",
                address: &[],
            }),
            manager: None,
            payoff: None,
            board_heading: "Management Committee",
            board: &[Person {
                name: "Alice Young",
                phone: "",
                email: "alice@canyonview.net",
                address: &[],
            }],
        },
        DemoHoa {
            pid: 1003,
            name: "Smithfield Meadows HOA",
            dba: None,
            registration: "HOA-1003",
            registration_type: "Homeowners Association",
            status: "Active",
            expires: "06/30/2026",
            location: "Cache County",
            mailing: &["1 Meadow Ln", "Smithfield, UT 84335"],
            president: None,
            manager: Some(Person {
                name: "Valley HOA Services",
                phone: "(435) 555-0130",
                email: "help@valleyhoa.com",
                address: &["55 N Main", "Logan, UT 84321"],
            }),
            payoff: None,
            board_heading: "Board Members",
            board: &[],
        },
    ]
}

struct DemoState {
    records: Vec<DemoHoa>,
    latency: Duration,
}

#[derive(Debug, Deserialize)]
struct AjaxForm {
    f: String,
    v: Option<String>,
}

/// Handle to a running fake registry. The server stops when dropped.
pub struct DemoRegistry {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl DemoRegistry {
    /// Full endpoint URL to hand to the registry client
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, AJAX_PATH)
    }
}

impl Drop for DemoRegistry {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the fake registry on an ephemeral localhost port
pub async fn spawn_registry() -> Result<DemoRegistry> {
    spawn_registry_with_latency(Duration::ZERO).await
}

/// Start the fake registry, delaying every response by `latency`
pub async fn spawn_registry_with_latency(latency: Duration) -> Result<DemoRegistry> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind demo registry")?;
    let addr = listener
        .local_addr()
        .context("Failed to read demo registry address")?;

    let state = Arc::new(DemoState {
        records: demo_records(),
        latency,
    });
    let app = Router::new()
        .route(AJAX_PATH, post(handle_ajax))
        .with_state(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!("Demo registry stopped: {}", e);
        }
    });

    tracing::info!("Demo registry listening on {}", addr);

    Ok(DemoRegistry {
        addr,
        shutdown: Some(shutdown_tx),
    })
}

async fn handle_ajax(State(state): State<Arc<DemoState>>, Form(form): Form<AjaxForm>) -> Response {
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }

    match (form.f.as_str(), form.v.as_deref()) {
        ("l", _) => Html(render_listing(state.records.iter())).into_response(),
        ("s", Some(query)) => {
            let query = query.trim();
            let matches: Vec<&DemoHoa> = if query == "%" {
                state.records.iter().collect()
            } else {
                let needle = query.to_lowercase();
                state
                    .records
                    .iter()
                    .filter(|r| {
                        r.name.to_lowercase().contains(&needle)
                            || r.registration.to_lowercase().contains(&needle)
                    })
                    .collect()
            };
            if matches.is_empty() {
                Html(format!(
                    "<div class=\"alert alert-warning text-center\">No results found for \"{}\".</div>",
                    escape(query)
                ))
                .into_response()
            } else {
                Html(render_listing(matches.into_iter())).into_response()
            }
        }
        ("d", Some(id)) => {
            let record = id
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|pid| state.records.iter().find(|r| r.pid == pid));
            match record {
                Some(record) => Html(render_detail(record)).into_response(),
                None => (
                    StatusCode::NOT_FOUND,
                    Html(
                        "<div class=\"alert alert-danger text-center\">No HOA found for that identifier.</div>"
                            .to_string(),
                    ),
                )
                    .into_response(),
            }
        }
        _ => (StatusCode::BAD_REQUEST, "Unknown request").into_response(),
    }
}

fn render_listing<'a>(records: impl Iterator<Item = &'a DemoHoa>) -> String {
    let mut html = String::from(
        "<table class=\"table table-hover\">\n<thead><tr><th>Name</th><th>Registration #</th><th>Status</th><th></th></tr></thead>\n<tbody>\n",
    );
    for r in records {
        let dba = r
            .dba
            .map(|d| format!("\n<small>DBA {}</small>", escape(d)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr class=\"link-view\" data-pid=\"{}\"><td>{}{}</td><td>{}</td><td>{}</td><td><a class=\"link-view\" href=\"#\">View</a></td></tr>\n",
            r.pid,
            escape(r.name),
            dba,
            escape(r.registration),
            escape(r.status)
        ));
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn person_lines(p: &Person) -> String {
    let mut lines = vec![escape(p.name)];
    if !p.phone.is_empty() {
        lines.push(escape(p.phone));
    }
    if !p.email.is_empty() {
        lines.push(escape(p.email));
    }
    lines.extend(p.address.iter().map(|l| escape(l)));
    lines.join("<br>\n")
}

fn render_detail(r: &DemoHoa) -> String {
    let mut html = String::from("<div class=\"container\">\n<div class=\"row\"><div class=\"col-12\">\n");
    html.push_str(&format!("<h1 class=\"mb-0\">{}</h1>\n", escape(r.name)));
    if let Some(dba) = r.dba {
        html.push_str(&format!("<h3 class=\"my-0\">DBA: {}</h3>\n", escape(dba)));
    }
    html.push_str(&format!(
        "<h6>Registration #: {}<br>\nRegistration Type: {}<br>\nStatus: <span class=\"badge badge-info\">{}</span><br>\nExpires: {}</h6>\n",
        escape(r.registration),
        escape(r.registration_type),
        escape(r.status),
        escape(r.expires)
    ));
    html.push_str(&format!("<h5>Location:</h5>\n<p>{}</p>\n", escape(r.location)));
    let mailing: Vec<String> = r.mailing.iter().map(|l| escape(l)).collect();
    html.push_str(&format!(
        "<h5>Contact Info:</h5>\n<p>{}</p>\n",
        mailing.join("<br>\n")
    ));
    html.push_str("</div></div>\n<div class=\"row border primary-color-border mt-4\">\n");
    for (role, person) in [
        ("President", &r.president),
        ("Community Manager", &r.manager),
        ("Payoff Contact", &r.payoff),
    ] {
        if let Some(p) = person {
            html.push_str(&format!(
                "<div class=\"col-md-4\"><h4 class=\"mb-0\">{}</h4>\n<p class=\"mt-0 ml-3\">{}</p></div>\n",
                role,
                person_lines(p)
            ));
        }
    }
    html.push_str("</div>\n<div class=\"row\">\n");
    html.push_str(&format!(
        "<div class=\"col-12\"><h4 class=\"border-bottom\">{}</h4></div>\n",
        r.board_heading
    ));
    for member in r.board {
        html.push_str(&format!(
            "<div class=\"col-md-6 col-lg-3\"><p class=\"ml-3\">{}</p></div>\n",
            person_lines(member)
        ));
    }
    html.push_str("</div>\n</div>");
    html
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_rows_carry_pids() {
        let records = demo_records();
        let html = render_listing(records.iter());
        assert!(html.contains("data-pid=\"1001\""));
        assert!(html.contains("data-pid=\"1003\""));
        assert_eq!(html.matches("<tr class=\"link-view\"").count(), records.len());
    }

    #[test]
    fn detail_has_role_cards_and_board() {
        let records = demo_records();
        let html = render_detail(&records[0]);
        assert!(html.contains("<h1 class=\"mb-0\">Aspen Ridge Owners Association</h1>"));
        assert!(html.contains("Community Manager"));
        assert!(html.contains("Board Members"));
    }
}
