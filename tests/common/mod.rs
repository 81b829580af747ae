//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Days, NaiveDate};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use covid_dashboard::cache::MemoryStore;
use covid_dashboard::config::DashboardConfig;
use covid_dashboard::{DashboardServer, Shutdown};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const DAYS: u64 = 20;

pub const STATE_PATH: &str = "/states/daily.csv";
pub const COUNTY_PATH: &str = "/us-counties.csv";
pub const COUNTRIES_PATH: &str = "/countries";

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;

/// Programmable upstream serving fixed bodies by path and counting hits.
pub struct MockUpstream {
    pub addr: SocketAddr,
    routes: Routes,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::default();
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();

        let (routes_task, hits_task) = (routes.clone(), hits.clone());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes_task.clone();
                let hits = hits_task.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                request.extend_from_slice(&buf[..n]);
                                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                                    break;
                                }
                            }
                        }
                    }

                    let head = String::from_utf8_lossy(&request);
                    let path = head
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();

                    *hits.lock().unwrap().entry(path.clone()).or_default() += 1;
                    let (status, body) = routes
                        .lock()
                        .unwrap()
                        .get(&path)
                        .cloned()
                        .unwrap_or((404, "not found".to_string()));

                    let status_text = match status {
                        200 => "200 OK",
                        404 => "404 Not Found",
                        500 => "500 Internal Server Error",
                        503 => "503 Service Unavailable",
                        _ => "200 OK",
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_text,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, routes, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn set(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Serve every fixture table.
    pub fn with_fixtures(self) -> Self {
        self.set(STATE_PATH, 200, state_csv());
        self.set(COUNTY_PATH, 200, county_csv());
        self.set(COUNTRIES_PATH, 200, country_list());
        for code in ["US", "SE", "NO", "DK"] {
            self.set(&format!("/countries/{code}"), 200, country_timeline(code));
        }
        self
    }
}

pub fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + Days::new(offset)
}

/// (code, name, daily case base, 2010 population)
pub const STATES: [(&str, &str, u64, u64); 5] = [
    ("CA", "California", 50, 37_000_000),
    ("TX", "Texas", 40, 25_000_000),
    ("NY", "New York", 30, 19_000_000),
    ("FL", "Florida", 20, 18_000_000),
    ("WA", "Washington", 10, 100_000),
];

/// Daily per-state table, newest rows first like the live feed.
pub fn state_csv() -> String {
    let mut csv = String::from(
        "date,state,positive,positiveIncrease,deathIncrease,totalTestResultsIncrease,hospitalizedCurrently\n",
    );
    for offset in (0..DAYS).rev() {
        let date = day(offset).format("%Y%m%d");
        for (code, _, base, _) in STATES {
            let cases = base * (offset + 1);
            let hospitalized = if offset < 3 { String::new() } else { offset.to_string() };
            csv.push_str(&format!(
                "{date},{code},{},{cases},{},{},{hospitalized}\n",
                cases * 2,
                base / 10,
                cases * 10,
            ));
        }
    }
    csv
}

/// Cumulative per-county table.
pub fn county_csv() -> String {
    let mut csv = String::from("date,county,state,fips,cases,deaths\n");
    for offset in 0..DAYS {
        let date = day(offset);
        let total = offset * offset;
        csv.push_str(&format!("{date},Santa Clara,California,06085,{total},{}\n", total / 20));
        csv.push_str(&format!("{date},King,Washington,53033,{},{}\n", total * 2, total / 10));
    }
    csv
}

pub fn country_list() -> String {
    json!({
        "data": [
            {"name": "USA", "code": "US", "population": 327_167_434},
            {"name": "Sweden", "code": "SE", "population": 10_183_175},
            {"name": "Norway", "code": "NO", "population": 5_314_336},
            {"name": "Denmark", "code": "DK", "population": 5_797_446},
        ]
    })
    .to_string()
}

/// Timeline newest first, led by a partial in-progress day.
pub fn country_timeline(code: &str) -> String {
    let scale = match code {
        "US" => 100.0,
        "SE" => 5.0,
        _ => 2.0,
    };
    let mut timeline = vec![json!({
        "date": day(DAYS).to_string(),
        "new_confirmed": 1,
        "new_deaths": 0,
        "new_recovered": 0,
        "is_in_progress": true,
    })];
    for offset in (0..DAYS).rev() {
        timeline.push(json!({
            "date": format!("{}T00:00:00.000Z", day(offset)),
            "new_confirmed": scale * (offset + 1) as f64,
            "new_deaths": scale / 10.0,
            "new_recovered": 0,
        }));
    }
    json!({ "data": { "code": code, "timeline": timeline } }).to_string()
}

/// Write the two population tables into `dir`.
pub fn write_population(dir: &Path) {
    let mut population = String::from("SUMLEV,NAME,POPESTIMATE2010,POPESTIMATE2019\n");
    let mut names = String::from("State,Abbrev,Code\n");
    for (code, name, _, pop) in STATES {
        population.push_str(&format!("040,{name},{pop},{}\n", pop + 1000));
        names.push_str(&format!("{name},{code}.,{code}\n"));
    }
    population.push_str("040,Puerto Rico,3725789,3193694\n");
    std::fs::write(dir.join("pop-est2019.csv"), population).unwrap();
    std::fs::write(dir.join("state-abbre.csv"), names).unwrap();
}

/// Configuration pointing every source at `upstream`.
pub fn config_for(upstream: &MockUpstream, data_dir: &Path) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.sources.country_list_url = upstream.url(COUNTRIES_PATH);
    config.sources.country_timeline_url = upstream.url("/countries/{code}");
    config.sources.state_daily_url = upstream.url(STATE_PATH);
    config.sources.county_daily_url = upstream.url(COUNTY_PATH);
    config.sources.data_dir = data_dir.display().to_string();
    config.timeouts.upstream_secs = 5;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

/// A running dashboard over an in-memory cache.
pub struct TestDashboard {
    pub base: String,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
    _data_dir: tempfile::TempDir,
}

impl TestDashboard {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let response = self.get(path).await;
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn admin(&self, method: reqwest::Method, path: &str, key: Option<&str>) -> reqwest::Response {
        let mut request = self.client.request(method, self.url(path));
        if let Some(key) = key {
            request = request.bearer_auth(key);
        }
        request.send().await.unwrap()
    }
}

pub async fn start_dashboard(upstream: &MockUpstream) -> TestDashboard {
    start_dashboard_with(upstream, |_| {}).await
}

pub async fn start_dashboard_with(
    upstream: &MockUpstream,
    adjust: impl FnOnce(&mut DashboardConfig),
) -> TestDashboard {
    let data_dir = tempfile::tempdir().unwrap();
    write_population(data_dir.path());

    let mut config = config_for(upstream, data_dir.path());
    adjust(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = DashboardServer::new(config, Arc::new(MemoryStore::new())).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();

    TestDashboard {
        base: format!("http://{addr}"),
        shutdown,
        client,
        _data_dir: data_dir,
    }
}
