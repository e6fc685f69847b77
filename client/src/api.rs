use territory_shared::Record;

pub async fn fetch_records() -> Result<Vec<Record>, String> {
    let resp = gloo_net::http::Request::get("/api/records")
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    resp.json::<Vec<Record>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
