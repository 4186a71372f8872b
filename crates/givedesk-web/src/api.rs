//! API Client

use reqwest::Url;

/// Form values of the QR widget, passed through to `/api/qr` as-is
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrParams {
    pub text: String,
    pub size: String,
    pub margin: String,
    pub ecc: String,
    pub dark: String,
    pub light: String,
}

impl Default for QrParams {
    fn default() -> Self {
        Self {
            text: "https://example.com".into(),
            size: "256".into(),
            margin: "4".into(),
            ecc: "M".into(),
            dark: "#000000".into(),
            light: "#ffffff".into(),
        }
    }
}

/// Build an `/api/qr` URL for the given origin
pub fn qr_url(origin: &str, params: &QrParams, format: &str, download: bool) -> Result<String, String> {
    let base = format!("{}/api/qr", origin.trim_end_matches('/'));
    let download = if download { "true" } else { "false" };

    Url::parse_with_params(
        &base,
        &[
            ("text", params.text.trim()),
            ("size", params.size.as_str()),
            ("margin", params.margin.as_str()),
            ("ecc", params.ecc.as_str()),
            ("dark", params.dark.as_str()),
            ("light", params.light.as_str()),
            ("format", format),
            ("download", download),
        ],
    )
    .map(String::from)
    .map_err(|e| e.to_string())
}

/// Origin of the page, for absolute API URLs
pub fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

/// Render the QR code as SVG markup for the preview
pub async fn render_svg(params: &QrParams) -> Result<String, String> {
    let url = qr_url(&origin(), params, "svg", false)?;

    let client = reqwest::Client::new();

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.text().await.map_err(|e| e.to_string())
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"].as_str().unwrap_or("Request failed").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_url_encodes_form_values() {
        let params = QrParams {
            text: "  hello world & more ".into(),
            ..QrParams::default()
        };
        let url = qr_url("https://give.example.org/", &params, "png", true).unwrap();

        assert!(url.starts_with("https://give.example.org/api/qr?"));
        assert!(url.contains("text=hello+world+%26+more&"));
        assert!(url.contains("dark=%23000000"));
        assert!(url.contains("format=png"));
        assert!(url.ends_with("download=true"));
    }

    #[test]
    fn test_qr_url_rejects_bad_origin() {
        assert!(qr_url("not a url", &QrParams::default(), "svg", false).is_err());
    }
}
