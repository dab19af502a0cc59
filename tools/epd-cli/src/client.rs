//! HTTP client for the display's web server
//!
//! The display exposes three endpoints: `GET /` reports its size and
//! temperature in response headers, `POST /clear` wipes the screen and
//! `POST /draw` takes a 4-bit packed frame as body with its geometry in
//! request headers.

use reqwest::header::HeaderMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Timeout applied to every request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Size and temperature reported by the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
    /// Degrees celsius
    pub temperature: i32,
}

impl DisplayInfo {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ClientError> {
        Ok(Self {
            width: header_value(headers, "width")?,
            height: header_value(headers, "height")?,
            temperature: header_value(headers, "temperature")?,
        })
    }
}

fn header_value<T: FromStr>(headers: &HeaderMap, name: &'static str) -> Result<T, ClientError> {
    let value = headers.get(name).ok_or(ClientError::MissingHeader(name))?;
    let text = value.to_str().map_err(|_| ClientError::InvalidHeader {
        name,
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })?;
    text.trim().parse().map_err(|_| ClientError::InvalidHeader {
        name,
        value: text.to_string(),
    })
}

/// Placement of a frame on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRequest {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    /// Clear the screen before drawing
    pub clear: bool,
}

/// Blocking client, one request at a time
pub struct DisplayClient {
    base_url: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl DisplayClient {
    /// Connect to `host`, either a bare hostname or a full `http://` URL
    pub fn new(host: &str) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url(host),
            client,
            runtime,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query display size and temperature
    pub fn info(&self) -> Result<DisplayInfo, ClientError> {
        self.runtime.block_on(async {
            let response = self.client.get(self.url("/")).send().await?;
            let response = check_status("GET /", response)?;
            DisplayInfo::from_headers(response.headers())
        })
    }

    /// Clear the whole screen
    pub fn clear(&self) -> Result<(), ClientError> {
        self.runtime.block_on(async {
            let response = self.client.post(self.url("/clear")).send().await?;
            check_status("POST /clear", response)?;
            Ok::<(), ClientError>(())
        })
    }

    /// Send a packed frame, high nibble first
    pub fn draw(&self, request: &DrawRequest, payload: Vec<u8>) -> Result<(), ClientError> {
        tracing::debug!(
            "Drawing {}x{} at ({}, {}), {} bytes",
            request.width,
            request.height,
            request.x,
            request.y,
            payload.len()
        );
        self.runtime.block_on(async {
            let response = self
                .client
                .post(self.url("/draw"))
                .header("width", request.width.to_string())
                .header("height", request.height.to_string())
                .header("x", request.x.to_string())
                .header("y", request.y.to_string())
                .header("clear", if request.clear { "1" } else { "0" })
                .body(payload)
                .send()
                .await?;
            check_status("POST /draw", response)?;
            Ok::<(), ClientError>(())
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Transport {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_display_info_from_headers() {
        let map = headers(&[("width", "1200"), ("height", "825"), ("temperature", "-3")]);
        assert_eq!(
            DisplayInfo::from_headers(&map).unwrap(),
            DisplayInfo {
                width: 1200,
                height: 825,
                temperature: -3
            }
        );
    }

    #[test]
    fn test_missing_header() {
        let map = headers(&[("width", "1200"), ("height", "825")]);
        assert!(matches!(
            DisplayInfo::from_headers(&map),
            Err(ClientError::MissingHeader("temperature"))
        ));
    }

    #[test]
    fn test_invalid_header() {
        let map = headers(&[("width", "wide"), ("height", "825"), ("temperature", "20")]);
        match DisplayInfo::from_headers(&map) {
            Err(ClientError::InvalidHeader { name, value }) => {
                assert_eq!(name, "width");
                assert_eq!(value, "wide");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("epd.local"), "http://epd.local");
        assert_eq!(base_url("epd.local/"), "http://epd.local");
        assert_eq!(base_url("http://10.0.0.5:8080"), "http://10.0.0.5:8080");
    }
}
