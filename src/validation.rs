/// Validates HTTP/HTTPS URL
pub fn validate_http_url(value: &str) -> Result<url::Url, String> {
    if value.trim().is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    let url = url::Url::parse(value).map_err(|e| format!("Invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err("URL must use http or https scheme".to_string()),
    }
    if url.host_str().filter(|h| !h.is_empty()).is_none() {
        return Err("URL must have a valid host".to_string());
    }
    Ok(url)
}

/// Validates a CORS origin: an HTTP/HTTPS URL without path, query or fragment
pub fn validate_origin(value: &str) -> Result<(), String> {
    let url = validate_http_url(value)?;
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("Origin must not contain a path, query or fragment".to_string());
    }
    Ok(())
}
