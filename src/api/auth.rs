use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use sha2::Sha256;

use crate::config::Credentials;
use crate::{WaasError, WaasResult};

type HmacSha256 = Hmac<Sha256>;

const ACCESS_KEY: &str = "ok-access-key";
const ACCESS_PASSPHRASE: &str = "ok-access-passphrase";
const ACCESS_PROJECT: &str = "ok-access-project";
const ACCESS_TIMESTAMP: &str = "ok-access-timestamp";
const ACCESS_SIGN: &str = "ok-access-sign";

/// Request timestamp, ISO-8601 UTC with millisecond precision.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `base64(HMAC-SHA256(secret, timestamp + method + path + body))`.
///
/// `path` includes the query string; `body` is only signed for POST requests.
pub fn sign(
    secret: &str,
    timestamp: &str,
    method: &Method,
    path: &str,
    body: &str,
) -> WaasResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| WaasError::Config(format!("invalid secret key: {err}")))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_str().as_bytes());
    mac.update(path.as_bytes());
    if *method == Method::POST {
        mac.update(body.as_bytes());
    }

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Authentication headers of a request.
pub fn headers(
    credentials: &Credentials,
    timestamp: &str,
    method: &Method,
    path: &str,
    body: &str,
) -> WaasResult<HeaderMap> {
    let signature = sign(&credentials.secret_key, timestamp, method, path, body)?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in [
        (ACCESS_KEY, credentials.api_key.as_str()),
        (ACCESS_PASSPHRASE, credentials.passphrase.as_str()),
        (ACCESS_PROJECT, credentials.project_id.as_str()),
        (ACCESS_TIMESTAMP, timestamp),
        (ACCESS_SIGN, signature.as_str()),
    ] {
        let value = HeaderValue::from_str(value)
            .map_err(|err| WaasError::Config(format!("invalid {name} header: {err}")))?;
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(headers)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    const TIMESTAMP: &str = "2023-06-01T12:00:00.000Z";

    fn credentials() -> Credentials {
        Credentials {
            api_key: "key".to_string(),
            secret_key: "secret".to_string(),
            passphrase: "pass".to_string(),
            project_id: "project".to_string(),
        }
    }

    #[test]
    fn test_should_format_timestamp_with_millis() {
        let now = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(timestamp(now), TIMESTAMP);
    }

    #[test]
    fn test_should_sign_post_with_body() {
        let signature = sign(
            "secret",
            TIMESTAMP,
            &Method::POST,
            "/api/v5/waas/transaction/get-sign-info",
            r#"{"addrFrom":"a"}"#,
        )
        .unwrap();

        assert_eq!(signature, "NrWQdfxJP7N8rWHUN0aMGvRERZtpQaUH9wSAM8yHPrI=");
    }

    #[test]
    fn test_should_sign_get_without_body() {
        let path = "/api/v5/waas/transaction/get-transaction-detail?walletId=w&orderId=1&chainId=0";
        let signature = sign("secret", TIMESTAMP, &Method::GET, path, "ignored").unwrap();

        assert_eq!(signature, "mLb9boECYMpgXEW24FhMoBDd0T81N62xYHU8eGYZS/g=");
    }

    #[test]
    fn test_should_build_headers() {
        let headers = headers(&credentials(), TIMESTAMP, &Method::GET, "/", "").unwrap();

        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["OK-ACCESS-KEY"], "key");
        assert_eq!(headers["OK-ACCESS-PASSPHRASE"], "pass");
        assert_eq!(headers["OK-ACCESS-PROJECT"], "project");
        assert_eq!(headers["OK-ACCESS-TIMESTAMP"], TIMESTAMP);
        assert!(headers.contains_key("OK-ACCESS-SIGN"));
    }
}
