//! Stream URL signing
//!
//! A live stream URL carries an expiry timestamp (`ts`, lowercase hex Unix
//! seconds) and a signature (`sign`). The signature is the hex HMAC-MD5 of
//! the canonical string
//!
//! ```text
//! app_id=<app_id>&path=<percent-encoded path>&ts=<percent-encoded ts>
//! ```
//!
//! where percent-encoding leaves only RFC 3986 unreserved characters
//! (`A-Z a-z 0-9 - _ . ~`) untouched, so `/` becomes `%2F`. The path in the
//! returned URL itself is not encoded.

use crate::config::{check_ttl, SigningConfig, STATION_ID_PLACEHOLDER};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::Md5;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

type HmacMd5 = Hmac<Md5>;

/// Everything except RFC 3986 unreserved characters
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode every byte outside the unreserved set
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

/// A signed, expiring stream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    url: String,
    ts: String,
    signature: String,
    expires_at: i64,
}

impl SignedUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Expiry as embedded in the URL (lowercase hex, no `0x`)
    pub fn ts(&self) -> &str {
        &self.ts
    }

    /// 32-character lowercase hex HMAC-MD5
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Expiry as Unix seconds
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for SignedUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl From<SignedUrl> for String {
    fn from(signed: SignedUrl) -> Self {
        signed.url
    }
}

/// Produces signed stream URLs
///
/// The HMAC is keyed once at construction and cloned per signature, so a
/// signer can be shared freely across requests.
#[derive(Clone)]
pub struct StreamSigner {
    mac: HmacMd5,
    app_id: String,
    base_url: String,
    path_template: String,
    ttl_secs: i64,
}

impl fmt::Debug for StreamSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSigner")
            .field("app_id", &self.app_id)
            .field("base_url", &self.base_url)
            .field("path_template", &self.path_template)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl StreamSigner {
    pub fn new(config: &SigningConfig) -> Result<Self> {
        check_ttl(config.ttl_secs)?;
        let mac = HmacMd5::new_from_slice(config.secret.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid signing secret: {}", e)))?;

        Ok(Self {
            mac,
            app_id: config.app_id.clone(),
            base_url: config.stream_base_url.trim_end_matches('/').to_string(),
            path_template: config.path_template.clone(),
            ttl_secs: config.ttl_secs,
        })
    }

    /// Scheme and host of every signed URL, without a trailing `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Resource path for a station, e.g. `/live/273/64k.mp3`
    pub fn stream_path(&self, station_id: &str) -> String {
        self.path_template.replace(STATION_ID_PLACEHOLDER, station_id)
    }

    /// The exact string the signature is computed over
    pub fn canonical_string(&self, path: &str, ts: &str) -> String {
        format!(
            "app_id={}&path={}&ts={}",
            self.app_id,
            percent_encode(path),
            percent_encode(ts)
        )
    }

    /// Sign the stream URL of `station_id`, expiring `ttl_secs` after `now`.
    ///
    /// The station id is interpolated verbatim; nothing is validated.
    pub fn sign(&self, station_id: impl fmt::Display, now: DateTime<Utc>) -> SignedUrl {
        let path = self.stream_path(&station_id.to_string());
        let expires_at = now.timestamp() + self.ttl_secs;
        let ts = format!("{:x}", expires_at);

        let mut mac = self.mac.clone();
        mac.update(self.canonical_string(&path, &ts).as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let url = format!(
            "{}{}?app_id={}&ts={}&sign={}",
            self.base_url, path, self.app_id, ts, signature
        );

        tracing::debug!(path = %path, ts = %ts, "Signed stream URL");

        SignedUrl {
            url,
            ts,
            signature,
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use percent_encoding::percent_decode_str;

    fn signer() -> StreamSigner {
        StreamSigner::new(&SigningConfig::default()).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_golden_signature_station_20003() {
        // ts 637b930f == 1669042959 == now + 3600
        let signed = signer().sign(20003, at(1_669_042_959 - 3600));

        assert_eq!(signed.ts(), "637b930f");
        assert_eq!(signed.signature(), "f2ff4c3ce17943f5210569cf1a04bf5f");
        assert_eq!(
            signed.as_str(),
            "https://lhttp.qingting.fm/live/20003/64k.mp3?app_id=web&ts=637b930f&sign=f2ff4c3ce17943f5210569cf1a04bf5f"
        );
    }

    #[test]
    fn test_station_273_end_to_end() {
        let signed = signer().sign(273, at(1_700_000_000));

        assert_eq!(signed.ts(), "6553ff10");
        assert_eq!(
            signed.as_str(),
            "https://lhttp.qingting.fm/live/273/64k.mp3?app_id=web&ts=6553ff10&sign=bcf9beff2f996f105dd0b1d394dff550"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = signer();
        let now = at(1_700_000_000);
        assert_eq!(signer.sign("20003", now), signer.sign("20003", now));
        assert_eq!(signer.sign(20003, now), signer.sign("20003", now));
    }

    #[test]
    fn test_expiry_is_hex_of_now_plus_ttl() {
        let signed = signer().sign(1, at(1_000));
        assert_eq!(signed.expires_at(), 4_600);
        assert_eq!(signed.ts(), "11f8");
        assert!(!signed.ts().starts_with("0x"));
    }

    #[test]
    fn test_subsecond_time_is_floored() {
        let now = Utc.timestamp_opt(1_700_000_000, 999_999_999).unwrap();
        assert_eq!(signer().sign(273, now).ts(), "6553ff10");
    }

    #[test]
    fn test_signature_is_32_lowercase_hex() {
        let signed = signer().sign("anything", at(1_234_567_890));
        assert_eq!(signed.signature().len(), 32);
        assert!(signed
            .signature()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_canonical_string_escapes_slash() {
        let signer = signer();
        let canonical = signer.canonical_string(&signer.stream_path("20003"), "637b930f");
        assert_eq!(
            canonical,
            "app_id=web&path=%2Flive%2F20003%2F64k.mp3&ts=637b930f"
        );
    }

    #[test]
    fn test_percent_encode_keeps_unreserved() {
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(percent_encode("a b/c?d=e&f"), "a%20b%2Fc%3Fd%3De%26f");
        assert_eq!(percent_encode("电台"), "%E7%94%B5%E5%8F%B0");
    }

    #[test]
    fn test_unvalidated_station_id_is_interpolated_verbatim() {
        let signed = signer().sign("abc def", at(1_700_000_000));
        assert!(signed
            .as_str()
            .starts_with("https://lhttp.qingting.fm/live/abc def/64k.mp3?"));
        assert_eq!(signed.signature(), "8faa965b9f751748cdf96f4646d1aba7");
    }

    #[test]
    fn test_query_string_round_trip() {
        let signed = signer().sign(273, at(1_700_000_000));
        let (_, query) = signed.as_str().split_once('?').unwrap();

        let pairs: Vec<(String, String)> = query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (
                    percent_decode_str(k).decode_utf8().unwrap().into_owned(),
                    percent_decode_str(v).decode_utf8().unwrap().into_owned(),
                )
            })
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("app_id".to_string(), "web".to_string()),
                ("ts".to_string(), signed.ts().to_string()),
                ("sign".to_string(), signed.signature().to_string()),
            ]
        );
    }

    #[test]
    fn test_different_secret_changes_signature() {
        let other = StreamSigner::new(&SigningConfig {
            secret: "another-secret".to_string(),
            ..SigningConfig::default()
        })
        .unwrap();
        let now = at(1_669_039_359);
        assert_ne!(other.sign(20003, now).signature(), signer().sign(20003, now).signature());
    }

    #[test]
    fn test_custom_template_and_base_url() {
        let signer = StreamSigner::new(&SigningConfig {
            stream_base_url: "http://localhost:9000/".to_string(),
            path_template: "/live/{id}/24k.mp3".to_string(),
            ..SigningConfig::default()
        })
        .unwrap();

        let signed = signer.sign(5, at(0));
        assert_eq!(signed.ts(), "e10");
        assert!(signed
            .as_str()
            .starts_with("http://localhost:9000/live/5/24k.mp3?app_id=web&ts=e10&sign="));
    }

    #[test]
    fn test_rejects_ttl_that_could_overflow_expiry() {
        let result = StreamSigner::new(&SigningConfig {
            ttl_secs: i64::MAX,
            ..SigningConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));

        let longest = StreamSigner::new(&SigningConfig {
            ttl_secs: crate::config::MAX_TTL_SECS,
            ..SigningConfig::default()
        })
        .unwrap();
        let latest = DateTime::<Utc>::MAX_UTC;
        assert_eq!(
            longest.sign(1, latest).expires_at(),
            latest.timestamp() + crate::config::MAX_TTL_SECS
        );
    }

    #[test]
    fn test_accessors_report_settings() {
        let signer = StreamSigner::new(&SigningConfig {
            stream_base_url: "http://localhost:9000/".to_string(),
            ..SigningConfig::default()
        })
        .unwrap();
        assert_eq!(signer.base_url(), "http://localhost:9000");
        assert_eq!(signer.ttl_secs(), 3600);
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains("Lwrpu"));
        assert!(rendered.contains("StreamSigner"));
    }
}
