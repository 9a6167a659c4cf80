//! Session cookie codec
//!
//! Reads and writes sessions in the identity provider's SSR cookie format so
//! sessions survive alongside the provider's own browser helpers:
//! `base64-` + base64url(JSON), split into `<name>.0`, `<name>.1`, ... once
//! the value exceeds the chunk size.

use axum::http::HeaderMap;
use platform::cookie::{CookieConfig, extract_cookies_with_prefix};
use platform::crypto::{from_base64_url, to_base64_url};

use crate::domain::entity::session::Session;

pub const BASE64_PREFIX: &str = "base64-";

/// Largest value written to a single cookie
pub const MAX_CHUNK_SIZE: usize = 3180;

#[derive(Debug, Clone)]
pub struct SessionCookieCodec {
    name: String,
    cookie: CookieConfig,
}

impl SessionCookieCodec {
    pub fn new(name: impl Into<String>, cookie: CookieConfig) -> Self {
        Self {
            name: name.into(),
            cookie,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chunk index for `<name>.<n>`; `None` for the unchunked name
    fn chunk_index(&self, cookie_name: &str) -> Option<Option<usize>> {
        if cookie_name == self.name {
            return Some(None);
        }
        cookie_name
            .strip_prefix(self.name.as_str())?
            .strip_prefix('.')?
            .parse::<usize>()
            .ok()
            .map(Some)
    }

    /// Session cookies present on the request, ignoring look-alikes such as
    /// the PKCE verifier cookie
    fn present(&self, headers: &HeaderMap) -> Vec<(Option<usize>, String, String)> {
        extract_cookies_with_prefix(headers, &self.name)
            .into_iter()
            .filter_map(|(name, value)| {
                self.chunk_index(&name).map(|index| (index, name, value))
            })
            .collect()
    }

    pub fn has_cookies(&self, headers: &HeaderMap) -> bool {
        !self.present(headers).is_empty()
    }

    /// Reassembled cookie value, chunks joined in index order
    fn raw_value(&self, headers: &HeaderMap) -> Option<String> {
        let present = self.present(headers);

        if let Some((_, _, value)) = present.iter().find(|(index, _, _)| index.is_none()) {
            return Some(value.clone());
        }

        let mut chunks: Vec<(usize, String)> = present
            .into_iter()
            .filter_map(|(index, _, value)| index.map(|i| (i, value)))
            .collect();
        if chunks.is_empty() {
            return None;
        }
        chunks.sort_by_key(|(index, _)| *index);

        // A gap means a chunk went missing; the value cannot be trusted
        if chunks.iter().enumerate().any(|(expected, (index, _))| expected != *index) {
            return None;
        }

        Some(chunks.into_iter().map(|(_, value)| value).collect())
    }

    pub fn read(&self, headers: &HeaderMap) -> Option<Session> {
        let raw = self.raw_value(headers)?;
        match decode(&raw) {
            Some(session) => Some(session),
            None => {
                tracing::debug!(cookie = %self.name, "Undecodable session cookie");
                None
            }
        }
    }

    /// Set-Cookie values storing `session`, plus deletions for chunk layouts
    /// the request carried that the new value does not use
    pub fn write(&self, session: &Session, request_headers: &HeaderMap) -> Vec<String> {
        let encoded = match encode(session) {
            Some(encoded) => encoded,
            None => return Vec::new(),
        };

        let mut cookies = Vec::new();
        let written: Vec<String> = if encoded.len() <= MAX_CHUNK_SIZE {
            cookies.push(self.cookie.build_set_cookie(&self.name, &encoded));
            vec![self.name.clone()]
        } else {
            // The encoded value is ASCII, so byte chunks are char chunks
            encoded
                .as_bytes()
                .chunks(MAX_CHUNK_SIZE)
                .enumerate()
                .map(|(i, chunk)| {
                    let name = format!("{}.{}", self.name, i);
                    let value = String::from_utf8_lossy(chunk);
                    cookies.push(self.cookie.build_set_cookie(&name, &value));
                    name
                })
                .collect()
        };

        for (_, name, _) in self.present(request_headers) {
            if !written.contains(&name) {
                cookies.push(self.cookie.build_delete_cookie(&name));
            }
        }

        cookies
    }

    /// Deletions for every session cookie the request carried
    pub fn clear(&self, request_headers: &HeaderMap) -> Vec<String> {
        let mut names: Vec<String> = self
            .present(request_headers)
            .into_iter()
            .map(|(_, name, _)| name)
            .collect();
        if names.is_empty() {
            names.push(self.name.clone());
        }
        names
            .iter()
            .map(|name| self.cookie.build_delete_cookie(name))
            .collect()
    }
}

fn encode(session: &Session) -> Option<String> {
    let json = serde_json::to_vec(session).ok()?;
    Some(format!("{}{}", BASE64_PREFIX, to_base64_url(&json)))
}

fn decode(raw: &str) -> Option<Session> {
    if let Some(encoded) = raw.strip_prefix(BASE64_PREFIX) {
        let bytes = from_base64_url(encoded).ok()?;
        return serde_json::from_slice(&bytes).ok();
    }

    // Older helpers wrote plain (sometimes URL-encoded) JSON
    if raw.starts_with('{') {
        return serde_json::from_str(raw).ok();
    }
    let decoded: Vec<(String, String)> = serde_urlencoded::from_str(&format!("v={}", raw)).ok()?;
    let (_, json) = decoded.into_iter().next()?;
    serde_json::from_str(&json).ok()
}
