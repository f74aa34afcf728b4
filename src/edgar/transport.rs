// src/edgar/transport.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};

use crate::utils::error::EdgarError;

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// The one operation the pipeline needs from the network: a GET with its own timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, EdgarError>;
}

/// reqwest-backed transport carrying the identifying User-Agent EDGAR requires.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, EdgarError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent) // Set the required User-Agent
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, EdgarError> {
        let response = self
            .client
            .get(url)
            // SEC uses various content types, but often text/html for filings
            .header(header::ACCEPT, "application/json,application/xml,text/html,text/plain,*/*")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, url, timeout))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(e, url, timeout))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify(err: reqwest::Error, url: &str, timeout: Duration) -> EdgarError {
    if err.is_timeout() {
        EdgarError::Timeout(timeout, url.to_string())
    } else {
        EdgarError::Network(err)
    }
}
