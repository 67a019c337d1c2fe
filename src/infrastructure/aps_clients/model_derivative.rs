use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::http::ApsHttp;
use super::ModelDerivativeClient;
use crate::domain::error::Result;
use crate::domain::manifest::encode_urn;

pub struct ModelDerivativeApi {
    http: ApsHttp,
}

impl ModelDerivativeApi {
    pub fn new(http: ApsHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ModelDerivativeClient for ModelDerivativeApi {
    async fn fetch_manifest(&self, version_urn: &str) -> Result<Value> {
        let encoded = encode_urn(version_urn);
        let url = self.http.endpoint(&[
            "modelderivative",
            "v2",
            "designdata",
            encoded.as_str(),
            "manifest",
        ]);
        self.http
            .send_json(self.http.request(Method::GET, url))
            .await
    }
}
