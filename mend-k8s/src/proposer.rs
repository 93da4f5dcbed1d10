//! Remote template proposer over HTTP.
//!
//! One POST per repair at most: the manifest as YAML text plus the
//! violation list, answered by a `{template, hole_space}` document with
//! `{"$hole": name}` sentinels. Responses are validated at this boundary;
//! anything short of a covered template falls back to the default catalog
//! upstream.

use std::time::Duration;

use serde::Serialize;

use mend_core::errors::ProposerError;
use mend_core::traits::{TemplateBundle, TemplateProposer};
use mend_core::types::violation::Violation;

use crate::manifest::Manifest;

#[derive(Serialize)]
struct ProposeRequest<'a> {
    manifest: String,
    violations: &'a [Violation],
}

pub struct HttpProposer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpProposer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProposerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProposerError::Unavailable {
                message: e.to_string(),
            })?;
        Ok(HttpProposer {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl TemplateProposer<Manifest> for HttpProposer {
    fn propose(
        &self,
        artifact: &Manifest,
        violations: &[Violation],
    ) -> Result<TemplateBundle, ProposerError> {
        let manifest = artifact
            .to_yaml_string()
            .map_err(|e| ProposerError::Unavailable {
                message: e.to_string(),
            })?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProposeRequest { manifest, violations })
            .send()
            .map_err(|e| ProposerError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProposerError::Unavailable {
                message: format!("HTTP {status}"),
            });
        }

        let bundle: TemplateBundle = response.json().map_err(|e| ProposerError::Malformed {
            reason: e.to_string(),
        })?;
        bundle.validate()?;
        Ok(bundle)
    }
}
