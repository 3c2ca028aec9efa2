//! Fixed upstream URLs and the per-request URLs derived from them

use anyhow::Context;
use reqwest::Url;

use crate::config::UpstreamConfig;

/// Which queue a request id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Generation,
    Edit,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub generate: Url,
    pub edit: Url,
    pub storage: Url,
}

impl Endpoints {
    pub fn from_config(config: &UpstreamConfig) -> anyhow::Result<Self> {
        Ok(Self {
            generate: parse(&config.generate_url, "generate_url")?,
            edit: parse(&config.edit_url, "edit_url")?,
            storage: parse(&config.storage_url, "storage_url")?,
        })
    }

    pub fn queue(&self, variant: Variant) -> &Url {
        match variant {
            Variant::Generation => &self.generate,
            Variant::Edit => &self.edit,
        }
    }

    /// `{queue}/requests/{id}` or `{queue}/requests/{id}/status`.
    ///
    /// `id` is pushed as a single path segment, so `/`, `?`, `#` and spaces are percent-encoded
    /// instead of changing the shape of the URL.
    pub fn request_url(&self, variant: Variant, request_id: &str, status: bool) -> Url {
        let mut url = self.queue(variant).clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("requests").push(request_id);
            if status {
                segments.push("status");
            }
        }
        url
    }
}

fn parse(raw: &str, name: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid upstream {}: {:?}", name, raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Upstream {} must be an http(s) URL: {:?}", name, raw);
    }
    Ok(url)
}
