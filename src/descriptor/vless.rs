//! `vless://<id>@<host>:<port>?<query>#<label>` descriptors.

use super::types::{CanonicalRecord, Endpoint, VlessEndpoint};
use super::AuthorityUri;
use crate::error_handling::DescriptorError;

pub(super) fn parse_vless(descriptor: &str) -> Result<CanonicalRecord, DescriptorError> {
    let uri = AuthorityUri::parse(descriptor)?;
    let id = uri.credential("id")?;

    let endpoint = VlessEndpoint {
        address: uri.host.clone(),
        port: uri.port,
        id,
        encryption: uri.param_or("encryption", "none"),
        network: uri.param_or("type", "tcp"),
        security: uri.param_or("security", "none"),
        path: uri.param_or("path", ""),
        host: uri.param_or("host", ""),
        sni: uri.param_or("sni", ""),
        fingerprint: uri.param_or("fp", ""),
        public_key: uri.param_or("pbk", ""),
        short_id: uri.param_or("sid", ""),
        flow: uri.param_or("flow", ""),
        service_name: uri.param_or("serviceName", ""),
    };

    Ok(CanonicalRecord {
        endpoint: Endpoint::Vless(endpoint),
        display_label: uri.fragment,
        raw_uri: descriptor.to_string(),
    })
}
