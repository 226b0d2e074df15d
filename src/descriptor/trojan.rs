//! `trojan://<password>@<host>:<port>?<query>#<label>` descriptors.

use super::types::{CanonicalRecord, Endpoint, TrojanEndpoint};
use super::AuthorityUri;
use crate::error_handling::DescriptorError;

pub(super) fn parse_trojan(descriptor: &str) -> Result<CanonicalRecord, DescriptorError> {
    let uri = AuthorityUri::parse(descriptor)?;
    let password = uri.credential("password")?;

    // `peer` is the older spelling of `sni`
    let sni = match uri.param("sni") {
        Some(sni) => sni.to_string(),
        None => uri.param_or("peer", ""),
    };

    let endpoint = TrojanEndpoint {
        address: uri.host.clone(),
        port: uri.port,
        password,
        sni,
        network: uri.param_or("type", "tcp"),
        security: uri.param_or("security", "tls"),
        path: uri.param_or("path", ""),
        host: uri.param_or("host", ""),
    };

    Ok(CanonicalRecord {
        endpoint: Endpoint::Trojan(endpoint),
        display_label: uri.fragment,
        raw_uri: descriptor.to_string(),
    })
}
