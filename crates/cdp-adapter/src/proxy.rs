use tokenrelay_flow::ProxyDescriptor;

/// Switches added for SOCKS proxies so that no traffic bypasses the tunnel.
const SOCKS_ISOLATION_FLAGS: [&str; 5] = [
    "--disable-webrtc-hw-encoding",
    "--disable-webrtc-hw-decoding",
    "--proxy-bypass-list=<-loopback>",
    "--disable-quic",
    "--dns-prefetch-disable",
];

/// Launch flags derived from a caller-supplied proxy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxyArgs {
    pub server: String,
    pub extra: Vec<String>,
    /// Inline `user:pass` split off the endpoint. Chromium does not accept it in
    /// `--proxy-server`, so it is reported rather than forwarded.
    pub dropped_credentials: bool,
}

impl ProxyArgs {
    pub fn from_descriptor(proxy: &ProxyDescriptor) -> Self {
        let scheme = proxy.protocol.trim().to_ascii_lowercase();
        let mut endpoint = proxy.data.trim();
        let prefix = format!("{scheme}://");
        if let Some(rest) = endpoint
            .get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(&prefix))
            .and_then(|_| endpoint.get(prefix.len()..))
        {
            endpoint = rest;
        }

        let (endpoint, dropped_credentials) = match endpoint.rsplit_once('@') {
            Some((_, host)) => (host, true),
            None => (endpoint, false),
        };

        let extra = if scheme.starts_with("socks") {
            SOCKS_ISOLATION_FLAGS.iter().map(|flag| flag.to_string()).collect()
        } else {
            Vec::new()
        };

        Self {
            server: format!("--proxy-server={scheme}://{endpoint}"),
            extra,
            dropped_credentials,
        }
    }

    pub fn into_args(self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.extra.len() + 1);
        args.push(self.server);
        args.extend(self.extra);
        args
    }
}
