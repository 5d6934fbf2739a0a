//! ICE (Interactive Connectivity Establishment) configuration.
//!
//! Provides helpers for configuring STUN and TURN servers.

use webrtc::ice_transport::ice_server::RTCIceServer;

/// ICE server configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    /// Create a STUN-only server config
    pub fn stun(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: None,
            credential: None,
        }
    }

    /// Create a TURN server config with credentials
    pub fn turn(url: &str, username: &str, credential: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: Some(username.to_string()),
            credential: Some(credential.to_string()),
        }
    }

    /// Convert to webrtc-rs RTCIceServer
    pub(crate) fn to_rtc_ice_server(&self) -> RTCIceServer {
        RTCIceServer {
            urls: self.urls.clone(),
            username: self.username.clone().unwrap_or_default(),
            credential: self.credential.clone().unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Single Google STUN server used by the default session
pub fn default_stun_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig::stun("stun:stun.l.google.com:19302")]
}

/// Google STUN pool, as deployed next to the bridge
pub fn google_stun_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun("stun:stun.l.google.com:19302"),
        IceServerConfig::stun("stun:stun1.l.google.com:19302"),
        IceServerConfig::stun("stun:stun2.l.google.com:19302"),
        IceServerConfig::stun("stun:stun4.l.google.com:19302"),
    ]
}

/// Parse a comma separated list of STUN urls (`BRIDGE_ICE_SERVERS`)
pub fn parse_stun_list(list: &str) -> Vec<IceServerConfig> {
    list.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(IceServerConfig::stun)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_credentials_carry_over() {
        let rtc = IceServerConfig::turn("turn:relay.example:3478", "user", "secret").to_rtc_ice_server();
        assert_eq!(rtc.urls, vec!["turn:relay.example:3478".to_string()]);
        assert_eq!(rtc.username, "user");
        assert_eq!(rtc.credential, "secret");
    }

    #[test]
    fn test_stun_has_no_credentials() {
        let rtc = IceServerConfig::stun("stun:stun.l.google.com:19302").to_rtc_ice_server();
        assert!(rtc.username.is_empty());
        assert!(rtc.credential.is_empty());
    }

    #[test]
    fn test_parse_stun_list() {
        let servers = parse_stun_list(" stun:a:1 , ,stun:b:2");
        assert_eq!(servers, vec![IceServerConfig::stun("stun:a:1"), IceServerConfig::stun("stun:b:2")]);
    }
}
