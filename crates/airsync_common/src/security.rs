//! Schema dialect of the VIF security map.
//!
//! The published security settings are a flat string map with well-known
//! keys. These constants are the only spellings the sink accepts.

pub const SECURITY_ENCRYPTION: &str = "encryption";
pub const SECURITY_MODE: &str = "mode";
pub const SECURITY_KEY: &str = "key";
pub const SECURITY_OFTAG: &str = "oftag";
pub const SECURITY_RADIUS_IP: &str = "radius_server_ip";
pub const SECURITY_RADIUS_PORT: &str = "radius_server_port";
pub const SECURITY_RADIUS_SECRET: &str = "radius_server_secret";

pub const ENCRYPTION_OPEN: &str = "OPEN";
pub const ENCRYPTION_WEP: &str = "WEP";
pub const ENCRYPTION_WPA_PSK: &str = "WPA-PSK";
pub const ENCRYPTION_WPA_EAP: &str = "WPA-EAP";

pub const MODE_WEP64: &str = "64";
pub const MODE_WEP128: &str = "128";
pub const MODE_WPA1: &str = "1";
pub const MODE_WPA2: &str = "2";
pub const MODE_MIXED: &str = "mixed";
