use serde::{Deserialize, Serialize};

/// Operator-editable settings persisted as `config.json`.
///
/// Every field is required on the wire; a document missing one is rejected
/// by `ConfigStore::replace`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertConfig {
    pub ip_addr: String,
    pub webroot: String,
    pub email: String,
    pub renew_days: u32,
    pub install_paths: Vec<String>,
    pub web_enable: bool,
    pub web_user: String,
    pub web_pass: String,
}

impl CertConfig {
    pub fn credentials_match(&self, user: &str, pass: &str) -> bool {
        self.web_user == user && self.web_pass == pass
    }
}
