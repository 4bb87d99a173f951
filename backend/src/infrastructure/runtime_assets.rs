pub const DEFAULT_CONFIG_JSON: &str = include_str!("../../templates/config/config.json");
pub const DEFAULT_INDEX_HTML: &str = include_str!("../../templates/web/index.html");
