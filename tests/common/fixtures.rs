//! Test fixtures and constants.

/// Key shared by every signer and gate in the tests
pub const KEY: &[u8] = b"0001020304050607";

/// Base URL the gate resolves request targets against
pub const BASE_URL: &str = "https://h/";

/// Files written into the served directory
pub mod files {
    pub const HELLO: &str = "hello.txt";
    pub const HELLO_CONTENT: &str = "hello, signed world\n";

    pub const NESTED: &str = "reports/2024/q1.csv";
    pub const NESTED_CONTENT: &str = "quarter,total\nq1,42\n";
}

/// Environment lookup for `AppConfig::from_sources`
pub fn test_env(base_url: &str, files_dir: &str) -> impl Fn(&str) -> Option<String> {
    let base_url = base_url.to_string();
    let files_dir = files_dir.to_string();
    move |name: &str| match name {
        "SIGNING_KEY" => Some(String::from_utf8_lossy(KEY).into_owned()),
        "BASE_URL" => Some(base_url.clone()),
        "FILES_DIR" => Some(files_dir.clone()),
        "BIND_ADDR" => Some("127.0.0.1:0".to_string()),
        _ => None,
    }
}

/// Strip scheme and authority, leaving the request target a client would send
pub fn request_target(signed: &str) -> String {
    let parsed = url::Url::parse(signed).expect("signed URL must parse");
    match parsed.query() {
        Some(query) => format!("{}?{}", parsed.path(), query),
        None => parsed.path().to_string(),
    }
}
