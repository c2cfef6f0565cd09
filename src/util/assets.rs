use std::borrow::Cow;

use rust_embed::RustEmbed;

/// Embed the `data/` directory (default configuration) into the binary.
#[derive(RustEmbed)]
#[folder = "data"]
struct EmbeddedData;

pub const DEFAULT_CONFIG: &str = "advisor.json";

/// Raw bytes of an embedded data file, if present.
pub fn load(name: &str) -> Option<Cow<'static, [u8]>> {
    EmbeddedData::get(canonical_path(name)).map(|file| file.data)
}

/// Embedded data file decoded as UTF-8.
pub fn load_text(name: &str) -> Option<String> {
    load(name).and_then(|data| String::from_utf8(data.into_owned()).ok())
}

fn canonical_path(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    trimmed.strip_prefix("data/").unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_embedded() {
        let text = load_text(DEFAULT_CONFIG).unwrap();
        assert!(text.contains("\"markets\""));
        assert_eq!(load_text("/data/advisor.json"), Some(text));
    }

    #[test]
    fn test_missing_asset() {
        assert!(load("nope.json").is_none());
    }
}
