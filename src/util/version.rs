pub const APP_NAME: &str = "Mandi Advisor";
pub const APP_AUTHOR: &str = "SetScallywag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Release tag when built from a tagged checkout, else the crate version.
pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// User agent for outbound HTTP requests.
pub fn user_agent() -> String {
    format!("mandi-advisor/{} ({})", version_label(), APP_AUTHOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_label_is_not_empty() {
        let label = version_label();
        assert!(!label.is_empty());
        assert!(user_agent().contains(&label));
    }
}
