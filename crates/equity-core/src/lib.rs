#![deny(warnings)]
pub mod game;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "holdem-equity"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn user_agent() -> String {
        format!("{}/{}", Self::name(), Self::version())
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "holdem-equity");
        assert!(!AppInfo::version().is_empty());
        assert!(AppInfo::user_agent().starts_with("holdem-equity/"));
    }
}
