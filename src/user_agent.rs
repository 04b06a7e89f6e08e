//! User-Agent string sent to the OB database API.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/ashrae-ob/obplatform";

/// Default User-Agent (identifies the tool and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("obplatform/{version} (research-data-client; +{PROJECT_UA_URL})")
}
