use tracing::debug;

use crate::error::ResolveError;

pub const DEFAULT_REMOTE: &str = "origin";

/// Picks the remote whose URL a link should point at.
///
/// A lone remote always wins, then an explicitly preferred remote that is
/// actually configured, then `origin`.
pub fn select_remote(remotes: &[String], preferred: Option<&str>) -> Result<String, ResolveError> {
    if let [only] = remotes {
        debug!(remote = %only, "selected the only configured remote");
        return Ok(only.clone());
    }

    if let Some(preferred) = preferred.filter(|name| remotes.iter().any(|remote| remote == name)) {
        debug!(remote = preferred, "selected preferred remote");
        return Ok(preferred.to_string());
    }

    if remotes.iter().any(|remote| remote == DEFAULT_REMOTE) {
        debug!(remote = DEFAULT_REMOTE, "fell back to default remote");
        return Ok(DEFAULT_REMOTE.to_string());
    }

    Err(ResolveError::NoRemoteDeterminable {
        remotes: remotes.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn single_remote_wins_over_preference() {
        assert_eq!(
            select_remote(&names(&["origin"]), None).expect("single remote"),
            "origin"
        );
        assert_eq!(
            select_remote(&names(&["upstream"]), Some("origin")).expect("single remote"),
            "upstream"
        );
    }

    #[test]
    fn preferred_remote_is_used_when_configured() {
        assert_eq!(
            select_remote(&names(&["a", "b"]), Some("b")).expect("preferred remote"),
            "b"
        );
        assert_eq!(
            select_remote(&names(&["origin", "fork"]), Some("fork")).expect("preferred remote"),
            "fork"
        );
    }

    #[test]
    fn unknown_preference_without_origin_fails() {
        let err = select_remote(&names(&["a", "b"]), Some("z")).expect_err("should fail");
        assert_eq!(
            err,
            ResolveError::NoRemoteDeterminable {
                remotes: names(&["a", "b"]),
            }
        );
    }

    #[test]
    fn origin_is_the_fallback() {
        assert_eq!(
            select_remote(&names(&["origin", "upstream"]), None).expect("origin fallback"),
            "origin"
        );
        assert_eq!(
            select_remote(&names(&["upstream", "origin"]), Some("missing"))
                .expect("origin fallback"),
            "origin"
        );
    }

    #[test]
    fn no_remotes_fails() {
        let err = select_remote(&[], Some("origin")).expect_err("empty remote list");
        assert!(matches!(err, ResolveError::NoRemoteDeterminable { .. }));
    }
}
