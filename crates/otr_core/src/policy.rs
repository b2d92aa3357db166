//! §3 "Policy": the recognized options, a plain host-owned struct — no
//! config file or env var layer, per §6/§9.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    pub allow_v2: bool,
    pub allow_v3: bool,
    pub require_encryption: bool,
    pub send_whitespace_tag: bool,
    pub whitespace_start_ake: bool,
    pub error_start_ake: bool,
}

impl Policy {
    /// The versions this policy admits, highest first — the order a
    /// dispatcher should prefer when picking a version to negotiate.
    pub fn allowed_versions(&self) -> Vec<u16> {
        let mut versions = Vec::new();
        if self.allow_v3 {
            versions.push(3);
        }
        if self.allow_v2 {
            versions.push(2);
        }
        versions
    }

    /// §3 "Policy with no allowed version disables all OTR handling."
    pub fn disables_otr(&self) -> bool {
        !self.allow_v2 && !self.allow_v3
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_v2: true,
            allow_v3: true,
            require_encryption: false,
            send_whitespace_tag: true,
            whitespace_start_ake: true,
            error_start_ake: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_allowed_version_disables_otr() {
        let policy = Policy { allow_v2: false, allow_v3: false, ..Policy::default() };
        assert!(policy.disables_otr());
        assert!(policy.allowed_versions().is_empty());
    }

    #[test]
    fn prefers_v3_over_v2() {
        let policy = Policy::default();
        assert_eq!(policy.allowed_versions(), vec![3, 2]);
    }
}
