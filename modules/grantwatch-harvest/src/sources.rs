use grantwatch_common::SourceKind;

/// One configured harvest origin. The list is static and compiled into
/// the deployment — sources change via code review, not runtime config.
#[derive(Debug, Clone, Copy)]
pub struct GrantSource {
    pub name: &'static str,
    pub url: &'static str,
    pub kind: SourceKind,
    pub provider: &'static str,
}

/// The fixed list of grant portals, in harvest order. Order matters:
/// deduplication is first-occurrence-wins across the flattened results,
/// so higher-fidelity sources come first.
pub fn grant_sources() -> &'static [GrantSource] {
    &[
        GrantSource {
            name: "Startup India Government Schemes",
            url: "https://www.startupindia.gov.in/content/sih/en/government-schemes.html",
            kind: SourceKind::Government,
            provider: "Startup India",
        },
        GrantSource {
            name: "SISFS Seed Fund",
            url: "https://seedfund.startupindia.gov.in/",
            kind: SourceKind::Government,
            provider: "Startup India",
        },
        GrantSource {
            name: "NIDHI Programs",
            url: "https://nidhi.dst.gov.in/schemes-programmes/",
            kind: SourceKind::Government,
            provider: "DST",
        },
        GrantSource {
            name: "BIRAC Funding Schemes",
            url: "https://birac.nic.in/desc_new.php?id=89",
            kind: SourceKind::Government,
            provider: "BIRAC",
        },
        GrantSource {
            name: "Startup Grants India Aggregator",
            url: "https://startupgrantsindia.com/",
            kind: SourceKind::Aggregator,
            provider: "StartupGrantsIndia",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_are_well_formed() {
        let sources = grant_sources();
        assert!(!sources.is_empty());
        for s in sources {
            assert!(s.url.starts_with("https://"), "{} has non-https URL", s.name);
            assert!(!s.name.is_empty());
            assert!(!s.provider.is_empty());
        }
    }
}
